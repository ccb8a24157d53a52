use crate::domain::model::{Coordinate, PoiCategory, PointOfInterest};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Current POI sets, one per category.
#[derive(Debug, Clone, Default)]
pub struct PoiSets {
    restrooms: Vec<PointOfInterest>,
    restaurants: Vec<PointOfInterest>,
}

impl PoiSets {
    pub fn new(restrooms: Vec<PointOfInterest>, restaurants: Vec<PointOfInterest>) -> Self {
        Self {
            restrooms,
            restaurants,
        }
    }

    pub fn get(&self, category: PoiCategory) -> &[PointOfInterest] {
        match category {
            PoiCategory::Restroom => &self.restrooms,
            PoiCategory::Restaurant => &self.restaurants,
        }
    }

    /// Last writer wins per category.
    pub fn replace(&mut self, category: PoiCategory, points: Vec<PointOfInterest>) {
        match category {
            PoiCategory::Restroom => self.restrooms = points,
            PoiCategory::Restaurant => self.restaurants = points,
        }
    }

    pub fn clear(&mut self) {
        self.restrooms.clear();
        self.restaurants.clear();
    }

    pub fn len(&self) -> usize {
        self.restrooms.len() + self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All points, restrooms first.
    pub fn iter(&self) -> impl Iterator<Item = &PointOfInterest> {
        PoiCategory::ALL.into_iter().flat_map(move |c| self.get(c).iter())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nearest {
    pub poi: PointOfInterest,
    pub distance_m: f64,
}

/// Great-circle distance in metres.
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = (to.latitude - from.latitude).to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Linear scan over restrooms then restaurants. Ties go to the point seen
/// first in that order.
pub fn nearest(origin: Coordinate, sets: &PoiSets) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;

    for poi in sets.iter() {
        let distance_m = haversine_m(origin, poi.coordinate());
        let closer = best.as_ref().map_or(true, |b| distance_m < b.distance_m);
        if closer {
            best = Some(Nearest {
                poi: poi.clone(),
                distance_m,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PoiDetails;

    const TIMES_SQUARE: Coordinate = Coordinate {
        latitude: 40.7580,
        longitude: -73.9855,
    };

    /// ~111.2 km per degree of latitude.
    fn north_of(origin: Coordinate, metres: f64) -> Coordinate {
        Coordinate::new(origin.latitude + metres / 111_195.0, origin.longitude)
    }

    fn restroom(at: Coordinate, name: &str) -> PointOfInterest {
        PointOfInterest::new(
            at,
            PoiDetails::Restroom {
                name: Some(name.to_string()),
                accessible: false,
                year_round: true,
                borough: None,
            },
        )
    }

    fn restaurant(at: Coordinate, name: &str) -> PointOfInterest {
        PointOfInterest::new(
            at,
            PoiDetails::Restaurant {
                name: Some(name.to_string()),
                cuisine: None,
                grade: Some("A".to_string()),
                borough: None,
            },
        )
    }

    #[test]
    fn test_haversine_known_distance() {
        // Times Square to Empire State Building ≈ 1.06 km
        let esb = Coordinate::new(40.7484, -73.9857);
        let d = haversine_m(TIMES_SQUARE, esb);
        assert!((d - 1067.0).abs() < 10.0, "got {}", d);
        assert_eq!(haversine_m(TIMES_SQUARE, TIMES_SQUARE), 0.0);
    }

    #[test]
    fn test_nearest_picks_closer_point() {
        let sets = PoiSets::new(
            vec![
                restroom(north_of(TIMES_SQUARE, 500.0), "B"),
                restroom(north_of(TIMES_SQUARE, 50.0), "A"),
            ],
            vec![],
        );

        let found = nearest(TIMES_SQUARE, &sets).map(|n| n.poi.display_name().to_string());
        assert_eq!(found.as_deref(), Some("A"));
    }

    #[test]
    fn test_nearest_searches_across_categories() {
        let sets = PoiSets::new(
            vec![restroom(north_of(TIMES_SQUARE, 300.0), "wc")],
            vec![restaurant(north_of(TIMES_SQUARE, 120.0), "diner")],
        );

        let found = nearest(TIMES_SQUARE, &sets);
        let found = found.expect("a point should be found");
        assert_eq!(found.poi.display_name(), "diner");
        assert!((found.distance_m - 120.0).abs() < 1.0);
    }

    #[test]
    fn test_tie_goes_to_restroom_listed_first() {
        let spot = north_of(TIMES_SQUARE, 200.0);
        let sets = PoiSets::new(
            vec![restroom(spot, "wc")],
            vec![restaurant(spot, "diner")],
        );

        let found = nearest(TIMES_SQUARE, &sets).map(|n| n.poi.category());
        assert_eq!(found, Some(PoiCategory::Restroom));
    }

    #[test]
    fn test_empty_sets_yield_none() {
        assert!(nearest(TIMES_SQUARE, &PoiSets::default()).is_none());
    }
}
