use crate::domain::model::PointOfInterest;

/// Greedy, order-preserving spatial filter.
///
/// A candidate is accepted only if no already accepted point lies within
/// `min_delta` degrees on *both* the latitude and longitude axis. Accepting
/// stops once `cap` points are kept.
///
/// Distances are raw degree deltas, not ground distance: at New York's
/// latitude a degree of longitude is shorter than a degree of latitude, so
/// the filter is anisotropic. Output is deterministic for a given input order.
pub fn declutter(points: Vec<PointOfInterest>, min_delta: f64, cap: usize) -> Vec<PointOfInterest> {
    let mut kept: Vec<PointOfInterest> = Vec::with_capacity(cap.min(points.len()));

    for candidate in points {
        if kept.len() >= cap {
            break;
        }

        let c = candidate.coordinate();
        let crowded = kept.iter().any(|accepted| {
            let a = accepted.coordinate();
            (a.latitude - c.latitude).abs() < min_delta
                && (a.longitude - c.longitude).abs() < min_delta
        });

        if !crowded {
            kept.push(candidate);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Coordinate, PoiDetails};

    fn restroom(lat: f64, lng: f64, name: &str) -> PointOfInterest {
        PointOfInterest::new(
            Coordinate::new(lat, lng),
            PoiDetails::Restroom {
                name: Some(name.to_string()),
                accessible: false,
                year_round: true,
                borough: None,
            },
        )
    }

    #[test]
    fn test_declutter_keeps_first_of_close_pair() {
        let points = vec![
            restroom(40.7580, -73.9855, "first"),
            restroom(40.7581, -73.9856, "too close"),
            restroom(40.7600, -73.9855, "far enough"),
        ];

        let kept = declutter(points, 0.0005, 100);

        let names: Vec<&str> = kept.iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["first", "far enough"]);
    }

    #[test]
    fn test_declutter_requires_both_axes_close() {
        // 緯度接近但經度相距夠遠，兩點都應保留
        let points = vec![
            restroom(40.7580, -73.9855, "a"),
            restroom(40.7580, -73.9800, "b"),
        ];

        assert_eq!(declutter(points, 0.0005, 100).len(), 2);
    }

    #[test]
    fn test_declutter_stops_at_cap() {
        let points: Vec<_> = (0..10)
            .map(|i| restroom(40.70 + f64::from(i) * 0.01, -73.98, &format!("p{}", i)))
            .collect();

        let kept = declutter(points, 0.0005, 3);

        assert_eq!(kept.len(), 3);
        assert_eq!(kept[2].display_name(), "p2");
    }

    #[test]
    fn test_declutter_output_has_no_crowded_pair() {
        let points: Vec<_> = (0..200)
            .map(|i| {
                let step = f64::from(i);
                restroom(40.75 + (step * 0.00037) % 0.01, -73.99 + (step * 0.00053) % 0.01, "p")
            })
            .collect();
        let min_delta = 0.001;

        let kept = declutter(points, min_delta, 100);

        assert!(kept.len() <= 100);
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                let dlat = (a.coordinate().latitude - b.coordinate().latitude).abs();
                let dlng = (a.coordinate().longitude - b.coordinate().longitude).abs();
                assert!(!(dlat < min_delta && dlng < min_delta));
            }
        }
    }

    #[test]
    fn test_declutter_empty_input() {
        assert!(declutter(Vec::new(), 0.0005, 100).is_empty());
    }
}
