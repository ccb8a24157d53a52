use serde::{Deserialize, Serialize};
use std::fmt;

/// 座標鍵的精度 (小數點後五位)
const KEY_SCALE: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoiCategory {
    Restroom,
    Restaurant,
}

impl PoiCategory {
    /// Fixed search order: restrooms before restaurants.
    pub const ALL: [PoiCategory; 2] = [PoiCategory::Restroom, PoiCategory::Restaurant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restroom => "restroom",
            Self::Restaurant => "restaurant",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Restroom => "restrooms",
            Self::Restaurant => "restaurants",
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Identity of a POI within its category: the coordinate rounded to five
/// decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoiKey {
    lat_e5: i64,
    lng_e5: i64,
}

impl PoiKey {
    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            lat_e5: (coordinate.latitude * KEY_SCALE).round() as i64,
            lng_e5: (coordinate.longitude * KEY_SCALE).round() as i64,
        }
    }
}

impl fmt::Display for PoiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.5},{:.5}",
            self.lat_e5 as f64 / KEY_SCALE,
            self.lng_e5 as f64 / KEY_SCALE
        )
    }
}

/// Category-specific display attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum PoiDetails {
    Restroom {
        name: Option<String>,
        accessible: bool,
        year_round: bool,
        borough: Option<String>,
    },
    Restaurant {
        name: Option<String>,
        cuisine: Option<String>,
        grade: Option<String>,
        borough: Option<String>,
    },
}

impl PoiDetails {
    pub fn category(&self) -> PoiCategory {
        match self {
            Self::Restroom { .. } => PoiCategory::Restroom,
            Self::Restaurant { .. } => PoiCategory::Restaurant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    #[serde(skip)]
    key: PoiKey,
    coordinate: Coordinate,
    pub details: PoiDetails,
}

impl PointOfInterest {
    pub fn new(coordinate: Coordinate, details: PoiDetails) -> Self {
        Self {
            key: PoiKey::from_coordinate(coordinate),
            coordinate,
            details,
        }
    }

    pub fn key(&self) -> PoiKey {
        self.key
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn category(&self) -> PoiCategory {
        self.details.category()
    }

    /// 顯示名稱，缺少時使用分類預設值
    pub fn display_name(&self) -> &str {
        match &self.details {
            PoiDetails::Restroom { name, .. } => name.as_deref().unwrap_or("Public Restroom"),
            PoiDetails::Restaurant { name, .. } => name.as_deref().unwrap_or("Restaurant"),
        }
    }

    pub fn borough(&self) -> Option<&str> {
        match &self.details {
            PoiDetails::Restroom { borough, .. } | PoiDetails::Restaurant { borough, .. } => {
                borough.as_deref()
            }
        }
    }
}

/// The visible map region as reported by the map engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(south_west: Coordinate, north_east: Coordinate, zoom: f64) -> Self {
        Self {
            south_west,
            north_east,
            zoom,
        }
    }

    /// Builds a viewport of the given spans centred on `center`.
    pub fn around(center: Coordinate, lat_span: f64, lng_span: f64, zoom: f64) -> Self {
        Self {
            south_west: Coordinate::new(center.latitude - lat_span / 2.0, center.longitude - lng_span / 2.0),
            north_east: Coordinate::new(center.latitude + lat_span / 2.0, center.longitude + lng_span / 2.0),
            zoom,
        }
    }

    pub fn south(&self) -> f64 {
        self.south_west.latitude
    }

    pub fn north(&self) -> f64 {
        self.north_east.latitude
    }

    pub fn west(&self) -> f64 {
        self.south_west.longitude
    }

    pub fn east(&self) -> f64 {
        self.north_east.longitude
    }

    pub fn lat_span(&self) -> f64 {
        (self.north() - self.south()).abs()
    }

    pub fn lng_span(&self) -> f64 {
        (self.east() - self.west()).abs()
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south() + self.north()) / 2.0,
            (self.west() + self.east()) / 2.0,
        )
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.latitude >= self.south()
            && coordinate.latitude <= self.north()
            && coordinate.longitude >= self.west()
            && coordinate.longitude <= self.east()
    }
}

/// Route geometry returned by a routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub geometry: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}
