// Adapters layer: concrete implementations of the domain ports.

pub mod headless_map;
pub mod location;
pub mod osrm;
pub mod socrata;

pub use headless_map::{MapOp, RecordingMap};
pub use location::{FixedLocation, UnavailableLocation};
pub use osrm::OsrmRoutingProvider;
pub use socrata::SocrataPoiSource;
