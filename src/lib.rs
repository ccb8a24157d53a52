pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliArgs;
pub use crate::config::SyncConfig;

pub use crate::core::{Session, SessionEvent, SessionNotice, SessionPorts};
pub use crate::domain::model::{Coordinate, PoiCategory, PointOfInterest, Viewport};
pub use crate::utils::error::{Result, SyncError};
