use crate::domain::model::{Coordinate, Viewport};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "poi-sync")]
#[command(about = "Find nearby NYC restrooms and A-graded restaurants")]
pub struct CliArgs {
    /// Path to TOML configuration file (defaults are used when absent)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Map centre latitude; defaults to the device location
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Map centre longitude; defaults to the device location
    #[arg(long, allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Visible latitude span in degrees (longitude span is twice this)
    #[arg(long, default_value = "0.02")]
    pub span: f64,

    #[arg(long, default_value = "14")]
    pub zoom: f64,

    /// Request walking directions to the nearest result
    #[arg(long)]
    pub directions: bool,

    /// Print every marker instead of only the nearest result
    #[arg(long)]
    pub list: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON logs")]
    pub json_logs: bool,
}

impl CliArgs {
    /// Explicit map centre, when both coordinates were given.
    pub fn center(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
            _ => None,
        }
    }

    pub fn viewport_around(&self, center: Coordinate) -> Viewport {
        Viewport::around(center, self.span, self.span * 2.0, self.zoom)
    }
}
