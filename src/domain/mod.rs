// Domain layer: core models and ports (capabilities the engine consumes).

pub mod model;
pub mod ports;
