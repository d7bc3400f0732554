// Domain layer: core models and ports (interfaces) for the identification pipeline.

pub mod model;
pub mod ports;
