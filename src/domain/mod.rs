// Domain layer: core models and ports (interfaces) shared by adapters and the sync engine.

pub mod model;
pub mod ports;
