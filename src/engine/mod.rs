mod core;
mod shared;

pub use self::core::PredictionEngine;
pub use shared::{EngineStatus, SharedEngine};
