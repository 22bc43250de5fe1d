//! Windowed velocity engine: per-key counts over a trailing time window.

mod velocity;
mod window;

pub use velocity::{EngineStats, VelocityEngine};
pub use window::EngineState;
