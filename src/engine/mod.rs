//! Layout engine orchestration: registry + calculator + cached result.

mod compose;
mod config;
mod core;

pub use config::{DEFAULT_MIN_SIZE, EngineConfig};
pub use core::{EngineState, LayoutEngine};
