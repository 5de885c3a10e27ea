//! Everything that sits between a live terminal and the layout engine:
//! the shared handle, resize debouncing, diagnostics snapshots and the
//! crossterm driver loop.

pub mod driver;
pub mod introspect;
pub mod resize;
pub mod shared_state;

pub use driver::{DriverConfig, DriverError, DriverEvent, DriverResult, TerminalDriver};
pub use introspect::{ComponentSnapshot, EngineSnapshot};
pub use resize::{DEFAULT_DEBOUNCE, ResizeDebouncer};
pub use shared_state::{SharedEngine, SharedStateError};
