//! Constraint-based terminal layout engine for permission screens.
//!
//! Components are registered with declarative [`Constraint`]s (fixed or
//! flexible heights, anchors, margins and relationships to other
//! components). The [`LayoutEngine`] resolves them against the terminal
//! size into non-negative rectangles, reports overflow as warnings and
//! composes the final frame. [`SharedEngine`] and [`TerminalDriver`] wire
//! the engine to a live terminal.

pub mod constraint;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod runtime;
pub mod width;

pub use constraint::{
    Anchor, Axis, Constraint, ConstraintError, ConstraintSet, Relationship, SizeKind, SizeValue,
    Spacing, SpacingKind,
};
pub use engine::{DEFAULT_MIN_SIZE, EngineConfig, EngineState, LayoutEngine};
pub use error::{LayoutError, Result};
pub use geometry::{Edge, Rect, Size};
pub use layout::{DEFAULT_HEIGHT, DEFAULT_SPACING, LayoutCalculator, LayoutResult, LayoutWarning};
pub use logging::{LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult};
pub use metrics::{LayoutMetrics, MetricSnapshot};
pub use registry::{Component, ComponentEvent, ComponentId, ComponentRegistry, Widget};
pub use runtime::{
    DriverConfig, DriverError, DriverEvent, DriverResult, EngineSnapshot, ResizeDebouncer,
    SharedEngine, SharedStateError, TerminalDriver,
};
pub use width::display_width;
