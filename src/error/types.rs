use thiserror::Error;

use crate::constraint::ConstraintError;
use crate::geometry::Size;
use crate::runtime::shared_state::SharedStateError;

/// Unified result type for the permroom crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Fatal errors surfaced by the layout engine.
///
/// Anything recoverable (overflow, exhausted flex space) is reported as a
/// [`crate::layout::LayoutWarning`] instead.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("circular dependency detected in layout constraints: {}", .components.join(", "))]
    CircularDependency { components: Vec<String> },
    #[error("component `{component}` references unknown component `{target}`")]
    UnknownTarget { component: String, target: String },
    #[error(
        "terminal {}x{} is below the minimum {}x{}",
        .size.width, .size.height, .min.width, .min.height
    )]
    TerminalTooSmall { size: Size, min: Size },
    #[error("terminal size is unknown; resize before recalculating")]
    TerminalUnknown,
    #[error("component `{0}` is already registered")]
    DuplicateComponent(String),
    #[error("component `{0}` not found")]
    ComponentNotFound(String),
    #[error("invalid constraint on `{component}`: {source}")]
    InvalidConstraint {
        component: String,
        #[source]
        source: ConstraintError,
    },
    #[error("shared state error: {0}")]
    SharedState(#[from] SharedStateError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    /// Configuration errors that a later mutation can fix, as opposed to I/O
    /// or lock failures.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            LayoutError::SharedState(_) | LayoutError::Serialization(_) | LayoutError::Io(_)
        )
    }
}
