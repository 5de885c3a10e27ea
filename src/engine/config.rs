use std::sync::{Arc, Mutex};

use crate::geometry::Size;
use crate::layout::{DEFAULT_HEIGHT, DEFAULT_SPACING};
use crate::logging::Logger;
use crate::metrics::LayoutMetrics;

pub const DEFAULT_MIN_SIZE: Size = Size::new(20, 5);

/// Configuration knobs for a [`super::LayoutEngine`].
#[derive(Clone)]
pub struct EngineConfig {
    /// Terminals smaller than this refuse to recalculate.
    pub min_size: Size,
    /// Rows between consecutive sequential components.
    pub spacing: u16,
    /// Height given to components without a height rule.
    pub default_height: u16,
    /// Recalculate immediately after every component mutation.
    pub auto_recalculate: bool,
    /// Optional structured logger used by the engine.
    pub logger: Option<Logger>,
    /// Shared counters updated on every recalculation and frame.
    pub metrics: Option<Arc<Mutex<LayoutMetrics>>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            spacing: DEFAULT_SPACING,
            default_height: DEFAULT_HEIGHT,
            auto_recalculate: false,
            logger: None,
            metrics: None,
        }
    }
}

impl EngineConfig {
    pub fn with_min_size(mut self, min_size: Size) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_spacing(mut self, spacing: u16) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_default_height(mut self, default_height: u16) -> Self {
        self.default_height = default_height;
        self
    }

    pub fn with_auto_recalculate(mut self, enabled: bool) -> Self {
        self.auto_recalculate = enabled;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(LayoutMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<LayoutMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}
