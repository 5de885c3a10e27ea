use std::time::Instant;

use serde::Serialize;
use serde_json::json;

use crate::constraint::ConstraintSet;
use crate::error::{LayoutError, Result};
use crate::geometry::Size;
use crate::layout::{LayoutCalculator, LayoutResult};
use crate::logging::{LogLevel, event_with_fields, json_kv};
use crate::metrics::{LayoutMetrics, MetricSnapshot};
use crate::registry::{Component, ComponentEvent, ComponentId, ComponentRegistry, Widget};

use super::compose::{compose_frame, stack_contents};
use super::config::EngineConfig;

const LOG_TARGET: &str = "permroom::engine";

/// Lifecycle of an engine's cached layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No terminal size has been supplied yet.
    Uninitialized,
    /// The cached result matches the current components and terminal.
    Clean,
    /// Something changed since the last successful calculation.
    Dirty,
}

/// Owns the component registry and calculator and keeps the last solved
/// layout around for rendering.
pub struct LayoutEngine {
    config: EngineConfig,
    calculator: LayoutCalculator,
    registry: ComponentRegistry,
    terminal: Option<Size>,
    cached: Option<LayoutResult>,
    dirty: bool,
    created_at: Instant,
}

impl LayoutEngine {
    pub fn new(config: EngineConfig) -> Self {
        let calculator = LayoutCalculator::new(config.spacing, config.default_height);
        Self {
            config,
            calculator,
            registry: ComponentRegistry::new(),
            terminal: None,
            cached: None,
            dirty: true,
            created_at: Instant::now(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        match (self.terminal, self.dirty) {
            (None, _) => EngineState::Uninitialized,
            (Some(_), true) => EngineState::Dirty,
            (Some(_), false) => EngineState::Clean,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn terminal(&self) -> Option<Size> {
        self.terminal
    }

    /// Last successful calculation, possibly stale if the engine is dirty.
    pub fn result(&self) -> Option<&LayoutResult> {
        self.cached.as_ref()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.registry.get(id)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.registry.iter()
    }

    pub fn add_component(
        &mut self,
        id: impl Into<ComponentId>,
        constraints: ConstraintSet,
    ) -> Result<()> {
        let id = id.into();
        validate(&id, &constraints)?;
        self.registry.register(id.clone(), constraints)?;
        self.after_mutation("component_added", &id)
    }

    /// Register a component whose content comes from a [`Widget`].
    pub fn add_widget<W>(
        &mut self,
        id: impl Into<ComponentId>,
        constraints: ConstraintSet,
        widget: W,
    ) -> Result<()>
    where
        W: Widget + 'static,
    {
        let id = id.into();
        validate(&id, &constraints)?;
        self.registry.register_widget(id.clone(), constraints, widget)?;
        self.after_mutation("component_added", &id)
    }

    /// Unregister `id` and hand the component back.
    ///
    /// The removal is always applied. With `auto_recalculate` on, a failed
    /// recalculation (for example another component still positioned
    /// relative to `id`) is returned as the error and the removed component
    /// is dropped. The engine then stays dirty with the previous result cached.
    pub fn remove_component(&mut self, id: &str) -> Result<Component> {
        let removed = self.registry.unregister(id)?;
        self.after_mutation("component_removed", id)?;
        Ok(removed)
    }

    pub fn update_constraints(&mut self, id: &str, constraints: ConstraintSet) -> Result<()> {
        validate(id, &constraints)?;
        self.registry.update_constraints(id, constraints)?;
        self.after_mutation("constraints_updated", id)
    }

    /// Replace a component's rendered content. Geometry is unaffected.
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> Result<bool> {
        self.registry.set_content(id, content)
    }

    /// Forward an external event to every widget-backed component.
    pub fn broadcast(&mut self, event: &ComponentEvent) -> Vec<ComponentId> {
        self.registry.broadcast(event)
    }

    /// Apply a new terminal size. Returns `Ok(false)` when nothing changed.
    pub fn handle_resize(&mut self, size: Size) -> Result<bool> {
        if self.terminal == Some(size) {
            return Ok(false);
        }
        self.terminal = Some(size);
        self.dirty = true;
        self.with_metrics(LayoutMetrics::record_resize_applied);
        self.log(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        self.registry.broadcast(&ComponentEvent::Resized(size));
        self.recalculate()?;
        Ok(true)
    }

    /// Solve the layout and push the rectangles onto the components.
    ///
    /// On failure the engine stays dirty and the previous result remains
    /// available for rendering.
    pub fn recalculate(&mut self) -> Result<&LayoutResult> {
        match self.solve() {
            Ok(result) => {
                let moved = self.registry.apply_layout(&result);
                let warnings = result.warning_messages();
                self.with_metrics(|m| m.record_recalculation(warnings.len()));
                self.log(
                    LogLevel::Debug,
                    "recalculated",
                    [
                        json_kv("components", json!(result.components().len())),
                        json_kv("moved", json!(moved.len())),
                        json_kv("warnings", json!(warnings.len())),
                    ],
                );
                for warning in warnings {
                    self.log(
                        LogLevel::Warn,
                        "layout_warning",
                        [json_kv("warning", json!(warning))],
                    );
                }
                self.dirty = false;
                Ok(self.cached.insert(result))
            }
            Err(err) => {
                self.with_metrics(LayoutMetrics::record_failure);
                self.log(
                    LogLevel::Error,
                    "recalculation_failed",
                    [json_kv("error", json!(err.to_string()))],
                );
                Err(err)
            }
        }
    }

    fn solve(&self) -> Result<LayoutResult> {
        let terminal = self.terminal.ok_or(LayoutError::TerminalUnknown)?;
        if !self.config.min_size.fits_within(terminal) {
            return Err(LayoutError::TerminalTooSmall {
                size: terminal,
                min: self.config.min_size,
            });
        }

        let mut inputs = Vec::with_capacity(self.registry.len());
        for component in self.registry.iter() {
            validate(component.id(), component.constraints())?;
            inputs.push((component.id(), component.constraints()));
        }
        self.calculator.calculate(terminal, &inputs)
    }

    /// Compose the full frame.
    ///
    /// A dirty engine recalculates first; if that fails the stale layout is
    /// used. Before any successful calculation the component contents are
    /// simply stacked.
    pub fn view(&mut self) -> String {
        if self.dirty && self.terminal.is_some() {
            // Failures are logged by `recalculate`; fall through to the
            // cached result.
            let _ = self.recalculate();
        }
        self.registry.refresh_widgets();

        let frame = match self.cached.as_ref() {
            Some(result) => compose_frame(result, self.registry.iter()),
            None => stack_contents(self.registry.iter()),
        };
        self.with_metrics(LayoutMetrics::record_frame);
        frame
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        let guard = metrics.lock().ok()?;
        Some(guard.snapshot(self.created_at.elapsed()))
    }

    fn after_mutation(&mut self, message: &str, id: &str) -> Result<()> {
        self.dirty = true;
        self.log(LogLevel::Debug, message, [json_kv("component", json!(id))]);
        if self.config.auto_recalculate && self.terminal.is_some() {
            self.recalculate()?;
        }
        Ok(())
    }

    fn with_metrics(&self, update: impl FnOnce(&mut LayoutMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut *guard);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

fn validate(id: &str, constraints: &ConstraintSet) -> Result<()> {
    constraints
        .validate()
        .map_err(|source| LayoutError::InvalidConstraint {
            component: id.to_string(),
            source,
        })
}
