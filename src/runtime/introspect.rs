//! Read-only diagnostic view of an engine, serialisable to JSON.

use serde::Serialize;

use crate::constraint::ConstraintSet;
use crate::engine::{EngineState, LayoutEngine};
use crate::geometry::{Rect, Size};
use crate::layout::LayoutResult;
use crate::metrics::MetricSnapshot;
use crate::registry::Component;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentSnapshot {
    pub id: String,
    pub rect: Rect,
    pub dirty: bool,
    pub content_lines: usize,
    pub has_widget: bool,
    pub constraints: ConstraintSet,
}

impl ComponentSnapshot {
    fn capture(component: &Component) -> Self {
        Self {
            id: component.id().to_string(),
            rect: component.rect(),
            dirty: component.is_dirty(),
            content_lines: component.content().lines().count(),
            has_widget: component.has_widget(),
            constraints: component.constraints().clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub terminal: Option<Size>,
    pub components: Vec<ComponentSnapshot>,
    pub layout: Option<LayoutResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricSnapshot>,
}

impl EngineSnapshot {
    /// Copy out everything a diagnostics consumer needs. Never mutates.
    pub fn capture(engine: &LayoutEngine) -> Self {
        Self {
            state: engine.state(),
            terminal: engine.terminal(),
            components: engine.components().map(ComponentSnapshot::capture).collect(),
            layout: engine.result().cloned(),
            metrics: engine.metrics_snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, SizeValue};
    use crate::engine::EngineConfig;

    #[test]
    fn snapshot_serializes_layout_and_components() {
        let mut engine = LayoutEngine::new(EngineConfig::default());
        engine
            .add_component(
                "footer",
                ConstraintSet::new()
                    .with(Constraint::height(SizeValue::Fixed(40)))
                    .with(Constraint::width(SizeValue::Fixed(10))),
            )
            .unwrap();
        engine.set_content("footer", "one\ntwo").unwrap();
        engine.handle_resize(Size::new(80, 24)).unwrap();

        let snapshot = EngineSnapshot::capture(&engine);
        assert_eq!(snapshot.state, EngineState::Clean);
        assert_eq!(snapshot.components[0].content_lines, 2);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["layout"]["terminal_width"], 80);
        assert_eq!(value["layout"]["components"]["footer"]["width"], 10);
        assert!(value["layout"]["warnings"][0]
            .as_str()
            .unwrap()
            .starts_with("overflow"));
        assert!(value.get("metrics").is_none());
    }
}
