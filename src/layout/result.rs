use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::geometry::{Edge, Rect, Size};

/// Non-fatal problem found while solving a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutWarning {
    /// A solved rectangle crosses one or more terminal edges.
    OutOfBounds {
        component: String,
        rect: Rect,
        edges: Vec<Edge>,
    },
    /// Fixed heights plus spacing need more rows than the flow has.
    HeightDeficit { required: u32, available: u16 },
    /// Flexible components exist but no rows were left to share.
    FlexStarved { components: Vec<String> },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutWarning::OutOfBounds {
                component,
                rect,
                edges,
            } => {
                let edges = edges
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("/");
                write!(
                    f,
                    "component `{component}` at ({}, {}) size {}x{} extends past the {edges} edge",
                    rect.x, rect.y, rect.width, rect.height
                )
            }
            LayoutWarning::HeightDeficit {
                required,
                available,
            } => write!(
                f,
                "overflow: components exceed terminal height by {} rows (need {required}, have {available})",
                required.saturating_sub(u32::from(*available))
            ),
            LayoutWarning::FlexStarved { components } => write!(
                f,
                "no space remaining for flexible components: {}",
                components.join(", ")
            ),
        }
    }
}

impl Serialize for LayoutWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Immutable snapshot of one layout calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutResult {
    terminal_width: u16,
    terminal_height: u16,
    components: BTreeMap<String, Rect>,
    warnings: Vec<LayoutWarning>,
}

impl LayoutResult {
    pub fn new(
        terminal: Size,
        components: BTreeMap<String, Rect>,
        warnings: Vec<LayoutWarning>,
    ) -> Self {
        Self {
            terminal_width: terminal.width,
            terminal_height: terminal.height,
            components,
            warnings,
        }
    }

    pub fn terminal(&self) -> Size {
        Size::new(self.terminal_width, self.terminal_height)
    }

    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.components.get(id).copied()
    }

    pub fn components(&self) -> &BTreeMap<String, Rect> {
        &self.components
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
