use serde::Serialize;

use crate::constraint::Spacing;

/// Integer size measured in terminal character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn fits_within(&self, other: Size) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

/// Rectangle placed on the terminal surface.
///
/// The origin is signed: relative placement and anchoring of oversized
/// components can legitimately land left of or above the screen, and the
/// calculator reports that as a bounds warning instead of wrapping around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.y + i32::from(self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + i32::from(self.width)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Shrink the rectangle by the given spacing on every side.
    pub fn inset(&self, spacing: &Spacing) -> Rect {
        let horizontal = spacing.left.saturating_add(spacing.right);
        let vertical = spacing.top.saturating_add(spacing.bottom);
        Rect {
            x: self.x + i32::from(spacing.left),
            y: self.y + i32::from(spacing.top),
            width: self.width.saturating_sub(horizontal),
            height: self.height.saturating_sub(vertical),
        }
    }

    /// Edges of `bounds` this rectangle crosses, in top/right/bottom/left order.
    pub fn overflowed_edges(&self, bounds: Size) -> Vec<Edge> {
        let mut edges = Vec::new();
        if self.y < 0 {
            edges.push(Edge::Top);
        }
        if self.right() > i32::from(bounds.width) {
            edges.push(Edge::Right);
        }
        if self.bottom() > i32::from(bounds.height) {
            edges.push(Edge::Bottom);
        }
        if self.x < 0 {
            edges.push(Edge::Left);
        }
        edges
    }
}

/// Terminal edge names used in bounds warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
            Edge::Left => "left",
        };
        f.write_str(name)
    }
}
