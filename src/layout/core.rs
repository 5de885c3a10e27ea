use std::collections::{BTreeMap, HashMap};

use crate::constraint::{Anchor, Axis, ConstraintSet, Relationship, SizeKind, SizeValue, Spacing};
use crate::error::{LayoutError, Result};
use crate::geometry::{Rect, Size};

use super::graph::DependencyGraph;
use super::result::{LayoutResult, LayoutWarning};

pub const DEFAULT_SPACING: u16 = 1;
pub const DEFAULT_HEIGHT: u16 = 10;

/// Pure solver from terminal size plus ordered components to rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutCalculator {
    spacing: u16,
    default_height: u16,
}

impl Default for LayoutCalculator {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            default_height: DEFAULT_HEIGHT,
        }
    }
}

impl LayoutCalculator {
    pub fn new(spacing: u16, default_height: u16) -> Self {
        Self {
            spacing,
            default_height,
        }
    }

    pub fn spacing(&self) -> u16 {
        self.spacing
    }

    pub fn default_height(&self) -> u16 {
        self.default_height
    }

    /// Solve the layout for `components`, given in registration order.
    ///
    /// Fails on unknown relationship targets and on cycles; everything else
    /// is reported through the result's warnings.
    pub fn calculate(
        &self,
        terminal: Size,
        components: &[(&str, &ConstraintSet)],
    ) -> Result<LayoutResult> {
        let graph = DependencyGraph::build(components)?;
        let order = graph
            .topological_order()
            .map_err(|stuck| LayoutError::CircularDependency {
                components: stuck
                    .into_iter()
                    .map(|idx| components[idx].0.to_string())
                    .collect(),
            })?;

        let (anchored, sequential): (Vec<usize>, Vec<usize>) = order
            .into_iter()
            .partition(|idx| components[*idx].1.anchor().is_some());

        let mut warnings = Vec::new();
        let mut rects = BTreeMap::new();
        let spacing = i32::from(self.spacing);

        let mut reserved_bottom: u16 = 0;
        for idx in anchored {
            let (id, set) = components[idx];
            let Some(anchor) = set.anchor() else {
                continue;
            };
            let margin = set.margin();
            let width = self.resolve_width(terminal, set);
            let height = self.resolve_anchored_height(terminal, set);
            if anchor.is_bottom() {
                reserved_bottom = reserved_bottom.max(height.saturating_add(margin.vertical()));
            }
            let rect = anchor_rect(anchor, terminal, width, height, &margin);
            record(id, rect, terminal, &mut rects, &mut warnings);
        }

        let flow: Vec<(&str, &ConstraintSet)> =
            sequential.into_iter().map(|idx| components[idx]).collect();
        let available = terminal.height.saturating_sub(reserved_bottom);
        let heights = self.solve_heights(available, &flow, &mut warnings);
        let leaders = leaders(components);

        let mut running_y: i32 = 0;
        for (&(id, set), height) in flow.iter().zip(heights) {
            let margin = set.margin();
            let width = self.resolve_width(terminal, set);

            let hanging = set
                .relationship()
                .filter(|rel| rel.target_first())
                .and_then(|rel| {
                    rects
                        .get(rel.target())
                        .map(|target| relative_origin(rel, *target, spacing))
                });
            let trailing = || {
                leaders.get(id).and_then(|(leader, rel)| {
                    rects
                        .get(*leader)
                        .map(|reference| relative_origin(rel, *reference, spacing))
                })
            };
            let (x, y) = hanging.or_else(trailing).unwrap_or((
                i32::from(margin.left),
                running_y + i32::from(margin.top),
            ));

            let rect = Rect::new(x, y, width, height);
            running_y = running_y.max(rect.bottom() + i32::from(margin.bottom) + spacing);
            record(id, rect, terminal, &mut rects, &mut warnings);
        }

        Ok(LayoutResult::new(terminal, rects, warnings))
    }

    /// Width never shares space with siblings: fixed cells, otherwise the
    /// full terminal width inside the margin.
    fn resolve_width(&self, terminal: Size, set: &ConstraintSet) -> u16 {
        let full = terminal.width.saturating_sub(set.margin().horizontal());
        let width = set
            .size(SizeKind::Width)
            .and_then(|value| value.calculate(full))
            .unwrap_or(full);
        set.clamp(Axis::Width, width)
    }

    fn resolve_anchored_height(&self, terminal: Size, set: &ConstraintSet) -> u16 {
        let full = terminal.height.saturating_sub(set.margin().vertical());
        let height = match set.size(SizeKind::Height) {
            Some(value) => value.calculate(full).unwrap_or(full),
            None => self.default_height,
        };
        set.clamp(Axis::Height, height)
    }

    /// Two-pass height resolution for the sequential flow.
    fn solve_heights(
        &self,
        available: u16,
        flow: &[(&str, &ConstraintSet)],
        warnings: &mut Vec<LayoutWarning>,
    ) -> Vec<u16> {
        let mut heights = vec![0u16; flow.len()];
        let mut floors = vec![0u16; flow.len()];
        let mut fixed = vec![false; flow.len()];
        let mut flex: Vec<(usize, f64)> = Vec::new();
        let mut margins: u32 = 0;

        for (pos, (_, set)) in flow.iter().enumerate() {
            margins += u32::from(set.margin().vertical());
            floors[pos] = set.min_bound(Axis::Height);
            match set.size(SizeKind::Height) {
                Some(SizeValue::Flex(weight)) => flex.push((pos, weight)),
                Some(SizeValue::Fixed(cells)) => {
                    heights[pos] = set.clamp(Axis::Height, cells);
                    fixed[pos] = true;
                }
                None => {
                    heights[pos] = set.clamp(Axis::Height, self.default_height);
                    fixed[pos] = true;
                }
            }
        }

        let spacing_used = u32::from(self.spacing) * flow.len().saturating_sub(1) as u32;
        let fixed_used = |heights: &[u16]| -> u32 {
            heights.iter().map(|h| u32::from(*h)).sum::<u32>() + margins + spacing_used
        };

        let required = fixed_used(&heights);
        if required > u32::from(available) {
            warnings.push(LayoutWarning::HeightDeficit {
                required,
                available,
            });
            shrink_fixed(
                &mut heights,
                &floors,
                &fixed,
                required - u32::from(available),
            );
        }

        let remaining = u32::from(available).saturating_sub(fixed_used(&heights)) as u16;
        if flex.is_empty() {
            return heights;
        }
        if remaining == 0 {
            warnings.push(LayoutWarning::FlexStarved {
                components: flex
                    .iter()
                    .map(|(pos, _)| flow[*pos].0.to_string())
                    .collect(),
            });
        }

        let weights: Vec<f64> = flex.iter().map(|(_, weight)| *weight).collect();
        for ((pos, _), share) in flex.iter().zip(distribute_flex(remaining, &weights)) {
            heights[*pos] = flow[*pos].1.clamp(Axis::Height, share);
        }
        heights
    }
}

/// Take `over` rows back from fixed tracks one row at a time, round-robin,
/// never going below a track's floor.
fn shrink_fixed(heights: &mut [u16], floors: &[u16], shrinkable: &[bool], mut over: u32) {
    while over > 0 {
        let mut changed = false;
        for idx in 0..heights.len() {
            if shrinkable[idx] && heights[idx] > floors[idx] {
                heights[idx] -= 1;
                over -= 1;
                changed = true;
                if over == 0 {
                    break;
                }
            }
        }

        if !changed {
            break;
        }
    }
}

/// Split `remaining` proportionally to `weights`, rounded to the nearest
/// cell. Rounding overshoot is taken back from the shares rounded up the
/// most so the total never exceeds `remaining`.
///
/// Weights are scaled by the largest one first so the sum stays finite
/// for any finite input.
fn distribute_flex(remaining: u16, weights: &[f64]) -> Vec<u16> {
    let largest = weights.iter().copied().fold(0.0, f64::max);
    if remaining == 0 || largest <= 0.0 {
        return vec![0; weights.len()];
    }

    let scaled: Vec<f64> = weights.iter().map(|weight| weight / largest).collect();
    let total: f64 = scaled.iter().sum();
    let exact: Vec<f64> = scaled
        .iter()
        .map(|weight| f64::from(remaining) * weight / total)
        .collect();
    let mut shares: Vec<u16> = exact.iter().map(|value| value.round() as u16).collect();

    let mut excess = shares
        .iter()
        .map(|share| u32::from(*share))
        .sum::<u32>()
        .saturating_sub(u32::from(remaining));
    while excess > 0 {
        let Some(idx) = (0..shares.len())
            .filter(|&idx| shares[idx] > 0)
            .max_by(|&a, &b| {
                let over_a = f64::from(shares[a]) - exact[a];
                let over_b = f64::from(shares[b]) - exact[b];
                over_a.total_cmp(&over_b)
            })
        else {
            break;
        };
        shares[idx] -= 1;
        excess -= 1;
    }
    shares
}

/// For every component, the first component declaring `Above`/`LeftOf` it.
fn leaders<'a>(
    components: &[(&'a str, &'a ConstraintSet)],
) -> HashMap<&'a str, (&'a str, &'a Relationship)> {
    let mut leaders = HashMap::new();
    for &(id, set) in components {
        if let Some(rel) = set.relationship().filter(|rel| !rel.target_first()) {
            leaders.entry(rel.target()).or_insert((id, rel));
        }
    }
    leaders
}

/// Origin of the component placed after `reference` under `rel`.
///
/// `Below`/`Above` stack vertically below the reference, `RightOf`/`LeftOf`
/// line up to its right: for the inverted kinds the reference is the
/// declaring component.
fn relative_origin(rel: &Relationship, reference: Rect, spacing: i32) -> (i32, i32) {
    let offset = i32::from(rel.offset());
    match rel {
        Relationship::Below { .. } | Relationship::Above { .. } => {
            (reference.x, reference.bottom() + spacing + offset)
        }
        Relationship::RightOf { .. } | Relationship::LeftOf { .. } => {
            (reference.right() + spacing + offset, reference.y)
        }
    }
}

fn anchor_rect(anchor: Anchor, terminal: Size, width: u16, height: u16, margin: &Spacing) -> Rect {
    let (tw, th) = (i32::from(terminal.width), i32::from(terminal.height));
    let (w, h) = (i32::from(width), i32::from(height));

    let x = match anchor {
        Anchor::TopLeft | Anchor::Left | Anchor::BottomLeft => i32::from(margin.left),
        Anchor::Top | Anchor::Center | Anchor::Bottom => (tw - w) / 2,
        Anchor::TopRight | Anchor::Right | Anchor::BottomRight => tw - w - i32::from(margin.right),
    };
    let y = match anchor {
        Anchor::TopLeft | Anchor::Top | Anchor::TopRight => i32::from(margin.top),
        Anchor::Left | Anchor::Center | Anchor::Right => (th - h) / 2,
        Anchor::BottomLeft | Anchor::Bottom | Anchor::BottomRight => {
            th - h - i32::from(margin.bottom)
        }
    };
    Rect::new(x, y, width, height)
}

fn record(
    id: &str,
    rect: Rect,
    terminal: Size,
    rects: &mut BTreeMap<String, Rect>,
    warnings: &mut Vec<LayoutWarning>,
) {
    let edges = rect.overflowed_edges(terminal);
    if !edges.is_empty() {
        warnings.push(LayoutWarning::OutOfBounds {
            component: id.to_string(),
            rect,
            edges,
        });
    }
    rects.insert(id.to_string(), rect);
}
