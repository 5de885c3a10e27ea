use serde::Serialize;
use thiserror::Error;

/// Errors raised when a single constraint is malformed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintError {
    #[error("flex weight must be non-negative, got {0}")]
    NegativeWeight(f64),
    #[error("flex weight must be finite")]
    NonFiniteWeight,
    #[error("relationship constraint has an empty target id")]
    EmptyTarget,
    #[error("minimum {axis} {min} exceeds maximum {max}")]
    MinExceedsMax { axis: Axis, min: u16, max: u16 },
}

/// Dimension a size constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Width,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

/// Either an absolute cell count or a proportional share of leftover space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SizeValue {
    Fixed(u16),
    Flex(f64),
}

impl SizeValue {
    /// Resolve against `available` cells.
    ///
    /// Flex values need the weights of their siblings, so they resolve to
    /// `None` here and are finished by the calculator.
    pub fn calculate(&self, _available: u16) -> Option<u16> {
        match self {
            SizeValue::Fixed(cells) => Some(*cells),
            SizeValue::Flex(_) => None,
        }
    }

    pub fn is_flex(&self) -> bool {
        matches!(self, SizeValue::Flex(_))
    }

    pub fn validate(&self) -> Result<(), ConstraintError> {
        match *self {
            SizeValue::Fixed(_) => Ok(()),
            SizeValue::Flex(weight) if !weight.is_finite() => Err(ConstraintError::NonFiniteWeight),
            SizeValue::Flex(weight) if weight < 0.0 => Err(ConstraintError::NegativeWeight(weight)),
            SizeValue::Flex(_) => Ok(()),
        }
    }
}

/// Which size rule a [`SizeValue`] feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizeKind {
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
}

impl SizeKind {
    pub fn axis(&self) -> Axis {
        match self {
            SizeKind::Width | SizeKind::MinWidth | SizeKind::MaxWidth => Axis::Width,
            SizeKind::Height | SizeKind::MinHeight | SizeKind::MaxHeight => Axis::Height,
        }
    }
}

/// The nine fixed reference points a component can be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Anchor {
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Anchor {
    /// Bottom-row anchors reserve their rows from the sequential flow.
    pub fn is_bottom(&self) -> bool {
        matches!(self, Anchor::BottomLeft | Anchor::Bottom | Anchor::BottomRight)
    }
}

/// Four-sided spacing in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Spacing {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Spacing {
    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(value: u16) -> Self {
        Self::new(value, value, value, value)
    }

    pub const fn symmetric(vertical: u16, horizontal: u16) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn vertical(&self) -> u16 {
        self.top.saturating_add(self.bottom)
    }

    pub fn horizontal(&self) -> u16 {
        self.left.saturating_add(self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpacingKind {
    Margin,
    Padding,
}

/// Placement relative to another named component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Relationship {
    Above { target: String, offset: u16 },
    Below { target: String, offset: u16 },
    LeftOf { target: String, offset: u16 },
    RightOf { target: String, offset: u16 },
}

impl Relationship {
    pub fn target(&self) -> &str {
        match self {
            Relationship::Above { target, .. }
            | Relationship::Below { target, .. }
            | Relationship::LeftOf { target, .. }
            | Relationship::RightOf { target, .. } => target,
        }
    }

    pub fn offset(&self) -> u16 {
        match self {
            Relationship::Above { offset, .. }
            | Relationship::Below { offset, .. }
            | Relationship::LeftOf { offset, .. }
            | Relationship::RightOf { offset, .. } => *offset,
        }
    }

    /// `true` when the target has to be placed before the owner.
    ///
    /// `Below`/`RightOf` hang the owner off its target. `Above`/`LeftOf`
    /// invert that: the owner goes first and the target follows it.
    pub fn target_first(&self) -> bool {
        matches!(
            self,
            Relationship::Below { .. } | Relationship::RightOf { .. }
        )
    }

    pub fn validate(&self) -> Result<(), ConstraintError> {
        if self.target().trim().is_empty() {
            return Err(ConstraintError::EmptyTarget);
        }
        Ok(())
    }
}

/// A single declarative layout rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constraint {
    Size(SizeKind, SizeValue),
    Anchor(Anchor),
    Spacing(SpacingKind, Spacing),
    Relationship(Relationship),
}

impl Constraint {
    pub fn width(value: SizeValue) -> Self {
        Constraint::Size(SizeKind::Width, value)
    }

    pub fn height(value: SizeValue) -> Self {
        Constraint::Size(SizeKind::Height, value)
    }

    pub fn min_width(value: u16) -> Self {
        Constraint::Size(SizeKind::MinWidth, SizeValue::Fixed(value))
    }

    pub fn min_height(value: u16) -> Self {
        Constraint::Size(SizeKind::MinHeight, SizeValue::Fixed(value))
    }

    pub fn max_width(value: u16) -> Self {
        Constraint::Size(SizeKind::MaxWidth, SizeValue::Fixed(value))
    }

    pub fn max_height(value: u16) -> Self {
        Constraint::Size(SizeKind::MaxHeight, SizeValue::Fixed(value))
    }

    pub fn margin(spacing: Spacing) -> Self {
        Constraint::Spacing(SpacingKind::Margin, spacing)
    }

    pub fn padding(spacing: Spacing) -> Self {
        Constraint::Spacing(SpacingKind::Padding, spacing)
    }

    pub fn above(target: impl Into<String>, offset: u16) -> Self {
        Constraint::Relationship(Relationship::Above {
            target: target.into(),
            offset,
        })
    }

    pub fn below(target: impl Into<String>, offset: u16) -> Self {
        Constraint::Relationship(Relationship::Below {
            target: target.into(),
            offset,
        })
    }

    pub fn left_of(target: impl Into<String>, offset: u16) -> Self {
        Constraint::Relationship(Relationship::LeftOf {
            target: target.into(),
            offset,
        })
    }

    pub fn right_of(target: impl Into<String>, offset: u16) -> Self {
        Constraint::Relationship(Relationship::RightOf {
            target: target.into(),
            offset,
        })
    }

    pub fn validate(&self) -> Result<(), ConstraintError> {
        match self {
            Constraint::Size(_, value) => value.validate(),
            Constraint::Relationship(rel) => rel.validate(),
            // Spacing sides and anchors are unsigned / closed sets.
            Constraint::Spacing(..) | Constraint::Anchor(_) => Ok(()),
        }
    }
}

/// Unordered bag of constraints attached to one component.
///
/// Several rules of the same category may be stored; lookups return the
/// first one that was added.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn add(&mut self, constraint: Constraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn size(&self, kind: SizeKind) -> Option<SizeValue> {
        self.sizes(kind).next()
    }

    /// Every rule of the given kind, in insertion order.
    pub fn sizes(&self, kind: SizeKind) -> impl Iterator<Item = SizeValue> + '_ {
        self.constraints.iter().filter_map(move |c| match c {
            Constraint::Size(k, value) if *k == kind => Some(*value),
            _ => None,
        })
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Anchor(anchor) => Some(*anchor),
            _ => None,
        })
    }

    pub fn margin(&self) -> Spacing {
        self.spacing(SpacingKind::Margin).unwrap_or_default()
    }

    pub fn padding(&self) -> Spacing {
        self.spacing(SpacingKind::Padding).unwrap_or_default()
    }

    fn spacing(&self, kind: SpacingKind) -> Option<Spacing> {
        self.constraints.iter().find_map(|c| match c {
            Constraint::Spacing(k, spacing) if *k == kind => Some(*spacing),
            _ => None,
        })
    }

    /// The relationship the solver acts on.
    pub fn relationship(&self) -> Option<&Relationship> {
        self.relationships().next()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::Relationship(rel) => Some(rel),
            _ => None,
        })
    }

    /// Check each constraint plus the cross-rule min/max bounds.
    ///
    /// Target existence is not checked here because the set does not know
    /// which components are registered.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        for constraint in &self.constraints {
            constraint.validate()?;
        }
        check_bounds(self, SizeKind::MinWidth, SizeKind::MaxWidth, Axis::Width)?;
        check_bounds(self, SizeKind::MinHeight, SizeKind::MaxHeight, Axis::Height)?;
        Ok(())
    }

    /// Clamp a resolved length to the first min/max bounds for `axis`.
    pub fn clamp(&self, axis: Axis, value: u16) -> u16 {
        let (min_kind, max_kind) = match axis {
            Axis::Width => (SizeKind::MinWidth, SizeKind::MaxWidth),
            Axis::Height => (SizeKind::MinHeight, SizeKind::MaxHeight),
        };
        let mut value = value;
        if let Some(SizeValue::Fixed(max)) = self.size(max_kind) {
            value = value.min(max);
        }
        if let Some(SizeValue::Fixed(min)) = self.size(min_kind) {
            value = value.max(min);
        }
        value
    }

    pub fn min_bound(&self, axis: Axis) -> u16 {
        let kind = match axis {
            Axis::Width => SizeKind::MinWidth,
            Axis::Height => SizeKind::MinHeight,
        };
        match self.size(kind) {
            Some(SizeValue::Fixed(min)) => min,
            _ => 0,
        }
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<T: IntoIterator<Item = Constraint>>(iter: T) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

fn check_bounds(
    set: &ConstraintSet,
    min_kind: SizeKind,
    max_kind: SizeKind,
    axis: Axis,
) -> Result<(), ConstraintError> {
    if let (Some(SizeValue::Fixed(min)), Some(SizeValue::Fixed(max))) =
        (set.size(min_kind), set.size(max_kind))
    {
        if min > max {
            return Err(ConstraintError::MinExceedsMax { axis, min, max });
        }
    }
    Ok(())
}
