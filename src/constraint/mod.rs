//! Constraint model: typed sizing and positioning rules plus validation.
//!
//! Pure value objects. The calculator in [`crate::layout`] is the only
//! consumer that turns these into geometry.

mod core;

pub use core::{
    Anchor, Axis, Constraint, ConstraintError, ConstraintSet, Relationship, SizeKind, SizeValue,
    Spacing, SpacingKind,
};
