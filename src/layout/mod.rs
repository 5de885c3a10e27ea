//! Layout calculator: dependency ordering, two-pass sizing and placement.
//!
//! The engine feeds components in registration order and receives an
//! immutable [`LayoutResult`]; nothing in here touches component state.

mod core;
mod graph;
mod result;

pub use core::{DEFAULT_HEIGHT, DEFAULT_SPACING, LayoutCalculator};
pub use result::{LayoutResult, LayoutWarning};
