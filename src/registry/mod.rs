//! Component registry: ordered, uniquely named components and their solved
//! geometry.

mod core;

pub use core::{Component, ComponentEvent, ComponentId, ComponentRegistry, Widget};
