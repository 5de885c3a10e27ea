use std::collections::HashMap;

use blake3::Hash;

use crate::constraint::ConstraintSet;
use crate::error::{LayoutError, Result};
use crate::geometry::{Rect, Size};
use crate::layout::LayoutResult;

pub type ComponentId = String;

/// Events forwarded to every registered widget.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentEvent {
    /// The terminal surface changed size.
    Resized(Size),
    /// Focus moved to the named component, or nowhere.
    FocusChanged(Option<ComponentId>),
    /// Free-form message from the surrounding application.
    Message { kind: String, payload: String },
}

/// Capability every adapted widget implements so solved geometry can be
/// pushed into it.
pub trait Widget: Send + Sync {
    fn set_size(&mut self, width: u16, height: u16);

    fn render(&self) -> String;

    /// React to a broadcast event. Returns `true` when the widget's rendered
    /// output may have changed.
    fn update(&mut self, _event: &ComponentEvent) -> bool {
        false
    }
}

/// A named component and its last solved geometry.
pub struct Component {
    id: ComponentId,
    constraints: ConstraintSet,
    content: String,
    hash: Option<Hash>,
    rect: Rect,
    is_dirty: bool,
    widget: Option<Box<dyn Widget>>,
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("constraints", &self.constraints)
            .field("rect", &self.rect)
            .field("is_dirty", &self.is_dirty)
            .field("has_widget", &self.widget.is_some())
            .finish()
    }
}

impl Component {
    fn new(id: ComponentId, constraints: ConstraintSet) -> Self {
        Self {
            id,
            constraints,
            content: String::new(),
            hash: None,
            rect: Rect::default(),
            is_dirty: true,
            widget: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn size(&self) -> Size {
        self.rect.size()
    }

    pub fn position(&self) -> (i32, i32) {
        (self.rect.x, self.rect.y)
    }

    /// Area left for content once padding is removed.
    pub fn content_rect(&self) -> Rect {
        self.rect.inset(&self.constraints.padding())
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn has_widget(&self) -> bool {
        self.widget.is_some()
    }

    fn set_content(&mut self, content: String) -> bool {
        let new_hash = blake3::hash(content.as_bytes());
        if self.hash.map(|h| h != new_hash).unwrap_or(true) {
            self.content = content;
            self.hash = Some(new_hash);
            self.is_dirty = true;
            return true;
        }
        false
    }

    fn apply_rect(&mut self, rect: Rect) -> bool {
        if self.rect == rect {
            return false;
        }
        self.rect = rect;
        self.is_dirty = true;
        if let Some(widget) = self.widget.as_mut() {
            widget.set_size(rect.width, rect.height);
        }
        true
    }

    /// Pull fresh output from the widget into the content cache.
    fn refresh_widget(&mut self) -> bool {
        match self.widget.as_ref().map(|w| w.render()) {
            Some(rendered) => self.set_content(rendered),
            None => false,
        }
    }
}

/// Ordered collection of components keyed by unique id.
///
/// Registration order is the default sequential layout order.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<Component>,
    index: HashMap<ComponentId, usize>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<ComponentId>, constraints: ConstraintSet) -> Result<()> {
        self.insert(Component::new(id.into(), constraints))
    }

    pub fn register_widget<W>(
        &mut self,
        id: impl Into<ComponentId>,
        constraints: ConstraintSet,
        widget: W,
    ) -> Result<()>
    where
        W: Widget + 'static,
    {
        let mut component = Component::new(id.into(), constraints);
        component.widget = Some(Box::new(widget));
        component.refresh_widget();
        self.insert(component)
    }

    fn insert(&mut self, component: Component) -> Result<()> {
        if self.index.contains_key(&component.id) {
            return Err(LayoutError::DuplicateComponent(component.id));
        }
        self.index
            .insert(component.id.clone(), self.components.len());
        self.components.push(component);
        Ok(())
    }

    pub fn unregister(&mut self, id: &str) -> Result<Component> {
        let position = self
            .index
            .remove(id)
            .ok_or_else(|| LayoutError::ComponentNotFound(id.to_string()))?;
        let removed = self.components.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.index.get(id).map(|&idx| &self.components[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Registration position of `id`.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Component> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| LayoutError::ComponentNotFound(id.to_string()))?;
        Ok(&mut self.components[idx])
    }

    pub fn update_constraints(&mut self, id: &str, constraints: ConstraintSet) -> Result<()> {
        let component = self.get_mut(id)?;
        component.constraints = constraints;
        component.is_dirty = true;
        Ok(())
    }

    /// Replace the content cache. Returns `true` if the content changed.
    pub fn set_content(&mut self, id: &str, content: impl Into<String>) -> Result<bool> {
        Ok(self.get_mut(id)?.set_content(content.into()))
    }

    /// Copy solved rectangles onto their components. Returns the ids whose
    /// geometry changed.
    pub fn apply_layout(&mut self, result: &LayoutResult) -> Vec<ComponentId> {
        let mut changed = Vec::new();
        for component in &mut self.components {
            if let Some(rect) = result.rect(&component.id) {
                if component.apply_rect(rect) {
                    changed.push(component.id.clone());
                }
            }
        }
        changed
    }

    /// Re-render every widget-backed component into its content cache.
    pub fn refresh_widgets(&mut self) -> usize {
        self.components
            .iter_mut()
            .filter(|c| c.widget.is_some())
            .map(|c| c.refresh_widget())
            .filter(|changed| *changed)
            .count()
    }

    /// Forward `event` to every widget, returning the ids that reported a
    /// change.
    pub fn broadcast(&mut self, event: &ComponentEvent) -> Vec<ComponentId> {
        let mut changed = Vec::new();
        for component in &mut self.components {
            let Some(widget) = component.widget.as_mut() else {
                continue;
            };
            if widget.update(event) {
                component.refresh_widget();
                component.is_dirty = true;
                changed.push(component.id.clone());
            }
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn dirty_ids(&self) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|c| c.is_dirty)
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn has_dirty(&self) -> bool {
        self.components.iter().any(|c| c.is_dirty)
    }

    /// Clear every dirty flag, returning the ids that were dirty.
    pub fn take_dirty(&mut self) -> Vec<ComponentId> {
        let mut ids = Vec::new();
        for component in &mut self.components {
            if component.is_dirty {
                component.is_dirty = false;
                ids.push(component.id.clone());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, SizeValue};
    use crate::layout::LayoutResult;
    use std::collections::BTreeMap;

    struct Label {
        text: String,
        size: Size,
    }

    impl Widget for Label {
        fn set_size(&mut self, width: u16, height: u16) {
            self.size = Size::new(width, height);
        }

        fn render(&self) -> String {
            format!("{} {}x{}", self.text, self.size.width, self.size.height)
        }

        fn update(&mut self, event: &ComponentEvent) -> bool {
            match event {
                ComponentEvent::Message { kind, payload } if kind == "rename" => {
                    self.text = payload.clone();
                    true
                }
                _ => false,
            }
        }
    }

    fn label(text: &str) -> Label {
        Label {
            text: text.to_string(),
            size: Size::new(0, 0),
        }
    }

    fn result_with(entries: &[(&str, Rect)]) -> LayoutResult {
        let components: BTreeMap<String, Rect> = entries
            .iter()
            .map(|(id, rect)| (id.to_string(), *rect))
            .collect();
        LayoutResult::new(Size::new(80, 24), components, Vec::new())
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = ComponentRegistry::new();
        registry.register("header", ConstraintSet::new()).unwrap();
        let err = registry.register("header", ConstraintSet::new()).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateComponent(id) if id == "header"));
    }

    #[test]
    fn unregister_keeps_order_of_remaining() {
        let mut registry = ComponentRegistry::new();
        for id in ["a", "b", "c", "d"] {
            registry.register(id, ConstraintSet::new()).unwrap();
        }
        registry.unregister("b").unwrap();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["a", "c", "d"]);
        assert_eq!(registry.position_of("d"), Some(2));
        assert!(matches!(
            registry.unregister("b"),
            Err(LayoutError::ComponentNotFound(_))
        ));
    }

    #[test]
    fn set_content_detects_changes() {
        let mut registry = ComponentRegistry::new();
        registry.register("body", ConstraintSet::new()).unwrap();
        registry.take_dirty();

        assert!(registry.set_content("body", "hello").unwrap());
        assert_eq!(registry.take_dirty(), vec!["body".to_string()]);

        assert!(!registry.set_content("body", "hello").unwrap());
        assert!(registry.take_dirty().is_empty());
    }

    #[test]
    fn apply_layout_marks_only_moved_components() {
        let mut registry = ComponentRegistry::new();
        registry.register("a", ConstraintSet::new()).unwrap();
        registry.register("b", ConstraintSet::new()).unwrap();

        let first = result_with(&[("a", Rect::new(0, 0, 80, 4)), ("b", Rect::new(0, 5, 80, 4))]);
        registry.apply_layout(&first);
        registry.take_dirty();

        let second = result_with(&[("a", Rect::new(0, 0, 80, 4)), ("b", Rect::new(0, 6, 80, 4))]);
        let changed = registry.apply_layout(&second);
        assert_eq!(changed, vec!["b".to_string()]);
        assert_eq!(registry.get("b").unwrap().position(), (0, 6));
        assert_eq!(registry.dirty_ids(), vec!["b".to_string()]);
    }

    #[test]
    fn widgets_receive_sizes_and_events() {
        let mut registry = ComponentRegistry::new();
        registry
            .register_widget(
                "status",
                ConstraintSet::new().with(Constraint::height(SizeValue::Fixed(1))),
                label("ok"),
            )
            .unwrap();
        registry.register("plain", ConstraintSet::new()).unwrap();

        registry.apply_layout(&result_with(&[("status", Rect::new(0, 23, 80, 1))]));
        registry.refresh_widgets();
        assert_eq!(registry.get("status").unwrap().content(), "ok 80x1");

        let changed = registry.broadcast(&ComponentEvent::Message {
            kind: "rename".into(),
            payload: "saved".into(),
        });
        assert_eq!(changed, vec!["status".to_string()]);
        assert_eq!(registry.get("status").unwrap().content(), "saved 80x1");

        let unchanged = registry.broadcast(&ComponentEvent::Resized(Size::new(10, 10)));
        assert!(unchanged.is_empty());
    }

    #[test]
    fn update_constraints_requires_existing_component() {
        let mut registry = ComponentRegistry::new();
        let err = registry
            .update_constraints("ghost", ConstraintSet::new())
            .unwrap_err();
        assert!(matches!(err, LayoutError::ComponentNotFound(id) if id == "ghost"));
    }
}
