use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::constraint::ConstraintSet;
use crate::engine::LayoutEngine;
use crate::error::Result;
use crate::geometry::Size;
use crate::layout::LayoutResult;

use super::introspect::EngineSnapshot;

/// Thread-shareable handle to a [`LayoutEngine`].
///
/// One coarse reader/writer lock guards the whole engine. Introspection
/// takes the read side; every mutation, recalculation and frame composition
/// takes the write side. The lock is only held for the duration of the
/// closure passed to [`SharedEngine::read`] / [`SharedEngine::write`].
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<LayoutEngine>>,
}

impl SharedEngine {
    pub fn new(engine: LayoutEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn read<R>(
        &self,
        f: impl FnOnce(&LayoutEngine) -> R,
    ) -> std::result::Result<R, SharedStateError> {
        let guard = self.inner.read().map_err(|_| SharedStateError::Poisoned)?;
        Ok(f(&*guard))
    }

    pub fn write<R>(
        &self,
        f: impl FnOnce(&mut LayoutEngine) -> R,
    ) -> std::result::Result<R, SharedStateError> {
        let mut guard = self.inner.write().map_err(|_| SharedStateError::Poisoned)?;
        Ok(f(&mut *guard))
    }

    pub fn add_component(&self, id: impl Into<String>, constraints: ConstraintSet) -> Result<()> {
        let id = id.into();
        self.write(|engine| engine.add_component(id, constraints))?
    }

    pub fn remove_component(&self, id: &str) -> Result<()> {
        self.write(|engine| engine.remove_component(id).map(|_| ()))?
    }

    pub fn update_constraints(&self, id: &str, constraints: ConstraintSet) -> Result<()> {
        self.write(|engine| engine.update_constraints(id, constraints))?
    }

    pub fn set_content(&self, id: &str, content: impl Into<String>) -> Result<bool> {
        let content = content.into();
        self.write(|engine| engine.set_content(id, content))?
    }

    pub fn handle_resize(&self, size: Size) -> Result<bool> {
        self.write(|engine| engine.handle_resize(size))?
    }

    pub fn recalculate(&self) -> Result<LayoutResult> {
        self.write(|engine| engine.recalculate().cloned())?
    }

    pub fn view(&self) -> Result<String> {
        Ok(self.write(|engine| engine.view())?)
    }

    pub fn result(&self) -> Result<Option<LayoutResult>> {
        Ok(self.read(|engine| engine.result().cloned())?)
    }

    pub fn snapshot(&self) -> Result<EngineSnapshot> {
        Ok(self.read(EngineSnapshot::capture)?)
    }

    pub fn snapshot_json(&self) -> Result<String> {
        let snapshot = self.snapshot()?;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }
}

#[derive(Debug, Error)]
pub enum SharedStateError {
    #[error("shared engine lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, SizeValue};
    use crate::engine::{EngineConfig, EngineState};
    use std::thread;

    fn shared() -> SharedEngine {
        SharedEngine::new(LayoutEngine::new(EngineConfig::default()))
    }

    #[test]
    fn mutations_go_through_the_lock() {
        let engine = shared();
        engine
            .add_component(
                "header",
                ConstraintSet::new().with(Constraint::height(SizeValue::Fixed(4))),
            )
            .unwrap();
        engine.handle_resize(Size::new(80, 24)).unwrap();

        let state = engine.read(|e| e.state()).unwrap();
        assert_eq!(state, EngineState::Clean);
        let result = engine.result().unwrap().unwrap();
        assert_eq!(result.rect("header").unwrap().height, 4);
    }

    #[test]
    fn readers_on_other_threads_see_updates() {
        let engine = shared();
        engine.add_component("a", ConstraintSet::new()).unwrap();
        engine.handle_resize(Size::new(80, 24)).unwrap();

        let reader = engine.clone();
        let handle = thread::spawn(move || reader.snapshot_json().unwrap());
        let json = handle.join().unwrap();
        assert!(json.contains("\"state\": \"clean\""));
        assert!(json.contains("\"id\": \"a\""));
    }

    #[test]
    fn poisoned_lock_surfaces_as_error() {
        let engine = shared();
        let poisoner = engine.clone();
        let _ = thread::spawn(move || {
            let _: std::result::Result<(), _> = poisoner.write(|_| panic!("poison the lock"));
        })
        .join();

        let err = engine.read(|e| e.state()).unwrap_err();
        assert!(matches!(err, SharedStateError::Poisoned));
        assert!(engine.snapshot().is_err());
    }
}
