use super::RegistryStore;
use crate::error::Result;
use crate::registry::Registry;
use std::cell::{Cell, RefCell};

/// In-memory storage for testing.
/// Does NOT persist data.
#[derive(Default)]
pub struct InMemoryStore {
    registry: RefCell<Option<Registry>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry: RefCell::new(Some(registry)),
            saves: Cell::new(0),
            fail_saves: Cell::new(false),
        }
    }

    /// What a fresh `load` would return.
    pub fn snapshot(&self) -> Option<Registry> {
        self.registry.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Makes every later `save` fail with an IO error.
    pub fn fail_saves(&self) {
        self.fail_saves.set(true);
    }
}

impl RegistryStore for InMemoryStore {
    fn load(&self) -> Result<Option<Registry>> {
        Ok(self.registry.borrow().clone())
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        if self.fail_saves.get() {
            let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
            return Err(err.into());
        }
        *self.registry.borrow_mut() = Some(registry.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}
