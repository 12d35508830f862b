use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{KeyValueStore, StoreError};

/// In-memory store for tests.
///
/// [`MemoryStore::set_read_only`] makes every write fail, standing in for an
/// unavailable or full backing store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<HashMap<String, String>>,
    read_only: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Number of successful `set`/`remove` calls.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.get() {
            return Err(StoreError::Unavailable("store is read-only".to_owned()));
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.data
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.data.borrow_mut().remove(key);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> Result<String, StoreError>,
    ) -> Result<(), StoreError> {
        let current = self.get(key);
        let next = f(current.as_deref())?;
        self.set(key, &next)
    }
}
