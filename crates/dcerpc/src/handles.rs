//! Server-side context handle table
//!
//! Issues fresh handles for opened resources and resolves the handles
//! callers send back. A handle the table does not know (never issued,
//! already closed, or issued by another table) resolves to `None`; the
//! operation answers `Status::ERROR_INVALID_HANDLE` in that case.

use std::collections::HashMap;
use std::sync::Arc;

use midl_ndr::{ContextHandle, Uuid};
use parking_lot::RwLock;
use tracing::debug;

/// Live resources keyed by the handle that names them
pub struct ContextHandleTable<T> {
    entries: RwLock<HashMap<ContextHandle, Arc<T>>>,
}

impl<T> ContextHandleTable<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `resource` under a newly issued handle
    pub fn open(&self, resource: T) -> ContextHandle {
        let resource = Arc::new(resource);
        let mut entries = self.entries.write();
        loop {
            let handle = ContextHandle::new(0, random_uuid());
            if handle.is_nil() || entries.contains_key(&handle) {
                continue;
            }
            entries.insert(handle, Arc::clone(&resource));
            debug!(%handle, live = entries.len(), "context handle opened");
            return handle;
        }
    }

    pub fn get(&self, handle: &ContextHandle) -> Option<Arc<T>> {
        self.entries.read().get(handle).cloned()
    }

    /// Invalidate a handle, returning its resource if it was live
    pub fn close(&self, handle: &ContextHandle) -> Option<Arc<T>> {
        let removed = self.entries.write().remove(handle);
        if removed.is_some() {
            debug!(%handle, "context handle closed");
        }
        removed
    }

    /// Drop every live handle, as when the owning connection goes away
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T> Default for ContextHandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn random_uuid() -> Uuid {
    let binding = uuid::Uuid::new_v4();
    let (data1, data2, data3, data4) = binding.as_fields();
    Uuid::from_fields(data1, data2, data3, *data4)
}
