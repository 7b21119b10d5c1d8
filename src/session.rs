//! Per-user session storage for in-flight handshake state.
//!
//! The consumer keeps its pending request-token secrets and obtained access
//! grants in named slots here, one session per resource owner. Swap in a
//! backend-specific implementation for anything beyond a single process.

// self
use crate::{_prelude::*, store::{StoreError, StoreFuture}};

/// String slot storage scoped to one resource owner's browsing session.
pub trait SessionStore: Send + Sync {
	/// Reads a slot, `None` when it was never set or has been removed.
	fn get<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes a slot, replacing any previous value.
	fn set<'a>(&'a self, slot: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Removes a slot. Removing an absent slot is not an error.
	fn remove<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, ()>;
}

/// Process-local [`SessionStore`] backed by a hash map.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
	slots: Arc<RwLock<HashMap<String, String>>>,
}
impl MemorySession {
	/// Creates an empty session.
	pub fn new() -> Self {
		Self::default()
	}

	fn get_now(&self, slot: &str) -> Result<Option<String>, StoreError> {
		Ok(self.slots.read().get(slot).cloned())
	}

	fn set_now(&self, slot: &str, value: String) -> Result<(), StoreError> {
		self.slots.write().insert(slot.to_owned(), value);

		Ok(())
	}

	fn remove_now(&self, slot: &str) -> Result<(), StoreError> {
		self.slots.write().remove(slot);

		Ok(())
	}
}
impl SessionStore for MemorySession {
	fn get<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { self.get_now(slot) })
	}

	fn set<'a>(&'a self, slot: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.set_now(slot, value) })
	}

	fn remove<'a>(&'a self, slot: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.remove_now(slot) })
	}
}
