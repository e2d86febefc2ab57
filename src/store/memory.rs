//! Thread-safe in-memory [`CredentialStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError},
};

/// Keeps the current credential in-process; the default store for clients and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<Credential>>>);
impl MemoryStore {
	/// Creates a store that already holds `credential`, e.g. right after sign-in.
	pub fn with_credential(credential: impl Into<Credential>) -> Self {
		Self(Arc::new(RwLock::new(Some(credential.into()))))
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self) -> Result<Option<Credential>, StoreError> {
		Ok(self.0.read().clone())
	}

	fn set(&self, credential: Credential) -> Result<(), StoreError> {
		*self.0.write() = Some(credential);

		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		self.0.write().take();

		Ok(())
	}
}
