//! Storage contract and built-in backends for the current access credential.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Storage backend contract for the single credential a coordinator stamps onto requests.
///
/// Implementations must replace the credential atomically: a concurrent [`get`](Self::get)
/// observes either the previous value or the new one, never a partial write. Calls are
/// synchronous and short so the coordinator can consult the store inside its critical
/// section.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current credential, if any.
	fn get(&self) -> Result<Option<Credential>, StoreError>;

	/// Persists or replaces the current credential.
	fn set(&self, credential: Credential) -> Result<(), StoreError>;

	/// Removes the current credential (sign-out or unrecoverable refresh failure).
	fn clear(&self) -> Result<(), StoreError>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
