//! Simple file-backed [`CredentialStore`] for CLIs and long-running agents.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError},
};

#[derive(Serialize, Deserialize)]
struct Snapshot {
	credential: Credential,
	stored_at: OffsetDateTime,
}

/// Persists the credential to a JSON file after each mutation.
///
/// Reads are served from memory; writes go through a temporary file and a rename so the file
/// on disk is never half-written.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<Credential>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<Credential>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let snapshot: Snapshot =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(Some(snapshot.credential))
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, credential: &Credential) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot =
			Snapshot { credential: credential.clone(), stored_at: OffsetDateTime::now_utc() };
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize credential snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl CredentialStore for FileStore {
	fn get(&self) -> Result<Option<Credential>, StoreError> {
		Ok(self.inner.read().clone())
	}

	fn set(&self, credential: Credential) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		self.persist_locked(&credential)?;
		*guard = Some(credential);

		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		match fs::remove_file(&self.path) {
			Ok(()) => {},
			Err(e) if e.kind() == ErrorKind::NotFound => {},
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to remove {}: {e}", self.path.display()),
				}),
		}

		guard.take();

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::{SystemTime, UNIX_EPOCH};
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.expect("System clock should be after the UNIX epoch.")
			.as_nanos();

		std::env::temp_dir()
			.join(format!("session-refresh-{label}-{}-{nanos}", std::process::id()))
			.join("credential.json")
	}

	#[test]
	fn credential_survives_reopen() {
		let path = temp_path("reopen");
		let store = FileStore::open(&path).expect("Opening a fresh file store should succeed.");

		assert_eq!(store.path(), path.as_path());
		assert_eq!(store.get().expect("Reads should succeed."), None);

		store.set(Credential::new("T1")).expect("Persisting T1 should succeed.");
		store.set(Credential::new("T2")).expect("Persisting T2 should succeed.");

		let reopened = FileStore::open(&path).expect("Reopening the file store should succeed.");

		assert_eq!(reopened.get().expect("Reads should succeed."), Some(Credential::new("T2")));
		assert!(!path.with_extension("tmp").exists());

		reopened.clear().expect("Clearing should remove the backing file.");

		assert!(!path.exists());
		assert_eq!(reopened.get().expect("Reads should succeed."), None);

		let _ = fs::remove_dir_all(path.parent().expect("Temp path always has a parent."));
	}

	#[test]
	fn clear_without_file_is_a_noop() {
		let path = temp_path("clear");
		let store = FileStore::open(&path).expect("Opening a fresh file store should succeed.");

		store.clear().expect("Clearing an empty store should succeed.");

		let _ = fs::remove_dir_all(path.parent().expect("Temp path always has a parent."));
	}

	#[test]
	fn corrupt_file_is_reported_as_serialization_error() {
		let path = temp_path("corrupt");

		FileStore::ensure_parent_exists(&path).expect("Creating the temp directory should work.");
		fs::write(&path, b"{not json").expect("Writing the corrupt fixture should succeed.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshots must not load.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		let _ = fs::remove_dir_all(path.parent().expect("Temp path always has a parent."));
	}
}
