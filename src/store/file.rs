//! JSON-file-backed [`CredentialStore`] for CLIs and desktop shells that must survive restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
	process,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, TokenSecret},
	store::{CredentialStore, StoreError, StoreFuture},
};

type Snapshot = BTreeMap<String, TokenSecret>;

static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Persists credentials to a JSON object (`{"access_token": "...", "refresh_token": "..."}`).
///
/// Nothing is cached: every read goes to the file, and every mutation re-reads the file before
/// rewriting it, so writes made by another process or another `FileStore` on the same path are
/// observed. Entries under names other than the credential keys are kept untouched, so the file
/// can be shared with other settings of the same application.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	write_lock: Arc<Mutex<()>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, rejecting an existing malformed file.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;
		Self::load_snapshot(&path)?;

		Ok(Self { path, write_lock: Default::default() })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
		if !path.exists() {
			return Ok(Snapshot::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(Snapshot::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Snapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize credential snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension(format!(
			"{}.{}.tmp",
			process::id(),
			TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
		));

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

		fs::rename(&tmp_path, &self.path).map_err(|e| {
			let _ = fs::remove_file(&tmp_path);

			StoreError::Backend { message: format!("Failed to replace {}: {e}", self.path.display()) }
		})
	}

	/// Re-reads the file, applies `mutate`, and atomically replaces the file; a failed write
	/// leaves the file unchanged.
	fn mutate(&self, mutate: impl FnOnce(&mut Snapshot)) -> Result<(), StoreError> {
		let _guard = self.write_lock.lock();
		let mut next = Self::load_snapshot(&self.path)?;

		mutate(&mut next);

		self.persist_locked(&next)
	}
}
impl CredentialStore for FileStore {
	fn fetch(&self, key: CredentialKey) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			let mut snapshot = Self::load_snapshot(&self.path)?;

			Ok(snapshot.remove(key.as_str()))
		})
	}

	fn save(&self, key: CredentialKey, secret: TokenSecret) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|snapshot| {
				snapshot.insert(key.as_str().to_owned(), secret);
			})
		})
	}

	fn save_pair(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|snapshot| {
				snapshot.insert(CredentialKey::Access.as_str().to_owned(), pair.access);
				snapshot.insert(CredentialKey::Refresh.as_str().to_owned(), pair.refresh);
			})
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|snapshot| {
				for key in CredentialKey::ALL {
					snapshot.remove(key.as_str());
				}
			})
		})
	}
}
