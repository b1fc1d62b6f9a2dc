//! Thread-safe in-memory [`CredentialStore`] for tests, demos, and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, TokenSecret},
	store::{CredentialStore, StoreFuture},
};

type CredentialMap = Arc<RwLock<HashMap<CredentialKey, TokenSecret>>>;

/// Storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(CredentialMap);
impl MemoryStore {
	/// Returns a store pre-populated with `pair`.
	pub fn with_pair(pair: CredentialPair) -> Self {
		let store = Self::default();

		Self::write_pair(&store.0, pair);

		store
	}

	/// Number of credentials currently held.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credential is held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn write_pair(map: &CredentialMap, pair: CredentialPair) {
		let mut guard = map.write();

		guard.insert(CredentialKey::Access, pair.access);
		guard.insert(CredentialKey::Refresh, pair.refresh);
	}
}
impl CredentialStore for MemoryStore {
	fn fetch(&self, key: CredentialKey) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&key).cloned()) })
	}

	fn save(&self, key: CredentialKey, secret: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key, secret);

			Ok(())
		})
	}

	fn save_pair(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::write_pair(&map, pair);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().clear();

			Ok(())
		})
	}
}
