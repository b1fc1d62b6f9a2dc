//! Storage contracts and built-in credential store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persisted key/value storage for the access and refresh credentials.
///
/// The client never caches credentials in memory; every request goes through
/// [`fetch`](CredentialStore::fetch), so external login or logout code that writes to the same
/// store is observed on the next request.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the credential stored under `key`, if present.
	fn fetch(&self, key: CredentialKey) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Persists or replaces the credential stored under `key`.
	fn save(&self, key: CredentialKey, secret: TokenSecret) -> StoreFuture<'_, ()>;

	/// Overwrites both credentials in one step.
	fn save_pair(&self, pair: CredentialPair) -> StoreFuture<'_, ()>;

	/// Removes every stored credential.
	fn clear(&self) -> StoreFuture<'_, ()>;
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
