//! Shared fixtures for the integration tests: a reqwest-backed client wired to a mock server and
//! helpers to seed or inspect the in-memory credential store.

#![allow(dead_code, unused_imports)]

pub use std::sync::Arc;

pub use parking_lot::Mutex;
pub use url::Url;

pub use authed_client::error::{Error, Result};
// self
use authed_client::{
	auth::{CredentialKey, CredentialPair, TokenSecret},
	client::ApiClient,
	config::ClientConfig,
	reqwest::Client as ReqwestClient,
	store::{CredentialStore, MemoryStore},
	transport::ReqwestTransport,
};

/// Client type alias used by reqwest-backed integration tests.
pub type ReqwestTestClient = ApiClient<ReqwestTransport>;

/// Refresh path wired into every test client.
pub const TEST_REFRESH_PATH: &str = "/auth/refresh-token";

/// Builds a client configuration pointing at `base_url` (usually an `httpmock` server).
pub fn test_config(base_url: &str) -> ClientConfig {
	let base_url = Url::parse(base_url).expect("Test base URL should parse.");

	ClientConfig::new(base_url).with_refresh_path(TEST_REFRESH_PATH)
}

/// Constructs an [`ApiClient`] backed by an in-memory store and the reqwest transport.
pub fn build_reqwest_test_client(base_url: &str) -> (ReqwestTestClient, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = store_backend.clone();
	let transport = ReqwestTransport::with_client(
		ReqwestClient::builder().build().expect("Failed to build Reqwest client for tests."),
	);
	let client = ApiClient::with_transport(store, test_config(base_url), transport);

	(client, store_backend)
}

/// Seeds the access credential into `store`.
pub async fn seed_access(store: &MemoryStore, access: &str) {
	store
		.save(CredentialKey::Access, TokenSecret::new(access))
		.await
		.expect("Failed to seed the access credential.");
}

/// Seeds the refresh credential into `store`.
pub async fn seed_refresh(store: &MemoryStore, refresh: &str) {
	store
		.save(CredentialKey::Refresh, TokenSecret::new(refresh))
		.await
		.expect("Failed to seed the refresh credential.");
}

/// Seeds both credentials at once.
pub async fn seed_pair(store: &MemoryStore, access: &str, refresh: &str) {
	store
		.save_pair(CredentialPair::new(access, refresh))
		.await
		.expect("Failed to seed the credential pair.");
}

/// Reads both stored credentials as plain strings.
pub async fn stored_pair(store: &MemoryStore) -> (Option<String>, Option<String>) {
	let access = store
		.fetch(CredentialKey::Access)
		.await
		.expect("Access credential lookup should succeed.")
		.map(|secret| secret.expose().to_owned());
	let refresh = store
		.fetch(CredentialKey::Refresh)
		.await
		.expect("Refresh credential lookup should succeed.")
		.map(|secret| secret.expose().to_owned());

	(access, refresh)
}
