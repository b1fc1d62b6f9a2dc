//! Protected-route gating backed by the credential store.

// self
use crate::{
	_prelude::*,
	auth::CredentialKey,
	routes::{LOGIN_PATH, RouteMatch},
	store::{CredentialStore, StoreError},
};

/// Decision returned by [`RouteGuard::admit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Admission {
	/// Render the matched views.
	Granted,
	/// Navigate to the contained path instead.
	Redirect(String),
}

/// Gate for protected routes.
///
/// A protected route is admitted while the store holds an access credential or a refresh
/// credential, because the first request through [`ApiClient`](crate::client::ApiClient) can
/// mint an access credential from the latter.
#[derive(Clone)]
pub struct RouteGuard {
	store: Arc<dyn CredentialStore>,
	login_path: String,
}
impl RouteGuard {
	/// Creates a guard redirecting to [`LOGIN_PATH`].
	pub fn new(store: Arc<dyn CredentialStore>) -> Self {
		Self { store, login_path: LOGIN_PATH.to_owned() }
	}

	/// Overrides the redirect target.
	pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Decides whether `route` may render.
	pub async fn admit<V>(&self, route: &RouteMatch<'_, V>) -> Result<Admission, StoreError> {
		if !route.protected {
			return Ok(Admission::Granted);
		}

		for key in CredentialKey::ALL {
			if self.store.fetch(key).await?.is_some_and(|secret| !secret.is_empty()) {
				return Ok(Admission::Granted);
			}
		}

		Ok(Admission::Redirect(self.login_path.clone()))
	}
}
impl Debug for RouteGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RouteGuard").field("login_path", &self.login_path).finish()
	}
}
