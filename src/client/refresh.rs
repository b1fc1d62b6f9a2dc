//! Refresh procedure with a single-flight guard and a tagged outcome.
//!
//! Every refresh, whether requested explicitly through [`ApiClient::refresh`] or triggered by
//! the interception pipeline, runs while holding the client's refresh guard, so at most one
//! refresh call is in flight per client. Callers that queued behind a successful refresh
//! re-read storage after acquiring the guard and reuse the credential it minted instead of
//! spending the (already rotated) refresh credential again.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, TokenSecret},
	client::ApiClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::RequestDescriptor,
	store::StoreError,
	transport::HttpTransport,
};

/// Tagged result of a refresh attempt.
#[derive(Debug)]
pub enum RefreshOutcome {
	/// A usable access credential is now stored.
	Refreshed(TokenSecret),
	/// No refresh credential is stored; no network call was made.
	NoRefreshCredential,
	/// The refresh call or the follow-up storage write failed; storage is unchanged.
	Failed(RefreshFailure),
}
impl RefreshOutcome {
	/// Borrows the refreshed access credential, if any.
	pub fn credential(&self) -> Option<&TokenSecret> {
		match self {
			Self::Refreshed(secret) => Some(secret),
			_ => None,
		}
	}

	/// Consumes the outcome, keeping only the refreshed access credential.
	pub fn into_credential(self) -> Option<TokenSecret> {
		match self {
			Self::Refreshed(secret) => Some(secret),
			_ => None,
		}
	}

	/// Returns `true` when a credential is available.
	pub fn is_refreshed(&self) -> bool {
		matches!(self, Self::Refreshed(_))
	}

	fn flow_outcome(&self) -> FlowOutcome {
		match self {
			Self::Refreshed(_) => FlowOutcome::Success,
			Self::NoRefreshCredential => FlowOutcome::Skipped,
			Self::Failed(_) => FlowOutcome::Failure,
		}
	}
}

/// Reasons a refresh call failed.
#[derive(Debug, ThisError)]
pub enum RefreshFailure {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the refresh credential with status {status}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// Refresh request could not be built or delivered.
	#[error("Refresh request could not be dispatched.")]
	Dispatch(#[source] Error),
	/// Refresh response body did not carry both credentials.
	#[error("Refresh response body is malformed.")]
	MalformedBody(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// Refresh response carried an empty credential.
	#[error("Refresh response field `{field}` is empty.")]
	EmptyCredential {
		/// JSON field name that was empty.
		field: &'static str,
	},
	/// Credential storage could not be read or written.
	#[error("Credential storage failed during refresh.")]
	Storage(#[source] StoreError),
}

/// Why the refresh procedure is running.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RefreshTrigger<'a> {
	/// Explicit request; always calls the refresh endpoint.
	Forced,
	/// The caller holds no credential or a rejected one; any other stored access credential
	/// found after acquiring the guard satisfies it.
	Replace(Option<&'a TokenSecret>),
}

#[derive(Serialize)]
struct RefreshRequestBody<'a> {
	#[serde(rename = "refreshToken")]
	refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponseBody {
	#[serde(rename = "accessToken")]
	access_token: String,
	#[serde(rename = "newRefreshToken")]
	new_refresh_token: String,
}

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges the stored refresh credential for a new credential pair.
	///
	/// Failures are reported through [`RefreshOutcome`] rather than an error so callers can tell
	/// "not signed in" ([`RefreshOutcome::NoRefreshCredential`]) from a failed exchange.
	pub async fn refresh(&self) -> RefreshOutcome {
		self.refresh_with(RefreshTrigger::Forced).await
	}

	pub(crate) async fn refresh_with(&self, trigger: RefreshTrigger<'_>) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;

				if let RefreshTrigger::Replace(stale) = trigger {
					match self.stored(CredentialKey::Access).await {
						Ok(Some(current)) if Some(&current) != stale => {
							self.refresh_metrics.record_coalesced();

							return RefreshOutcome::Refreshed(current);
						},
						Ok(_) => {},
						Err(err) => return self.refresh_failed(RefreshFailure::Storage(err)),
					}
				}

				let refresh = match self.stored(CredentialKey::Refresh).await {
					Ok(Some(refresh)) => refresh,
					Ok(None) => {
						self.refresh_metrics.record_skipped();

						return RefreshOutcome::NoRefreshCredential;
					},
					Err(err) => return self.refresh_failed(RefreshFailure::Storage(err)),
				};

				self.refresh_metrics.record_call();

				let pair = match self.exchange_refresh_credential(&refresh).await {
					Ok(pair) => pair,
					Err(failure) => return self.refresh_failed(failure),
				};

				if let Err(err) = self.store.save_pair(pair.clone()).await {
					return self.refresh_failed(RefreshFailure::Storage(err));
				}

				self.refresh_metrics.record_success();

				RefreshOutcome::Refreshed(pair.access)
			})
			.await;

		obs::record_flow_outcome(KIND, outcome.flow_outcome());

		outcome
	}

	async fn exchange_refresh_credential(
		&self,
		refresh: &TokenSecret,
	) -> Result<CredentialPair, RefreshFailure> {
		let request = RequestDescriptor::post(self.config.refresh_path.as_str())
			.json(&RefreshRequestBody { refresh_token: refresh.expose() })
			.map_err(|err| RefreshFailure::Dispatch(err.into()))?
			.without_auth();
		let response = self.dispatch(&request, None).await.map_err(|err| match err.status() {
			Some(status) => RefreshFailure::Rejected { status },
			None => RefreshFailure::Dispatch(err),
		})?;
		let mut deserializer = serde_json::Deserializer::from_slice(response.body());
		let body: RefreshResponseBody = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(RefreshFailure::MalformedBody)?;

		if body.access_token.is_empty() {
			return Err(RefreshFailure::EmptyCredential { field: "accessToken" });
		}
		if body.new_refresh_token.is_empty() {
			return Err(RefreshFailure::EmptyCredential { field: "newRefreshToken" });
		}

		Ok(CredentialPair::new(body.access_token, body.new_refresh_token))
	}

	fn refresh_failed(&self, failure: RefreshFailure) -> RefreshOutcome {
		self.refresh_metrics.record_failure();
		obs::warn_absorbed(FlowKind::Refresh, &failure);

		RefreshOutcome::Failed(failure)
	}
}
