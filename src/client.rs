//! Authenticated request client.
//!
//! [`ApiClient::send`] wraps every dispatch in two interception steps:
//!
//! - before dispatch, unless the descriptor is credential-exempt, the access credential is read
//!   from the [`CredentialStore`]; when it is missing the refresh procedure runs first, and any
//!   credential obtained is attached as `Authorization: Bearer <token>`;
//! - after dispatch, a 401 on a descriptor that has not been retried yet triggers one refresh
//!   and, if that yields a credential, exactly one re-dispatch. Every other failure, and every
//!   failure of the retry itself, reaches the caller unchanged.

pub mod refresh;

pub use refresh::*;

// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, TokenSecret},
	config::ClientConfig,
	error::{ConfigError, StatusError},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	request::{ApiResponse, RequestDescriptor},
	store::{CredentialStore, StoreError},
	transport::{HttpRequest, HttpTransport},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Sends API requests with storage-backed bearer credentials and one-shot refresh-and-retry.
///
/// Clones share the transport, the store, the refresh counters, and the single-flight refresh
/// guard, so concurrent requests issued through any clone coalesce their refreshes.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including refresh calls.
	pub transport: Arc<T>,
	/// Persisted credential storage; read on every non-exempt request.
	pub store: Arc<dyn CredentialStore>,
	/// Base endpoint, refresh path, and default headers.
	pub config: ClientConfig,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn CredentialStore>,
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			refresh_metrics: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Dispatches `request` through the interception pipeline.
	pub async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Send;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_intercepted(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Sends a `GET` request.
	pub async fn get(&self, path: &str) -> Result<ApiResponse> {
		self.send(RequestDescriptor::get(path)).await
	}

	/// Sends a `DELETE` request.
	pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
		self.send(RequestDescriptor::delete(path)).await
	}

	/// Sends a `POST` request with a JSON body.
	pub async fn post<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(RequestDescriptor::post(path).json(body)?).await
	}

	/// Sends a `PUT` request with a JSON body.
	pub async fn put<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(RequestDescriptor::put(path).json(body)?).await
	}

	/// Sends a `PATCH` request with a JSON body.
	pub async fn patch<B>(&self, path: &str, body: &B) -> Result<ApiResponse>
	where
		B: ?Sized + Serialize,
	{
		self.send(RequestDescriptor::patch(path).json(body)?).await
	}

	async fn send_intercepted(&self, mut request: RequestDescriptor) -> Result<ApiResponse> {
		let credential = self.credential_for(&request).await?;
		let err = match self.dispatch(&request, credential.as_ref()).await {
			Ok(response) => return Ok(response),
			Err(err) => err,
		};

		if !err.is_unauthorized() || request.skip_auth || request.is_retried() {
			return Err(err);
		}

		request.mark_retried();

		let Some(fresh) =
			self.refresh_with(RefreshTrigger::Replace(credential.as_ref())).await.into_credential()
		else {
			return Err(err);
		};
		let span = FlowSpan::new(FlowKind::Retry, "send");

		obs::record_flow_outcome(FlowKind::Retry, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch(&request, Some(&fresh))).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(FlowKind::Retry, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(FlowKind::Retry, FlowOutcome::Failure),
		}

		result
	}

	/// Pre-dispatch step: stored access credential, or a refreshed one when it is missing.
	async fn credential_for(&self, request: &RequestDescriptor) -> Result<Option<TokenSecret>> {
		if request.skip_auth {
			return Ok(None);
		}
		if let Some(access) = self.stored(CredentialKey::Access).await? {
			return Ok(Some(access));
		}

		Ok(self.refresh_with(RefreshTrigger::Replace(None)).await.into_credential())
	}

	/// Reads a credential, treating an empty value as absent.
	pub(crate) async fn stored(
		&self,
		key: CredentialKey,
	) -> Result<Option<TokenSecret>, StoreError> {
		let secret = self.store.fetch(key).await?;

		Ok(secret.filter(|secret| !secret.is_empty()))
	}

	/// Builds and sends one HTTP request; non-2xx statuses become [`StatusError`].
	pub(crate) async fn dispatch(
		&self,
		request: &RequestDescriptor,
		credential: Option<&TokenSecret>,
	) -> Result<ApiResponse> {
		let http_request = self.build_request(request, credential)?;
		let url = http_request.uri().to_string();
		let response = self.transport.execute(http_request).await?;

		if response.status().is_success() {
			return Ok(ApiResponse::new(response));
		}

		let (parts, body) = response.into_parts();

		Err(StatusError { url, status: parts.status, headers: parts.headers, body }.into())
	}

	fn build_request(
		&self,
		request: &RequestDescriptor,
		credential: Option<&TokenSecret>,
	) -> Result<HttpRequest, ConfigError> {
		let url = self.config.resolve(&request.path)?;
		let mut http_request = http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.body(request.body.clone().unwrap_or_default())?;
		let headers = http_request.headers_mut();

		headers.extend(self.config.default_headers.clone());
		headers.extend(request.headers.clone());

		if request.skip_auth {
			headers.remove(AUTHORIZATION);

			return Ok(http_request);
		}
		if let Some(secret) = credential {
			let mut value = HeaderValue::from_str(&secret.bearer())
				.map_err(|_| ConfigError::InvalidCredential)?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		Ok(http_request)
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(store: Arc<dyn CredentialStore>, config: ClientConfig) -> Self {
		Self::with_transport(store, config, ReqwestTransport::default())
	}

	/// Creates a reqwest-backed client configured from the process environment.
	pub fn from_env(store: Arc<dyn CredentialStore>) -> Result<Self> {
		Ok(Self::new(store, ClientConfig::from_env()?))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_path", &self.config.refresh_path)
			.finish()
	}
}
