//! Transport primitives for outbound API requests.
//!
//! The module exposes [`HttpTransport`], the client's only dependency on an HTTP stack, together
//! with the owned request/response aliases it exchanges. Interception (credential lookup,
//! refresh, retry) happens above this layer; a transport only moves bytes and reports what the
//! server said, so non-success statuses come back as `Ok` responses.

// self
use crate::{_prelude::*, error::TransportError};

/// Fully-built outbound request handed to a transport.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Buffered response returned by a transport.
pub type HttpResponse = http::Response<Vec<u8>>;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing buffered requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back many clones
/// of [`ApiClient`](crate::client::ApiClient) and the futures it returns can hop executors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let url = request.uri().to_string();
			let request = reqwest::Request::try_from(request)
				.map_err(|e| TransportError::network(url.as_str(), e))?;
			let response =
				self.0.execute(request).await.map_err(|e| TransportError::network(url.as_str(), e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| TransportError::network(url.as_str(), e))?;
			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
