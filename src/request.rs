//! Request descriptors and buffered responses exchanged with
//! [`ApiClient`](crate::client::ApiClient).

// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError},
	transport::HttpResponse,
};

/// Outbound request plus the interception flags the client honors.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the base endpoint, or an absolute URL.
	pub path: String,
	/// Per-request headers; they override the configured defaults.
	pub headers: HeaderMap,
	/// Raw body bytes, if any.
	pub body: Option<Vec<u8>>,
	/// Suppresses credential lookup, attachment, and refresh-and-retry.
	pub skip_auth: bool,
	retried: bool,
}
impl RequestDescriptor {
	/// Creates a descriptor for `method` + `path` with no body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			headers: HeaderMap::new(),
			body: None,
			skip_auth: false,
			retried: false,
		}
	}

	/// `GET` shorthand.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `DELETE` shorthand.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// `POST` shorthand.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` shorthand.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` shorthand.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Serializes `value` as the JSON body.
	pub fn json<T>(mut self, value: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(value).map_err(ConfigError::RequestBody)?);

		Ok(self)
	}

	/// Sets a raw body.
	pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
		self.body = Some(bytes.into());

		self
	}

	/// Adds or replaces a per-request header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Marks the request as credential-exempt.
	pub fn without_auth(mut self) -> Self {
		self.skip_auth = true;

		self
	}

	/// Returns `true` once the request has been re-dispatched after an authorization failure.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}
}

/// Successful (2xx) response returned by the client.
#[derive(Debug)]
pub struct ApiResponse(HttpResponse);
impl ApiResponse {
	pub(crate) fn new(response: HttpResponse) -> Self {
		Self(response)
	}

	/// Response status.
	pub fn status(&self) -> StatusCode {
		self.0.status()
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		self.0.headers()
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		self.0.body()
	}

	/// Deserializes the body as JSON, reporting the failing field path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(self.body());

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			DecodeError::Json { source, status: self.status().as_u16() }.into()
		})
	}

	/// Returns the underlying buffered response.
	pub fn into_inner(self) -> HttpResponse {
		self.0
	}
}
