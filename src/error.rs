//! Client-level error types shared across the transport, store, and interception layers.

// crates.io
use http::{HeaderMap, StatusCode};
// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Server answered with a non-success status.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
}
impl Error {
	/// Returns the HTTP status when the failure came from a server response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status(err) => Some(err.status.as_u16()),
			_ => None,
		}
	}

	/// Returns `true` for authorization failures (HTTP 401).
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Base endpoint cannot be parsed.
	#[error("Base endpoint `{value}` is not a valid URL.")]
	InvalidBaseUrl {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path cannot be joined onto the base endpoint.
	#[error("Request path `{path}` does not resolve to a valid URL.")]
	InvalidPath {
		/// Path as supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Stored credential cannot be encoded as an `Authorization` header value.
	#[error("Stored credential cannot be encoded as an Authorization header value.")]
	InvalidCredential,
	/// Request body could not be serialized as JSON.
	#[error("Request body could not be serialized as JSON.")]
	RequestBody(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed request.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised for `url`.
	pub fn network(url: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

/// Non-success response returned by the server, kept intact for the caller.
#[derive(Debug, ThisError)]
#[error("Request to {url} failed with status {status}.")]
pub struct StatusError {
	/// Target URL of the failed request.
	pub url: String,
	/// Response status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl StatusError {
	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Response payload failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body was not the JSON shape the caller asked for.
	#[error("Response body is not the expected JSON shape.")]
	Json {
		/// Structured parsing failure naming the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the decoded response.
		status: u16,
	},
}
