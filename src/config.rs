//! Client configuration: base endpoint, refresh path, and default request headers.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue,
	header::CONTENT_TYPE,
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Base endpoint used when [`BASE_URL_VAR`] is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://jsonplaceholder.typicode.com";
/// Refresh endpoint path used when [`REFRESH_PATH_VAR`] is unset or blank.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";
/// Environment variable holding the base endpoint.
pub const BASE_URL_VAR: &str = "API_URL";
/// Environment variable overriding the refresh endpoint path.
pub const REFRESH_PATH_VAR: &str = "API_REFRESH_PATH";

/// Settings shared by every request an [`ApiClient`](crate::client::ApiClient) sends.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// Endpoint that relative request paths are joined onto.
	pub base_url: Url,
	/// Path (or absolute URL) of the refresh endpoint.
	pub refresh_path: String,
	/// Headers attached to every request before per-request headers.
	pub default_headers: HeaderMap,
}
impl ClientConfig {
	/// Creates a configuration for `base_url` with the default refresh path and a JSON
	/// `Content-Type` header.
	pub fn new(base_url: Url) -> Self {
		let mut default_headers = HeaderMap::new();

		default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Self { base_url, refresh_path: DEFAULT_REFRESH_PATH.to_owned(), default_headers }
	}

	/// Reads [`BASE_URL_VAR`] and [`REFRESH_PATH_VAR`] from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds a configuration from an arbitrary variable source; blank values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let raw_base = read(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
		let base_url = Url::parse(&raw_base)
			.map_err(|source| ConfigError::InvalidBaseUrl { value: raw_base.clone(), source })?;
		let mut config = Self::new(base_url);

		if let Some(path) = read(REFRESH_PATH_VAR) {
			config.refresh_path = path;
		}

		Ok(config)
	}

	/// Overrides the refresh endpoint path.
	pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Adds or replaces a default header.
	pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.default_headers.insert(name, value);

		self
	}

	/// Resolves a request path against the base endpoint.
	///
	/// Absolute URLs (`scheme://host/...`) pass through untouched. Everything else, including
	/// colon-bearing paths like `projects:list`, is appended to the base endpoint with exactly one
	/// slash between them, so a base path such as `/api/v1` is preserved.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		if path.contains("://") {
			if let Some(absolute) = Url::parse(path).ok().filter(Url::has_host) {
				return Ok(absolute);
			}
		}

		let base = self.base_url.as_str().trim_end_matches('/');
		let relative = path.trim_start_matches('/');
		let joined = if relative.is_empty() { format!("{base}/") } else { format!("{base}/{relative}") };

		Url::parse(&joined).map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}
}
