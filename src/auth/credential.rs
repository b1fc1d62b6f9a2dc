//! Storage keys and the credential pair written by successful logins and refreshes.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Fixed storage names under which credentials are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CredentialKey {
	/// Short-lived bearer credential attached to requests.
	Access,
	/// Longer-lived credential exchanged for a new access credential.
	Refresh,
}
impl CredentialKey {
	/// Every key, in storage order.
	pub const ALL: [Self; 2] = [Self::Access, Self::Refresh];

	/// Returns the storage name for the key.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Access => "access_token",
			Self::Refresh => "refresh_token",
		}
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for CredentialKey {
	type Err = UnknownCredentialKey;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|key| key.as_str() == s)
			.ok_or_else(|| UnknownCredentialKey { name: s.to_owned() })
	}
}

/// Error returned when a storage name matches no [`CredentialKey`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("`{name}` is not a credential storage key.")]
pub struct UnknownCredentialKey {
	/// Offending storage name.
	pub name: String,
}

/// Access + refresh credentials issued together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
	/// Access credential.
	pub access: TokenSecret,
	/// Refresh credential.
	pub refresh: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from raw secrets.
	pub fn new(access: impl Into<TokenSecret>, refresh: impl Into<TokenSecret>) -> Self {
		Self { access: access.into(), refresh: refresh.into() }
	}

	/// Returns the secret stored under `key`.
	pub fn get(&self, key: CredentialKey) -> &TokenSecret {
		match key {
			CredentialKey::Access => &self.access,
			CredentialKey::Refresh => &self.refresh,
		}
	}
}
