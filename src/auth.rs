//! Credential model: redacted secrets, fixed storage keys, and the access/refresh pair.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
