//! External identity resolution through GitHub and Google.
//!
//! Each resolver turns a client-supplied credential (a GitHub authorization code or a Google ID
//! token) into a [`ProviderIdentity`]. Neither resolver caches or retries; one failed call fails
//! the login.

pub mod github;
pub mod google;

pub use github::GithubResolver;
pub use google::{GoogleClaims, GoogleVerifier};

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderKind, UserId},
};

/// Identity established by a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderIdentity {
	/// Provider that vouched for the identity.
	pub provider: ProviderKind,
	/// Provider-native subject (GitHub numeric id, Google `sub`).
	pub subject: String,
	/// Name shown for new users.
	pub display_name: String,
}
impl ProviderIdentity {
	/// Local identifier derived from provider + subject.
	pub fn user_id(&self) -> Result<UserId, IdentifierError> {
		UserId::qualified(self.provider, &self.subject)
	}
}
