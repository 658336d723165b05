//! Strongly typed identifiers for users, issues, and identity providers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, issue).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (user, issue).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (user, issue).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// Provider label is not a supported identity provider.
	#[error("Unknown identity provider `{value}`.")]
	UnknownProvider {
		/// Rejected label.
		value: String,
	},
}

def_id! { UserId, "Provider-qualified user identifier (`github:<id>`, `google:<sub>`).", "User" }
def_id! { IssueId, "Identifier assigned to an issue when its analysis is stored.", "Issue" }

impl UserId {
	/// Qualifies a provider-native subject with its provider so identities from different
	/// providers can never collide.
	pub fn qualified(provider: ProviderKind, subject: &str) -> Result<Self, IdentifierError> {
		Self::new(format!("{}:{subject}", provider.as_str()))
	}

	/// Provider prefix, when the identifier was produced by [`UserId::qualified`].
	pub fn provider(&self) -> Option<ProviderKind> {
		self.0.split_once(':').and_then(|(prefix, _)| prefix.parse().ok())
	}
}

impl IssueId {
	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4().to_string())
	}
}

/// External identity providers accepted for login.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	/// GitHub OAuth App.
	Github,
	/// Google Sign-In.
	Google,
}
impl ProviderKind {
	/// Returns the stable lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Github => "github",
			Self::Google => "google",
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ProviderKind {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"github" => Ok(Self::Github),
			"google" => Ok(Self::Google),
			other => Err(IdentifierError::UnknownProvider { value: other.to_owned() }),
		}
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
