//! Service-level error types shared across tokens, identity providers, ratings, and stores.

// self
use crate::{_prelude::*, auth::IdentifierError, store::StoreError};

/// Service-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Outbound call to a non-identity collaborator (analysis backend) failed.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Request payload or identifier failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// GitHub or Google could not establish the caller's identity.
	#[error(transparent)]
	IdentityProvider(#[from] IdentityProviderError),
	/// A provider-issued identity assertion failed verification.
	#[error(transparent)]
	TokenValidation(#[from] TokenValidationError),

	/// No bearer credential accompanied the request.
	#[error("Authorization header is missing.")]
	MissingCredentials,
	/// Bearer token failed signature, structure, or expiry checks.
	///
	/// The specific reason is logged but never surfaced to the caller.
	#[error("Token is invalid or expired.")]
	InvalidToken,
	/// No record matched; doubles as the access-control failure for owner-scoped lookups.
	#[error("{entity} cannot be found.")]
	NotFound {
		/// Kind of record that was looked up.
		entity: &'static str,
	},
	/// Concurrent writers kept changing the record between read and write.
	#[error("The {entity} changed concurrently; retry the request.")]
	Conflict {
		/// Kind of record that kept changing.
		entity: &'static str,
	},
	/// Local token could not be signed.
	#[error("Couldn't make authentication token.")]
	Signing {
		/// Underlying signer failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}
impl Error {
	/// Shorthand for [`Error::NotFound`].
	pub fn not_found(entity: &'static str) -> Self {
		Self::NotFound { entity }
	}

	/// Returns the machine-usable category for this error.
	pub fn category(&self) -> ErrorCategory {
		match self {
			Self::MissingCredentials | Self::InvalidToken => ErrorCategory::Unauthorized,
			Self::Validation(_) => ErrorCategory::Validation,
			Self::NotFound { .. } => ErrorCategory::NotFound,
			Self::Conflict { .. } => ErrorCategory::Conflict,
			Self::IdentityProvider(_) => ErrorCategory::IdentityProvider,
			Self::TokenValidation(_) => ErrorCategory::TokenValidation,
			Self::Storage(_) | Self::Config(_) | Self::Transport(_) | Self::Signing { .. } =>
				ErrorCategory::Internal,
		}
	}

	/// Message safe to hand to untrusted clients.
	///
	/// Internal failures collapse into a generic sentence so storage or transport details never
	/// leave the process; every other category keeps its descriptive message.
	pub fn public_message(&self) -> String {
		match self.category() {
			ErrorCategory::Internal => "Internal server error.".into(),
			_ => self.to_string(),
		}
	}
}

impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		Self::Validation(e.into())
	}
}

/// Machine-usable error categories reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// Missing, invalid, or expired bearer token.
	Unauthorized,
	/// Malformed request body, out-of-range score, or unparsable identifier.
	Validation,
	/// No matching issue or user.
	NotFound,
	/// Optimistic concurrency retries were exhausted.
	Conflict,
	/// OAuth exchange, profile fetch, or key-set fetch failed.
	IdentityProvider,
	/// Provider identity assertion failed a specific verification check.
	TokenValidation,
	/// Storage, configuration, signing, or collaborator failure.
	Internal,
}
impl ErrorCategory {
	/// Returns a stable label suitable for response bodies or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unauthorized => "unauthorized",
			Self::Validation => "validation",
			Self::NotFound => "not_found",
			Self::Conflict => "conflict",
			Self::IdentityProvider => "identity_provider",
			Self::TokenValidation => "token_validation",
			Self::Internal => "internal",
		}
	}

	/// HTTP status code conventionally paired with the category.
	pub const fn http_status(self) -> u16 {
		match self {
			Self::Unauthorized | Self::IdentityProvider | Self::TokenValidation => 401,
			Self::Validation => 400,
			Self::NotFound => 404,
			Self::Conflict => 409,
			Self::Internal => 500,
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request validation failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// Score outside the tri-state range.
	#[error("Score must be one of: -1, 0, 1 (got {score}).")]
	InvalidScore {
		/// Rejected value.
		score: i64,
	},
	/// Required field was absent or null.
	#[error("Field `{field}` is required.")]
	MissingField {
		/// Wire name of the missing field.
		field: &'static str,
	},
	/// Required field was present but blank.
	#[error("Field `{field}` cannot be empty.")]
	EmptyField {
		/// Wire name of the blank field.
		field: &'static str,
	},
	/// Identifier could not be parsed.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
}

/// Configuration and validation failures raised while wiring the service.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Required environment variable is not set.
	#[error("Environment variable `{name}` is not set.")]
	MissingVariable {
		/// Variable name.
		name: &'static str,
	},
	/// Required setting is blank.
	#[error("Setting `{field}` cannot be empty.")]
	EmptyValue {
		/// Setting name.
		field: &'static str,
	},
	/// Endpoint URL cannot be parsed.
	#[error("Setting `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Outbound request timeout is zero or unparsable.
	#[error("Request timeout `{value}` is invalid.")]
	InvalidTimeout {
		/// Raw value that was rejected.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, status, decoding).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote endpoint.")]
	Io(#[from] std::io::Error),
	/// Remote endpoint answered with a non-success status.
	#[error("Remote endpoint responded with HTTP {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Leading part of the response body.
		body_preview: String,
	},
	/// Response body was not the expected JSON document.
	#[error("Remote endpoint returned malformed JSON.")]
	Decode {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client reported a failure without a typed cause.
	#[error("HTTP client error: {message}.")]
	Other {
		/// Client-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status attached to the failure, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::UnexpectedStatus { status, .. } => Some(*status),
			_ => None,
		}
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Provider call sites that can fail while establishing identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderStage {
	/// GitHub authorization-code exchange.
	GithubCodeExchange,
	/// GitHub authenticated-user profile fetch.
	GithubProfile,
	/// Google public key set fetch.
	GoogleKeySet,
}
impl ProviderStage {
	/// Returns a stable label suitable for logs and messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::GithubCodeExchange => "github code exchange",
			Self::GithubProfile => "github profile fetch",
			Self::GoogleKeySet => "google key set fetch",
		}
	}
}
impl Display for ProviderStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failures while talking to an identity provider.
#[derive(Debug, ThisError)]
pub enum IdentityProviderError {
	/// Provider answered but refused the request (bad or replayed code, revoked grant).
	#[error("Identity provider rejected the {stage}: {message}.")]
	Rejected {
		/// Call site that failed.
		stage: ProviderStage,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Provider-supplied description.
		message: String,
	},
	/// Call failed in transport or produced an unreadable body.
	#[error("Identity provider call failed during the {stage}.")]
	Transport {
		/// Call site that failed.
		stage: ProviderStage,
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
}
impl IdentityProviderError {
	/// Call site that produced the failure.
	pub fn stage(&self) -> ProviderStage {
		match self {
			Self::Rejected { stage, .. } | Self::Transport { stage, .. } => *stage,
		}
	}
}

/// Specific reasons a provider-issued identity assertion was rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenValidationError {
	/// Token could not be parsed as a compact JWS.
	#[error("ID token is malformed: {reason}.")]
	Malformed {
		/// Parser-supplied reason.
		reason: String,
	},
	/// Token header carries no key identifier.
	#[error("ID token header is missing a key identifier.")]
	MissingKeyId,
	/// Provider key set has no key with the token's identifier.
	#[error("No provider key matches key identifier `{kid}`.")]
	KeyNotFound {
		/// Key identifier from the token header.
		kid: String,
	},
	/// Provider key could not be used for verification.
	#[error("Provider key `{kid}` is unusable: {reason}.")]
	UnsupportedKey {
		/// Key identifier from the token header.
		kid: String,
		/// Decoder-supplied reason.
		reason: String,
	},
	/// Signature does not verify under the provider key.
	#[error("ID token signature is invalid.")]
	SignatureInvalid,
	/// `iss` is not an accepted issuer.
	#[error("ID token issuer `{issuer}` is invalid.")]
	InvalidIssuer {
		/// Issuer claimed by the token.
		issuer: String,
	},
	/// `aud` does not contain the registered client identifier.
	#[error("ID token audience is invalid.")]
	InvalidAudience,
	/// `exp` is not in the future.
	#[error("ID token is expired.")]
	TokenExpired,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_service_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Service error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn internal_errors_hide_details_from_clients() {
		let error: Error =
			StoreError::Backend { message: "driver exploded at 0xdead".into() }.into();

		assert_eq!(error.category(), ErrorCategory::Internal);
		assert_eq!(error.category().http_status(), 500);
		assert_eq!(error.public_message(), "Internal server error.");
	}

	#[test]
	fn token_failures_share_one_unauthorized_category() {
		assert_eq!(Error::InvalidToken.category(), ErrorCategory::Unauthorized);
		assert_eq!(Error::MissingCredentials.category(), ErrorCategory::Unauthorized);
		assert_eq!(Error::InvalidToken.public_message(), "Token is invalid or expired.");
	}

	#[test]
	fn audience_failure_keeps_its_specific_message() {
		let error: Error = TokenValidationError::InvalidAudience.into();

		assert_eq!(error.category(), ErrorCategory::TokenValidation);
		assert_eq!(error.public_message(), "ID token audience is invalid.");
	}

	#[test]
	fn not_found_maps_to_404() {
		let error = Error::not_found("Issue");

		assert_eq!(error.category().http_status(), 404);
		assert_eq!(error.to_string(), "Issue cannot be found.");
	}
}
