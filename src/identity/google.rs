//! Google login: ID token verification against the published key set.
//!
//! Checks run in a fixed order and stop at the first failure: key identifier, key lookup,
//! RS256 signature, issuer, audience, expiry. Each failure has its own
//! [`TokenValidationError`] variant.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind, jwk::JwkSet};
// self
use crate::{
	_prelude::*,
	auth::ProviderKind,
	config::ServiceConfig,
	error::{IdentityProviderError, ProviderStage, TokenValidationError, ValidationError},
	http::ProviderHttpClient,
	identity::ProviderIdentity,
	obs::{self, OperationKind},
};

/// Issuers Google uses for ID tokens.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// `aud` claim, which may be a single string or a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
	/// One audience.
	Single(String),
	/// Several audiences.
	Multiple(Vec<String>),
}
impl Audience {
	/// Returns `true` when `client_id` is among the audiences.
	pub fn contains(&self, client_id: &str) -> bool {
		match self {
			Self::Single(aud) => aud == client_id,
			Self::Multiple(auds) => auds.iter().any(|aud| aud == client_id),
		}
	}
}

/// Claims read from a Google ID token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleClaims {
	/// Issuer.
	pub iss: String,
	/// Stable Google account identifier.
	pub sub: String,
	/// Intended audience(s).
	pub aud: Audience,
	/// Expiry as Unix seconds.
	pub exp: i64,
	/// Account email.
	#[serde(default)]
	pub email: Option<String>,
	/// Given name.
	#[serde(default)]
	pub given_name: Option<String>,
	/// Full name.
	#[serde(default)]
	pub name: Option<String>,
}
impl GoogleClaims {
	/// Best available human-readable name, falling back to the subject.
	pub fn display_name(&self) -> &str {
		[&self.given_name, &self.name, &self.email]
			.into_iter()
			.flatten()
			.map(String::as_str)
			.find(|name| !name.trim().is_empty())
			.unwrap_or(self.sub.as_str())
	}
}

/// Verifies Google ID tokens for one client identifier.
#[derive(Clone)]
pub struct GoogleVerifier {
	http: ProviderHttpClient,
	certs_endpoint: Url,
	client_id: String,
	validation: Validation,
}
impl GoogleVerifier {
	/// Builds a verifier from the configured client identifier and key set endpoint.
	pub fn new(config: &ServiceConfig, http: ProviderHttpClient) -> Self {
		let mut validation = Validation::new(Algorithm::RS256);

		// Issuer, audience, and expiry are checked in `verify_with_keys`.
		validation.validate_exp = false;
		validation.validate_aud = false;
		validation.required_spec_claims.clear();
		validation.leeway = 0;

		Self {
			http,
			certs_endpoint: config.endpoints.google_certs.clone(),
			client_id: config.google_client_id.clone(),
			validation,
		}
	}

	/// Verifies `id_token`, fetching the current key set.
	pub async fn verify(&self, id_token: &str) -> Result<GoogleClaims> {
		let id_token = id_token.trim();

		if id_token.is_empty() {
			return Err(ValidationError::EmptyField { field: "idToken" }.into());
		}

		let kid = self.key_id(id_token).inspect_err(|e| self.reject(e))?;
		let keys = self.http.get_json::<JwkSet>(&self.certs_endpoint, None).await.map_err(
			|source| IdentityProviderError::Transport { stage: ProviderStage::GoogleKeySet, source },
		)?;

		self.verify_with_keys(id_token, &kid, &keys, OffsetDateTime::now_utc())
			.inspect_err(|e| self.reject(e))
			.map_err(Error::from)
	}

	/// Verifies `id_token` and converts the claims into a [`ProviderIdentity`].
	pub async fn resolve(&self, id_token: &str) -> Result<ProviderIdentity> {
		let claims = self.verify(id_token).await?;

		Ok(ProviderIdentity {
			provider: ProviderKind::Google,
			display_name: claims.display_name().to_owned(),
			subject: claims.sub,
		})
	}

	/// Runs every post-fetch check against an already loaded key set.
	pub fn verify_with_keys(
		&self,
		id_token: &str,
		kid: &str,
		keys: &JwkSet,
		now: OffsetDateTime,
	) -> Result<GoogleClaims, TokenValidationError> {
		let jwk =
			keys.find(kid).ok_or_else(|| TokenValidationError::KeyNotFound { kid: kid.into() })?;
		let key = DecodingKey::from_jwk(jwk).map_err(|e| TokenValidationError::UnsupportedKey {
			kid: kid.into(),
			reason: e.to_string(),
		})?;
		let claims = jsonwebtoken::decode::<GoogleClaims>(id_token, &key, &self.validation)
			.map_err(|e| match e.kind() {
				ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm =>
					TokenValidationError::SignatureInvalid,
				_ => TokenValidationError::Malformed { reason: e.to_string() },
			})?
			.claims;

		if !GOOGLE_ISSUERS.contains(&claims.iss.as_str()) {
			return Err(TokenValidationError::InvalidIssuer { issuer: claims.iss });
		}
		if !claims.aud.contains(&self.client_id) {
			return Err(TokenValidationError::InvalidAudience);
		}
		if claims.exp <= now.unix_timestamp() {
			return Err(TokenValidationError::TokenExpired);
		}

		Ok(claims)
	}

	fn key_id(&self, id_token: &str) -> Result<String, TokenValidationError> {
		jsonwebtoken::decode_header(id_token)
			.map_err(|e| TokenValidationError::Malformed { reason: e.to_string() })?
			.kid
			.ok_or(TokenValidationError::MissingKeyId)
	}

	fn reject(&self, reason: &TokenValidationError) {
		obs::log_rejection(OperationKind::GoogleLogin, reason);
	}
}
impl Debug for GoogleVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GoogleVerifier")
			.field("certs_endpoint", &self.certs_endpoint.as_str())
			.field("client_id", &self.client_id)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{EncodingKey, Header};
	// self
	use super::*;

	const CLIENT_ID: &str = "web-client.apps.googleusercontent.com";
	const KID: &str = "test-key-1";

	fn verifier() -> GoogleVerifier {
		let config = ServiceConfig::builder()
			.secret("secret")
			.github_client("id", "secret")
			.google_client_id(CLIENT_ID)
			.build()
			.expect("Configuration fixture should build.");

		GoogleVerifier::new(&config, ProviderHttpClient::default())
	}

	fn keys() -> JwkSet {
		serde_json::from_slice(include_bytes!("../../tests/fixtures/google_jwks.json"))
			.expect("JWKS fixture should parse.")
	}

	fn sign(claims: &serde_json::Value, pem: &[u8], kid: Option<&str>) -> String {
		let mut header = Header::new(Algorithm::RS256);

		header.kid = kid.map(str::to_owned);

		jsonwebtoken::encode(
			&header,
			claims,
			&EncodingKey::from_rsa_pem(pem).expect("RSA fixture should load."),
		)
		.expect("Fixture token should sign.")
	}

	fn claims(aud: serde_json::Value, exp: i64) -> serde_json::Value {
		serde_json::json!({
			"iss": "https://accounts.google.com",
			"sub": "1098765",
			"aud": aud,
			"exp": exp,
			"email": "ada@example.com",
			"given_name": "Ada",
		})
	}

	fn future() -> i64 {
		(OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp()
	}

	const GOOD_KEY: &[u8] = include_bytes!("../../tests/fixtures/google_rsa.pem");
	const ROGUE_KEY: &[u8] = include_bytes!("../../tests/fixtures/rogue_rsa.pem");

	#[test]
	fn valid_token_passes_every_check() {
		let token = sign(&claims(CLIENT_ID.into(), future()), GOOD_KEY, Some(KID));
		let claims = verifier()
			.verify_with_keys(&token, KID, &keys(), OffsetDateTime::now_utc())
			.expect("Token should verify.");

		assert_eq!(claims.sub, "1098765");
		assert_eq!(claims.display_name(), "Ada");
	}

	#[test]
	fn audience_list_is_accepted() {
		let aud = serde_json::json!(["other-client", CLIENT_ID]);
		let token = sign(&claims(aud, future()), GOOD_KEY, Some(KID));

		assert!(
			verifier().verify_with_keys(&token, KID, &keys(), OffsetDateTime::now_utc()).is_ok()
		);
	}

	#[test]
	fn each_failed_check_has_its_own_reason() {
		let verifier = verifier();
		let now = OffsetDateTime::now_utc();
		let wrong_aud = sign(&claims("someone-else".into(), future()), GOOD_KEY, Some(KID));
		let expired =
			sign(&claims(CLIENT_ID.into(), now.unix_timestamp() - 5), GOOD_KEY, Some(KID));
		let forged = sign(&claims(CLIENT_ID.into(), future()), ROGUE_KEY, Some(KID));
		let mut foreign = claims(CLIENT_ID.into(), future());

		foreign["iss"] = "https://evil.example.com".into();

		let foreign = sign(&foreign, GOOD_KEY, Some(KID));

		assert_eq!(
			verifier.verify_with_keys(&wrong_aud, KID, &keys(), now),
			Err(TokenValidationError::InvalidAudience)
		);
		assert_eq!(
			verifier.verify_with_keys(&expired, KID, &keys(), now),
			Err(TokenValidationError::TokenExpired)
		);
		assert_eq!(
			verifier.verify_with_keys(&forged, KID, &keys(), now),
			Err(TokenValidationError::SignatureInvalid)
		);
		assert!(matches!(
			verifier.verify_with_keys(&foreign, KID, &keys(), now),
			Err(TokenValidationError::InvalidIssuer { .. })
		));
		assert!(matches!(
			verifier.verify_with_keys(&forged, "rotated-away", &keys(), now),
			Err(TokenValidationError::KeyNotFound { .. })
		));
	}

	#[test]
	fn header_problems_are_caught_before_fetching_keys() {
		let verifier = verifier();
		let no_kid = sign(&claims(CLIENT_ID.into(), future()), GOOD_KEY, None);

		assert_eq!(verifier.key_id(&no_kid), Err(TokenValidationError::MissingKeyId));
		assert!(matches!(
			verifier.key_id("definitely-not-a-jwt"),
			Err(TokenValidationError::Malformed { .. })
		));
	}

	#[test]
	fn display_name_falls_back_in_order() {
		let mut claims: GoogleClaims = serde_json::from_value(claims(CLIENT_ID.into(), 0))
			.expect("Claims fixture should decode.");

		claims.given_name = None;

		assert_eq!(claims.display_name(), "ada@example.com");

		claims.name = Some("Ada Lovelace".into());

		assert_eq!(claims.display_name(), "Ada Lovelace");

		claims.name = None;
		claims.email = None;

		assert_eq!(claims.display_name(), "1098765");
	}
}
