//! Locally issued HS256 access and refresh tokens.
//!
//! Both token kinds carry the same claim set, `{ exp, id, userName }`, and differ only in their
//! lifetime. Verification never tells the caller why a token failed; the reason is logged through
//! [`obs::log_rejection`](crate::obs::log_rejection).

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::{SecretString, UserId},
	config::ServiceConfig,
	obs::{self, OperationKind},
};

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL: Duration = Duration::minutes(10);
/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL: Duration = Duration::hours(24);

/// Claim set embedded in every locally issued token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Expiry as Unix seconds.
	pub exp: i64,
	/// Authenticated user.
	pub id: UserId,
	/// Display name at the time the token was minted.
	#[serde(rename = "userName")]
	pub user_name: String,
}
impl TokenClaims {
	/// Returns the expiry as an [`OffsetDateTime`], when representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp).ok()
	}
}

/// Access/refresh pair handed to a client after login or refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
	/// Short-lived bearer credential.
	pub access_token: SecretString,
	/// Longer-lived credential accepted by [`TokenService::refresh`].
	pub refresh_token: SecretString,
	/// Access token lifetime in seconds.
	pub expires_in: i64,
}

/// Stateless signer/verifier for local tokens.
#[derive(Clone)]
pub struct TokenService {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
}
impl TokenService {
	/// Builds the service from the configured signing secret.
	pub fn new(config: &ServiceConfig) -> Self {
		Self::from_secret(config.secret.expose().as_bytes())
	}

	/// Builds the service from raw secret bytes.
	pub fn from_secret(secret: &[u8]) -> Self {
		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry is checked against an explicit clock in `decode_at`.
		validation.validate_exp = false;
		validation.leeway = 0;

		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation,
		}
	}

	/// Mints a fresh access/refresh pair for the user.
	pub fn issue_pair(&self, user_id: &UserId, user_name: &str) -> Result<TokenPair> {
		self.issue_pair_at(user_id, user_name, OffsetDateTime::now_utc())
	}

	/// Mints a pair as if the current time were `now`.
	pub fn issue_pair_at(
		&self,
		user_id: &UserId,
		user_name: &str,
		now: OffsetDateTime,
	) -> Result<TokenPair> {
		let access_token = self.sign(user_id, user_name, now + ACCESS_TOKEN_TTL)?;
		let refresh_token = self.sign(user_id, user_name, now + REFRESH_TOKEN_TTL)?;

		Ok(TokenPair {
			access_token,
			refresh_token,
			expires_in: ACCESS_TOKEN_TTL.whole_seconds(),
		})
	}

	/// Verifies a token and returns the user it names.
	pub fn verify(&self, token: &str) -> Result<UserId> {
		self.decode(token).map(|claims| claims.id)
	}

	/// Verifies a token and returns its full claim set.
	pub fn decode(&self, token: &str) -> Result<TokenClaims> {
		self.decode_at(token, OffsetDateTime::now_utc())
	}

	/// Verifies a token against the clock value `now`.
	pub fn decode_at(&self, token: &str, now: OffsetDateTime) -> Result<TokenClaims> {
		let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
			.map_err(|e| {
				obs::log_rejection(OperationKind::Authenticate, &e);

				Error::InvalidToken
			})?;

		if data.claims.exp <= now.unix_timestamp() {
			obs::log_rejection(OperationKind::Authenticate, &"token expired");

			return Err(Error::InvalidToken);
		}

		Ok(data.claims)
	}

	/// Verifies a refresh token and mints a new pair from its embedded identity.
	///
	/// Storage is not consulted; callers that need the user to still exist must check separately.
	pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
		let claims = self.decode(refresh_token)?;

		self.issue_pair(&claims.id, &claims.user_name)
	}

	fn sign(&self, user_id: &UserId, user_name: &str, exp: OffsetDateTime) -> Result<SecretString> {
		let claims = TokenClaims {
			exp: exp.unix_timestamp(),
			id: user_id.clone(),
			user_name: user_name.into(),
		};
		let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
			.map_err(|source| Error::Signing { source })?;

		Ok(SecretString::new(token))
	}
}
impl Debug for TokenService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenService").finish_non_exhaustive()
	}
}
