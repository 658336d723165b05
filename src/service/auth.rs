//! Login, refresh, and bearer authentication.
//!
//! Both login paths converge on the same tail: resolve a [`ProviderIdentity`], find or create the
//! local user, then mint a token pair.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	config::ServiceConfig,
	directory::UserDirectory,
	error::ConfigError,
	http::ProviderHttpClient,
	identity::{GithubResolver, GoogleVerifier, ProviderIdentity},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	service::{GithubLoginRequest, GoogleLoginRequest, LoginResponse, RefreshRequest},
	store::UserStore,
	token::TokenService,
};

const BEARER: &str = "Bearer";

/// Entry point for every identity-establishing operation.
#[derive(Debug)]
pub struct AuthService {
	tokens: TokenService,
	directory: UserDirectory,
	github: GithubResolver,
	google: GoogleVerifier,
}
impl AuthService {
	/// Builds the service with an HTTP client honoring the configured timeout.
	pub fn new(config: &ServiceConfig, users: Arc<dyn UserStore>) -> Result<Self, ConfigError> {
		let http = ProviderHttpClient::with_timeout(config.request_timeout)?;

		Self::with_http_client(config, users, http)
	}

	/// Builds the service around a caller-supplied HTTP client.
	pub fn with_http_client(
		config: &ServiceConfig,
		users: Arc<dyn UserStore>,
		http: ProviderHttpClient,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			tokens: TokenService::new(config),
			directory: UserDirectory::new(users),
			github: GithubResolver::new(config, http.clone())?,
			google: GoogleVerifier::new(config, http),
		})
	}

	/// Token signer/verifier used by this service.
	pub fn tokens(&self) -> &TokenService {
		&self.tokens
	}

	/// User directory used by this service.
	pub fn directory(&self) -> &UserDirectory {
		&self.directory
	}

	/// Logs in with a GitHub authorization code.
	pub async fn login_with_github(&self, request: &GithubLoginRequest) -> Result<LoginResponse> {
		const KIND: OperationKind = OperationKind::GithubLogin;

		self.observe(KIND, "login_with_github", async {
			let identity = self.github.resolve(&request.code).await?;

			self.complete_login(&identity).await
		})
		.await
	}

	/// Logs in with a Google ID token.
	pub async fn login_with_google(&self, request: &GoogleLoginRequest) -> Result<LoginResponse> {
		const KIND: OperationKind = OperationKind::GoogleLogin;

		self.observe(KIND, "login_with_google", async {
			let identity = self.google.resolve(&request.id_token).await?;

			self.complete_login(&identity).await
		})
		.await
	}

	/// Mints a new pair from a refresh token whose user still exists.
	pub async fn refresh(&self, request: &RefreshRequest) -> Result<LoginResponse> {
		const KIND: OperationKind = OperationKind::Refresh;

		self.observe(KIND, "refresh", async {
			let claims = self.tokens.decode(request.refresh_token.trim())?;

			if self.directory.fetch(&claims.id).await?.is_none() {
				obs::log_rejection(KIND, &format!("{} no longer exists", claims.id));

				return Err(Error::InvalidToken);
			}

			Ok(self.tokens.issue_pair(&claims.id, &claims.user_name)?.into())
		})
		.await
	}

	/// Verifies an `Authorization` header value and returns the caller's identity.
	pub fn authenticate(&self, header: Option<&str>) -> Result<UserId> {
		let header = header.map(str::trim).filter(|value| !value.is_empty());
		let Some(header) = header else {
			return Err(Error::MissingCredentials);
		};
		let token = match header.split_once(' ') {
			Some((scheme, token)) if scheme.eq_ignore_ascii_case(BEARER) => token.trim(),
			_ => {
				obs::log_rejection(OperationKind::Authenticate, &"unsupported scheme");

				return Err(Error::InvalidToken);
			},
		};

		self.tokens.verify(token)
	}

	async fn complete_login(&self, identity: &ProviderIdentity) -> Result<LoginResponse> {
		let user = self.directory.find_or_create(identity).await?;

		Ok(self.tokens.issue_pair(&user.id, &user.name)?.into())
	}

	async fn observe<F>(
		&self,
		kind: OperationKind,
		stage: &'static str,
		fut: F,
	) -> Result<LoginResponse>
	where
		F: Future<Output = Result<LoginResponse>>,
	{
		let span = OperationSpan::new(kind, stage);

		obs::record_outcome(kind, OperationOutcome::Attempt);

		let result = span.instrument(fut).await;

		obs::record_outcome(kind, OperationOutcome::of(&result));

		result
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet, store::MemoryStore};

	fn service() -> AuthService {
		let config = _preludet::test_config("https://127.0.0.1:1");

		AuthService::with_http_client(
			&config,
			Arc::new(MemoryStore::default()),
			ProviderHttpClient::default(),
		)
		.expect("Auth service should build.")
	}

	#[test]
	fn missing_header_is_distinguished_from_bad_token() {
		let service = service();

		assert!(matches!(service.authenticate(None), Err(Error::MissingCredentials)));
		assert!(matches!(service.authenticate(Some("   ")), Err(Error::MissingCredentials)));
		assert!(matches!(service.authenticate(Some("Basic abc")), Err(Error::InvalidToken)));
		assert!(matches!(service.authenticate(Some("Bearer nope")), Err(Error::InvalidToken)));
	}

	#[test]
	fn bearer_scheme_is_case_insensitive() {
		let service = service();
		let id = UserId::new("github:9").expect("User fixture should be valid.");
		let pair = service.tokens().issue_pair(&id, "octocat").expect("Signing should succeed.");
		let header = format!("bearer {}", pair.access_token.expose());

		assert_eq!(service.authenticate(Some(&header)).expect("Token should verify."), id);
	}

	#[tokio::test]
	async fn refresh_for_vanished_user_is_rejected() {
		let service = service();
		let id = UserId::new("github:404").expect("User fixture should be valid.");
		let pair = service.tokens().issue_pair(&id, "ghost").expect("Signing should succeed.");
		let request = RefreshRequest { refresh_token: pair.refresh_token.expose().to_owned() };

		assert!(matches!(service.refresh(&request).await, Err(Error::InvalidToken)));
	}
}
