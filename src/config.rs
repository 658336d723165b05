//! Process-wide settings built once at startup and passed by reference to each service.
//!
//! [`ServiceConfig`] carries the token signing secret, GitHub/Google client credentials, and the
//! provider endpoints. Build it with [`ServiceConfig::builder`] or load it from the environment
//! with [`ServiceConfig::from_env`]; both paths run the same validation.

// self
use crate::{_prelude::*, auth::SecretString, error::ConfigError};

/// GitHub endpoint that exchanges an authorization code for an access token.
pub const DEFAULT_GITHUB_TOKEN_ENDPOINT: &str = "https://github.com/login/oauth/access_token";
/// GitHub endpoint returning the authenticated user's profile.
pub const DEFAULT_GITHUB_PROFILE_ENDPOINT: &str = "https://api.github.com/user";
/// Google JSON Web Key Set used to verify ID tokens.
pub const DEFAULT_GOOGLE_CERTS_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/certs";
/// Outbound request timeout applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

const ENV_SECRET: &str = "SIGNALONE_SECRET";
const ENV_GITHUB_CLIENT_ID: &str = "GITHUB_CLIENT_ID";
const ENV_GITHUB_CLIENT_SECRET: &str = "GITHUB_CLIENT_SECRET";
const ENV_GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
const ENV_ANALYSIS_URL: &str = "ANALYSIS_URL";
const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

/// GitHub OAuth App credentials.
#[derive(Clone, Debug)]
pub struct GithubCredentials {
	/// OAuth App client identifier.
	pub client_id: String,
	/// OAuth App client secret.
	pub client_secret: SecretString,
}

/// Provider endpoints contacted during login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
	/// GitHub code-exchange endpoint.
	pub github_token: Url,
	/// GitHub authenticated-user endpoint.
	pub github_profile: Url,
	/// Google key set endpoint.
	pub google_certs: Url,
}

/// Validated service configuration.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
	/// HMAC secret for locally issued tokens; never rotated within a process lifetime.
	pub secret: SecretString,
	/// GitHub OAuth App credentials.
	pub github: GithubCredentials,
	/// Client identifier Google ID tokens must name in `aud`.
	pub google_client_id: String,
	/// Provider endpoints.
	pub endpoints: ProviderEndpoints,
	/// Analysis backend endpoint, when log ingestion is enabled.
	pub analysis_endpoint: Option<Url>,
	/// Timeout applied to every outbound request.
	pub request_timeout: StdDuration,
}
impl ServiceConfig {
	/// Returns an empty builder.
	pub fn builder() -> ServiceConfigBuilder {
		ServiceConfigBuilder::default()
	}

	/// Loads the configuration from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads the configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let require = |name: &'static str| {
			lookup(name).ok_or(ConfigError::MissingVariable { name })
		};
		let mut builder = Self::builder()
			.secret(require(ENV_SECRET)?)
			.github_client(require(ENV_GITHUB_CLIENT_ID)?, require(ENV_GITHUB_CLIENT_SECRET)?)
			.google_client_id(require(ENV_GOOGLE_CLIENT_ID)?);

		if let Some(raw) = lookup(ENV_ANALYSIS_URL) {
			let url = Url::parse(&raw)
				.map_err(|source| ConfigError::InvalidUrl { field: "analysis_endpoint", source })?;

			builder = builder.analysis_endpoint(url);
		}
		if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
			let secs = raw
				.trim()
				.parse::<u64>()
				.map_err(|_| ConfigError::InvalidTimeout { value: raw.clone() })?;

			builder = builder.request_timeout(StdDuration::from_secs(secs));
		}

		builder.build()
	}
}

/// Builder for [`ServiceConfig`] values.
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
	secret: Option<SecretString>,
	github_client_id: Option<String>,
	github_client_secret: Option<SecretString>,
	google_client_id: Option<String>,
	github_token_endpoint: Option<Url>,
	github_profile_endpoint: Option<Url>,
	google_certs_endpoint: Option<Url>,
	analysis_endpoint: Option<Url>,
	request_timeout: Option<StdDuration>,
}
impl ServiceConfigBuilder {
	/// Sets the token signing secret.
	pub fn secret(mut self, secret: impl Into<SecretString>) -> Self {
		self.secret = Some(secret.into());

		self
	}

	/// Sets the GitHub OAuth App credentials.
	pub fn github_client(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<SecretString>,
	) -> Self {
		self.github_client_id = Some(client_id.into());
		self.github_client_secret = Some(client_secret.into());

		self
	}

	/// Sets the Google client identifier.
	pub fn google_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.google_client_id = Some(client_id.into());

		self
	}

	/// Overrides the GitHub code-exchange endpoint.
	pub fn github_token_endpoint(mut self, url: Url) -> Self {
		self.github_token_endpoint = Some(url);

		self
	}

	/// Overrides the GitHub profile endpoint.
	pub fn github_profile_endpoint(mut self, url: Url) -> Self {
		self.github_profile_endpoint = Some(url);

		self
	}

	/// Overrides the Google key set endpoint.
	pub fn google_certs_endpoint(mut self, url: Url) -> Self {
		self.google_certs_endpoint = Some(url);

		self
	}

	/// Sets the analysis backend endpoint.
	pub fn analysis_endpoint(mut self, url: Url) -> Self {
		self.analysis_endpoint = Some(url);

		self
	}

	/// Overrides the outbound request timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ServiceConfig, ConfigError> {
		let secret = self.secret.unwrap_or_default();

		if secret.is_blank() {
			return Err(ConfigError::EmptyValue { field: "secret" });
		}

		let client_id = non_empty("github_client_id", self.github_client_id)?;
		let client_secret = self.github_client_secret.unwrap_or_default();

		if client_secret.is_blank() {
			return Err(ConfigError::EmptyValue { field: "github_client_secret" });
		}

		let google_client_id = non_empty("google_client_id", self.google_client_id)?;
		let endpoints = ProviderEndpoints {
			github_token: endpoint_or_default(
				"github_token",
				self.github_token_endpoint,
				DEFAULT_GITHUB_TOKEN_ENDPOINT,
			)?,
			github_profile: endpoint_or_default(
				"github_profile",
				self.github_profile_endpoint,
				DEFAULT_GITHUB_PROFILE_ENDPOINT,
			)?,
			google_certs: endpoint_or_default(
				"google_certs",
				self.google_certs_endpoint,
				DEFAULT_GOOGLE_CERTS_ENDPOINT,
			)?,
		};

		if let Some(url) = self.analysis_endpoint.as_ref() {
			validate_endpoint("analysis", url)?;
		}

		let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);

		if request_timeout.is_zero() {
			return Err(ConfigError::InvalidTimeout { value: "0".into() });
		}

		Ok(ServiceConfig {
			secret,
			github: GithubCredentials { client_id, client_secret },
			google_client_id,
			endpoints,
			analysis_endpoint: self.analysis_endpoint,
			request_timeout,
		})
	}
}

fn non_empty(field: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	match value {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(ConfigError::EmptyValue { field }),
	}
}

fn endpoint_or_default(
	name: &'static str,
	url: Option<Url>,
	default: &str,
) -> Result<Url, ConfigError> {
	let url = match url {
		Some(url) => url,
		None =>
			Url::parse(default).map_err(|source| ConfigError::InvalidUrl { field: name, source })?,
	};

	validate_endpoint(name, &url)?;

	Ok(url)
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
