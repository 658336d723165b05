//! GitHub login: authorization-code exchange followed by a profile fetch.

// self
use crate::{
	_prelude::*,
	auth::ProviderKind,
	config::ServiceConfig,
	error::{ConfigError, IdentityProviderError, ProviderStage, ValidationError},
	http::ProviderHttpClient,
	identity::ProviderIdentity,
	oauth::CodeExchangeFacade,
};

#[derive(Debug, Deserialize)]
struct GithubProfile {
	id: u64,
	login: String,
}

/// Resolves a GitHub authorization code into the authenticated user's identity.
pub struct GithubResolver {
	exchange: CodeExchangeFacade,
	http: ProviderHttpClient,
	profile_endpoint: Url,
}
impl GithubResolver {
	/// Builds a resolver from configured credentials and endpoints.
	pub fn new(config: &ServiceConfig, http: ProviderHttpClient) -> Result<Self, ConfigError> {
		Ok(Self {
			exchange: CodeExchangeFacade::from_config(config, http.clone())?,
			http,
			profile_endpoint: config.endpoints.github_profile.clone(),
		})
	}

	/// Exchanges `code` for a provider token, then reads the profile it grants access to.
	pub async fn resolve(&self, code: &str) -> Result<ProviderIdentity> {
		let code = code.trim();

		if code.is_empty() {
			return Err(ValidationError::EmptyField { field: "code" }.into());
		}

		let access_token = self.exchange.exchange_code(code).await?;
		let profile = self
			.http
			.get_json::<GithubProfile>(&self.profile_endpoint, Some(access_token.expose()))
			.await
			.map_err(|source| IdentityProviderError::Transport {
				stage: ProviderStage::GithubProfile,
				source,
			})?;

		Ok(ProviderIdentity {
			provider: ProviderKind::Github,
			subject: profile.id.to_string(),
			display_name: profile.login,
		})
	}
}
impl Debug for GithubResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GithubResolver")
			.field("profile_endpoint", &self.profile_endpoint.as_str())
			.finish_non_exhaustive()
	}
}
