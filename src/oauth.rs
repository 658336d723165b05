//! `oauth2` facade for the GitHub authorization-code exchange.

// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::SecretString,
	config::ServiceConfig,
	error::{ConfigError, IdentityProviderError, ProviderStage, TransportError},
	http::{self, ProviderHttpClient, ResponseMetadataSlot},
};

type ExchangeClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const STAGE: ProviderStage = ProviderStage::GithubCodeExchange;

/// GitHub reports a bad or replayed code with HTTP 200 and an `error` body.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

pub(crate) struct CodeExchangeFacade {
	oauth_client: ExchangeClient,
	http_client: ProviderHttpClient,
}
impl CodeExchangeFacade {
	pub(crate) fn from_config(
		config: &ServiceConfig,
		http_client: ProviderHttpClient,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(config.endpoints.github_token.to_string())
			.map_err(|source| ConfigError::InvalidUrl { field: "github_token", source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.github.client_id.clone()))
			.set_client_secret(ClientSecret::new(
				config.github.client_secret.expose().to_owned(),
			))
			.set_auth_type(AuthType::RequestBody)
			.set_token_uri(token_url);

		Ok(Self { oauth_client, http_client })
	}

	/// Trades a one-time authorization code for a GitHub access token.
	pub(crate) async fn exchange_code(
		&self,
		code: &str,
	) -> Result<SecretString, IdentityProviderError> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take().and_then(|meta| meta.status), err))?;

		Ok(SecretString::new(response.access_token().secret().to_owned()))
	}
}

fn map_request_error(
	status: Option<u16>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> IdentityProviderError {
	match err {
		RequestTokenError::ServerResponse(response) => rejected(status, &response),
		RequestTokenError::Request(error) =>
			IdentityProviderError::Transport { stage: STAGE, source: map_transport_error(error) },
		RequestTokenError::Parse(source, body) =>
			match http::decode_json::<ProviderErrorBody>(&body) {
				Ok(payload) => IdentityProviderError::Rejected {
					stage: STAGE,
					status,
					message: payload.error_description.unwrap_or(payload.error),
				},
				Err(_) => IdentityProviderError::Transport {
					stage: STAGE,
					source: TransportError::Decode { source },
				},
			},
		RequestTokenError::Other(message) =>
			IdentityProviderError::Rejected { stage: STAGE, status, message },
	}
}

fn rejected(status: Option<u16>, response: &BasicErrorResponse) -> IdentityProviderError {
	let message = match response.error_description() {
		Some(description) => description.clone(),
		None => response.error().as_ref().to_owned(),
	};

	IdentityProviderError::Rejected { stage: STAGE, status, message }
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> TransportError {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::from(*inner),
		HttpClientError::Http(inner) => TransportError::network(inner),
		HttpClientError::Io(inner) => TransportError::Io(inner),
		HttpClientError::Other(message) => TransportError::Other { message },
		_ => TransportError::Other { message: "unrecognized HTTP client failure".into() },
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> ServiceConfig {
		ServiceConfig::builder()
			.secret("secret")
			.github_client("client-id", "client-secret")
			.google_client_id("google-id")
			.build()
			.expect("Configuration fixture should build.")
	}

	#[test]
	fn builds_request_body_client() {
		let facade = CodeExchangeFacade::from_config(&config(), ProviderHttpClient::default());

		assert!(facade.is_ok());
	}

	#[test]
	fn transport_errors_keep_their_shape() {
		let io = std::io::Error::other("socket closed");

		assert!(matches!(map_transport_error(HttpClientError::Io(io)), TransportError::Io(_)));
		assert!(matches!(
			map_transport_error(HttpClientError::Other("boom".into())),
			TransportError::Other { .. }
		));
	}
}
