//! Outbound HTTP for identity providers and the analysis backend.
//!
//! [`ProviderHttpClient`] wraps a reqwest client and offers two faces: plain JSON helpers used
//! for profile, key set, and analysis calls, and an [`InstrumentedHandle`] that satisfies
//! `oauth2`'s [`AsyncHttpClient`] so the GitHub code exchange can run through the `oauth2` crate
//! while the last response status lands in a [`ResponseMetadataSlot`] for error reporting.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

const BODY_PREVIEW_LIMIT: usize = 256;
const CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so outbound provider behavior lives in one place.
///
/// Each call is a single attempt; failures surface to the caller without retries.
#[derive(Clone, Debug, Default)]
pub struct ProviderHttpClient(pub ReqwestClient);
impl ProviderHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that gives up after `timeout` and never follows redirects.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.user_agent(CLIENT_USER_AGENT)
			.build()?;

		Ok(Self(client))
	}

	/// Builds an `oauth2` handle that records response metadata into `slot`.
	pub fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}

	/// Issues a GET and decodes a successful JSON response.
	pub async fn get_json<T>(&self, url: &Url, bearer: Option<&str>) -> Result<T, TransportError>
	where
		T: DeserializeOwned,
	{
		let mut request = self
			.0
			.get(url.clone())
			.header(ACCEPT, "application/json")
			.header(USER_AGENT, CLIENT_USER_AGENT);

		if let Some(token) = bearer {
			request = request.bearer_auth(token);
		}

		read_json(request.send().await?).await
	}

	/// Issues a JSON POST and decodes a successful JSON response.
	pub async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T, TransportError>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		let request = self
			.0
			.post(url.clone())
			.header(ACCEPT, "application/json")
			.header(USER_AGENT, CLIENT_USER_AGENT)
			.json(body);

		read_json(request.send().await?).await
	}
}
impl AsRef<ReqwestClient> for ProviderHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ProviderHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// `oauth2` transport handle returned by [`ProviderHttpClient::instrumented`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Decodes a JSON body, reporting the failing field path on mismatch.
pub fn decode_json<T>(body: &[u8]) -> Result<T, TransportError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransportError::Decode { source })
}

/// Truncates a response body for inclusion in error messages.
pub fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	let mut buf = text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

async fn read_json<T>(response: reqwest::Response) -> Result<T, TransportError>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let body = response.bytes().await?;

	if !status.is_success() {
		return Err(TransportError::UnexpectedStatus {
			status: status.as_u16(),
			body_preview: body_preview(&body),
		});
	}

	decode_json(&body)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Profile {
		#[allow(dead_code)]
		id: u64,
	}

	#[test]
	fn decode_reports_field_path() {
		let err = decode_json::<Profile>(br#"{"id":"not-a-number"}"#)
			.expect_err("String id must fail to decode.");

		match err {
			TransportError::Decode { source } => assert_eq!(source.path().to_string(), "id"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn previews_are_truncated() {
		let long = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let preview = body_preview(long.as_bytes());

		assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
		assert_eq!(body_preview(b"short"), "short");
	}

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
		assert!(slot.take().is_none());
	}
}
