//! Log analysis collaborator.
//!
//! The analysis backend is opaque: it receives raw logs and returns a title, a summary, and
//! predicted solutions. [`HttpAnalysisBackend`] talks to it over JSON; tests plug in their own
//! [`AnalysisBackend`].

// self
use crate::{_prelude::*, config::ServiceConfig, error::ConfigError, http::ProviderHttpClient};

/// Boxed future returned by [`AnalysisBackend::analyze`].
pub type AnalysisFuture<'a> = Pin<Box<dyn Future<Output = Result<IssueAnalysis>> + 'a + Send>>;

/// Structured result of analyzing a batch of logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAnalysis {
	/// Short headline.
	pub title: String,
	/// Summary of what the logs show.
	pub log_summary: String,
	/// Suggested remediation.
	pub predicted_solutions: String,
	/// References backing the suggestion.
	#[serde(default)]
	pub sources: Vec<String>,
}

/// Turns raw logs into an [`IssueAnalysis`].
pub trait AnalysisBackend
where
	Self: Send + Sync,
{
	/// Analyzes the provided logs.
	fn analyze<'a>(&'a self, logs: &'a str) -> AnalysisFuture<'a>;
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
	logs: &'a str,
}

/// Backend reached over HTTP with a `{"logs": ...}` JSON body.
#[derive(Clone, Debug)]
pub struct HttpAnalysisBackend {
	http: ProviderHttpClient,
	endpoint: Url,
}
impl HttpAnalysisBackend {
	/// Targets `endpoint` through `http`.
	pub fn new(http: ProviderHttpClient, endpoint: Url) -> Self {
		Self { http, endpoint }
	}

	/// Builds a backend from the configured endpoint and timeout, if an endpoint is configured.
	pub fn from_config(config: &ServiceConfig) -> Result<Option<Self>, ConfigError> {
		let Some(endpoint) = config.analysis_endpoint.clone() else {
			return Ok(None);
		};
		let http = ProviderHttpClient::with_timeout(config.request_timeout)?;

		Ok(Some(Self::new(http, endpoint)))
	}
}
impl AnalysisBackend for HttpAnalysisBackend {
	fn analyze<'a>(&'a self, logs: &'a str) -> AnalysisFuture<'a> {
		Box::pin(async move {
			let analysis = self.http.post_json(&self.endpoint, &AnalysisRequest { logs }).await?;

			Ok(analysis)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::{_preludet, error::TransportError};

	fn backend(server: &MockServer) -> HttpAnalysisBackend {
		let endpoint = Url::parse(&server.url("/analysis")).expect("Mock URL should parse.");

		HttpAnalysisBackend::new(_preludet::test_http_client(), endpoint)
	}

	#[tokio::test]
	async fn posts_logs_and_decodes_camel_case_result() {
		let server = MockServer::start_async().await;
		let mock = server
			.mock_async(|when, then| {
				when.method(POST)
					.path("/analysis")
					.json_body(serde_json::json!({ "logs": "oom\nkilled" }));
				then.status(200).header("content-type", "application/json").body(
					r#"{"title":"OOM","logSummary":"Killed by the kernel.","predictedSolutions":"Raise the memory limit."}"#,
				);
			})
			.await;
		let analysis =
			backend(&server).analyze("oom\nkilled").await.expect("Analysis should decode.");

		mock.assert_async().await;

		assert_eq!(analysis.title, "OOM");
		assert_eq!(analysis.log_summary, "Killed by the kernel.");
		assert!(analysis.sources.is_empty());
	}

	#[test]
	fn from_config_requires_an_endpoint() {
		let builder = || {
			ServiceConfig::builder()
				.secret("secret")
				.github_client("id", "secret")
				.google_client_id("google")
		};
		let without = builder().build().expect("Configuration fixture should build.");
		let with = builder()
			.analysis_endpoint(Url::parse("https://analysis.example.com/v1").expect("URL parses."))
			.build()
			.expect("Configuration fixture should build.");

		assert!(HttpAnalysisBackend::from_config(&without).expect("Builds.").is_none());

		let backend = HttpAnalysisBackend::from_config(&with)
			.expect("Builds.")
			.expect("Endpoint should be configured.");

		assert_eq!(backend.endpoint.as_str(), "https://analysis.example.com/v1");
	}

	#[tokio::test]
	async fn backend_failure_is_a_transport_error() {
		let server = MockServer::start_async().await;

		server
			.mock_async(|when, then| {
				when.method(POST).path("/analysis");
				then.status(502).body("bad gateway");
			})
			.await;

		let err = backend(&server).analyze("logs").await.expect_err("502 should fail.");

		assert!(matches!(
			err,
			Error::Transport(TransportError::UnexpectedStatus { status: 502, .. })
		));
	}
}
