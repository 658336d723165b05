//! Logs in through a mocked GitHub, authenticates the issued access token, ingests a batch of
//! logs, and rates the resulting issue.
//!
//! Run with `cargo run --example github_login --features test`.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use signalone_core::{
	_preludet,
	analysis::{AnalysisBackend, AnalysisFuture, IssueAnalysis},
	auth::IssueId,
	config::ServiceConfig,
	service::{AuthService, GithubLoginRequest, IssueService, LogAnalysisRequest, RateIssueRequest},
	store::MemoryStore,
};

struct CannedAnalysis;
impl AnalysisBackend for CannedAnalysis {
	fn analyze<'a>(&'a self, logs: &'a str) -> AnalysisFuture<'a> {
		let lines = logs.lines().count();

		Box::pin(async move {
			Ok(IssueAnalysis {
				title: format!("{lines} suspicious log lines"),
				log_summary: "Upstream refused connections.".into(),
				predicted_solutions: "Check the upstream health check.".into(),
				sources: Vec::new(),
			})
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/login/oauth/access_token")
				.form_urlencoded_tuple("code", "demo-code");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"gho_demo","token_type":"bearer","scope":"read:user"}"#);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/user").header("authorization", "Bearer gho_demo");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":583231,"login":"octocat"}"#);
		})
		.await;
	let config = ServiceConfig::builder()
		.secret("demo-signing-secret")
		.github_client("demo-client", "demo-secret")
		.google_client_id("demo.apps.googleusercontent.com")
		.github_token_endpoint(Url::parse(&server.url("/login/oauth/access_token"))?)
		.github_profile_endpoint(Url::parse(&server.url("/user"))?)
		.build()?;
	let store = Arc::new(MemoryStore::default());
	// httpmock serves a self-signed certificate.
	let auth = AuthService::with_http_client(&config, store.clone(), _preludet::test_http_client())?;
	let issues = IssueService::new(store.clone(), store.clone(), store, Arc::new(CannedAnalysis));
	let login = auth.login_with_github(&GithubLoginRequest { code: "demo-code".into() }).await?;
	let user = auth.authenticate(Some(&format!("Bearer {}", login.access_token)))?;

	println!("Logged in as {user}; access token expires in {}s.", login.expires_in);

	let receipt = issues
		.analyze_logs(
			&user,
			&LogAnalysisRequest {
				container_name: "checkout".into(),
				logs: "connect ECONNREFUSED\nretrying\nconnect ECONNREFUSED".into(),
			},
		)
		.await?;
	let issue_id: IssueId = receipt.issue_id;
	let outcome = issues.rate_issue(&user, &issue_id, &RateIssueRequest { score: Some(1) }).await?;

	println!("Rated {issue_id}: {outcome:?}.");

	token_mock.assert_async().await;
	profile_mock.assert_async().await;

	Ok(())
}
