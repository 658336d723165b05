//! Authentication, provider identity resolution, and issue rating core for the SignalOne
//! log-analysis service.
//!
//! The crate issues and verifies the service's own HS256 access/refresh tokens, establishes user
//! identity through GitHub (OAuth code exchange) or Google (signed ID tokens verified against the
//! provider key set), and keeps each user's rating counter consistent with the tri-state scores
//! stored on their issues.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod analysis;
pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod identity;
pub mod model;
pub mod obs;
pub mod rating;
pub mod search;
pub mod service;
pub mod store;
pub mod token;

mod oauth;

#[cfg(any(test, feature = "test"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit and integration tests; enabled via `cfg(test)`
	//! or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		analysis::{AnalysisBackend, AnalysisFuture, IssueAnalysis},
		config::ServiceConfig,
		http::ProviderHttpClient,
		service::{AuthService, IssueService},
		store::MemoryStore,
	};

	/// Shared secret used by test configurations.
	pub const TEST_SECRET: &str = "signalone-test-secret";
	/// Google client identifier expected in test ID tokens.
	pub const TEST_GOOGLE_CLIENT_ID: &str = "signalone-web.apps.googleusercontent.com";

	/// Builds a reqwest-backed provider client that accepts the self-signed certificates
	/// produced by `httpmock` during tests.
	pub fn test_http_client() -> ProviderHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ProviderHttpClient::with_client(client)
	}

	/// Builds a configuration whose provider endpoints all live under `base`.
	pub fn test_config(base: &str) -> ServiceConfig {
		let endpoint = |path: &str| {
			Url::parse(&format!("{}{path}", base.trim_end_matches('/')))
				.expect("Test endpoint should parse successfully.")
		};

		ServiceConfig::builder()
			.secret(TEST_SECRET)
			.github_client("github-client", "github-secret")
			.google_client_id(TEST_GOOGLE_CLIENT_ID)
			.github_token_endpoint(endpoint("/login/oauth/access_token"))
			.github_profile_endpoint(endpoint("/user"))
			.google_certs_endpoint(endpoint("/oauth2/v3/certs"))
			.analysis_endpoint(endpoint("/analysis"))
			.build()
			.expect("Test configuration should build successfully.")
	}

	/// Analysis backend returning a fixed result without touching the network.
	#[derive(Clone, Debug)]
	pub struct StaticAnalysisBackend(pub IssueAnalysis);
	impl Default for StaticAnalysisBackend {
		fn default() -> Self {
			Self(IssueAnalysis {
				title: "Connection pool exhausted".into(),
				log_summary: "The service ran out of database connections.".into(),
				predicted_solutions: "Raise the pool size or fix leaking handles.".into(),
				sources: vec!["https://docs.example.com/pooling".into()],
			})
		}
	}
	impl AnalysisBackend for StaticAnalysisBackend {
		fn analyze<'a>(&'a self, _logs: &'a str) -> AnalysisFuture<'a> {
			let analysis = self.0.clone();

			Box::pin(async move { Ok(analysis) })
		}
	}

	/// Wires an [`AuthService`] and [`IssueService`] over one shared [`MemoryStore`].
	pub fn build_memory_services(
		config: &ServiceConfig,
	) -> (AuthService, IssueService, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let auth = AuthService::with_http_client(config, store.clone(), test_http_client())
			.expect("Auth service should build from the test configuration.");
		let issues = IssueService::new(
			store.clone(),
			store.clone(),
			store.clone(),
			Arc::new(StaticAnalysisBackend::default()),
		);

		(auth, issues, store)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
