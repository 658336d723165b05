//! Wire shapes for login, refresh, rating, and ingestion requests.

// self
use crate::{_prelude::*, auth::IssueId, token::TokenPair};

const SUCCESS: &str = "Success";

/// GitHub login body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubLoginRequest {
	/// One-time authorization code from the OAuth redirect.
	pub code: String,
}

/// Google login body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
	/// Google-issued ID token.
	pub id_token: String,
}

/// Refresh body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
	/// Refresh token from an earlier login or refresh.
	pub refresh_token: String,
}

/// Rating body. A `null` or absent score is rejected by the rating engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateIssueRequest {
	/// Requested score.
	#[serde(default)]
	pub score: Option<i64>,
}

/// Log ingestion body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogAnalysisRequest {
	/// Container the logs came from.
	pub container_name: String,
	/// Newline-separated raw logs.
	pub logs: String,
}

/// Body returned by every login and refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	/// Always `"Success"`.
	pub message: String,
	/// Signed access token.
	pub access_token: String,
	/// Signed refresh token.
	pub refresh_token: String,
	/// Access token lifetime in seconds.
	pub expires_in: i64,
}
impl From<TokenPair> for LoginResponse {
	fn from(pair: TokenPair) -> Self {
		Self {
			message: SUCCESS.into(),
			access_token: pair.access_token.expose().to_owned(),
			refresh_token: pair.refresh_token.expose().to_owned(),
			expires_in: pair.expires_in,
		}
	}
}

/// Body returned after a successful ingestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReceipt {
	/// Always `"Success"`.
	pub message: String,
	/// Identifier of the stored issue.
	pub issue_id: IssueId,
}
impl AnalysisReceipt {
	pub(crate) fn new(issue_id: IssueId) -> Self {
		Self { message: SUCCESS.into(), issue_id }
	}
}
