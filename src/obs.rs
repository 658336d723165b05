//! Optional observability helpers for authentication and rating operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `signalone.operation` with the `operation`
//!   and `stage` fields, plus debug events explaining why a token was rejected.
//! - Enable `metrics` to increment the `signalone_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// GitHub code exchange + profile login.
	GithubLogin,
	/// Google ID token login.
	GoogleLogin,
	/// Refresh token re-mint.
	Refresh,
	/// Bearer token verification.
	Authenticate,
	/// Issue score change.
	Rating,
	/// Log analysis ingestion.
	Ingestion,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::GithubLogin => "github_login",
			OperationKind::GoogleLogin => "google_login",
			OperationKind::Refresh => "refresh",
			OperationKind::Authenticate => "authenticate",
			OperationKind::Rating => "rating",
			OperationKind::Ingestion => "ingestion",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto [`OperationOutcome::Success`] or [`OperationOutcome::Failure`].
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure }
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
