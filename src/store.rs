//! Storage contracts for users, issues, and saved analyses, plus the in-memory implementation.
//!
//! The traits ask only for point lookups, filtered scans, and conditional updates so any document
//! or relational backend can implement them. Filters arrive as a typed [`IssueSearchCriteria`];
//! translating it into a query language is the adapter's job.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{IssueId, UserId},
	model::{Issue, IssueSummary, SavedAnalysis, Score, Severity, User},
};

/// Boxed future returned by every store operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// User persistence.
pub trait UserStore
where
	Self: Send + Sync,
{
	/// Fetches a user by identifier.
	fn fetch<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<User>>;

	/// Inserts a user unless one with the same identifier already exists.
	fn insert(&self, user: User) -> StoreFuture<'_, InsertOutcome>;

	/// Atomically adds `delta` to the user's counter; `false` when no user matched.
	fn increment_counter<'a>(&'a self, id: &'a UserId, delta: i64) -> StoreFuture<'a, bool>;
}

/// Issue persistence.
pub trait IssueStore
where
	Self: Send + Sync,
{
	/// Persists a new issue.
	fn insert(&self, issue: Issue) -> StoreFuture<'_, ()>;

	/// Fetches an issue only when it belongs to `owner`.
	fn find_owned<'a>(
		&'a self,
		id: &'a IssueId,
		owner: &'a UserId,
	) -> StoreFuture<'a, Option<Issue>>;

	/// Returns one page of matching summaries, newest first, plus the total match count.
	fn search<'a>(&'a self, criteria: &'a IssueSearchCriteria) -> StoreFuture<'a, IssuePage>;

	/// Sets the score only if the stored value still equals `expected`.
	fn compare_and_swap_score<'a>(
		&'a self,
		id: &'a IssueId,
		owner: &'a UserId,
		expected: Score,
		replacement: Score,
	) -> StoreFuture<'a, ScoreSwapOutcome>;

	/// Marks the owner's issue resolved; `false` when no issue matched.
	fn mark_resolved<'a>(&'a self, id: &'a IssueId, owner: &'a UserId) -> StoreFuture<'a, bool>;

	/// Deletes the owner's issues recorded for the container and returns the count removed.
	fn delete_by_container<'a>(
		&'a self,
		owner: &'a UserId,
		container: &'a str,
	) -> StoreFuture<'a, u64>;

	/// Distinct container names across the owner's issues.
	fn distinct_containers<'a>(&'a self, owner: &'a UserId) -> StoreFuture<'a, Vec<String>>;
}

/// Write-once sink for analyses kept on behalf of free-tier users.
pub trait AnalysisStore
where
	Self: Send + Sync,
{
	/// Appends an analysis.
	fn save(&self, analysis: SavedAnalysis) -> StoreFuture<'_, ()>;
}

/// Result of [`UserStore::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
	/// The record was created.
	Inserted,
	/// A record with the same identifier already existed and was left untouched.
	Duplicate,
}

/// Result of a score compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSwapOutcome {
	/// The stored score matched and was replaced.
	Updated,
	/// The issue exists but its score changed since it was read.
	ScoreMismatch {
		/// Score currently stored.
		current: Score,
	},
	/// No issue matched the identifier + owner pair.
	Missing,
}

/// Page of search results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePage {
	/// Summaries on this page.
	pub issues: Vec<IssueSummary>,
	/// Number of issues matching the filter across all pages.
	#[serde(rename = "max")]
	pub total: u64,
}

/// Typed issue filter. Absent fields do not constrain the result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueSearchCriteria {
	/// Owner the issues must belong to.
	pub owner: Option<UserId>,
	/// Exact container name.
	pub container: Option<String>,
	/// Exact severity.
	pub severity: Option<Severity>,
	/// Exact classification label.
	pub issue_type: Option<String>,
	/// Resolution flag.
	pub resolved: Option<bool>,
	/// Inclusive lower timestamp bound.
	pub start: OffsetDateTime,
	/// Inclusive upper timestamp bound.
	pub end: OffsetDateTime,
	/// Matches to skip.
	pub offset: u64,
	/// Maximum matches to return.
	pub limit: u64,
}
impl IssueSearchCriteria {
	/// Returns `true` when `issue` satisfies every present filter and the timestamp range.
	pub fn matches(&self, issue: &Issue) -> bool {
		self.owner.as_ref().is_none_or(|owner| &issue.user_id == owner)
			&& self.container.as_ref().is_none_or(|name| &issue.container_name == name)
			&& self.severity.as_ref().is_none_or(|severity| &issue.severity == severity)
			&& self.issue_type.as_ref().is_none_or(|kind| issue.issue_type.as_ref() == Some(kind))
			&& self.resolved.is_none_or(|resolved| issue.is_resolved == resolved)
			// Both ends inclusive; an issue stamped exactly at `end` is in range.
			&& issue.timestamp >= self.start
			&& issue.timestamp <= self.end
	}
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
