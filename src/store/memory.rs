//! Thread-safe in-memory store for local development and tests.

// std
use std::collections::BTreeSet;
// self
use crate::{
	_prelude::*,
	auth::{IssueId, UserId},
	model::{Issue, IssueSummary, SavedAnalysis, Score, User},
	store::{
		AnalysisStore, InsertOutcome, IssuePage, IssueSearchCriteria, IssueStore, ScoreSwapOutcome,
		StoreError, StoreFuture, UserStore,
	},
};

#[derive(Debug, Default)]
struct MemoryState {
	users: HashMap<UserId, User>,
	issues: HashMap<IssueId, Issue>,
	analyses: Vec<SavedAnalysis>,
}

/// Keeps users, issues, and saved analyses in-process behind one lock.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<MemoryState>>);
impl MemoryStore {
	/// Snapshot of every saved analysis in insertion order.
	pub fn saved_analyses(&self) -> Vec<SavedAnalysis> {
		self.0.read().analyses.clone()
	}

	/// Number of stored issues.
	pub fn issue_count(&self) -> usize {
		self.0.read().issues.len()
	}

	fn insert_user_now(&self, user: User) -> InsertOutcome {
		let mut state = self.0.write();

		if state.users.contains_key(&user.id) {
			return InsertOutcome::Duplicate;
		}

		state.users.insert(user.id.clone(), user);

		InsertOutcome::Inserted
	}

	fn increment_now(&self, id: &UserId, delta: i64) -> bool {
		match self.0.write().users.get_mut(id) {
			Some(user) => {
				user.counter += delta;

				true
			},
			None => false,
		}
	}

	fn insert_issue_now(&self, issue: Issue) -> Result<(), StoreError> {
		let mut state = self.0.write();

		if state.issues.contains_key(&issue.id) {
			let message = format!("issue {} already exists", issue.id);

			return Err(StoreError::Backend { message });
		}

		state.issues.insert(issue.id.clone(), issue);

		Ok(())
	}

	fn search_now(&self, criteria: &IssueSearchCriteria) -> IssuePage {
		let state = self.0.read();
		let mut matched =
			state.issues.values().filter(|issue| criteria.matches(issue)).collect::<Vec<_>>();

		matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));

		let total = matched.len() as u64;
		let issues = matched
			.into_iter()
			.skip(usize::try_from(criteria.offset).unwrap_or(usize::MAX))
			.take(usize::try_from(criteria.limit).unwrap_or(usize::MAX))
			.map(IssueSummary::from)
			.collect();

		IssuePage { issues, total }
	}

	fn cas_score_now(
		&self,
		id: &IssueId,
		owner: &UserId,
		expected: Score,
		replacement: Score,
	) -> ScoreSwapOutcome {
		let mut state = self.0.write();

		match state.issues.get_mut(id) {
			Some(issue) if &issue.user_id == owner && issue.score == expected => {
				issue.score = replacement;

				ScoreSwapOutcome::Updated
			},
			Some(issue) if &issue.user_id == owner =>
				ScoreSwapOutcome::ScoreMismatch { current: issue.score },
			_ => ScoreSwapOutcome::Missing,
		}
	}

	fn resolve_now(&self, id: &IssueId, owner: &UserId) -> bool {
		match self.0.write().issues.get_mut(id).filter(|issue| &issue.user_id == owner) {
			Some(issue) => {
				issue.is_resolved = true;

				true
			},
			None => false,
		}
	}

	fn delete_container_now(&self, owner: &UserId, container: &str) -> u64 {
		let mut state = self.0.write();
		let before = state.issues.len();

		state
			.issues
			.retain(|_, issue| &issue.user_id != owner || issue.container_name != container);

		(before - state.issues.len()) as u64
	}

	fn containers_now(&self, owner: &UserId) -> Vec<String> {
		self.0
			.read()
			.issues
			.values()
			.filter(|issue| &issue.user_id == owner)
			.map(|issue| issue.container_name.clone())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}
}
impl UserStore for MemoryStore {
	fn fetch<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<User>> {
		Box::pin(async move { Ok(self.0.read().users.get(id).cloned()) })
	}

	fn insert(&self, user: User) -> StoreFuture<'_, InsertOutcome> {
		Box::pin(async move { Ok(self.insert_user_now(user)) })
	}

	fn increment_counter<'a>(&'a self, id: &'a UserId, delta: i64) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.increment_now(id, delta)) })
	}
}
impl IssueStore for MemoryStore {
	fn insert(&self, issue: Issue) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.insert_issue_now(issue) })
	}

	fn find_owned<'a>(
		&'a self,
		id: &'a IssueId,
		owner: &'a UserId,
	) -> StoreFuture<'a, Option<Issue>> {
		Box::pin(async move {
			Ok(self.0.read().issues.get(id).filter(|issue| &issue.user_id == owner).cloned())
		})
	}

	fn search<'a>(&'a self, criteria: &'a IssueSearchCriteria) -> StoreFuture<'a, IssuePage> {
		Box::pin(async move { Ok(self.search_now(criteria)) })
	}

	fn compare_and_swap_score<'a>(
		&'a self,
		id: &'a IssueId,
		owner: &'a UserId,
		expected: Score,
		replacement: Score,
	) -> StoreFuture<'a, ScoreSwapOutcome> {
		Box::pin(async move { Ok(self.cas_score_now(id, owner, expected, replacement)) })
	}

	fn mark_resolved<'a>(&'a self, id: &'a IssueId, owner: &'a UserId) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.resolve_now(id, owner)) })
	}

	fn delete_by_container<'a>(
		&'a self,
		owner: &'a UserId,
		container: &'a str,
	) -> StoreFuture<'a, u64> {
		Box::pin(async move { Ok(self.delete_container_now(owner, container)) })
	}

	fn distinct_containers<'a>(&'a self, owner: &'a UserId) -> StoreFuture<'a, Vec<String>> {
		Box::pin(async move { Ok(self.containers_now(owner)) })
	}
}
impl AnalysisStore for MemoryStore {
	fn save(&self, analysis: SavedAnalysis) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().analyses.push(analysis);

			Ok(())
		})
	}
}
