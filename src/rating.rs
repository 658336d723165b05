//! Tri-state issue rating and the per-user counter it drives.
//!
//! A rating moves an issue's score from `current` to `requested` and adds
//! `requested - current` to the owner's counter. Submitting the score already stored is a no-op,
//! so retries never double count. The score write is a compare-and-swap against the value that was
//! read, retried a bounded number of times, and ratings of the same issue are serialized through a
//! per-issue guard. The counter update is a single atomic increment; it is not rolled back when it
//! fails after the score write.

// self
use crate::{
	_prelude::*,
	auth::{IssueId, UserId},
	error::ValidationError,
	model::Score,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	store::{IssueStore, ScoreSwapOutcome, UserStore},
};

/// Compare-and-swap attempts before a rating gives up with [`Error::Conflict`].
pub const MAX_SCORE_ATTEMPTS: usize = 3;

/// Result of a successful rating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingOutcome {
	/// The issue already carried the requested score; nothing was written.
	Unchanged,
	/// The score changed and the counter moved by `delta`.
	Rated {
		/// Score before the change.
		previous: Score,
		/// Score after the change.
		current: Score,
		/// Amount added to the owner's counter.
		delta: i64,
	},
}

/// Counter change for a score transition.
///
/// | from | to | delta |
/// |------|----|-------|
/// | 0 | 1 | +1 |
/// | 0 | -1 | -1 |
/// | 1 | -1 | -2 |
/// | -1 | 1 | +2 |
/// | 1 | 0 | -1 |
/// | -1 | 0 | +1 |
pub const fn counter_delta(current: Score, requested: Score) -> i64 {
	current.delta_to(requested)
}

/// Applies rating requests against issue and user storage.
pub struct RatingEngine {
	issues: Arc<dyn IssueStore>,
	users: Arc<dyn UserStore>,
	guards: Mutex<HashMap<IssueId, Arc<AsyncMutex<()>>>>,
}
impl RatingEngine {
	/// Wires the engine to its stores.
	pub fn new(issues: Arc<dyn IssueStore>, users: Arc<dyn UserStore>) -> Self {
		Self { issues, users, guards: Default::default() }
	}

	/// Validates a raw score, then applies it.
	///
	/// A missing score is a validation failure and an out-of-range one fails with
	/// [`ValidationError::InvalidScore`]; neither touches storage.
	pub async fn rate(
		&self,
		user: &UserId,
		issue: &IssueId,
		requested: Option<i64>,
	) -> Result<RatingOutcome> {
		let raw = requested.ok_or(ValidationError::MissingField { field: "score" })?;
		let score = Score::new(raw)?;

		self.apply(user, issue, score).await
	}

	/// Moves the issue to `requested` and adjusts the owner's counter.
	///
	/// Issues owned by someone else are reported as [`Error::NotFound`].
	pub async fn apply(
		&self,
		user: &UserId,
		issue: &IssueId,
		requested: Score,
	) -> Result<RatingOutcome> {
		const KIND: OperationKind = OperationKind::Rating;

		let span = OperationSpan::new(KIND, "apply");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				if self.users.fetch(user).await?.is_none() {
					return Err(Error::not_found("User"));
				}

				let lease = self.lease(issue);
				let outcome = {
					let _serialized = lease.guard.lock().await;

					self.swap_score(user, issue, requested).await
				};

				drop(lease);

				let outcome = outcome?;

				let RatingOutcome::Rated { delta, .. } = outcome else {
					return Ok(outcome);
				};

				if !self.users.increment_counter(user, delta).await? {
					obs::log_inconsistency(
						KIND,
						&format!("score of {issue} changed but {user} no longer exists"),
					);

					return Err(Error::not_found("User"));
				}

				Ok(outcome)
			})
			.await;

		obs::record_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	async fn swap_score(
		&self,
		user: &UserId,
		issue: &IssueId,
		requested: Score,
	) -> Result<RatingOutcome> {
		let mut current = self
			.issues
			.find_owned(issue, user)
			.await?
			.ok_or(Error::not_found("Issue"))?
			.score;

		for _ in 0..MAX_SCORE_ATTEMPTS {
			if current == requested {
				return Ok(RatingOutcome::Unchanged);
			}

			match self.issues.compare_and_swap_score(issue, user, current, requested).await? {
				ScoreSwapOutcome::Updated =>
					return Ok(RatingOutcome::Rated {
						previous: current,
						current: requested,
						delta: counter_delta(current, requested),
					}),
				ScoreSwapOutcome::ScoreMismatch { current: observed } => current = observed,
				ScoreSwapOutcome::Missing => return Err(Error::not_found("Issue")),
			}
		}

		Err(Error::Conflict { entity: "Issue" })
	}

	fn lease(&self, issue: &IssueId) -> IssueLease<'_> {
		let guard = self
			.guards
			.lock()
			.entry(issue.clone())
			.or_insert_with(|| Arc::new(AsyncMutex::new(())))
			.clone();

		IssueLease { engine: self, issue: issue.clone(), guard }
	}
}
impl Debug for RatingEngine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RatingEngine").field("guards", &self.guards.lock().len()).finish()
	}
}

/// Shared handle on one issue's guard; the map entry is pruned when the last lease drops, even if
/// the rating future was cancelled while waiting.
struct IssueLease<'a> {
	engine: &'a RatingEngine,
	issue: IssueId,
	guard: Arc<AsyncMutex<()>>,
}
impl Drop for IssueLease<'_> {
	fn drop(&mut self) {
		let mut guards = self.engine.guards.lock();

		// Map entry plus ours means nobody else is waiting.
		if Arc::strong_count(&self.guard) == 2 {
			guards.remove(&self.issue);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::ProviderKind,
		model::{Issue, Severity, User},
		store::{InsertOutcome, MemoryStore, StoreFuture},
	};

	/// Finds the user on read but never on increment, as if it were deleted mid-rating.
	struct VanishingUsers(Arc<MemoryStore>);
	impl UserStore for VanishingUsers {
		fn fetch<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<User>> {
			UserStore::fetch(&*self.0, id)
		}

		fn insert(&self, user: User) -> StoreFuture<'_, InsertOutcome> {
			UserStore::insert(&*self.0, user)
		}

		fn increment_counter<'a>(&'a self, _id: &'a UserId, _delta: i64) -> StoreFuture<'a, bool> {
			Box::pin(async { Ok(false) })
		}
	}

	async fn seeded(score: Score) -> (Arc<MemoryStore>, RatingEngine, UserId, IssueId) {
		let store = Arc::new(MemoryStore::default());
		let user = UserId::qualified(ProviderKind::Github, "1").expect("User id should be valid.");
		let issue = IssueId::generate();

		UserStore::insert(&*store, User::new(user.clone(), "octocat", ProviderKind::Github))
			.await
			.expect("User insert should succeed.");
		IssueStore::insert(
			&*store,
			Issue {
				id: issue.clone(),
				user_id: user.clone(),
				container_name: "api".into(),
				severity: Severity::default(),
				issue_type: None,
				title: "Crash loop".into(),
				timestamp: OffsetDateTime::now_utc(),
				is_resolved: false,
				logs: Vec::new(),
				log_summary: String::new(),
				predicted_solutions_summary: String::new(),
				predicted_solutions_sources: Vec::new(),
				score,
			},
		)
		.await
		.expect("Issue insert should succeed.");

		let engine = RatingEngine::new(store.clone(), store.clone());

		(store, engine, user, issue)
	}

	async fn counter(store: &MemoryStore, user: &UserId) -> i64 {
		UserStore::fetch(store, user)
			.await
			.expect("User fetch should succeed.")
			.expect("User should exist.")
			.counter
	}

	#[test]
	fn transition_table_matches_difference() {
		let cases = [
			(Score::NEUTRAL, Score::UP, 1),
			(Score::NEUTRAL, Score::DOWN, -1),
			(Score::UP, Score::DOWN, -2),
			(Score::DOWN, Score::UP, 2),
			(Score::UP, Score::NEUTRAL, -1),
			(Score::DOWN, Score::NEUTRAL, 1),
		];

		for (from, to, expected) in cases {
			assert_eq!(counter_delta(from, to), expected, "{from} -> {to}");
		}
	}

	#[tokio::test]
	async fn out_of_range_and_missing_scores_touch_nothing() {
		let (store, engine, user, issue) = seeded(Score::NEUTRAL).await;

		assert!(matches!(
			engine.rate(&user, &issue, Some(2)).await,
			Err(Error::Validation(ValidationError::InvalidScore { score: 2 }))
		));
		assert!(matches!(engine.rate(&user, &issue, None).await, Err(Error::Validation(_))));
		assert_eq!(counter(&store, &user).await, 0);
	}

	#[tokio::test]
	async fn repeated_rating_counts_once() {
		let (store, engine, user, issue) = seeded(Score::NEUTRAL).await;
		let first = engine.rate(&user, &issue, Some(1)).await.expect("First rating succeeds.");

		assert_eq!(
			first,
			RatingOutcome::Rated { previous: Score::NEUTRAL, current: Score::UP, delta: 1 }
		);

		let second = engine.rate(&user, &issue, Some(1)).await.expect("Second rating succeeds.");

		assert_eq!(second, RatingOutcome::Unchanged);
		assert_eq!(counter(&store, &user).await, 1);
	}

	#[tokio::test]
	async fn full_swing_moves_counter_by_two() {
		let (store, engine, user, issue) = seeded(Score::UP).await;

		engine.apply(&user, &issue, Score::DOWN).await.expect("Rating succeeds.");

		assert_eq!(counter(&store, &user).await, -2);
	}

	#[tokio::test]
	async fn foreign_issue_is_not_found() {
		let (store, engine, _owner, issue) = seeded(Score::NEUTRAL).await;
		let stranger =
			UserId::qualified(ProviderKind::Google, "2").expect("User id should be valid.");

		UserStore::insert(&*store, User::new(stranger.clone(), "mallory", ProviderKind::Google))
			.await
			.expect("User insert should succeed.");

		assert!(matches!(
			engine.apply(&stranger, &issue, Score::UP).await,
			Err(Error::NotFound { entity: "Issue" })
		));
		assert_eq!(counter(&store, &stranger).await, 0);
	}

	#[tokio::test]
	async fn concurrent_ratings_never_double_count() {
		let (store, engine, user, issue) = seeded(Score::NEUTRAL).await;
		let engine = Arc::new(engine);
		let mut handles = Vec::new();

		for _ in 0..8 {
			let engine = engine.clone();
			let user = user.clone();
			let issue = issue.clone();

			handles.push(tokio::spawn(async move { engine.apply(&user, &issue, Score::UP).await }));
		}
		for handle in handles {
			handle.await.expect("Task should join.").expect("Rating should succeed.");
		}

		assert_eq!(counter(&store, &user).await, 1);
		assert_eq!(engine.guards.lock().len(), 0);
	}

	#[tokio::test]
	async fn counter_miss_after_score_write_is_not_rolled_back() {
		let (store, _engine, user, issue) = seeded(Score::NEUTRAL).await;
		let engine = RatingEngine::new(store.clone(), Arc::new(VanishingUsers(store.clone())));

		assert!(matches!(
			engine.apply(&user, &issue, Score::UP).await,
			Err(Error::NotFound { entity: "User" })
		));

		let stored = IssueStore::find_owned(&*store, &issue, &user)
			.await
			.expect("Issue fetch should succeed.")
			.expect("Issue should exist.");

		assert_eq!(stored.score, Score::UP);
		assert_eq!(counter(&store, &user).await, 0);
		assert_eq!(engine.guards.lock().len(), 0);
	}

	#[tokio::test]
	async fn cancelled_rating_leaves_no_guard_behind() {
		let (store, engine, user, issue) = seeded(Score::NEUTRAL).await;
		let held = engine.lease(&issue);
		let serialized = held.guard.lock().await;
		let mut waiting = Box::pin(engine.apply(&user, &issue, Score::UP));

		assert!(tokio::time::timeout(StdDuration::from_millis(20), &mut waiting).await.is_err());

		drop(serialized);
		drop(held);

		assert_eq!(engine.guards.lock().len(), 1);

		drop(waiting);

		assert_eq!(engine.guards.lock().len(), 0);
		assert_eq!(counter(&store, &user).await, 0);
	}
}
