//! Issue lifecycle: ingestion, search, lookup, rating, resolution, and cleanup.
//!
//! Every operation acts on behalf of an authenticated owner; issues belonging to anyone else are
//! reported as not found.

// self
use crate::{
	_prelude::*,
	analysis::AnalysisBackend,
	auth::{IssueId, UserId},
	error::ValidationError,
	model::{Issue, SavedAnalysis, Score, Severity},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	rating::{RatingEngine, RatingOutcome},
	search::SearchQuery,
	service::{AnalysisReceipt, LogAnalysisRequest, RateIssueRequest},
	store::{AnalysisStore, IssuePage, IssueStore, UserStore},
};

/// Owner-scoped issue operations.
pub struct IssueService {
	issues: Arc<dyn IssueStore>,
	users: Arc<dyn UserStore>,
	analyses: Arc<dyn AnalysisStore>,
	backend: Arc<dyn AnalysisBackend>,
	rating: RatingEngine,
}
impl IssueService {
	/// Wires the service to its stores and analysis backend.
	pub fn new(
		issues: Arc<dyn IssueStore>,
		users: Arc<dyn UserStore>,
		analyses: Arc<dyn AnalysisStore>,
		backend: Arc<dyn AnalysisBackend>,
	) -> Self {
		let rating = RatingEngine::new(issues.clone(), users.clone());

		Self { issues, users, analyses, backend, rating }
	}

	/// Analyzes submitted logs and stores the result as a new issue owned by `user`.
	///
	/// Free-tier users also get a [`SavedAnalysis`] record.
	pub async fn analyze_logs(
		&self,
		user: &UserId,
		request: &LogAnalysisRequest,
	) -> Result<AnalysisReceipt> {
		const KIND: OperationKind = OperationKind::Ingestion;

		let span = OperationSpan::new(KIND, "analyze_logs");

		obs::record_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async {
				let container_name = request.container_name.trim();

				if container_name.is_empty() {
					return Err(ValidationError::EmptyField { field: "containerName" }.into());
				}
				if request.logs.trim().is_empty() {
					return Err(ValidationError::EmptyField { field: "logs" }.into());
				}

				let owner = self.users.fetch(user).await?.ok_or(Error::not_found("User"))?;
				let analysis = self.backend.analyze(&request.logs).await?;

				if !owner.is_pro {
					self.analyses
						.save(SavedAnalysis {
							logs: request.logs.clone(),
							log_summary: analysis.log_summary.clone(),
						})
						.await?;
				}

				let issue = Issue {
					id: IssueId::generate(),
					user_id: owner.id,
					container_name: container_name.to_owned(),
					severity: Severity::default(),
					issue_type: None,
					title: analysis.title,
					timestamp: OffsetDateTime::now_utc(),
					is_resolved: false,
					logs: request.logs.split('\n').map(str::to_owned).collect(),
					log_summary: analysis.log_summary,
					predicted_solutions_summary: analysis.predicted_solutions,
					predicted_solutions_sources: analysis.sources,
					score: Score::NEUTRAL,
				};
				let issue_id = issue.id.clone();

				self.issues.insert(issue).await?;

				Ok(AnalysisReceipt::new(issue_id))
			})
			.await;

		obs::record_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	/// Returns one page of the owner's issues.
	pub async fn search_issues(&self, user: &UserId, query: SearchQuery) -> Result<IssuePage> {
		let criteria = query.into_criteria(user.clone());

		Ok(self.issues.search(&criteria).await?)
	}

	/// Returns one of the owner's issues in full.
	pub async fn get_issue(&self, user: &UserId, id: &IssueId) -> Result<Issue> {
		self.issues.find_owned(id, user).await?.ok_or(Error::not_found("Issue"))
	}

	/// Applies a rating request to one of the owner's issues.
	pub async fn rate_issue(
		&self,
		user: &UserId,
		id: &IssueId,
		request: &RateIssueRequest,
	) -> Result<RatingOutcome> {
		self.rating.rate(user, id, request.score).await
	}

	/// Marks one of the owner's issues resolved. Resolving twice succeeds.
	pub async fn resolve_issue(&self, user: &UserId, id: &IssueId) -> Result<()> {
		if self.issues.mark_resolved(id, user).await? {
			Ok(())
		} else {
			Err(Error::not_found("Issue"))
		}
	}

	/// Deletes the owner's issues for `container` and returns how many were removed.
	pub async fn delete_issues(&self, user: &UserId, container: &str) -> Result<u64> {
		let container = container.trim();

		if container.is_empty() {
			return Err(ValidationError::EmptyField { field: "container" }.into());
		}

		Ok(self.issues.delete_by_container(user, container).await?)
	}

	/// Distinct container names across the owner's issues.
	pub async fn containers(&self, user: &UserId) -> Result<Vec<String>> {
		Ok(self.issues.distinct_containers(user).await?)
	}

	/// Rating engine shared by [`IssueService::rate_issue`].
	pub fn rating(&self) -> &RatingEngine {
		&self.rating
	}
}
impl Debug for IssueService {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssueService").field("rating", &self.rating).finish_non_exhaustive()
	}
}
