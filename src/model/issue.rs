//! Issues, their tri-state score, severity labels, and the analyses saved for free-tier users.

// self
use crate::{
	_prelude::*,
	auth::{IssueId, UserId},
	error::ValidationError,
};

/// Tri-state rating: downvote, neutral, or upvote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(i8);
impl Score {
	/// Downvote.
	pub const DOWN: Self = Self(-1);
	/// Neutral; every issue starts here.
	pub const NEUTRAL: Self = Self(0);
	/// Upvote.
	pub const UP: Self = Self(1);

	/// Accepts only `-1`, `0`, or `1`.
	pub fn new(value: i64) -> Result<Self, ValidationError> {
		match value {
			-1 => Ok(Self::DOWN),
			0 => Ok(Self::NEUTRAL),
			1 => Ok(Self::UP),
			score => Err(ValidationError::InvalidScore { score }),
		}
	}

	/// Raw value.
	pub const fn get(self) -> i64 {
		self.0 as i64
	}

	/// Counter change caused by moving from `self` to `next`.
	pub const fn delta_to(self, next: Score) -> i64 {
		next.get() - self.get()
	}
}
impl TryFrom<i64> for Score {
	type Error = ValidationError;

	fn try_from(value: i64) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<Score> for i64 {
	fn from(value: Score) -> Self {
		value.get()
	}
}
impl Display for Score {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}

/// Issue severity.
///
/// Detection does not exist yet, so ingestion always assigns the default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
	/// `CRITICAL`
	#[default]
	Critical,
	/// `HIGH`
	High,
	/// `MEDIUM`
	Medium,
	/// `LOW`
	Low,
	/// Any label not known to this crate, kept verbatim.
	Other(String),
}
impl Severity {
	/// Wire label.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Critical => "CRITICAL",
			Self::High => "HIGH",
			Self::Medium => "MEDIUM",
			Self::Low => "LOW",
			Self::Other(label) => label,
		}
	}
}
impl From<String> for Severity {
	fn from(value: String) -> Self {
		match value.to_ascii_uppercase().as_str() {
			"CRITICAL" => Self::Critical,
			"HIGH" => Self::High,
			"MEDIUM" => Self::Medium,
			"LOW" => Self::Low,
			_ => Self::Other(value),
		}
	}
}
impl From<&str> for Severity {
	fn from(value: &str) -> Self {
		Self::from(value.to_owned())
	}
}
impl From<Severity> for String {
	fn from(value: Severity) -> Self {
		match value {
			Severity::Other(label) => label,
			known => known.as_str().to_owned(),
		}
	}
}
impl Display for Severity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Detected incident produced by log analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
	/// Identifier generated at analysis time.
	pub id: IssueId,
	/// Owner.
	pub user_id: UserId,
	/// Container or source the logs came from.
	pub container_name: String,
	/// Severity label.
	pub severity: Severity,
	/// Optional classification label.
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub issue_type: Option<String>,
	/// Short headline from the analysis.
	pub title: String,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	/// Whether the owner marked the issue resolved.
	pub is_resolved: bool,
	/// Raw log lines in input order.
	pub logs: Vec<String>,
	/// Generated summary of the logs.
	pub log_summary: String,
	/// Generated remediation summary.
	pub predicted_solutions_summary: String,
	/// References backing the predicted solutions.
	pub predicted_solutions_sources: Vec<String>,
	/// Owner's rating.
	pub score: Score,
}

/// Projection of an [`Issue`] returned by search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
	/// Issue identifier.
	pub id: IssueId,
	/// Container or source name.
	pub container_name: String,
	/// Severity label.
	pub severity: Severity,
	/// Headline.
	pub title: String,
	/// Resolution flag.
	pub is_resolved: bool,
	/// Creation instant.
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
}
impl From<&Issue> for IssueSummary {
	fn from(issue: &Issue) -> Self {
		Self {
			id: issue.id.clone(),
			container_name: issue.container_name.clone(),
			severity: issue.severity.clone(),
			title: issue.title.clone(),
			is_resolved: issue.is_resolved,
			timestamp: issue.timestamp,
		}
	}
}

/// Analysis kept for free-tier users; written once, never read back by this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysis {
	/// Raw submitted logs.
	pub logs: String,
	/// Generated summary.
	pub log_summary: String,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn score_accepts_only_tri_state_values() {
		assert_eq!(Score::new(-1), Ok(Score::DOWN));
		assert_eq!(Score::new(0), Ok(Score::NEUTRAL));
		assert_eq!(Score::new(1), Ok(Score::UP));
		assert_eq!(Score::new(2), Err(ValidationError::InvalidScore { score: 2 }));
		assert!(serde_json::from_str::<Score>("5").is_err());
		assert_eq!(serde_json::from_str::<Score>("-1").expect("Score should parse."), Score::DOWN);
	}

	#[test]
	fn delta_is_difference_of_scores() {
		assert_eq!(Score::UP.delta_to(Score::DOWN), -2);
		assert_eq!(Score::DOWN.delta_to(Score::UP), 2);
		assert_eq!(Score::NEUTRAL.delta_to(Score::NEUTRAL), 0);
	}

	#[test]
	fn severity_keeps_unknown_labels() {
		assert_eq!(Severity::default(), Severity::Critical);
		assert_eq!(Severity::from("critical"), Severity::Critical);
		assert_eq!(Severity::from("NOISY"), Severity::Other("NOISY".into()));
		assert_eq!(
			serde_json::to_string(&Severity::High).expect("Severity should serialize."),
			"\"HIGH\""
		);
	}
}
