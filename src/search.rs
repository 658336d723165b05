//! Query-string translation for issue search.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, auth::UserId, model::Severity, store::IssueSearchCriteria};

/// Page size used when `limit` is absent, zero, or unparsable.
pub const DEFAULT_LIMIT: u64 = 30;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u64 = 100;

/// Parsed search parameters before they are scoped to an owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
	/// Matches to skip.
	pub offset: u64,
	/// Page size, already clamped.
	pub limit: u64,
	/// Container filter.
	pub container: Option<String>,
	/// Severity filter.
	pub severity: Option<Severity>,
	/// Classification filter.
	pub issue_type: Option<String>,
	/// Resolution flag; always applied.
	pub is_resolved: bool,
	/// Inclusive lower bound.
	pub start: OffsetDateTime,
	/// Inclusive upper bound.
	pub end: OffsetDateTime,
	/// Accepted for compatibility; search does no text matching.
	pub search_string: Option<String>,
}
impl SearchQuery {
	/// Parses raw query pairs, falling back to defaults for anything absent or unparsable.
	///
	/// Unknown keys are ignored and an empty value counts as absent.
	pub fn from_params<'a, I>(params: I, now: OffsetDateTime) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut query = Self::defaults(now);

		for (key, value) in params {
			let value = value.trim();

			if value.is_empty() {
				continue;
			}

			match key {
				"offset" => query.offset = value.parse().unwrap_or(0),
				"limit" => query.limit = clamp_limit(value.parse().ok()),
				"container" => query.container = Some(value.to_owned()),
				"issueSeverity" => query.severity = Some(Severity::from(value)),
				"issueType" => query.issue_type = Some(value.to_owned()),
				"isResolved" => query.is_resolved = value.parse().unwrap_or(false),
				"startTimestamp" =>
					if let Ok(start) = OffsetDateTime::parse(value, &Rfc3339) {
						query.start = start;
					},
				"endTimestamp" =>
					if let Ok(end) = OffsetDateTime::parse(value, &Rfc3339) {
						query.end = end;
					},
				"searchString" => query.search_string = Some(value.to_owned()),
				_ => {},
			}
		}

		query
	}

	/// Query with every default applied.
	pub fn defaults(now: OffsetDateTime) -> Self {
		Self {
			offset: 0,
			limit: DEFAULT_LIMIT,
			container: None,
			severity: None,
			issue_type: None,
			is_resolved: false,
			start: time::Date::MIN.midnight().assume_utc(),
			end: now,
			search_string: None,
		}
	}

	/// Scopes the query to `owner` and produces storage criteria.
	pub fn into_criteria(self, owner: UserId) -> IssueSearchCriteria {
		IssueSearchCriteria {
			owner: Some(owner),
			container: self.container,
			severity: self.severity,
			issue_type: self.issue_type,
			resolved: Some(self.is_resolved),
			start: self.start,
			end: self.end,
			offset: self.offset,
			limit: self.limit,
		}
	}
}

fn clamp_limit(requested: Option<u64>) -> u64 {
	match requested {
		None | Some(0) => DEFAULT_LIMIT,
		Some(limit) => limit.min(MAX_LIMIT),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const NOW: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

	#[test]
	fn empty_query_uses_defaults() {
		let query = SearchQuery::from_params([], NOW);

		assert_eq!(query, SearchQuery::defaults(NOW));
		assert_eq!(query.limit, DEFAULT_LIMIT);
		assert_eq!(query.end, NOW);
		assert!(query.start < OffsetDateTime::UNIX_EPOCH);
		assert!(!query.is_resolved);
	}

	#[test]
	fn limit_is_clamped_and_garbage_falls_back() {
		assert_eq!(SearchQuery::from_params([("limit", "500")], NOW).limit, MAX_LIMIT);
		assert_eq!(SearchQuery::from_params([("limit", "12")], NOW).limit, 12);
		assert_eq!(SearchQuery::from_params([("limit", "0")], NOW).limit, DEFAULT_LIMIT);
		assert_eq!(SearchQuery::from_params([("limit", "-4")], NOW).limit, DEFAULT_LIMIT);
		assert_eq!(SearchQuery::from_params([("offset", "ten")], NOW).offset, 0);
	}

	#[test]
	fn filters_and_timestamps_are_parsed() {
		let query = SearchQuery::from_params(
			[
				("container", "api"),
				("issueSeverity", "high"),
				("issueType", "crash"),
				("isResolved", "true"),
				("startTimestamp", "2024-01-01T00:00:00Z"),
				("endTimestamp", "not-a-date"),
				("searchString", "timeout"),
				("unknown", "x"),
			],
			NOW,
		);

		assert_eq!(query.container.as_deref(), Some("api"));
		assert_eq!(query.severity, Some(Severity::High));
		assert_eq!(query.issue_type.as_deref(), Some("crash"));
		assert!(query.is_resolved);
		assert_eq!(query.start, datetime!(2024-01-01 0:00 UTC));
		assert_eq!(query.end, NOW);
	}

	#[test]
	fn blank_values_count_as_absent() {
		let query = SearchQuery::from_params([("container", ""), ("issueType", "  ")], NOW);

		assert!(query.container.is_none());
		assert!(query.issue_type.is_none());
	}

	#[test]
	fn criteria_are_scoped_to_owner() {
		let owner = UserId::new("google:abc").expect("Owner fixture should be valid.");
		let criteria = SearchQuery::defaults(NOW).into_criteria(owner.clone());

		assert_eq!(criteria.owner, Some(owner));
		assert_eq!(criteria.resolved, Some(false));
	}
}
