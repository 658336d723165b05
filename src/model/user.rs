//! Local user records created on first login.

// self
use crate::{
	_prelude::*,
	auth::{ProviderKind, SecretString, UserId},
};

/// Local user record created on first login from a provider identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Provider-qualified identifier; unique per provider identity.
	#[serde(rename = "userId")]
	pub id: UserId,
	/// Display name captured at creation.
	#[serde(rename = "userName")]
	pub name: String,
	/// Provider that authenticated the user.
	#[serde(rename = "type")]
	pub provider: ProviderKind,
	/// Paid subscription flag.
	pub is_pro: bool,
	/// Net sum of all rating transitions on the user's issues.
	pub counter: i64,
	/// Opaque credential for a downstream agent.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub agent_bearer_token: Option<SecretString>,
}
impl User {
	/// Builds the default record for a first-time login: free tier, zero counter, no agent
	/// credential.
	pub fn new(id: UserId, name: impl Into<String>, provider: ProviderKind) -> Self {
		Self { id, name: name.into(), provider, is_pro: false, counter: 0, agent_bearer_token: None }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn new_users_start_free_with_zero_counter() {
		let id = UserId::qualified(ProviderKind::Github, "7").expect("User fixture is valid.");
		let user = User::new(id, "octocat", ProviderKind::Github);

		assert!(!user.is_pro);
		assert_eq!(user.counter, 0);
		assert!(user.agent_bearer_token.is_none());

		let json = serde_json::to_value(&user).expect("User should serialize.");

		assert_eq!(json["userId"], "github:7");
		assert_eq!(json["userName"], "octocat");
		assert_eq!(json["type"], "github");
		assert_eq!(json["isPro"], false);
	}
}
