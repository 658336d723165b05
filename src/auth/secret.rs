//! Redacting wrapper for credentials that must stay out of logs.

// self
use crate::_prelude::*;

/// Credential string (signing secret, client secret, bearer token) that never prints its value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);
impl SecretString {
	/// Wraps a credential.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw credential. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the credential is empty or only whitespace.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SecretString(<redacted>)")
	}
}
impl Display for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_but_serde_keeps_value() {
		let secret = SecretString::new("gho_live_value");

		assert_eq!(format!("{secret:?}"), "SecretString(<redacted>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(
			serde_json::to_string(&secret).expect("Secret should serialize."),
			"\"gho_live_value\""
		);
	}

	#[test]
	fn blank_detection_ignores_whitespace() {
		assert!(SecretString::default().is_blank());
		assert!(SecretString::from("  \t").is_blank());
		assert!(!SecretString::from("s3cr3t").is_blank());
	}
}
