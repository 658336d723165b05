//! Persistent records: users, issues, and saved analyses.

pub mod issue;
pub mod user;

pub use issue::*;
pub use user::*;
