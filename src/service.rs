//! Request-level orchestration on top of tokens, identity resolution, and storage.

pub mod auth;
pub mod issues;
pub mod payload;

pub use auth::AuthService;
pub use issues::IssueService;
pub use payload::*;
