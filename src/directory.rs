//! Find-or-create of local users keyed by provider identity.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	identity::ProviderIdentity,
	model::User,
	store::{InsertOutcome, UserStore},
};

/// Maps provider identities onto local [`User`] records.
#[derive(Clone)]
pub struct UserDirectory {
	users: Arc<dyn UserStore>,
}
impl UserDirectory {
	/// Wraps a user store.
	pub fn new(users: Arc<dyn UserStore>) -> Self {
		Self { users }
	}

	/// Returns the existing user for `identity`, creating a default record on first login.
	///
	/// A concurrent first login for the same identity resolves to whichever insert won.
	pub async fn find_or_create(&self, identity: &ProviderIdentity) -> Result<User> {
		let id = identity.user_id()?;

		if let Some(user) = self.users.fetch(&id).await? {
			return Ok(user);
		}

		let user = User::new(id, identity.display_name.clone(), identity.provider);

		match self.users.insert(user.clone()).await? {
			InsertOutcome::Inserted => Ok(user),
			InsertOutcome::Duplicate => self.require(&user.id).await,
		}
	}

	/// Fetches a user, if present.
	pub async fn fetch(&self, id: &UserId) -> Result<Option<User>> {
		Ok(self.users.fetch(id).await?)
	}

	/// Fetches a user or fails with [`Error::NotFound`].
	pub async fn require(&self, id: &UserId) -> Result<User> {
		self.fetch(id).await?.ok_or(Error::not_found("User"))
	}
}
impl Debug for UserDirectory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("UserDirectory(..)")
	}
}
