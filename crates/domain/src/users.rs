//! Profile reads and edits for the calling user.

use common::UserId;
use store::{Profile, Store, StoreExt, User};

use crate::error::Result;

#[derive(Clone)]
pub struct UserService<S: Store> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn profile(&self, user: UserId) -> Result<User> {
        Ok(self.store.require_user(user).await?)
    }

    /// Replaces the whole profile block.
    #[tracing::instrument(skip(self, profile))]
    pub async fn update_profile(&self, user: UserId, profile: Profile) -> Result<User> {
        let mut stored = self.store.require_user(user).await?;
        stored.profile = profile;
        Ok(self.store.update_user(stored).await?)
    }
}
