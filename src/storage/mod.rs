//! Storage layer for Rapport
//!
//! The scoring engine only needs to read friends and interactions; the
//! `StorageBackend` trait is that collaborator contract plus the CRUD
//! mutations the dashboard uses.

pub mod libsql;

#[cfg(test)]
pub mod test_utils;

use crate::error::Result;
use crate::types::{Friend, FriendId, FriendUpdate, Interaction, InteractionId, NewFriend};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage backend trait defining all required operations
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a new friend and return it with its assigned id
    async fn create_friend(&self, friend: &NewFriend) -> Result<Friend>;

    /// Retrieve a friend by ID
    async fn get_friend(&self, id: FriendId) -> Result<Friend>;

    /// All friends, ordered by id
    async fn list_friends(&self) -> Result<Vec<Friend>>;

    /// Apply a partial update and return the updated friend
    async fn update_friend(&self, id: FriendId, update: &FriendUpdate) -> Result<Friend>;

    /// Delete a friend together with all of its interactions
    ///
    /// Returns the number of interactions removed by the cascade.
    async fn delete_friend(&self, id: FriendId) -> Result<usize>;

    /// Store a new interaction for an existing friend
    async fn create_interaction(
        &self,
        friend_id: FriendId,
        kind: &str,
        notes: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Interaction>;

    /// Retrieve an interaction by ID
    async fn get_interaction(&self, id: InteractionId) -> Result<Interaction>;

    /// A friend's interactions, newest first
    async fn list_interactions_for_friend(&self, id: FriendId) -> Result<Vec<Interaction>>;

    /// Every interaction in the store, newest first
    async fn list_all_interactions(&self) -> Result<Vec<Interaction>>;

    /// Number of interactions logged for a friend
    async fn count_interactions_for_friend(&self, id: FriendId) -> Result<usize> {
        Ok(self.list_interactions_for_friend(id).await?.len())
    }

    /// Delete a single interaction
    async fn delete_interaction(&self, id: InteractionId) -> Result<()>;
}
