//! Tracker service
//!
//! Validates requests at the boundary, delegates persistence to a
//! [`StorageBackend`], and runs the scoring engine over what the store
//! returns. Every read loads a fresh snapshot; nothing is cached here.

use crate::error::{RapportError, Result};
use crate::scoring;
use crate::stats;
use crate::storage::StorageBackend;
use crate::types::{
    FriendCard, FriendId, FriendUpdate, Interaction, InteractionId, NewFriend, NewInteraction,
    OverviewStats, WeeklyActivity, KNOWN_INTERACTION_TYPES,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Friend and interaction operations with derived metrics
#[derive(Clone)]
pub struct Tracker {
    storage: Arc<dyn StorageBackend>,
}

impl Tracker {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Add a friend; the name must be non-empty
    pub async fn create_friend(&self, request: NewFriend) -> Result<FriendCard> {
        let request = request.validate()?;
        let friend = self.storage.create_friend(&request).await?;
        info!("Added friend {} ({})", friend.id, friend.name);
        Ok(scoring::friend_card(&friend, &[], Utc::now().date_naive()))
    }

    /// Apply a partial update and return the refreshed card
    pub async fn update_friend(&self, id: FriendId, update: FriendUpdate) -> Result<FriendCard> {
        let update = update.validate()?;
        self.storage.update_friend(id, &update).await?;
        self.friend_card(id).await
    }

    /// Delete a friend and, with it, every interaction it owns
    pub async fn delete_friend(&self, id: FriendId) -> Result<usize> {
        let removed = self.storage.delete_friend(id).await?;
        info!("Removed friend {} ({} interactions cascaded)", id, removed);
        Ok(removed)
    }

    pub async fn friend_card(&self, id: FriendId) -> Result<FriendCard> {
        self.friend_card_at(id, Utc::now()).await
    }

    pub async fn friend_card_at(&self, id: FriendId, now: DateTime<Utc>) -> Result<FriendCard> {
        let friend = self.storage.get_friend(id).await?;
        let interactions = self.storage.list_interactions_for_friend(id).await?;
        Ok(scoring::friend_card(&friend, &interactions, now.date_naive()))
    }

    pub async fn list_friend_cards(&self) -> Result<Vec<FriendCard>> {
        self.list_friend_cards_at(Utc::now()).await
    }

    /// Cards for every friend, in store order
    ///
    /// Loads all interactions once and groups them, rather than querying per
    /// friend.
    pub async fn list_friend_cards_at(&self, now: DateTime<Utc>) -> Result<Vec<FriendCard>> {
        let friends = self.storage.list_friends().await?;
        let interactions = self.storage.list_all_interactions().await?;
        let grouped = stats::group_by_friend(&interactions);
        let today = now.date_naive();

        Ok(friends
            .iter()
            .map(|friend| {
                let own = grouped.get(&friend.id).map(Vec::as_slice).unwrap_or(&[]);
                scoring::friend_card(friend, own, today)
            })
            .collect())
    }

    pub async fn log_interaction(&self, request: NewInteraction) -> Result<Interaction> {
        self.log_interaction_at(request, Utc::now()).await
    }

    /// Log an interaction; `now` is used when no timestamp was supplied
    pub async fn log_interaction_at(
        &self,
        request: NewInteraction,
        now: DateTime<Utc>,
    ) -> Result<Interaction> {
        let friend_id = request
            .friend_id
            .ok_or_else(|| RapportError::InvalidInput("friendId is required".to_string()))?;

        match self.storage.get_friend(friend_id).await {
            Ok(_) => {}
            Err(RapportError::FriendNotFound(id)) => {
                return Err(RapportError::InvalidInput(format!(
                    "friend {} does not exist",
                    id
                )));
            }
            Err(e) => return Err(e),
        }

        let kind = request.kind_or_default();
        if !KNOWN_INTERACTION_TYPES.contains(&kind.as_str()) {
            warn!("Logging interaction with unrecognised type '{}'", kind);
        }
        let occurred_at = request.resolve_occurred_at(now)?;

        let interaction = self
            .storage
            .create_interaction(friend_id, &kind, request.notes.as_deref(), occurred_at)
            .await?;
        debug!(
            "Logged {} with friend {} at {}",
            interaction.kind, friend_id, interaction.occurred_at
        );
        Ok(interaction)
    }

    /// A friend's interactions, newest first; errors if the friend is unknown
    pub async fn interactions_for_friend(&self, id: FriendId) -> Result<Vec<Interaction>> {
        self.storage.get_friend(id).await?;
        self.storage.list_interactions_for_friend(id).await
    }

    pub async fn list_interactions(&self) -> Result<Vec<Interaction>> {
        self.storage.list_all_interactions().await
    }

    pub async fn delete_interaction(&self, id: InteractionId) -> Result<()> {
        self.storage.delete_interaction(id).await
    }

    pub async fn overview_stats(&self) -> Result<OverviewStats> {
        self.overview_stats_at(Utc::now()).await
    }

    pub async fn overview_stats_at(&self, now: DateTime<Utc>) -> Result<OverviewStats> {
        let friends = self.storage.list_friends().await?;
        let interactions = self.storage.list_all_interactions().await?;
        Ok(stats::overview_stats(&friends, &interactions, now))
    }

    pub async fn weekly_activity(&self) -> Result<WeeklyActivity> {
        self.weekly_activity_at(Utc::now()).await
    }

    pub async fn weekly_activity_at(&self, now: DateTime<Utc>) -> Result<WeeklyActivity> {
        let interactions = self.storage.list_all_interactions().await?;
        Ok(stats::weekly_buckets(&interactions, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::DISPLAY_NEVER_CONTACTED_DAYS;
    use crate::storage::libsql::LibsqlStorage;
    use crate::storage::test_utils::create_test_storage;
    use chrono::Duration;
    use tempfile::TempDir;

    async fn create_test_tracker() -> (Tracker, TempDir) {
        let (storage, dir) = create_test_storage().await;
        let storage: Arc<LibsqlStorage> = Arc::new(storage);
        (Tracker::new(storage), dir)
    }

    #[tokio::test]
    async fn test_create_friend_requires_name() {
        let (tracker, _dir) = create_test_tracker().await;
        let err = tracker.create_friend(NewFriend::named("")).await.unwrap_err();
        assert!(matches!(err, RapportError::InvalidInput(_)));
        assert!(tracker.list_friend_cards().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_friend_card() {
        let (tracker, _dir) = create_test_tracker().await;
        let card = tracker.create_friend(NewFriend::named("Saloni")).await.unwrap();

        assert_eq!(card.name, "Saloni");
        assert_eq!(card.preference, "Text/Chat");
        assert_eq!(card.interactions, 0);
        assert_eq!(card.last_contact_days, DISPLAY_NEVER_CONTACTED_DAYS);
        assert_eq!(card.connection, 0);
    }

    #[tokio::test]
    async fn test_friend_card_end_to_end() {
        let (tracker, _dir) = create_test_tracker().await;
        let now = Utc::now();
        let card = tracker.create_friend(NewFriend::named("Mike")).await.unwrap();

        tracker
            .log_interaction_at(NewInteraction::for_friend(card.id).with_kind("call"), now)
            .await
            .unwrap();
        tracker
            .log_interaction_at(
                NewInteraction::for_friend(card.id).at(now - Duration::days(10)),
                now,
            )
            .await
            .unwrap();

        let card = tracker.friend_card_at(card.id, now).await.unwrap();
        assert_eq!(card.last_contact_days, 0);
        assert_eq!(card.interactions, 2);
        assert_eq!(card.connection, 73);
    }

    #[tokio::test]
    async fn test_log_interaction_defaults() {
        let (tracker, _dir) = create_test_tracker().await;
        let now = Utc::now();
        let friend = tracker.create_friend(NewFriend::named("Sarah")).await.unwrap();

        let interaction = tracker
            .log_interaction_at(NewInteraction::for_friend(friend.id), now)
            .await
            .unwrap();
        assert_eq!(interaction.kind, "text");
        assert!(interaction.notes.is_none());
        assert!((interaction.occurred_at - now).num_milliseconds().abs() < 1);
    }

    #[tokio::test]
    async fn test_log_interaction_validation() {
        let (tracker, _dir) = create_test_tracker().await;

        let err = tracker
            .log_interaction(NewInteraction::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RapportError::InvalidInput(_)));

        let err = tracker
            .log_interaction(NewInteraction::for_friend(FriendId(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, RapportError::InvalidInput(_)));

        let friend = tracker.create_friend(NewFriend::named("Chris")).await.unwrap();
        let mut bad_date = NewInteraction::for_friend(friend.id);
        bad_date.occurred_at = Some("yesterday-ish".to_string());
        let err = tracker.log_interaction(bad_date).await.unwrap_err();
        assert!(matches!(err, RapportError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_friend() {
        let (tracker, _dir) = create_test_tracker().await;
        let friend = tracker.create_friend(NewFriend::named("Jess")).await.unwrap();

        let card = tracker
            .update_friend(
                friend.id,
                FriendUpdate {
                    name: Some("Jessica Smith".to_string()),
                    preference: Some("Call".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(card.name, "Jessica Smith");
        assert_eq!(card.preference, "Call");

        let err = tracker
            .update_friend(
                friend.id,
                FriendUpdate {
                    name: Some("".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RapportError::InvalidInput(_)));

        let err = tracker
            .update_friend(FriendId(999), FriendUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_friend_cascades() {
        let (tracker, _dir) = create_test_tracker().await;
        let friend = tracker.create_friend(NewFriend::named("Gone")).await.unwrap();
        for kind in ["call", "text"] {
            tracker
                .log_interaction(NewInteraction::for_friend(friend.id).with_kind(kind))
                .await
                .unwrap();
        }

        assert_eq!(tracker.delete_friend(friend.id).await.unwrap(), 2);
        assert!(tracker.list_interactions().await.unwrap().is_empty());
        assert!(tracker
            .interactions_for_friend(friend.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_list_friend_cards_matches_single_cards() {
        let (tracker, _dir) = create_test_tracker().await;
        let now = Utc::now();
        let a = tracker.create_friend(NewFriend::named("A")).await.unwrap();
        let b = tracker.create_friend(NewFriend::named("B")).await.unwrap();
        tracker
            .log_interaction_at(
                NewInteraction::for_friend(a.id).at(now - Duration::days(30)),
                now,
            )
            .await
            .unwrap();

        let cards = tracker.list_friend_cards_at(now).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0], tracker.friend_card_at(a.id, now).await.unwrap());
        assert_eq!(cards[1], tracker.friend_card_at(b.id, now).await.unwrap());
        assert_eq!(cards[0].last_contact_days, 30);
    }

    #[tokio::test]
    async fn test_overview_and_weekly() {
        let (tracker, _dir) = create_test_tracker().await;
        let now = Utc::now();

        let empty = tracker.overview_stats_at(now).await.unwrap();
        assert_eq!(empty.total_friends, 0);
        assert_eq!(empty.avg_connection, 0);

        let close = tracker.create_friend(NewFriend::named("Close")).await.unwrap();
        tracker.create_friend(NewFriend::named("Distant")).await.unwrap();
        for days in [0, 1, 3] {
            tracker
                .log_interaction_at(
                    NewInteraction::for_friend(close.id).at(now - Duration::days(days)),
                    now,
                )
                .await
                .unwrap();
        }

        let stats = tracker.overview_stats_at(now).await.unwrap();
        assert_eq!(stats.total_friends, 2);
        assert_eq!(stats.interactions_this_week, 3);
        // round(70 + 4.5) = 74 (ties to even); mean of 74 and 0 is 37
        assert_eq!(stats.avg_connection, 37);
        assert_eq!(stats.need_attention, 1);

        let weekly = tracker.weekly_activity_at(now).await.unwrap();
        assert_eq!(weekly.data.len(), 7);
        assert_eq!(weekly.data[6], 1);
        assert_eq!(weekly.data[5], 1);
        assert_eq!(weekly.data[3], 1);
        assert_eq!(weekly.data.iter().sum::<usize>(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_log_interaction() {
        let (tracker, _dir) = create_test_tracker().await;
        let friend_id = tracker.create_friend(NewFriend::named("Popular")).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker
                    .log_interaction(NewInteraction::for_friend(friend_id))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().expect("Concurrent log failed");
        }

        let card = tracker.friend_card(friend_id).await.unwrap();
        assert_eq!(card.interactions, 20);
    }
}
