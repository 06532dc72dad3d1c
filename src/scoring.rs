// Connection Strength Scoring
//
// Scores how close the owner is to each friend on a 0-100 scale:
// - Recency (70%): linear decay to zero over a 60-day horizon
// - Volume (30%): credited per interaction, capped at 20
//
// All functions are pure and take "today" explicitly; callers pass the
// current UTC date.

use crate::types::{Friend, FriendCard, Interaction};
use chrono::NaiveDate;

/// Days after which the recency contribution reaches zero
pub const RECENCY_HORIZON_DAYS: f64 = 60.0;

/// Interaction count at which the volume contribution saturates
pub const VOLUME_CAP: usize = 20;

/// Maximum points awarded for recency
pub const RECENCY_WEIGHT: f64 = 70.0;

/// Maximum points awarded for volume
pub const VOLUME_WEIGHT: f64 = 30.0;

/// Days assumed when scoring a friend who was never contacted
pub const SCORING_NEVER_CONTACTED_DAYS: i64 = 365;

/// Days reported to the dashboard for a friend who was never contacted
///
/// Kept distinct from [`SCORING_NEVER_CONTACTED_DAYS`]: the UI keys off 999.
pub const DISPLAY_NEVER_CONTACTED_DAYS: i64 = 999;

/// Whole days between `today` and the most recent interaction's date
///
/// Returns `None` when there are no interactions. A future-dated interaction
/// yields a negative count.
pub fn last_contact_days(interactions: &[Interaction], today: NaiveDate) -> Option<i64> {
    interactions
        .iter()
        .map(|i| i.occurred_at)
        .max()
        .map(|last| (today - last.date_naive()).num_days())
}

pub fn interactions_count(interactions: &[Interaction]) -> usize {
    interactions.len()
}

/// Recency contribution (0-70)
///
/// Clamped on both sides so negative day counts cannot exceed the weight.
pub fn recency_points(days: i64) -> f64 {
    (1.0 - days as f64 / RECENCY_HORIZON_DAYS).clamp(0.0, 1.0) * RECENCY_WEIGHT
}

/// Volume contribution (0-30)
pub fn volume_points(count: usize) -> f64 {
    count.min(VOLUME_CAP) as f64 * (VOLUME_WEIGHT / VOLUME_CAP as f64)
}

/// Round half to even, matching the scores the dashboard has always shown
pub fn round_score(raw: f64) -> u8 {
    raw.round_ties_even().clamp(0.0, 100.0) as u8
}

/// Connection strength in [0, 100]
///
/// `days` is the result of [`last_contact_days`]; `None` scores as
/// [`SCORING_NEVER_CONTACTED_DAYS`].
pub fn connection_strength(days: Option<i64>, count: usize) -> u8 {
    let days = days.unwrap_or(SCORING_NEVER_CONTACTED_DAYS);
    round_score(recency_points(days) + volume_points(count))
}

/// Derived metrics for a single friend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendMetrics {
    pub last_contact_days: Option<i64>,
    pub interactions: usize,
    pub connection: u8,
}

impl FriendMetrics {
    /// Compute metrics from the friend's interactions
    pub fn compute(interactions: &[Interaction], today: NaiveDate) -> Self {
        let last_contact_days = last_contact_days(interactions, today);
        let interactions = interactions_count(interactions);
        Self {
            last_contact_days,
            interactions,
            connection: connection_strength(last_contact_days, interactions),
        }
    }

    /// Last contact as shown to the dashboard (999 when never contacted)
    pub fn display_last_contact_days(&self) -> i64 {
        self.last_contact_days
            .unwrap_or(DISPLAY_NEVER_CONTACTED_DAYS)
    }
}

/// Build the client-facing card for a friend
///
/// `interactions` must be the friend's own interactions.
pub fn friend_card(friend: &Friend, interactions: &[Interaction], today: NaiveDate) -> FriendCard {
    let metrics = FriendMetrics::compute(interactions, today);
    FriendCard {
        id: friend.id,
        name: friend.name.clone(),
        email: friend.email.clone(),
        phone: friend.phone.clone(),
        preference: friend.preference_or_default().to_string(),
        bio: friend.bio_or_default().to_string(),
        avatar: friend.avatar_or_default().to_string(),
        interactions: metrics.interactions,
        last_contact_days: metrics.display_last_contact_days(),
        connection: metrics.connection,
    }
}
