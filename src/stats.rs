//! Aggregate statistics for the dashboard
//!
//! Overview numbers and the seven-day activity chart. Calendar days are UTC
//! days, the same clock the per-friend recency uses.

use crate::scoring::FriendMetrics;
use crate::types::{Friend, FriendId, Interaction, OverviewStats, WeeklyActivity};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;

/// Friends not contacted for more than this many days need attention
pub const ATTENTION_THRESHOLD_DAYS: i64 = 21;

/// Length of the activity window, in calendar days, including today
pub const WEEK_DAYS: u64 = 7;

/// Group interactions by the friend they belong to
pub fn group_by_friend(interactions: &[Interaction]) -> HashMap<FriendId, Vec<Interaction>> {
    let mut grouped: HashMap<FriendId, Vec<Interaction>> = HashMap::new();
    for interaction in interactions {
        grouped
            .entry(interaction.friend_id)
            .or_default()
            .push(interaction.clone());
    }
    grouped
}

/// Midnight at the start of the rolling week that ends on `today`
pub fn week_start(today: NaiveDate) -> DateTime<Utc> {
    today
        .checked_sub_days(Days::new(WEEK_DAYS - 1))
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Count interactions in `[week_start(today), now]`
pub fn interactions_this_week(interactions: &[Interaction], now: DateTime<Utc>) -> usize {
    let start = week_start(now.date_naive());
    interactions
        .iter()
        .filter(|i| i.occurred_at >= start && i.occurred_at <= now)
        .count()
}

/// Mean of the scores, rounded half to even; 0 for no scores
pub fn average_connection(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return 0;
    }
    let sum: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    crate::scoring::round_score(f64::from(sum) / scores.len() as f64)
}

pub fn needs_attention(display_last_contact_days: i64) -> bool {
    display_last_contact_days > ATTENTION_THRESHOLD_DAYS
}

/// Headline numbers for the dashboard
///
/// `interactions` is every interaction in the store; friends are matched by id.
pub fn overview_stats(
    friends: &[Friend],
    interactions: &[Interaction],
    now: DateTime<Utc>,
) -> OverviewStats {
    let today = now.date_naive();
    let grouped = group_by_friend(interactions);

    let metrics: Vec<FriendMetrics> = friends
        .iter()
        .map(|friend| {
            let own = grouped.get(&friend.id).map(Vec::as_slice).unwrap_or(&[]);
            FriendMetrics::compute(own, today)
        })
        .collect();

    let scores: Vec<u8> = metrics.iter().map(|m| m.connection).collect();

    OverviewStats {
        total_friends: friends.len(),
        interactions_this_week: interactions_this_week(interactions, now),
        avg_connection: average_connection(&scores),
        need_attention: metrics
            .iter()
            .filter(|m| needs_attention(m.display_last_contact_days()))
            .count(),
    }
}

/// Interactions per calendar day for the seven days ending today
///
/// Buckets run oldest to newest and cover `[week_start(today), now]`, the
/// same window as [`interactions_this_week`]: earlier days are whole, today
/// stops at `now`.
pub fn weekly_buckets(interactions: &[Interaction], now: DateTime<Utc>) -> WeeklyActivity {
    let today = now.date_naive();
    let days: Vec<NaiveDate> = (0..WEEK_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .collect();

    let mut data = vec![0usize; days.len()];
    for interaction in interactions.iter().filter(|i| i.occurred_at <= now) {
        let date = interaction.occurred_at.date_naive();
        if let Some(slot) = days.iter().position(|d| *d == date) {
            data[slot] += 1;
        }
    }

    WeeklyActivity {
        labels: days.iter().map(|d| d.format("%a").to_string()).collect(),
        data,
    }
}
