//! Core data types for Rapport
//!
//! Friends, the interactions logged against them, and the derived records
//! handed to the dashboard. Field names serialize in camelCase to match the
//! client.

use crate::error::{RapportError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Preference shown when a friend has none recorded
pub const DEFAULT_PREFERENCE: &str = "Text/Chat";

/// Placeholder avatar shown when a friend has none recorded
pub const DEFAULT_AVATAR: &str = "https://placehold.co/48x48/60A5FA/0B1A2B?text=FM";

/// Interaction type used when the request omits one
pub const DEFAULT_INTERACTION_TYPE: &str = "text";

/// Interaction types the dashboard knows how to render
pub const KNOWN_INTERACTION_TYPES: [&str; 4] = ["meetup", "call", "video", "text"];

/// Unique identifier for friends
///
/// Assigned by the store on creation and never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendId(pub i64);

impl std::fmt::Display for FriendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionId(pub i64);

impl std::fmt::Display for InteractionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A friend as stored
///
/// Optional fields keep whatever was written; defaults are applied when the
/// friend is rendered (see [`Friend::preference_or_default`] and friends).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: FriendId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preference: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Empty strings count as missing, same as an absent value.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Friend {
    pub fn preference_or_default(&self) -> &str {
        non_empty(&self.preference).unwrap_or(DEFAULT_PREFERENCE)
    }

    pub fn bio_or_default(&self) -> &str {
        non_empty(&self.bio).unwrap_or("")
    }

    pub fn avatar_or_default(&self) -> &str {
        non_empty(&self.avatar).unwrap_or(DEFAULT_AVATAR)
    }
}

/// Request body for creating a friend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFriend {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preference: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl NewFriend {
    /// Create a request with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Reject requests without a usable name; returns the trimmed copy
    pub fn validate(mut self) -> Result<Self> {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            return Err(RapportError::InvalidInput("name is required".to_string()));
        }
        self.name = trimmed.to_string();
        Ok(self)
    }
}

/// Partial update for a friend; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preference: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl FriendUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.preference.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
    }

    /// A present name must still be non-empty
    pub fn validate(mut self) -> Result<Self> {
        if let Some(name) = self.name.take() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(RapportError::InvalidInput(
                    "name cannot be empty".to_string(),
                ));
            }
            self.name = Some(trimmed.to_string());
        }
        Ok(self)
    }
}

/// A logged interaction with a friend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: InteractionId,
    pub friend_id: FriendId,
    /// One of `meetup | call | video | text` in practice, but not enforced
    #[serde(rename = "type")]
    pub kind: String,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Request body for logging an interaction
///
/// `occurredAt` may be an RFC 3339 timestamp, a naive ISO timestamp (taken
/// as UTC), or a bare `YYYY-MM-DD` date. The dashboard's log form sends the
/// date under `date`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInteraction {
    pub friend_id: Option<FriendId>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "date")]
    pub occurred_at: Option<String>,
}

impl NewInteraction {
    pub fn for_friend(friend_id: FriendId) -> Self {
        Self {
            friend_id: Some(friend_id),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at.to_rfc3339());
        self
    }

    /// Type to store, falling back to [`DEFAULT_INTERACTION_TYPE`]
    pub fn kind_or_default(&self) -> String {
        self.kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_INTERACTION_TYPE)
            .to_string()
    }

    /// Timestamp to store, falling back to `now`
    pub fn resolve_occurred_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match self.occurred_at.as_deref().map(str::trim) {
            None | Some("") => Ok(now),
            Some(raw) => parse_timestamp(raw),
        }
    }
}

/// Parse the timestamp shapes accepted for `occurredAt`
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(RapportError::InvalidInput(format!(
        "occurredAt is not a valid timestamp: {}",
        raw
    )))
}

/// Client-facing friend record with derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendCard {
    pub id: FriendId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preference: String,
    pub bio: String,
    pub avatar: String,
    pub interactions: usize,
    /// Days since last contact, `999` when never contacted
    pub last_contact_days: i64,
    /// Connection strength, 0-100
    pub connection: u8,
}

/// Dashboard headline numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_friends: usize,
    pub interactions_this_week: usize,
    pub avg_connection: u8,
    pub need_attention: usize,
}

/// Interactions per day for the last seven days, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bare_friend() -> Friend {
        Friend {
            id: FriendId(1),
            name: "Saloni".to_string(),
            email: None,
            phone: None,
            preference: None,
            bio: None,
            avatar: None,
        }
    }

    #[test]
    fn test_friend_defaults() {
        let friend = bare_friend();
        assert_eq!(friend.preference_or_default(), "Text/Chat");
        assert_eq!(friend.bio_or_default(), "");
        assert_eq!(friend.avatar_or_default(), DEFAULT_AVATAR);
    }

    #[test]
    fn test_empty_strings_use_defaults() {
        let mut friend = bare_friend();
        friend.preference = Some(String::new());
        friend.avatar = Some(String::new());
        assert_eq!(friend.preference_or_default(), DEFAULT_PREFERENCE);
        assert_eq!(friend.avatar_or_default(), DEFAULT_AVATAR);

        friend.preference = Some("Call".to_string());
        assert_eq!(friend.preference_or_default(), "Call");
    }

    #[test]
    fn test_new_friend_requires_name() {
        assert!(matches!(
            NewFriend::named("   ").validate(),
            Err(RapportError::InvalidInput(_))
        ));
        assert!(NewFriend::default().validate().is_err());

        let ok = NewFriend::named("  Mike Ross ").validate().unwrap();
        assert_eq!(ok.name, "Mike Ross");
    }

    #[test]
    fn test_new_friend_deserialize_without_name() {
        let req: NewFriend = serde_json::from_str(r#"{"email": "a@b.c"}"#).unwrap();
        assert_eq!(req.name, "");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_friend_update_only_sets_present_fields() {
        let update: FriendUpdate =
            serde_json::from_str(r#"{"bio": "Met at climbing", "phone": "555"}"#).unwrap();
        assert!(!update.is_empty());

        let update = update.validate().unwrap();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert_eq!(update.bio.as_deref(), Some("Met at climbing"));
        assert_eq!(update.phone.as_deref(), Some("555"));
    }

    #[test]
    fn test_friend_update_rejects_blank_name() {
        let update = FriendUpdate {
            name: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
        assert!(FriendUpdate::default().is_empty());
    }

    #[test]
    fn test_interaction_kind_default() {
        let req = NewInteraction::for_friend(FriendId(1));
        assert_eq!(req.kind_or_default(), "text");

        let req = req.with_kind("  ");
        assert_eq!(req.kind_or_default(), "text");

        let req = NewInteraction::for_friend(FriendId(1)).with_kind("meetup");
        assert_eq!(req.kind_or_default(), "meetup");
    }

    #[test]
    fn test_resolve_occurred_at() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        let req = NewInteraction::for_friend(FriendId(1));
        assert_eq!(req.resolve_occurred_at(now).unwrap(), now);

        let backfill = Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap();
        let req = NewInteraction::for_friend(FriendId(1)).at(backfill);
        assert_eq!(req.resolve_occurred_at(now).unwrap(), backfill);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        let midnight = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-14").unwrap(), midnight);
        assert_eq!(parse_timestamp("2025-03-14T00:00:00").unwrap(), midnight);
        assert_eq!(parse_timestamp("2025-03-14T02:00:00+02:00").unwrap(), midnight);
        assert!(matches!(
            parse_timestamp("last tuesday"),
            Err(RapportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_dashboard_payload_date_alias() {
        let req: NewInteraction =
            serde_json::from_str(r#"{"friendId": 3, "type": "call", "date": "2025-03-14"}"#)
                .unwrap();
        assert_eq!(req.friend_id, Some(FriendId(3)));
        assert_eq!(req.occurred_at.as_deref(), Some("2025-03-14"));
    }

    #[test]
    fn test_interaction_serializes_type_field() {
        let interaction = Interaction {
            id: InteractionId(7),
            friend_id: FriendId(1),
            kind: "video".to_string(),
            notes: None,
            occurred_at: Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&interaction).unwrap();
        assert_eq!(json["type"], "video");
        assert_eq!(json["friendId"], 1);
        assert!(json["occurredAt"].as_str().unwrap().starts_with("2025-03-14T12:00:00"));
    }
}
