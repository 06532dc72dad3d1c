//! Rapport - Personal Relationship Tracker
//!
//! Keeps a list of friends and a log of interactions with them, and derives:
//! - A 0-100 connection strength per friend (recency + volume)
//! - Dashboard overview numbers (friends, weekly activity, who needs attention)
//! - A seven-day activity chart
//!
//! # Architecture
//!
//! - **Types**: Friends, interactions and the derived dashboard records
//! - **Scoring / Stats**: Pure functions over friends and interactions
//! - **Storage**: `StorageBackend` trait with a libSQL implementation
//! - **Service**: `Tracker`, validation and glue between storage and scoring
//! - **API**: axum HTTP server for the dashboard
//!
//! # Example
//!
//! ```ignore
//! use rapport_core::{LibsqlStorage, NewFriend, NewInteraction, Tracker};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = LibsqlStorage::open_or_create("rapport.db").await?;
//!     let tracker = Tracker::new(Arc::new(storage));
//!
//!     let friend = tracker.create_friend(NewFriend::named("Saloni")).await?;
//!     tracker
//!         .log_interaction(NewInteraction::for_friend(friend.id).with_kind("call"))
//!         .await?;
//!
//!     let card = tracker.friend_card(friend.id).await?;
//!     println!("{}: {}%", card.name, card.connection);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod scoring;
pub mod service;
pub mod stats;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::RapportConfig;
pub use error::{RapportError, Result};
pub use service::Tracker;
pub use storage::{libsql::LibsqlStorage, StorageBackend};
pub use types::{
    Friend, FriendCard, FriendId, FriendUpdate, Interaction, InteractionId, NewFriend,
    NewInteraction, OverviewStats, WeeklyActivity,
};
