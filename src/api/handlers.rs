//! Request handlers
//!
//! Thin wrappers over [`Tracker`](crate::service::Tracker): extract, call,
//! serialize. Validation and not-found handling surface as `RapportError`.

use super::server::AppState;
use crate::error::Result;
use crate::types::{
    FriendCard, FriendId, FriendUpdate, Interaction, InteractionId, NewFriend, NewInteraction,
    OverviewStats, WeeklyActivity,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::debug;

/// Liveness probe kept for the dashboard's connectivity check
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn test_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the Rapport backend!".to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn list_friends_handler(State(state): State<AppState>) -> Result<Json<Vec<FriendCard>>> {
    let cards = state.tracker.list_friend_cards().await?;
    debug!("Listing {} friends", cards.len());
    Ok(Json(cards))
}

pub async fn create_friend_handler(
    State(state): State<AppState>,
    Json(req): Json<NewFriend>,
) -> Result<(StatusCode, Json<FriendCard>)> {
    let card = state.tracker.create_friend(req).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_friend_handler(
    State(state): State<AppState>,
    Path(id): Path<FriendId>,
) -> Result<Json<FriendCard>> {
    Ok(Json(state.tracker.friend_card(id).await?))
}

pub async fn update_friend_handler(
    State(state): State<AppState>,
    Path(id): Path<FriendId>,
    Json(update): Json<FriendUpdate>,
) -> Result<Json<FriendCard>> {
    Ok(Json(state.tracker.update_friend(id, update).await?))
}

pub async fn delete_friend_handler(
    State(state): State<AppState>,
    Path(id): Path<FriendId>,
) -> Result<StatusCode> {
    state.tracker.delete_friend(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn friend_interactions_handler(
    State(state): State<AppState>,
    Path(id): Path<FriendId>,
) -> Result<Json<Vec<Interaction>>> {
    Ok(Json(state.tracker.interactions_for_friend(id).await?))
}

pub async fn list_interactions_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Interaction>>> {
    Ok(Json(state.tracker.list_interactions().await?))
}

/// Body returned after logging an interaction
#[derive(Debug, Serialize)]
pub struct InteractionLogged {
    pub message: String,
    pub data: Interaction,
}

pub async fn log_interaction_handler(
    State(state): State<AppState>,
    Json(req): Json<NewInteraction>,
) -> Result<(StatusCode, Json<InteractionLogged>)> {
    let interaction = state.tracker.log_interaction(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(InteractionLogged {
            message: "Interaction logged successfully!".to_string(),
            data: interaction,
        }),
    ))
}

pub async fn delete_interaction_handler(
    State(state): State<AppState>,
    Path(id): Path<InteractionId>,
) -> Result<StatusCode> {
    state.tracker.delete_interaction(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn overview_stats_handler(State(state): State<AppState>) -> Result<Json<OverviewStats>> {
    Ok(Json(state.tracker.overview_stats().await?))
}

pub async fn weekly_stats_handler(State(state): State<AppState>) -> Result<Json<WeeklyActivity>> {
    Ok(Json(state.tracker.weekly_activity().await?))
}
