// src/server/mod.rs

//! Thin HTTP surface over the suggestion service.

use crate::service::SuggestionService;
use crate::store::UserLikeRecord;
use crate::suggest::{ScoredSuggestion, SuggestionResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(service: Arc<SuggestionService>) -> Router {
    Router::new()
        .route("/suggestions", post(post_suggestions))
        .route("/likes", post(post_like))
        .route("/likes/{user_id}", get(get_likes))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct SuggestionsRequest {
    user_id: String,
    songs: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SuggestionsReply {
    status: &'static str,
    suggestions: Vec<ScoredSuggestion>,
}

async fn post_suggestions(
    State(service): State<Arc<SuggestionService>>,
    Json(request): Json<SuggestionsRequest>,
) -> Json<SuggestionsReply> {
    match service
        .get_suggestions(&request.user_id, &request.songs)
        .await
    {
        SuggestionResponse::Ranked(suggestions) => Json(SuggestionsReply {
            status: "ok",
            suggestions,
        }),
        SuggestionResponse::NoSuggestions => Json(SuggestionsReply {
            status: "no_suggestions",
            suggestions: Vec::new(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct LikeRequest {
    user_id: String,
    song: String,
}

#[derive(Debug, Serialize)]
struct LikeReply {
    status: &'static str,
    committed: Vec<String>,
    failed: usize,
}

async fn post_like(
    State(service): State<Arc<SuggestionService>>,
    Json(request): Json<LikeRequest>,
) -> Result<Json<LikeReply>, StatusCode> {
    match service.record_like(&request.user_id, &request.song).await {
        Ok(receipt) => Ok(Json(LikeReply {
            status: "ok",
            committed: receipt.committed,
            failed: receipt.failed.len(),
        })),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

#[derive(Debug, Serialize)]
struct LikesReply {
    likes: Vec<UserLikeRecord>,
}

async fn get_likes(
    State(service): State<Arc<SuggestionService>>,
    Path(user_id): Path<String>,
) -> Json<LikesReply> {
    Json(LikesReply {
        likes: service.load_likes(&user_id).await,
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
