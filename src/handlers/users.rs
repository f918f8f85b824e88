use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::store::User;
use crate::AppState;

use super::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "viewer".into()
}

// ─── GET /api/users/:id ──────────────────────────────────────────

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<User>, AppError> {
    state
        .store
        .find(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user '{id}' not found")))
}

// ─── POST /api/users ─────────────────────────────────────────────

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("email must contain '@'".into()));
    }

    let user = state.store.insert(req.name, req.email, req.role);
    tracing::info!(id = user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}
