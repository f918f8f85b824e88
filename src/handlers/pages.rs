use std::fmt::Write as _;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::profiler::render::escape_html;
use crate::AppState;

use super::{layout, AppError, PageError};

const PAGE_SIZE: usize = 25;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Show users with ids greater than this.
    #[serde(default)]
    pub after: u64,
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Html<String> {
    let total = state.store.count();
    let users = state.store.list(params.after, PAGE_SIZE);
    tracing::info!(after = params.after, shown = users.len(), total, "listing users");

    let mut body = format!("<h1>Users</h1><p>{total} users</p><ul>");
    for user in &users {
        let _ = write!(
            body,
            "<li><a href=\"/users/{}\">{}</a> ({})</li>",
            user.id,
            escape_html(&user.name),
            escape_html(&user.role),
        );
    }
    body.push_str("</ul>");
    if let Some(last) = users.last().filter(|_| users.len() == PAGE_SIZE) {
        let _ = write!(body, "<a href=\"/?after={}\">next</a>", last.id);
    }

    layout("Users", &body)
}

// ─── GET /users/:id ──────────────────────────────────────────────

pub async fn show_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Html<String>, PageError> {
    let Some(user) = state.store.find(id) else {
        tracing::warn!(id, "user not found");
        return Err(AppError::NotFound(format!("user {id} not found")).into());
    };
    tracing::debug!(id, role = %user.role, "user loaded");

    let body = format!(
        "<h1>{}</h1><dl><dt>Email</dt><dd>{}</dd><dt>Role</dt><dd>{}</dd></dl>\
         <a href=\"/\">back</a>",
        escape_html(&user.name),
        escape_html(&user.email),
        escape_html(&user.role),
    );
    Ok(layout(&user.name, &body))
}
