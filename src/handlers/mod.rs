pub mod pages;
pub mod users;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::profiler::render::escape_html;

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
}

impl AppError {
    fn parts(self) -> (StatusCode, String) {
        match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

/// Same errors, rendered as a page for the HTML routes.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, message) = self.0.parts();
        let title = status.canonical_reason().unwrap_or("Error");
        let body = format!("<h1>{title}</h1><p>{}</p>", escape_html(&message));
        (status, layout(title, &body)).into_response()
    }
}

// ─── Page shell ──────────────────────────────────────────────────

pub fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body>\n{body}\n</body>\n</html>\n",
        escape_html(title),
    ))
}
