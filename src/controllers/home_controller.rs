use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Html("ok".to_string()))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html("not found".to_string()))
}
