use axum::{Router, routing::get};
use tower_http::services::ServeFile;

use crate::{AppState, controllers::home_controller};

pub fn add_routes(router: Router<AppState>, index_file: &str) -> Router<AppState> {
    router
        .route_service("/", ServeFile::new(index_file))
        .route("/health", get(home_controller::health))
}
