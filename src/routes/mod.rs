use axum::Router;
use tower_http::services::ServeDir;

use crate::{AppState, controllers::home_controller};

pub mod home_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router, &state.settings.index_file());

    router
        .nest_service("/static", ServeDir::new(&state.settings.static_dir))
        .fallback(home_controller::not_found)
        .with_state(state)
}
