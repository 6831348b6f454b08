use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/calendar/prev", post(handlers::nav_prev))
        .route("/calendar/next", post(handlers::nav_next))
        .route("/calendar/today", post(handlers::nav_today))
        .route("/settings", post(handlers::save_settings_form))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/calendar/navigate", post(handlers::navigate))
        .route("/api/calendar/month", post(handlers::set_month))
        .route("/api/deals", get(handlers::get_deals))
        .route(
            "/api/settings",
            get(handlers::get_settings).post(handlers::save_settings),
        )
        .with_state(state)
}
