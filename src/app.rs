use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/week", get(handlers::get_week))
        .route("/api/events", get(handlers::events))
        .route("/api/week/previous", post(handlers::previous_week))
        .route("/api/week/next", post(handlers::next_week))
        .route("/api/week/today", post(handlers::current_week))
        .route("/api/weekends", post(handlers::set_weekends))
        .route("/api/days/:day/form", post(handlers::open_add_form))
        .route("/api/days/:day/blocks/:id/edit", post(handlers::open_edit_form))
        .route("/api/days/:day/blocks/:id", delete(handlers::remove_block))
        .route("/api/form", post(handlers::submit_form).delete(handlers::cancel_form))
        .route("/api/clock/in", post(handlers::clock_in))
        .route("/api/clock/out", post(handlers::clock_out))
        .with_state(state)
}
