use crate::errors::AppError;
use crate::models::{TimeBlockInput, WeekSnapshot, WeekendsRequest};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    Json,
};
use tokio_stream::{Stream, StreamExt, wrappers::WatchStream};
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.view.lock().await;
    Html(render_index(&view.snapshot()))
}

pub async fn get_week(State(state): State<AppState>) -> Json<WeekSnapshot> {
    let view = state.view.lock().await;
    Json(view.snapshot())
}

/// Streams a snapshot now and after every change.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let updates = state.view.lock().await.subscribe();
    let stream = WatchStream::new(updates)
        .map(|snapshot| Event::default().event("week").json_data(snapshot));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn previous_week(State(state): State<AppState>) -> Json<WeekSnapshot> {
    let mut view = state.view.lock().await;
    view.previous_week().await;
    Json(view.snapshot())
}

pub async fn next_week(State(state): State<AppState>) -> Json<WeekSnapshot> {
    let mut view = state.view.lock().await;
    view.next_week().await;
    Json(view.snapshot())
}

pub async fn current_week(State(state): State<AppState>) -> Json<WeekSnapshot> {
    let mut view = state.view.lock().await;
    view.go_to_today().await;
    Json(view.snapshot())
}

pub async fn set_weekends(
    State(state): State<AppState>,
    Json(payload): Json<WeekendsRequest>,
) -> Json<WeekSnapshot> {
    let mut view = state.view.lock().await;
    view.toggle_weekends(payload.show);
    Json(view.snapshot())
}

pub async fn open_add_form(
    State(state): State<AppState>,
    Path(day): Path<u8>,
) -> Result<Json<WeekSnapshot>, AppError> {
    let mut view = state.view.lock().await;
    view.open_add(day)?;
    Ok(Json(view.snapshot()))
}

pub async fn open_edit_form(
    State(state): State<AppState>,
    Path((day, id)): Path<(u8, String)>,
) -> Result<Json<WeekSnapshot>, AppError> {
    let mut view = state.view.lock().await;
    view.open_edit(day, &id)?;
    Ok(Json(view.snapshot()))
}

pub async fn submit_form(
    State(state): State<AppState>,
    Json(payload): Json<TimeBlockInput>,
) -> Result<Json<WeekSnapshot>, AppError> {
    let mut view = state.view.lock().await;
    if let Err(err) = view.submit_form(&payload).await {
        warn!("rejected time block: {err}");
        return Err(err.into());
    }
    Ok(Json(view.snapshot()))
}

pub async fn cancel_form(State(state): State<AppState>) -> Json<WeekSnapshot> {
    let mut view = state.view.lock().await;
    view.cancel_form();
    Json(view.snapshot())
}

pub async fn remove_block(
    State(state): State<AppState>,
    Path((day, id)): Path<(u8, String)>,
) -> Result<Json<WeekSnapshot>, AppError> {
    let mut view = state.view.lock().await;
    view.remove_block(day, &id).await?;
    Ok(Json(view.snapshot()))
}

pub async fn clock_in(State(state): State<AppState>) -> Result<Json<WeekSnapshot>, AppError> {
    let mut view = state.view.lock().await;
    view.clock_in().await?;
    Ok(Json(view.snapshot()))
}

pub async fn clock_out(State(state): State<AppState>) -> Result<Json<WeekSnapshot>, AppError> {
    let mut view = state.view.lock().await;
    view.clock_out().await?;
    Ok(Json(view.snapshot()))
}
