//! "Meet the artist" event handlers.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::catalog::Event;
use crate::state::AppState;

/// Events that have not finished yet, soonest first.
pub async fn upcoming(State(state): State<AppState>) -> Json<Vec<Event>> {
    let today = Utc::now().date_naive();
    Json(
        state
            .catalog()
            .upcoming_events(today)
            .into_iter()
            .cloned()
            .collect(),
    )
}
