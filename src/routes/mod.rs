// Route definitions

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{controller::LoadOutcome, loader::LoadTicket, AppState};

mod api;
mod auth;
mod controls;
mod pages;

pub fn create_router(app_state: AppState) -> Router {
    // JSON view of the same state the HTML pages render
    let api_router = Router::new()
        .route("/view", get(api::get_view))
        .route("/filters", put(api::put_filters))
        .route("/sort", put(api::put_sort))
        .with_state(app_state.clone());

    Router::new()
        .route("/", get(pages::index))
        .route("/login", post(auth::handle_login))
        .route("/logout", post(auth::handle_logout))
        .route("/refresh", post(controls::refresh))
        .route("/filters", post(controls::apply_filters))
        .route("/filters/clear", post(controls::clear_filters))
        .route("/sort/:key", get(controls::sort_by))
        .nest("/api", api_router)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

// Fetches outside the controller lock, then applies the response under it. Runs as its
// own task so a client hanging up cannot leave the load marked in flight.
pub(crate) async fn run_load(app_state: &AppState, ticket: LoadTicket) -> LoadOutcome {
    let state = app_state.clone();
    let task = tokio::spawn(async move {
        let result = ticket.fetch(state.source.as_ref()).await;
        state.viewer.lock().await.finish_load(ticket, result)
    });
    match task.await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "Load finished");
            outcome
        }
        Err(e) => {
            tracing::error!("Load task failed: {}", e);
            LoadOutcome::Failed(e.to_string())
        }
    }
}
