use axum::{
    extract::{Form, State},
    response::Redirect,
};
use serde::Deserialize;

use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

// Handler for POST /login. Outcome (including errors) shows up on the next render of "/".
pub async fn handle_login(
    State(app_state): State<AppState>,
    Form(form): Form<LoginRequest>,
) -> Redirect {
    let attempt = app_state.viewer.lock().await.begin_login(&form.username, &form.password);
    let Some(attempt) = attempt else {
        return Redirect::to("/");
    };

    // Validation and the first load finish even if the client goes away
    let state = app_state.clone();
    let task = tokio::spawn(async move {
        let outcome = attempt.validate(state.source.as_ref()).await;
        let ticket = state.viewer.lock().await.finish_login(attempt, outcome);
        if let Some(ticket) = ticket {
            super::run_load(&state, ticket).await;
        }
    });
    if let Err(e) = task.await {
        tracing::error!("Login task failed: {}", e);
    }
    Redirect::to("/")
}

pub async fn handle_logout(State(app_state): State<AppState>) -> Redirect {
    app_state.viewer.lock().await.logout();
    Redirect::to("/")
}
