// Filter, sort and refresh actions from the data view

use axum::{
    extract::{Form, Path, State},
    response::Redirect,
};

use crate::{
    error::{AppError, AppResult},
    models::{FilterSpec, SortKey},
    AppState,
};

pub async fn refresh(State(app_state): State<AppState>) -> Redirect {
    let ticket = app_state.viewer.lock().await.begin_load(false);
    if let Some(ticket) = ticket {
        super::run_load(&app_state, ticket).await;
    }
    Redirect::to("/")
}

pub async fn apply_filters(
    State(app_state): State<AppState>,
    Form(filters): Form<FilterSpec>,
) -> Redirect {
    tracing::debug!(?filters, "Applying filters");
    app_state.viewer.lock().await.set_filters(filters);
    Redirect::to("/")
}

pub async fn clear_filters(State(app_state): State<AppState>) -> Redirect {
    app_state.viewer.lock().await.clear_filters();
    Redirect::to("/")
}

pub async fn sort_by(
    State(app_state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Redirect> {
    let key: SortKey = key.parse().map_err(|e: crate::models::UnknownSortKey| AppError::BadRequest(e.to_string()))?;
    app_state.viewer.lock().await.request_sort(key);
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{routes::test_support, session::MemoryCredentialSlot};
    use std::time::Duration;

    #[tokio::test]
    async fn refresh_completes_after_the_client_hangs_up() {
        let state = test_support::state(MemoryCredentialSlot::with_token("YTpi"), Duration::from_millis(50));

        let request = refresh(State(state.clone()));
        assert!(tokio::time::timeout(Duration::from_millis(10), request).await.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let mut viewer = state.viewer.lock().await;
        assert!(!viewer.is_loading());
        assert_eq!(viewer.dataset().len(), 1);
        assert!(viewer.begin_load(false).is_some());
    }

    #[tokio::test]
    async fn unknown_sort_key_is_a_bad_request() {
        let state = test_support::state(MemoryCredentialSlot::with_token("YTpi"), Duration::ZERO);
        let result = sort_by(State(state), Path("mileage".to_string())).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
