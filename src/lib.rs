// StandVirtual Advisor: filter, sort and session engine for a vehicle-advert viewer,
// plus the local web front end that renders it.

use axum::extract::FromRef;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod backend;
pub mod coerce;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod format;
pub mod loader;
pub mod models;
pub mod options;
pub mod routes;
pub mod session;
pub mod sort;
pub mod view;

use crate::{backend::AdvertSource, controller::ViewerController};

// Shared state handed to every handler. The controller lock is never held across
// backend requests.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub source: Arc<dyn AdvertSource>,
    pub viewer: Arc<Mutex<ViewerController>>,
    pub display_tz: Tz,
}
