// Application state: session, dataset, filter and sort state, and the derived view

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::{
    backend::{AdvertSource, TransportError},
    loader::{records_from_body, DatasetLoader, LoadTicket},
    models::{Advert, FilterSpec, SortKey, SortSpec},
    options::FilterOptions,
    session::{CredentialSlot, Fetched, LoginAttempt, LoginState, SessionManager, SessionPhase},
    view::project_positions,
};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Replaced { count: usize },
    Failed(String),
    SessionExpired,
    Stale,
    Skipped, // logged out or already loading
}

/// Owns every piece of viewer state. Setters recompute the option sets and the
/// projected view before returning, so readers never see a stale view.
pub struct ViewerController {
    session: SessionManager,
    loader: DatasetLoader,
    dataset: Vec<Advert>,
    filters: FilterSpec,
    sort: SortSpec,
    options: FilterOptions,
    visible: Vec<usize>,
    error: Option<String>,
}

impl ViewerController {
    pub fn new(slot: Arc<dyn CredentialSlot>, records_path: impl Into<String>) -> Self {
        ViewerController {
            session: SessionManager::restore(slot),
            loader: DatasetLoader::new(records_path),
            dataset: Vec::new(),
            filters: FilterSpec::default(),
            sort: SortSpec::default(),
            options: FilterOptions::default(),
            visible: Vec::new(),
            error: None,
        }
    }

    // --- Readers ---

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn login_state(&self) -> &LoginState {
        self.session.login_state()
    }

    pub fn dataset(&self) -> &[Advert] {
        &self.dataset
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn view(&self) -> Vec<&Advert> {
        self.visible.iter().map(|&i| &self.dataset[i]).collect()
    }

    // --- Filter and sort setters ---

    pub fn set_filters(&mut self, filters: FilterSpec) {
        self.filters = filters;
        self.options.reconcile(&mut self.filters);
        self.recompute_view();
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterSpec::default();
        self.recompute_view();
    }

    pub fn request_sort(&mut self, key: SortKey) {
        self.sort.request(key);
        self.recompute_view();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.recompute_view();
    }

    fn replace_dataset(&mut self, dataset: Vec<Advert>) {
        self.dataset = dataset;
        self.options = FilterOptions::derive(&self.dataset);
        self.options.reconcile(&mut self.filters);
        self.recompute_view();
    }

    fn recompute_view(&mut self) {
        self.visible = project_positions(&self.dataset, &self.filters, &self.sort);
    }

    // --- Session ---

    /// Re-checks the durable credential slot; a cleared slot ends the session here too.
    pub fn sync_session(&mut self) {
        if self.session.is_authenticated() && self.session.authorize().is_none() {
            self.loader.invalidate();
        }
    }

    pub fn begin_login(&mut self, username: &str, password: &str) -> Option<LoginAttempt> {
        let path = self.loader.records_path().to_string();
        self.session.begin_login(username, password, &path)
    }

    /// Applies a login response. On success the first load (with a filter reset) is
    /// issued right away and its ticket returned.
    pub fn finish_login(&mut self, attempt: LoginAttempt, outcome: Result<Value, TransportError>) -> Option<LoadTicket> {
        if !self.session.finish_login(attempt, outcome) {
            return None;
        }
        self.error = None;
        self.loader.invalidate();
        self.begin_load(true)
    }

    pub async fn login(&mut self, source: &dyn AdvertSource, username: &str, password: &str) -> LoadOutcome {
        let Some(attempt) = self.begin_login(username, password) else {
            return LoadOutcome::Skipped;
        };
        let outcome = attempt.validate(source).await;
        match self.finish_login(attempt, outcome) {
            Some(ticket) => self.run_load(source, ticket).await,
            None => LoadOutcome::Skipped,
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.loader.invalidate();
        self.error = None;
        self.dataset.clear();
        self.options = FilterOptions::default();
        self.visible.clear();
    }

    // --- Loading ---

    pub fn begin_load(&mut self, reset_filters: bool) -> Option<LoadTicket> {
        let ticket = self.loader.begin(&mut self.session, reset_filters);
        if ticket.is_some() {
            self.error = None;
        } else if !self.session.is_authenticated() {
            // The slot may have been cleared under us
            self.loader.invalidate();
        }
        ticket
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Value, TransportError>) -> LoadOutcome {
        if !self.loader.accept(&ticket) {
            return LoadOutcome::Stale;
        }
        match self.session.settle(result) {
            Ok(Fetched::Body(body)) => {
                let records = records_from_body(body);
                let count = records.len();
                if ticket.reset_filters {
                    self.filters = FilterSpec::default();
                }
                self.replace_dataset(records);
                info!(count, reset_filters = ticket.reset_filters, "Dataset replaced.");
                LoadOutcome::Replaced { count }
            }
            Ok(Fetched::SessionExpired) => {
                self.loader.invalidate();
                LoadOutcome::SessionExpired
            }
            Ok(Fetched::NotAuthenticated) => LoadOutcome::Skipped,
            Err(e) => {
                tracing::warn!("Failed to load adverts: {}", e);
                let message = e.to_string();
                self.error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    async fn run_load(&mut self, source: &dyn AdvertSource, ticket: LoadTicket) -> LoadOutcome {
        let result = ticket.fetch(source).await;
        self.finish_load(ticket, result)
    }

    pub async fn load(&mut self, source: &dyn AdvertSource, reset_filters: bool) -> LoadOutcome {
        match self.begin_load(reset_filters) {
            Some(ticket) => self.run_load(source, ticket).await,
            None => LoadOutcome::Skipped,
        }
    }

    // Explicit refresh keeps the current filters
    pub async fn refresh(&mut self, source: &dyn AdvertSource) -> LoadOutcome {
        self.load(source, false).await
    }

    pub fn snapshot(&self) -> ViewerSnapshot<'_> {
        ViewerSnapshot {
            phase: self.phase(),
            authenticated: self.is_authenticated(),
            login: self.login_state(),
            options: &self.options,
            filters: &self.filters,
            sort: self.sort,
            records: self.view(),
            total: self.dataset.len(),
            shown: self.visible.len(),
            loading: self.is_loading(),
            error: self.error(),
        }
    }
}

/// Everything a renderer needs, borrowed from the controller.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerSnapshot<'a> {
    pub phase: SessionPhase,
    pub authenticated: bool,
    pub login: &'a LoginState,
    pub options: &'a FilterOptions,
    pub filters: &'a FilterSpec,
    pub sort: SortSpec,
    pub records: Vec<&'a Advert>,
    pub total: usize,
    pub shown: usize,
    pub loading: bool,
    pub error: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryCredentialSlot;
    use crate::models::SortDirection;
    use serde_json::json;

    fn controller_with(dataset: Value) -> ViewerController {
        let mut controller = ViewerController::new(Arc::new(MemoryCredentialSlot::with_token("YTpi")), "/api/sent-adverts");
        let ticket = controller.begin_load(true).unwrap();
        controller.finish_load(ticket, Ok(dataset));
        controller
    }

    fn titles(controller: &ViewerController) -> Vec<String> {
        controller.view().iter().map(|a| a.title.clone().unwrap_or_default()).collect()
    }

    #[test]
    fn setters_recompute_the_view() {
        let mut controller = controller_with(json!([
            { "title": "Golf", "brand": "VW", "price": 10000 },
            { "title": "A3", "brand": "Audi", "price": 15000 },
            { "title": "Polo", "brand": "VW", "price": 7000 }
        ]));

        controller.set_sort(SortSpec { key: SortKey::Price, direction: SortDirection::Ascending });
        assert_eq!(titles(&controller), vec!["Polo", "Golf", "A3"]);

        controller.set_filters(FilterSpec { brand: "VW".into(), ..FilterSpec::default() });
        assert_eq!(titles(&controller), vec!["Polo", "Golf"]);

        controller.request_sort(SortKey::Price);
        assert_eq!(titles(&controller), vec!["Golf", "Polo"]);

        controller.clear_filters();
        assert_eq!(controller.view().len(), 3);
    }

    #[test]
    fn selection_outside_the_options_is_dropped() {
        let mut controller = controller_with(json!([{ "brand": "VW" }]));
        controller.set_filters(FilterSpec { brand: "Tesla".into(), ..FilterSpec::default() });
        assert_eq!(controller.filters().brand, "");
        assert_eq!(controller.view().len(), 1);
    }

    #[test]
    fn reload_clears_a_vanished_selection() {
        let mut controller = controller_with(json!([{ "brand": "VW" }, { "brand": "Audi" }]));
        controller.set_filters(FilterSpec { brand: "Audi".into(), ..FilterSpec::default() });
        assert_eq!(controller.view().len(), 1);

        let ticket = controller.begin_load(false).unwrap();
        controller.finish_load(ticket, Ok(json!([{ "brand": "VW" }, { "brand": "Seat" }])));
        assert_eq!(controller.filters().brand, "");
        assert_eq!(controller.options().brands, vec!["Seat", "VW"]);
        assert_eq!(controller.view().len(), 2);
    }

    #[test]
    fn reset_load_restores_default_filters() {
        let mut controller = controller_with(json!([{ "brand": "VW", "year": 2010 }]));
        controller.set_filters(FilterSpec { year_min: "2015".into(), ..FilterSpec::default() });
        assert!(controller.view().is_empty());

        let ticket = controller.begin_load(false).unwrap();
        controller.finish_load(ticket, Ok(json!([{ "brand": "VW", "year": 2010 }])));
        assert_eq!(controller.filters().year_min, "2015");

        let ticket = controller.begin_load(true).unwrap();
        controller.finish_load(ticket, Ok(json!([{ "brand": "VW", "year": 2010 }])));
        assert_eq!(controller.filters(), &FilterSpec::default());
        assert_eq!(controller.view().len(), 1);
    }

    #[test]
    fn failed_load_keeps_the_dataset() {
        let mut controller = controller_with(json!([{ "title": "Golf" }]));
        let ticket = controller.begin_load(false).unwrap();
        let outcome = controller.finish_load(ticket, Err(TransportError::Status(502)));

        assert_eq!(outcome, LoadOutcome::Failed("HTTP 502".into()));
        assert_eq!(controller.error(), Some("HTTP 502"));
        assert_eq!(titles(&controller), vec!["Golf"]);
        assert!(!controller.is_loading());
    }

    #[test]
    fn logout_discards_in_flight_load_and_data() {
        let mut controller = controller_with(json!([{ "title": "Golf" }]));
        let ticket = controller.begin_load(false).unwrap();
        controller.logout();

        assert_eq!(controller.finish_load(ticket, Ok(json!([{ "title": "Late" }]))), LoadOutcome::Stale);
        assert!(controller.dataset().is_empty());
        assert!(controller.view().is_empty());
        assert_eq!(controller.phase(), SessionPhase::Unauthenticated);
    }

    #[test]
    fn snapshot_counts() {
        let mut controller = controller_with(json!([{ "brand": "VW" }, { "brand": "Audi" }]));
        controller.set_filters(FilterSpec { brand: "VW".into(), ..FilterSpec::default() });

        let snapshot = serde_json::to_value(controller.snapshot()).unwrap();
        assert_eq!(snapshot["total"], json!(2));
        assert_eq!(snapshot["shown"], json!(1));
        assert_eq!(snapshot["authenticated"], json!(true));
        assert_eq!(snapshot["sort"], json!({ "key": "advertCreatedAt", "direction": "desc" }));
        assert_eq!(snapshot["options"]["brands"], json!(["Audi", "VW"]));
        assert!(snapshot["login"].get("password").is_none());
    }
}
