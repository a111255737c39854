// Dataset loading: sequence-numbered fetches of the advert collection

use serde_json::Value;

use crate::{
    backend::{AdvertSource, TransportError},
    models::Advert,
    session::{Credential, SessionManager},
};

/// One issued load. Only the most recently issued ticket may apply its response.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    seq: u64,
    credential: Credential,
    path: String,
    pub reset_filters: bool,
}

impl LoadTicket {
    pub async fn fetch(&self, source: &dyn AdvertSource) -> Result<Value, TransportError> {
        source.get_json(&self.path, Some(&self.credential)).await
    }
}

pub struct DatasetLoader {
    records_path: String,
    seq: u64,
    in_flight: Option<u64>,
}

impl DatasetLoader {
    pub fn new(records_path: impl Into<String>) -> Self {
        DatasetLoader { records_path: records_path.into(), seq: 0, in_flight: None }
    }

    pub fn records_path(&self) -> &str {
        &self.records_path
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Issues a ticket, or `None` when logged out or a load is already running.
    pub fn begin(&mut self, session: &mut SessionManager, reset_filters: bool) -> Option<LoadTicket> {
        if self.is_loading() {
            tracing::debug!("Load already in flight, ignoring");
            return None;
        }
        let credential = session.authorize()?;
        self.seq += 1;
        self.in_flight = Some(self.seq);
        tracing::debug!(seq = self.seq, reset_filters, "Starting dataset load");
        Some(LoadTicket { seq: self.seq, credential, path: self.records_path.clone(), reset_filters })
    }

    /// Claims the response slot for `ticket`. False for a ticket that was superseded,
    /// e.g. by a logout while it was in flight.
    pub fn accept(&mut self, ticket: &LoadTicket) -> bool {
        if self.in_flight != Some(ticket.seq) {
            tracing::debug!(seq = ticket.seq, current = self.seq, "Discarding stale load response");
            return false;
        }
        self.in_flight = None;
        true
    }

    // Any outstanding ticket becomes stale
    pub fn invalidate(&mut self) {
        self.seq += 1;
        self.in_flight = None;
    }
}

/// The collection as records. A body that is not an array counts as empty; an
/// element that is not an advert object becomes an advert with every field absent.
pub fn records_from_body(body: Value) -> Vec<Advert> {
    let Value::Array(items) = body else {
        tracing::warn!("Backend response is not an array, treating as empty");
        return Vec::new();
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value::<Advert>(item).unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Record is not an object, keeping it as an empty advert");
                Advert::default()
            })
        })
        .collect()
}
