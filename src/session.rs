// Credential-based session: login, authenticated fetches, expiry on 401, logout

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use serde_json::Value;
use std::{
    fmt, fs, io,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{AdvertSource, TransportError};

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired or unauthorized. Please log in.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Username and password are required";

// --- Credential ---

/// Opaque HTTP Basic token, `base64(username:password)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn basic(username: &str, password: &str) -> Self {
        Credential(STANDARD.encode(format!("{}:{}", username, password)))
    }

    // Blank tokens are not credentials
    pub fn from_token(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.trim().is_empty()).then_some(Credential(token))
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> String {
        format!("Basic {}", self.0)
    }
}

// Never print the token
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

// --- Durable slot ---

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("credential slot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single durable string slot mirroring the session credential.
pub trait CredentialSlot: Send + Sync {
    fn get(&self) -> Result<Option<String>, SlotError>;
    fn set(&self, token: &str) -> Result<(), SlotError>;
    fn remove(&self) -> Result<(), SlotError>;
}

// Token stored in one file; a missing or blank file is an empty slot
pub struct FileCredentialSlot {
    path: PathBuf,
}

impl FileCredentialSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentialSlot { path: path.into() }
    }

    fn io_error(&self, source: io::Error) -> SlotError {
        SlotError::Io { path: self.path.clone(), source }
    }
}

impl CredentialSlot for FileCredentialSlot {
    fn get(&self) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn set(&self, token: &str) -> Result<(), SlotError> {
        fs::write(&self.path, token).map_err(|e| self.io_error(e))
    }

    fn remove(&self) -> Result<(), SlotError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[derive(Default)]
pub struct MemoryCredentialSlot {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        MemoryCredentialSlot { token: Mutex::new(Some(token.to_string())) }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialSlot for MemoryCredentialSlot {
    fn get(&self) -> Result<Option<String>, SlotError> {
        Ok(self.slot().clone())
    }

    fn set(&self, token: &str) -> Result<(), SlotError> {
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SlotError> {
        *self.slot() = None;
        Ok(())
    }
}

// --- Session ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

// Login form as last submitted; the password is never serialized
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginState {
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub error: Option<String>,
    pub in_flight: bool,
}

/// A submitted login waiting for its validation request.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    credential: Credential,
    validation_path: String,
}

impl LoginAttempt {
    pub async fn validate(&self, source: &dyn AdvertSource) -> Result<Value, TransportError> {
        source.get_json(&self.validation_path, Some(&self.credential)).await
    }
}

/// Result of an authenticated request that did not fail in transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    NotAuthenticated, // nothing was sent
    SessionExpired,
    Body(Value),
}

pub struct SessionManager {
    credential: Option<Credential>,
    slot: Arc<dyn CredentialSlot>,
    login: LoginState,
}

impl SessionManager {
    /// Picks up a credential left in the durable slot by an earlier run.
    pub fn restore(slot: Arc<dyn CredentialSlot>) -> Self {
        let credential = match slot.get() {
            Ok(token) => token.and_then(Credential::from_token),
            Err(e) => {
                warn!("Failed to read credential slot, starting logged out: {}", e);
                None
            }
        };
        if credential.is_some() {
            info!("Restored session from credential slot.");
        }
        SessionManager { credential, slot, login: LoginState::default() }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.credential.is_some() {
            SessionPhase::Authenticated
        } else if self.login.in_flight {
            SessionPhase::Authenticating
        } else {
            SessionPhase::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn login_state(&self) -> &LoginState {
        &self.login
    }

    /// Starts a login. Refused while another login is in flight, and refused locally
    /// when either input is blank.
    pub fn begin_login(&mut self, username: &str, password: &str, validation_path: &str) -> Option<LoginAttempt> {
        if self.login.in_flight {
            tracing::debug!("Login already in flight, ignoring resubmission");
            return None;
        }
        self.login.username = username.to_string();
        self.login.password = password.to_string();
        if username.is_empty() || password.is_empty() {
            self.login.error = Some(MISSING_CREDENTIALS_MESSAGE.to_string());
            return None;
        }
        self.login.in_flight = true;
        self.login.error = None;
        Some(LoginAttempt {
            credential: Credential::basic(username, password),
            validation_path: validation_path.to_string(),
        })
    }

    /// Applies the validation response. Only a successful response persists anything.
    pub fn finish_login(&mut self, attempt: LoginAttempt, outcome: Result<Value, TransportError>) -> bool {
        self.login.in_flight = false;
        let failure = match outcome {
            Ok(_) => match self.slot.set(attempt.credential.token()) {
                Ok(()) => {
                    info!(username = %self.login.username, "Login succeeded.");
                    self.credential = Some(attempt.credential);
                    self.login = LoginState::default();
                    return true;
                }
                Err(e) => e.to_string(),
            },
            Err(TransportError::Unauthorized) => INVALID_CREDENTIALS_MESSAGE.to_string(),
            Err(TransportError::Status(code)) => format!("Login failed (HTTP {})", code),
            Err(e) => e.to_string(),
        };
        warn!(username = %self.login.username, "Login failed: {}", failure);
        self.login.error = Some(failure);
        false
    }

    pub async fn login(&mut self, source: &dyn AdvertSource, username: &str, password: &str, validation_path: &str) -> bool {
        let Some(attempt) = self.begin_login(username, password, validation_path) else {
            return false;
        };
        let outcome = attempt.validate(source).await;
        self.finish_login(attempt, outcome)
    }

    /// The credential to attach to the next request, if the session is still alive.
    /// The durable slot wins: cleared elsewhere ends the session, replaced elsewhere
    /// adopts the new token.
    pub fn authorize(&mut self) -> Option<Credential> {
        let held = self.credential.as_ref()?;
        match self.slot.get() {
            Ok(Some(token)) if token == held.token() => {}
            Ok(Some(token)) => {
                info!("Credential slot changed outside this session, adopting it.");
                self.credential = Credential::from_token(token);
            }
            Ok(None) => {
                info!("Credential slot was cleared, ending session.");
                self.credential = None;
                self.login.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
            }
            Err(e) => warn!("Failed to read credential slot, keeping session: {}", e),
        }
        self.credential.clone()
    }

    /// Converts a response to an authenticated request: a 401 ends the session
    /// instead of being reported as an error.
    pub fn settle(&mut self, result: Result<Value, TransportError>) -> Result<Fetched, TransportError> {
        match result {
            Ok(body) => Ok(Fetched::Body(body)),
            Err(TransportError::Unauthorized) => {
                self.expire();
                Ok(Fetched::SessionExpired)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn authenticated_fetch(&mut self, source: &dyn AdvertSource, path: &str) -> Result<Fetched, TransportError> {
        let Some(credential) = self.authorize() else {
            return Ok(Fetched::NotAuthenticated);
        };
        let result = source.get_json(path, Some(&credential)).await;
        self.settle(result)
    }

    pub fn expire(&mut self) {
        warn!("Backend rejected the credential, session expired.");
        self.clear_credential();
        self.login.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
    }

    pub fn logout(&mut self) {
        info!("Logged out.");
        self.clear_credential();
        self.login = LoginState::default();
    }

    fn clear_credential(&mut self) {
        self.credential = None;
        if let Err(e) = self.slot.remove() {
            warn!("Failed to clear credential slot: {}", e);
        }
    }
}
