//! Login state around a [`DataSource`].
//!
//! A session starts unauthenticated. A successful [`Session::login`] loads
//! the full community batch into a [`RecordStore`]; [`Session::logout`]
//! drops the store and tells the source to forget its credentials. A
//! failed login leaves the session exactly as it was.

use ecomonitor_core::{MonitorError, Result};
use ecomonitor_data::source::{Credentials, DataSource};
use ecomonitor_data::store::RecordStore;

/// Where a session is in its lifecycle.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated { store: RecordStore },
}

/// A dashboard session bound to one data source.
pub struct Session<S> {
    source: S,
    state: SessionState,
}

impl<S: DataSource> Session<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: SessionState::Unauthenticated,
        }
    }

    /// Authenticate and load the community.
    ///
    /// Returns [`MonitorError::SessionActive`] when already logged in.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&RecordStore> {
        if self.is_authenticated() {
            return Err(MonitorError::SessionActive);
        }

        tracing::info!(source = self.source.label(), email = %credentials.email, "logging in");
        let data = self.source.connect(credentials).await.map_err(|e| {
            tracing::warn!(error = %e, blocking = e.is_blocking(), "login failed");
            e
        })?;
        tracing::info!(
            residents = data.residents.len(),
            records = data.usage.len(),
            "community loaded"
        );

        self.state = SessionState::Authenticated {
            store: RecordStore::new(data),
        };
        self.store().ok_or(MonitorError::NotAuthenticated)
    }

    /// Drop the loaded data and any cached credential. A no-op when
    /// already logged out.
    pub fn logout(&mut self) {
        if let SessionState::Authenticated { .. } = std::mem::take(&mut self.state) {
            tracing::info!("logged out");
        }
        self.source.disconnect();
    }

    pub fn store(&self) -> Option<&RecordStore> {
        match &self.state {
            SessionState::Authenticated { store } => Some(store),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn label(&self) -> &'static str {
        self.source.label()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
