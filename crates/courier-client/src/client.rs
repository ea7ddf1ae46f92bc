//! # Courier Client
//!
//! One handle wiring every service to a shared session, gateway and
//! credential store.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CourierClientBuilder::new(config)                                     │
//! │      .with_gateway(..)            default: HttpGateway(config.api)     │
//! │      .with_credential_store(..)   default: SQLite at                   │
//! │                                   config.storage.database_path         │
//! │      .build().await                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │   SessionManager ◄── OrderStore ◄── OrderStateMachine                  │
//! │         ▲       ◄── AvailabilityToggle                                 │
//! │         └─────────── EarningsService                                   │
//! │                                                                         │
//! │   build() ends with session.restore()                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::{debug, info};

use courier_db::{CredentialStore, Database, DbConfig, SqliteCredentialStore};

use crate::availability::AvailabilityToggle;
use crate::config::ClientConfig;
use crate::earnings::EarningsService;
use crate::error::ClientResult;
use crate::gateway::{HttpGateway, RemoteGateway};
use crate::orders::{OrderStateMachine, OrderStore};
use crate::session::{SessionManager, SessionStatus};

// =============================================================================
// Client
// =============================================================================

/// Entry point for a courier app.
#[derive(Debug)]
pub struct CourierClient {
    config: ClientConfig,
    session: Arc<SessionManager>,
    orders: Arc<OrderStore>,
    transitions: Arc<OrderStateMachine>,
    availability: Arc<AvailabilityToggle>,
    earnings: Arc<EarningsService>,
    database: Option<Database>,
}

impl CourierClient {
    pub fn builder(config: ClientConfig) -> CourierClientBuilder {
        CourierClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn orders(&self) -> &Arc<OrderStore> {
        &self.orders
    }

    pub fn transitions(&self) -> &Arc<OrderStateMachine> {
        &self.transitions
    }

    pub fn availability(&self) -> &Arc<AvailabilityToggle> {
        &self.availability
    }

    pub fn earnings(&self) -> &Arc<EarningsService> {
        &self.earnings
    }

    /// Signs out. Cached orders and availability are reset by the session.
    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Closes the local database, if this client opened one.
    pub async fn shutdown(self) {
        if let Some(db) = self.database {
            db.close().await;
        }
        info!("Courier client shut down");
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`CourierClient`].
pub struct CourierClientBuilder {
    config: ClientConfig,
    gateway: Option<Arc<dyn RemoteGateway>>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl CourierClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        CourierClientBuilder {
            config,
            gateway: None,
            credentials: None,
        }
    }

    /// Uses `gateway` instead of an `HttpGateway`.
    pub fn with_gateway(mut self, gateway: Arc<dyn RemoteGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Uses `store` instead of the SQLite credential store.
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Opens storage, wires the services and restores any saved session.
    pub async fn build(self) -> ClientResult<CourierClient> {
        self.config.validate()?;

        let (credentials, database) = match self.credentials {
            Some(store) => (store, None),
            None => {
                let path = &self.config.storage.database_path;
                debug!(?path, "Opening credential database");
                let db = Database::new(DbConfig::new(path)).await?;
                let store: Arc<dyn CredentialStore> = Arc::new(SqliteCredentialStore::new(&db));
                (store, Some(db))
            }
        };

        let gateway: Arc<dyn RemoteGateway> = match self.gateway {
            Some(gateway) => gateway,
            None => Arc::new(HttpGateway::new(&self.config.api, Arc::clone(&credentials))?),
        };

        let session = Arc::new(SessionManager::new(
            Arc::clone(&gateway),
            Arc::clone(&credentials),
        ));
        let orders = Arc::new(OrderStore::new(
            Arc::clone(&gateway),
            Arc::clone(&session),
            self.config.orders.history_page_size,
        ));
        let transitions = Arc::new(OrderStateMachine::new(
            Arc::clone(&orders),
            Arc::clone(&session),
            Arc::clone(&gateway),
        ));
        let availability = Arc::new(AvailabilityToggle::new(
            Arc::clone(&gateway),
            Arc::clone(&session),
        ));
        let earnings = Arc::new(EarningsService::new(
            Arc::clone(&session),
            Arc::clone(&orders),
            Arc::clone(&gateway),
            self.config.orders.earnings_history_limit,
        ));

        let status = session.restore().await;
        info!(
            device_id = %self.config.device_id(),
            session = %status,
            "Courier client ready"
        );
        if status == SessionStatus::SignedIn {
            debug!("Resumed saved session");
        }

        Ok(CourierClient {
            config: self.config,
            session,
            orders,
            transitions,
            availability,
            earnings,
            database,
        })
    }
}
