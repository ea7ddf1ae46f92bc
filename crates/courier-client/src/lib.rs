//! # courier-client: Stateful Services for the Courier App
//!
//! Session handling, cached orders, the optimistic transition protocol and
//! the connection to the delivery backend.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          CourierClient                                  │
//! │                                                                         │
//! │  ┌────────────────┐                                                    │
//! │  │ SessionManager │  SignedOut → Authenticating → SignedIn             │
//! │  │ (watch)        │  gates everything below                            │
//! │  └───────┬────────┘                                                    │
//! │          │                                                              │
//! │  ┌───────▼────────┐  ┌────────────────────┐  ┌──────────────────────┐  │
//! │  │  OrderStore    │◄─│ OrderStateMachine  │  │ AvailabilityToggle   │  │
//! │  │ active/history │  │ Applied →          │  │ optimistic, rollback │  │
//! │  │ last-write-wins│  │ Confirmed |        │  │ on failure           │  │
//! │  └───────┬────────┘  │ RolledBack         │  └──────────────────────┘  │
//! │          │           └────────────────────┘                            │
//! │  ┌───────▼────────┐                                                    │
//! │  │EarningsService │  local summaries + backend figures                 │
//! │  └────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ RemoteGateway: HttpGateway (reqwest) │ CredentialStore (SQLite) │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier_client::{ClientConfig, CourierClient};
//!
//! let client = CourierClient::builder(ClientConfig::load_or_default(None))
//!     .build()
//!     .await?;
//!
//! client.session().login_with_pin("9876543210", "123456").await?;
//! client.orders().refresh_active().await?;
//! client.transitions().accept("T1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod client;
pub mod config;
pub mod earnings;
pub mod error;
pub mod gateway;
pub mod orders;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use availability::AvailabilityToggle;
pub use client::{CourierClient, CourierClientBuilder};
pub use config::{ApiSettings, ClientConfig, DeviceConfig, OrderSettings, StorageSettings};
pub use earnings::EarningsService;
pub use error::{ClientError, ClientResult};
pub use gateway::{AuthGrant, CompletionReceipt, HttpGateway, RemoteGateway};
pub use orders::{OrderEvent, OrderStateMachine, OrderStore, RefreshOutcome};
pub use session::{SessionManager, SessionStatus};
