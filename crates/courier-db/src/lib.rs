//! # courier-db: Local Persistence for the Courier Client
//!
//! Keeps the signed-in session on the device so a restart does not force
//! the courier to log in again.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionManager (courier-client)                                       │
//! │       │  Arc<dyn CredentialStore>                                      │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     courier-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Credential   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  Repository   │    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └───────▲───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │   SqliteCredentialStore ───────┘   MemoryCredentialStore       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  courier.db (platform data dir)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use courier_db::{Database, DbConfig, SqliteCredentialStore, CredentialStore};
//!
//! let db = Database::new(DbConfig::new("path/to/courier.db")).await?;
//! let store = SqliteCredentialStore::new(&db);
//! let token = store.load_token().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::credentials::CredentialRepository;
pub use store::{
    CredentialStore, MemoryCredentialStore, SqliteCredentialStore, PROFILE_KEY, TOKEN_KEY,
};
