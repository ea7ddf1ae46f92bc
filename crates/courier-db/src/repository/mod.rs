//! # Repository Module
//!
//! Database repository implementations for the courier client.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqliteCredentialStore                                                 │
//! │       │                                                                 │
//! │       │  repo.put_many(&[("auth_token", ..), ("user_profile", ..)])    │
//! │       ▼                                                                 │
//! │  CredentialRepository                                                  │
//! │  ├── get(&self, key)                                                   │
//! │  ├── put(&self, key, value)                                            │
//! │  ├── put_many(&self, entries)      (one transaction)                   │
//! │  ├── remove(&self, key)                                                │
//! │  ├── remove_many(&self, keys)      (one transaction)                   │
//! │  └── count(&self)                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite `credentials` table                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod credentials;
