//! # Orders
//!
//! The courier's orders and the protocol that moves them through their
//! lifecycle.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderStateMachine ─────── apply / confirm / roll back ─────┐          │
//! │     │  broadcast<OrderEvent>                                 │          │
//! │     │                                                        ▼          │
//! │     │                                         ┌──────────────────────┐ │
//! │     └── gateway call ──► RemoteGateway        │ OrderStore           │ │
//! │                                               │  active  (pending,   │ │
//! │                                               │   picked_up,         │ │
//! │                                               │   in_transit)        │ │
//! │                                               │  history (delivered, │ │
//! │                                               │   cancelled)         │ │
//! │                                               └──────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod events;
pub mod machine;
pub mod store;

pub use events::OrderEvent;
pub use machine::OrderStateMachine;
pub use store::{OrderStore, RefreshOutcome};
