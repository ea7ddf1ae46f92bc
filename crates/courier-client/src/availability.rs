//! # Availability
//!
//! Whether the courier is taking new orders. Starts offline.
//!
//! Changes are shown locally first and mirrored to the backend; a failed
//! call puts the previous value back. One change at a time, independent of
//! order transitions.
//!
//! Every session reset turns it back offline locally, without telling the
//! backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::gateway::RemoteGateway;
use crate::session::SessionManager;

/// Clears the in-flight flag on drop.
struct UpdateGuard<'a>(&'a AtomicBool);

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The courier's online/offline switch.
pub struct AvailabilityToggle {
    state: Arc<watch::Sender<bool>>,
    updating: AtomicBool,
    gateway: Arc<dyn RemoteGateway>,
    session: Arc<SessionManager>,
}

impl AvailabilityToggle {
    pub fn new(gateway: Arc<dyn RemoteGateway>, session: Arc<SessionManager>) -> Self {
        let (state, _) = watch::channel(false);
        let state = Arc::new(state);

        let weak: Weak<watch::Sender<bool>> = Arc::downgrade(&state);
        session.on_reset(move || {
            if let Some(state) = weak.upgrade() {
                if state.send_replace(false) {
                    debug!("Availability reset to offline");
                }
            }
        });

        AvailabilityToggle {
            state,
            updating: AtomicBool::new(false),
            gateway,
            session,
        }
    }

    /// Sets availability and returns the value now in effect.
    pub async fn set(&self, available: bool) -> ClientResult<bool> {
        self.session.require_signed_in()?;

        if self
            .updating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClientError::AvailabilityUpdateInProgress);
        }
        let _guard = UpdateGuard(&self.updating);

        let prior = self.state.send_replace(available);

        let result = self.gateway.set_availability(available).await;
        match self.session.absorb_expiry(result).await {
            Ok(()) => {
                info!(available, "Availability updated");
                Ok(available)
            }
            Err(err) => {
                let restored = self.session.is_signed_in() && prior;
                self.state.send_replace(restored);
                warn!(available, error = %err, "Availability change rolled back");
                Err(err)
            }
        }
    }

    /// Flips availability.
    pub async fn toggle(&self) -> ClientResult<bool> {
        let next = !*self.state.borrow();
        self.set(next).await
    }

    /// Current value; always `false` while signed out.
    pub fn is_available(&self) -> bool {
        self.session.is_signed_in() && *self.state.borrow()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl std::fmt::Debug for AvailabilityToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityToggle")
            .field("available", &*self.state.borrow())
            .field("updating", &self.is_updating())
            .finish_non_exhaustive()
    }
}
