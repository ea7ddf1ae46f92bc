//! # Session Manager
//!
//! Owns the courier's signed-in session and gates every other service.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌────────────┐  login / verify_otp  ┌────────────────┐               │
//! │   │ SignedOut  │─────────────────────►│ Authenticating │               │
//! │   └────────────┘                      └───────┬────────┘               │
//! │        ▲   ▲          rejected / network /    │                        │
//! │        │   └──────────── storage failure ─────┤                        │
//! │        │                                      │ token + profile        │
//! │        │                                      │ persisted              │
//! │        │   logout / 401 (expire)      ┌───────▼────────┐               │
//! │        └──────────────────────────────│    SignedIn    │               │
//! │                                       └────────────────┘               │
//! │                                                                         │
//! │   restore(): persisted token + profile ──► SignedIn (no network)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every status change is published on a `watch` channel, so services
//! holding a receiver see `SignedOut` as soon as it happens.
//!
//! `SignedIn` holds exactly when both a token and a profile are held.
//!
//! ## Reset Hooks
//! Services caching per-courier data register a hook with
//! [`SessionManager::on_reset`]. Hooks run synchronously whenever the
//! session drops to `SignedOut` (logout, expiry, failed sign-in) and when
//! a new sign-in starts, so nothing cached survives into the next session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use courier_core::validation::{validate_otp, validate_phone_number, validate_pin};
use courier_core::Profile;
use courier_db::CredentialStore;

use crate::error::{ClientError, ClientResult};
use crate::gateway::{AuthGrant, RemoteGateway};

// =============================================================================
// Session Status
// =============================================================================

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    SignedOut,
    Authenticating,
    SignedIn,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::SignedOut => "signed out",
            SessionStatus::Authenticating => "authenticating",
            SessionStatus::SignedIn => "signed in",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    status: SessionStatus,
    token: Option<String>,
    profile: Option<Profile>,
}

type ResetHook = Box<dyn Fn() + Send + Sync>;

// =============================================================================
// Session Manager
// =============================================================================

/// The courier's session.
pub struct SessionManager {
    state: RwLock<SessionState>,
    status_tx: watch::Sender<SessionStatus>,
    reset_hooks: Mutex<Vec<ResetHook>>,
    gateway: Arc<dyn RemoteGateway>,
    store: Arc<dyn CredentialStore>,
}

impl SessionManager {
    /// Creates a signed-out session manager.
    pub fn new(gateway: Arc<dyn RemoteGateway>, store: Arc<dyn CredentialStore>) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::SignedOut);
        SessionManager {
            state: RwLock::new(SessionState::default()),
            status_tx,
            reset_hooks: Mutex::new(Vec::new()),
            gateway,
            store,
        }
    }

    /// Registers `hook` to run on every reset.
    ///
    /// Hooks run while the session lock is held and must not block on the
    /// session themselves.
    pub fn on_reset(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.reset_hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(hook));
    }

    fn run_reset_hooks(&self) {
        let hooks = self
            .reset_hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for hook in hooks.iter() {
            hook();
        }
    }

    // =========================================================================
    // Restore
    // =========================================================================

    /// Resumes a persisted session without contacting the backend.
    ///
    /// ## When This Occurs
    /// Once, at startup. Unreadable or partial credentials leave the
    /// session signed out; the problem is logged, never returned.
    pub async fn restore(&self) -> SessionStatus {
        let mut state = self.state.write().await;
        if state.status != SessionStatus::SignedOut {
            return state.status;
        }

        match self.load_persisted().await {
            Ok(Some((token, profile))) => {
                info!(courier_id = %profile.id, "Session restored");
                *state = SessionState {
                    status: SessionStatus::SignedIn,
                    token: Some(token),
                    profile: Some(profile),
                };
                self.status_tx.send_replace(SessionStatus::SignedIn);
            }
            Ok(None) => debug!("No persisted session"),
            Err(e) => warn!(error = %e, "Could not restore session, starting signed out"),
        }

        state.status
    }

    async fn load_persisted(&self) -> ClientResult<Option<(String, Profile)>> {
        let token = self.store.load_token().await?;
        let profile = self.store.load_profile().await?;

        match (token, profile) {
            (Some(token), Some(json)) => {
                let profile: Profile = serde_json::from_str(&json).map_err(|e| {
                    ClientError::Storage(format!("stored profile is unreadable: {}", e))
                })?;
                Ok(Some((token, profile)))
            }
            (None, None) => Ok(None),
            _ => {
                warn!("Persisted session is incomplete, ignoring it");
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Sign In
    // =========================================================================

    /// Signs in with phone number and 6-digit PIN.
    pub async fn login_with_pin(&self, phone: &str, pin: &str) -> ClientResult<Profile> {
        let phone = validate_phone_number(phone)?;
        let pin = validate_pin(pin)?;

        self.begin_authentication().await?;
        debug!("Signing in with PIN");
        let result = self.gateway.login(&phone, &pin).await;
        self.finish_authentication(result).await
    }

    /// Asks the backend to send a one-time password. Safe to repeat.
    pub async fn request_otp(&self, phone: &str) -> ClientResult<()> {
        let phone = validate_phone_number(phone)?;
        self.gateway.request_otp(&phone).await?;
        info!("One-time password requested");
        Ok(())
    }

    /// Signs in with a one-time password.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> ClientResult<Profile> {
        let phone = validate_phone_number(phone)?;
        let code = validate_otp(code)?;

        self.begin_authentication().await?;
        debug!("Signing in with one-time password");
        let result = self.gateway.verify_otp(&phone, &code).await;
        self.finish_authentication(result).await
    }

    async fn begin_authentication(&self) -> ClientResult<()> {
        let mut state = self.state.write().await;
        match state.status {
            SessionStatus::Authenticating => Err(ClientError::AuthenticationInProgress),
            SessionStatus::SignedIn => Err(ClientError::AlreadySignedIn),
            SessionStatus::SignedOut => {
                state.status = SessionStatus::Authenticating;
                self.status_tx.send_replace(SessionStatus::Authenticating);
                self.run_reset_hooks();
                Ok(())
            }
        }
    }

    async fn finish_authentication(&self, result: ClientResult<AuthGrant>) -> ClientResult<Profile> {
        let mut state = self.state.write().await;

        // A logout while the request was out cancels the sign-in.
        if state.status != SessionStatus::Authenticating {
            return Err(ClientError::auth_rejected("sign-in was cancelled"));
        }

        let grant = match result {
            Ok(grant) => grant,
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.reset(&mut state);
                return Err(e);
            }
        };

        let persisted = match serde_json::to_string(&grant.profile) {
            Ok(json) => self
                .store
                .save_session(&grant.token, &json)
                .await
                .map_err(ClientError::from),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        };
        if let Err(e) = persisted {
            warn!(error = %e, "Could not persist session");
            self.reset(&mut state);
            return Err(e);
        }

        info!(courier_id = %grant.profile.id, "Signed in");
        let profile = grant.profile.clone();
        *state = SessionState {
            status: SessionStatus::SignedIn,
            token: Some(grant.token),
            profile: Some(grant.profile),
        };
        self.status_tx.send_replace(SessionStatus::SignedIn);
        Ok(profile)
    }

    fn reset(&self, state: &mut SessionState) {
        *state = SessionState::default();
        self.status_tx.send_replace(SessionStatus::SignedOut);
        self.run_reset_hooks();
    }

    // =========================================================================
    // Sign Out
    // =========================================================================

    /// Signs out. Never fails.
    ///
    /// In-memory state is cleared and published first. The persisted
    /// credentials are removed before the session lock is released, so a
    /// sign-in waiting on the lock is never wiped by this logout. If removal
    /// fails they are blanked instead, which the store reports as absent.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        self.reset(&mut state);

        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to remove persisted credentials, blanking them");
            if let Err(e) = self.store.save_session("", "").await {
                error!(error = %e, "Persisted credentials could not be blanked either");
            }
        }
        drop(state);
        info!("Signed out");
    }

    /// Forced logout after the backend stopped accepting the token.
    pub async fn expire(&self) {
        warn!("Session expired, signing out");
        self.logout().await;
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Replaces the cached profile.
    ///
    /// Persisted first, then cached. Nothing is sent to the backend.
    pub async fn update_profile(&self, profile: Profile) -> ClientResult<()> {
        let mut state = self.state.write().await;
        if state.status != SessionStatus::SignedIn {
            return Err(ClientError::NotSignedIn);
        }

        self.persist_profile(&mut state, profile).await?;
        Ok(())
    }

    /// Fetches the profile from the backend and replaces the cached one.
    ///
    /// ## When This Occurs
    /// The profile screen opens. The fetched profile is dropped if the
    /// session ended or changed hands while the request was out.
    pub async fn refresh_profile(&self) -> ClientResult<Profile> {
        self.require_signed_in()?;
        let token = self.token().await;

        let result = self.gateway.get_profile().await;
        let profile = self.absorb_expiry(result).await?;

        let mut state = self.state.write().await;
        if state.status != SessionStatus::SignedIn || state.token != token {
            return Err(ClientError::NotSignedIn);
        }

        self.persist_profile(&mut state, profile.clone()).await?;
        info!(courier_id = %profile.id, "Profile refreshed");
        Ok(profile)
    }

    async fn persist_profile(&self, state: &mut SessionState, profile: Profile) -> ClientResult<()> {
        let json =
            serde_json::to_string(&profile).map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store.save_profile(&json).await?;

        debug!(courier_id = %profile.id, "Profile updated");
        state.profile = Some(profile);
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    pub fn is_signed_in(&self) -> bool {
        self.status() == SessionStatus::SignedIn
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.read().await.profile.clone()
    }

    pub(crate) fn require_signed_in(&self) -> ClientResult<()> {
        if self.is_signed_in() {
            Ok(())
        } else {
            Err(ClientError::NotSignedIn)
        }
    }

    /// Turns a `SessionExpired` result into a forced logout, then passes
    /// the result through unchanged.
    pub(crate) async fn absorb_expiry<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if matches!(result, Err(ClientError::SessionExpired)) {
            self.expire().await;
        }
        result
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
