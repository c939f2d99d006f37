//! Auth session: the single live session and its lifecycle.
//!
//! The session is published through a `watch` channel. Views and the route
//! guard subscribe to it; nothing reads the token store directly.
//!
//! Lifecycle: `Loading` at startup, then `Authenticated` or `Unauthenticated`.
//! Refreshes are tagged with a generation number; a result only lands if no
//! newer refresh, login or logout was issued while it was in flight.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Local;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use tenantdesk_auth::{BearerToken, Permission, Role, RoleGrant, Session, SessionProfile};

use crate::admin::AdminApi;
use crate::client::{ApiClient, CredentialCell, UnauthorizedHook};
use crate::config::ConsoleConfig;
use crate::error::ClientError;
use crate::store::{StoredToken, TokenStore};
use crate::types::{LoginResponse, UserInfoDto};

/// Published authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Startup validation of a persisted token has not settled yet.
    Loading,
    Unauthenticated,
    Authenticated(Arc<Session>),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

struct Shared {
    state: watch::Sender<AuthState>,
    store: Arc<dyn TokenStore>,
    credentials: CredentialCell,
    generation: AtomicU64,
    login_path: String,
    forced_redirect: Mutex<Option<String>>,
}

impl Shared {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publish `next` only if `generation` is still the latest one issued.
    fn settle(&self, generation: u64, next: AuthState) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Discard token, store and session if `allowed` holds.
    ///
    /// The check and the clear run under the state lock, so no token install
    /// or settle can interleave between them.
    fn sign_out_when(&self, allowed: impl FnOnce(&Self) -> bool) -> bool {
        let mut signed_out = false;
        self.state.send_if_modified(|state| {
            if !allowed(self) {
                return false;
            }
            signed_out = true;
            self.next_generation();
            self.credentials.clear();
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "failed to discard persisted token");
            }
            if *state == AuthState::Unauthenticated {
                return false;
            }
            *state = AuthState::Unauthenticated;
            true
        });
        signed_out
    }

    fn sign_out(&self) {
        self.sign_out_when(|_| true);
    }

    /// Sign out on behalf of refresh `generation`, unless something newer was issued.
    fn sign_out_if_current(&self, generation: u64) -> bool {
        self.sign_out_when(|shared| shared.is_current(generation))
    }

    /// Persist and activate a freshly issued token. Supersedes in-flight refreshes.
    fn install(&self, stored: StoredToken) {
        self.state.send_if_modified(|_| {
            self.next_generation();
            if let Err(err) = self.store.save(&stored) {
                warn!(error = %err, "failed to persist session token; session will not survive restart");
            }
            self.credentials.set(stored.token);
            false
        });
    }

    /// 401 hook target: discard the session the rejected token belonged to.
    fn expire(&self, token: &BearerToken) {
        let expired = self.sign_out_when(|shared| {
            !shared.credentials.current().is_some_and(|current| &current != token)
        });
        if !expired {
            debug!("ignoring 401 for a superseded token");
            return;
        }

        warn!("session expired; signed out, redirecting to login");
        *self.forced_redirect.lock().unwrap_or_else(|p| p.into_inner()) = Some(self.login_path.clone());
    }
}

/// Handle to the process-wide auth session. Clones share the same state.
#[derive(Clone)]
pub struct AuthSession {
    shared: Arc<Shared>,
    client: ApiClient,
}

impl core::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthSession")
            .field("state", &*self.shared.state.borrow())
            .field("client", &self.client)
            .finish()
    }
}

impl AuthSession {
    /// Build the session in the `Loading` state. Call [`AuthSession::start`] next.
    pub fn new(config: &ConsoleConfig, store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let (state, _) = watch::channel(AuthState::Loading);
        let shared = Arc::new(Shared {
            state,
            store,
            credentials: CredentialCell::default(),
            generation: AtomicU64::new(0),
            login_path: config.login_path.clone(),
            forced_redirect: Mutex::new(None),
        });

        let weak: Weak<Shared> = Arc::downgrade(&shared);
        let hook: UnauthorizedHook = Arc::new(move |token: &BearerToken| {
            if let Some(shared) = weak.upgrade() {
                shared.expire(token);
            }
        });

        let client = ApiClient::new(config, shared.credentials.clone(), hook)?;
        Ok(Self { shared, client })
    }

    /// Resolve the startup state from the persisted token.
    ///
    /// With a usable token, an identity refresh runs before the state leaves
    /// `Loading`. Returns the settled state.
    pub async fn start(&self) -> AuthState {
        match self.shared.store.load() {
            Ok(Some(stored)) => match stored.check_window(Local::now().naive_local()) {
                Ok(()) => {
                    self.shared.credentials.set(stored.token);
                    self.refresh().await;
                }
                Err(err) => {
                    info!(error = %err, "discarding expired persisted token");
                    self.shared.sign_out();
                }
            },
            Ok(None) => {
                debug!("no persisted token; starting unauthenticated");
                self.shared.sign_out();
            }
            Err(err) => {
                warn!(error = %err, "persisted token unreadable; starting unauthenticated");
                self.shared.sign_out();
            }
        }
        self.state()
    }

    /// Authenticate and load the identity.
    ///
    /// A successful login is always followed by a full identity refresh; the
    /// login response itself is not trusted for permissions. Failures are
    /// logged, leave any prior session untouched and return `false`.
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let response = match self.client.login(email, password).await {
            Ok(response) => response,
            Err(ClientError::Authentication(message)) => {
                warn!(%email, %message, "login rejected");
                return false;
            }
            Err(err) => {
                error!(%email, error = %err, "login failed");
                return false;
            }
        };

        let Some(stored) = stored_token(&response) else {
            warn!(%email, "login response carried no token");
            return false;
        };

        self.shared.install(stored);
        self.refresh().await;

        let authenticated = self.is_authenticated();
        if authenticated {
            info!(%email, "login succeeded");
        }
        authenticated
    }

    /// Discard the session and the persisted token. Idempotent.
    pub fn logout(&self) {
        self.shared.sign_out();
    }

    /// Re-fetch the identity. Any failure is an implicit logout.
    pub async fn refresh(&self) {
        let generation = self.shared.next_generation();

        let Some(token) = self.shared.credentials.current() else {
            debug!(generation, "refresh without a token; signing out");
            self.shared.sign_out();
            return;
        };

        let outcome = self
            .client
            .me()
            .await
            .and_then(|info| session_from_identity(info, token));

        if !self.shared.is_current(generation) {
            debug!(generation, "discarding stale identity refresh");
            return;
        }

        match outcome {
            Ok(session) => {
                debug!(
                    generation,
                    user_id = %session.user_id(),
                    permissions = session.permissions().len(),
                    "identity refreshed"
                );
                self.shared.settle(generation, AuthState::Authenticated(Arc::new(session)));
            }
            Err(err) => {
                if self.shared.sign_out_if_current(generation) {
                    warn!(generation, error = %err, "identity refresh failed; signed out");
                } else {
                    debug!(generation, error = %err, "ignoring failure of a superseded refresh");
                }
            }
        }
    }

    /// Ask the backend whether the current token is still accepted.
    ///
    /// A 401 signs out through the global hook; other failures leave the
    /// session as it is and report `false`.
    pub async fn validate_token(&self) -> bool {
        if self.shared.credentials.current().is_none() {
            return false;
        }
        match self.client.validate().await {
            Ok(info) => info.success,
            Err(err) => {
                debug!(error = %err, "token validation failed");
                false
            }
        }
    }

    pub fn state(&self) -> AuthState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.shared.state.subscribe()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        match &*self.shared.state.borrow() {
            AuthState::Authenticated(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.state.borrow().session().is_some()
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.shared
            .state
            .borrow()
            .session()
            .is_some_and(|s| s.has_permission(code))
    }

    pub fn has_role(&self, code: &str) -> bool {
        self.shared
            .state
            .borrow()
            .session()
            .is_some_and(|s| s.has_role(code))
    }

    /// Login redirect recorded by a forced logout (401), consumed once.
    pub fn take_forced_redirect(&self) -> Option<String> {
        self.shared
            .forced_redirect
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.client.clone())
    }
}

fn stored_token(response: &LoginResponse) -> Option<StoredToken> {
    let token = response.token.as_deref().filter(|t| !t.is_empty())?;
    Some(StoredToken {
        token: BearerToken::new(token),
        token_type: response.token_type.clone(),
        expires_at: response.expires_at,
    })
}

/// Build a session from an `/api/auth/me` payload.
pub fn session_from_identity(info: UserInfoDto, token: BearerToken) -> Result<Session, ClientError> {
    if !info.success {
        return Err(ClientError::Rejected(info.message));
    }

    let user = info
        .user
        .ok_or_else(|| ClientError::Parse("identity response has no user".to_string()))?;

    // The user's own reference is what management records are scoped by.
    let tenant_id = user
        .tenant_id
        .or_else(|| info.tenant.as_ref().map(|t| t.id.clone()))
        .ok_or_else(|| ClientError::Parse("identity response has no tenant".to_string()))?;

    let profile = SessionProfile {
        username: user.username.unwrap_or_default(),
        email: user.email.unwrap_or_default(),
        first_name: user.first_name.unwrap_or_default(),
        last_name: user.last_name.unwrap_or_default(),
        tenant_name: info.tenant.and_then(|t| t.name),
    };

    let roles = info
        .roles
        .unwrap_or_default()
        .into_iter()
        .map(|r| {
            let name = r.role_name.unwrap_or_else(|| r.role_code.clone());
            let permissions: BTreeSet<Permission> = r.permissions.into_iter().map(Permission::from).collect();
            RoleGrant::new(Role::new(r.role_code), name, permissions)
        })
        .collect();

    let direct = info
        .permissions
        .unwrap_or_default()
        .into_iter()
        .map(Permission::from)
        .collect();

    Ok(Session::new(user.id, tenant_id, profile, roles, direct, token))
}
