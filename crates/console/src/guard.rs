//! Route guard: decide, per navigation, whether to render, send to login,
//! or show an access-denied surface.
//!
//! The decision is recomputed on every navigation and on every session
//! change. Nothing is cached between evaluations.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use tenantdesk_auth::{AccessDecision, PermissionSet, evaluate, explain};

use crate::config::ConsoleConfig;
use crate::routes::{Resolution, RouteAccess, RouteTable};
use crate::session::AuthState;

/// Redirect chains longer than this are treated as misconfiguration.
const MAX_REDIRECTS: usize = 8;

/// Explanation shown instead of a page the session may not open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialNotice {
    pub path: String,
    /// Missing permission codes, sorted.
    pub missing: Vec<String>,
    pub reason: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardState {
    /// The auth session is still validating a persisted token; render nothing.
    Loading,
    /// Redirect to `login_path`; return to `return_to` after login.
    Unauthenticated { login_path: String, return_to: String },
    AccessDenied(DenialNotice),
    Authorized { path: String },
}

/// Pure transition for one target.
///
/// Protected targets require a live session even when they list no
/// permissions; the permission check itself is the access policy's.
pub fn decide(auth: &AuthState, access: &RouteAccess, path: &str, location: &str, login_path: &str) -> GuardState {
    let required = match access {
        RouteAccess::Public => return GuardState::Authorized { path: path.to_string() },
        RouteAccess::Protected(required) => required,
    };

    let session = match auth {
        AuthState::Loading => return GuardState::Loading,
        AuthState::Unauthenticated => return unauthenticated(location, login_path),
        AuthState::Authenticated(session) => &**session,
    };

    match evaluate(Some(session), required) {
        AccessDecision::Granted => GuardState::Authorized { path: path.to_string() },
        AccessDecision::DeniedUnauthenticated => unauthenticated(location, login_path),
        AccessDecision::DeniedInsufficientPermissions { missing } => {
            GuardState::AccessDenied(denial(session, path, required, &missing))
        }
    }
}

fn unauthenticated(location: &str, login_path: &str) -> GuardState {
    GuardState::Unauthenticated {
        login_path: login_path.to_string(),
        return_to: location.to_string(),
    }
}

fn denial(
    session: &tenantdesk_auth::Session,
    path: &str,
    required: &PermissionSet,
    missing: &PermissionSet,
) -> DenialNotice {
    let explanation = explain(Some(session), required);
    DenialNotice {
        path: path.to_string(),
        missing: missing.iter().map(|p| p.as_str().to_string()).collect(),
        reason: explanation.reason,
        suggestions: explanation.suggestions,
    }
}

/// Stateful guard bound to the auth session's published state.
#[derive(Debug)]
pub struct RouteGuard {
    routes: RouteTable,
    auth: watch::Receiver<AuthState>,
    login_path: String,
    home_path: String,
    /// Location as requested by the caller (query included).
    location: Option<String>,
    state: GuardState,
    return_to: Option<String>,
}

impl RouteGuard {
    pub fn new(routes: RouteTable, auth: watch::Receiver<AuthState>, config: &ConsoleConfig) -> Self {
        Self {
            routes,
            auth,
            login_path: config.login_path.clone(),
            home_path: config.home_path.clone(),
            location: None,
            state: GuardState::Loading,
            return_to: None,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Navigate to `location` and evaluate it against the current session.
    pub fn navigate(&mut self, location: &str) -> &GuardState {
        self.location = Some(location.to_string());
        self.evaluate_current()
    }

    /// Re-evaluate the current location (after a session change).
    pub fn reevaluate(&mut self) -> &GuardState {
        self.evaluate_current()
    }

    /// Wait for the next session change and re-evaluate.
    ///
    /// Returns `None` once the auth session has been dropped.
    pub async fn changed(&mut self) -> Option<&GuardState> {
        self.auth.changed().await.ok()?;
        Some(self.evaluate_current())
    }

    /// Where to go after a successful login: the recorded location, or home.
    pub fn post_login_target(&mut self) -> String {
        self.return_to.take().unwrap_or_else(|| self.home_path.clone())
    }

    fn evaluate_current(&mut self) -> &GuardState {
        let Some(location) = self.location.clone() else {
            return &self.state;
        };

        let auth = self.auth.borrow_and_update().clone();
        let next = self.resolve_and_decide(&auth, &location);

        if let GuardState::Unauthenticated { return_to, .. } = &next {
            self.return_to = Some(return_to.clone());
        }

        if next != self.state {
            match &next {
                GuardState::AccessDenied(notice) => {
                    info!(path = %notice.path, missing = ?notice.missing, "access denied");
                }
                other => debug!(%location, state = ?other, "route guard transition"),
            }
        }

        self.state = next;
        &self.state
    }

    fn resolve_and_decide(&self, auth: &AuthState, location: &str) -> GuardState {
        let mut target = location.to_string();

        for _ in 0..=MAX_REDIRECTS {
            match self.routes.resolve(&target) {
                Some(Resolution::Route(route)) => {
                    return decide(auth, &route.access, &route.path, location, &self.login_path);
                }
                Some(Resolution::Redirect(to)) => target = to.to_string(),
                None => break,
            }
        }

        // Unroutable: behave like a protected page with no permission.
        decide(
            auth,
            &RouteAccess::Protected(PermissionSet::new()),
            crate::routes::normalize_path(location),
            location,
            &self.login_path,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tenantdesk_auth::{BearerToken, Role, RoleGrant, Session, SessionProfile, permission_set};
    use tenantdesk_core::{TenantId, UserId};

    fn session(perms: &[&'static str]) -> AuthState {
        AuthState::Authenticated(Arc::new(Session::new(
            UserId::new(),
            TenantId::new("TNT0000001"),
            SessionProfile::default(),
            vec![RoleGrant::new(
                Role::new("TEST"),
                "Test",
                permission_set(perms.iter().copied()),
            )],
            PermissionSet::new(),
            BearerToken::new("t"),
        )))
    }

    fn guard(initial: AuthState) -> (watch::Sender<AuthState>, RouteGuard) {
        let (tx, rx) = watch::channel(initial);
        let guard = RouteGuard::new(RouteTable::admin_console(), rx, &ConsoleConfig::default());
        (tx, guard)
    }

    #[test]
    fn unauthenticated_navigation_records_return_location() {
        let (_tx, mut guard) = guard(AuthState::Unauthenticated);

        let state = guard.navigate("/tenants?page=2").clone();
        assert_eq!(
            state,
            GuardState::Unauthenticated {
                login_path: "/login".to_string(),
                return_to: "/tenants?page=2".to_string(),
            }
        );
        assert_eq!(guard.post_login_target(), "/tenants?page=2");
        assert_eq!(guard.post_login_target(), "/dashboard");
    }

    #[test]
    fn missing_permission_lists_exactly_the_missing_codes() {
        let (_tx, mut guard) = guard(session(&["USER_READ", "REPORT_GENERATE"]));

        match guard.navigate("/reports/audit") {
            GuardState::AccessDenied(notice) => {
                assert_eq!(notice.missing, vec!["AUDIT_READ".to_string()]);
                assert_eq!(notice.path, "/reports/audit");
                assert!(notice.reason.contains("AUDIT_READ"));
            }
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[test]
    fn loading_suspends_protected_but_not_public_routes() {
        let (_tx, mut guard) = guard(AuthState::Loading);
        assert_eq!(guard.navigate("/users"), &GuardState::Loading);
        assert_eq!(
            guard.navigate("/login"),
            &GuardState::Authorized { path: "/login".to_string() }
        );
    }

    #[test]
    fn root_redirects_to_dashboard_before_evaluating() {
        let (_tx, mut guard) = guard(session(&[]));
        assert_eq!(
            guard.navigate("/"),
            &GuardState::Authorized { path: "/dashboard".to_string() }
        );
    }

    #[test]
    fn logout_while_viewing_protected_page_reroutes_to_login() {
        let (tx, mut guard) = guard(session(&["USER_READ"]));
        assert_eq!(
            guard.navigate("/users"),
            &GuardState::Authorized { path: "/users".to_string() }
        );

        tx.send_replace(AuthState::Unauthenticated);
        assert_eq!(
            guard.reevaluate(),
            &GuardState::Unauthenticated {
                login_path: "/login".to_string(),
                return_to: "/users".to_string(),
            }
        );
    }

    #[test]
    fn permission_grant_is_reflected_on_reevaluation() {
        let (tx, mut guard) = guard(session(&[]));
        assert!(matches!(guard.navigate("/users/roles"), GuardState::AccessDenied(_)));

        tx.send_replace(session(&["ROLE_READ"]));
        assert_eq!(
            guard.reevaluate(),
            &GuardState::Authorized { path: "/users/roles".to_string() }
        );
    }

    #[tokio::test]
    async fn changed_reevaluates_on_session_change() {
        let (tx, mut guard) = guard(AuthState::Loading);
        assert_eq!(guard.navigate("/dashboard"), &GuardState::Loading);

        tx.send_replace(session(&[]));
        assert_eq!(
            guard.changed().await,
            Some(&GuardState::Authorized { path: "/dashboard".to_string() })
        );

        drop(tx);
        assert_eq!(guard.changed().await, None);
    }

    #[test]
    fn redirect_loops_are_bounded() {
        let table = RouteTable::new().redirect("/a", "/b").redirect("/b", "/a");
        let (_tx, rx) = watch::channel(AuthState::Unauthenticated);
        let mut guard = RouteGuard::new(table, rx, &ConsoleConfig::default());

        assert!(matches!(guard.navigate("/a"), GuardState::Unauthenticated { .. }));
    }
}
