//! Access policy: decide whether a permission requirement is satisfied.
//!
//! - No IO
//! - No panics
//! - No caching (the session may change between two evaluations)

use serde::Serialize;
use thiserror::Error;

use crate::{Permission, PermissionSet, Session};

/// Outcome of evaluating a requirement against the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Granted,
    DeniedUnauthenticated,
    DeniedInsufficientPermissions { missing: PermissionSet },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }

    pub fn into_result(self) -> Result<(), AuthzError> {
        match self {
            AccessDecision::Granted => Ok(()),
            AccessDecision::DeniedUnauthenticated => Err(AuthzError::Unauthenticated),
            AccessDecision::DeniedInsufficientPermissions { missing } => {
                Err(AuthzError::Forbidden { missing })
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("forbidden: missing permissions {}", join(.missing))]
    Forbidden { missing: PermissionSet },
}

fn join(set: &PermissionSet) -> String {
    set.iter().map(Permission::as_str).collect::<Vec<_>>().join(", ")
}

/// Requirement set for an optional single permission (`None` means public).
pub fn requirement(permission: Option<&Permission>) -> PermissionSet {
    permission.into_iter().cloned().collect()
}

/// Evaluate `required` against `session`.
///
/// Rules, in order:
/// 1. an empty requirement is granted, with or without a session;
/// 2. no session is `DeniedUnauthenticated`;
/// 3. otherwise every required code must be in the effective permissions,
///    and the codes that are not are reported as missing.
pub fn evaluate(session: Option<&Session>, required: &PermissionSet) -> AccessDecision {
    if required.is_empty() {
        return AccessDecision::Granted;
    }

    let Some(session) = session else {
        return AccessDecision::DeniedUnauthenticated;
    };

    let missing: PermissionSet = required
        .difference(session.permissions())
        .cloned()
        .collect();

    if missing.is_empty() {
        AccessDecision::Granted
    } else {
        AccessDecision::DeniedInsufficientPermissions { missing }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Explanation (denial surface)
// ─────────────────────────────────────────────────────────────────────────────

/// Human-auditable explanation of an access decision.
#[derive(Debug, Clone, Serialize)]
pub struct AccessExplanation {
    pub required: Vec<String>,
    pub granted: bool,
    pub reason: String,
    pub roles: Vec<String>,
    pub effective_permissions: Vec<String>,
    pub missing: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Explain why `required` is (or is not) satisfied by `session`.
pub fn explain(session: Option<&Session>, required: &PermissionSet) -> AccessExplanation {
    let decision = evaluate(session, required);
    let required_list: Vec<String> = required.iter().map(|p| p.as_str().to_string()).collect();

    let (roles, effective_permissions) = match session {
        Some(s) => (
            s.roles().iter().map(|r| r.code.as_str().to_string()).collect(),
            s.permissions().iter().map(|p| p.as_str().to_string()).collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    match decision {
        AccessDecision::Granted => {
            let reason = if required.is_empty() {
                "No permission is required".to_string()
            } else {
                format!("Session holds every required permission: {}", join(required))
            };
            AccessExplanation {
                required: required_list,
                granted: true,
                reason,
                roles,
                effective_permissions,
                missing: Vec::new(),
                suggestions: Vec::new(),
            }
        }
        AccessDecision::DeniedUnauthenticated => AccessExplanation {
            required: required_list,
            granted: false,
            reason: "No session is live; sign in to continue".to_string(),
            roles,
            effective_permissions,
            missing: required.iter().map(|p| p.as_str().to_string()).collect(),
            suggestions: vec!["Sign in with an account that holds the required permissions".to_string()],
        },
        AccessDecision::DeniedInsufficientPermissions { missing } => {
            let suggestions = missing
                .iter()
                .map(|p| format!("Ask a tenant administrator to grant '{}' or a role that bundles it", p))
                .collect();
            AccessExplanation {
                required: required_list,
                granted: false,
                reason: format!("Missing required permissions: {}", join(&missing)),
                roles,
                effective_permissions,
                missing: missing.iter().map(|p| p.as_str().to_string()).collect(),
                suggestions,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BearerToken, Role, RoleGrant, SessionProfile, permission_set};
    use proptest::prelude::*;
    use tenantdesk_core::{TenantId, UserId};

    fn session_with(perms: &[&str]) -> Session {
        let perms: PermissionSet = perms.iter().map(|p| Permission::new(p.to_string())).collect();
        Session::new(
            UserId::new(),
            TenantId::new("TNT0000001"),
            SessionProfile::default(),
            vec![RoleGrant::new(Role::new("TEST"), "Test", perms)],
            PermissionSet::new(),
            BearerToken::new("token"),
        )
    }

    #[test]
    fn empty_requirement_is_public() {
        assert_eq!(evaluate(None, &PermissionSet::new()), AccessDecision::Granted);
        assert_eq!(
            evaluate(Some(&session_with(&[])), &PermissionSet::new()),
            AccessDecision::Granted
        );
    }

    #[test]
    fn missing_session_is_unauthenticated() {
        let required = permission_set(["TENANT_READ"]);
        assert_eq!(evaluate(None, &required), AccessDecision::DeniedUnauthenticated);
        assert_eq!(evaluate(None, &required).into_result(), Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn reports_exactly_the_missing_codes() {
        let s = session_with(&["USER_READ", "ROLE_READ"]);
        let required = permission_set(["USER_READ", "AUDIT_READ"]);

        assert_eq!(
            evaluate(Some(&s), &required),
            AccessDecision::DeniedInsufficientPermissions {
                missing: permission_set(["AUDIT_READ"])
            }
        );
    }

    #[test]
    fn forbidden_error_names_missing_codes() {
        let err = AuthzError::Forbidden {
            missing: permission_set(["ROLE_READ", "AUDIT_READ"]),
        };
        assert_eq!(err.to_string(), "forbidden: missing permissions AUDIT_READ, ROLE_READ");
    }

    #[test]
    fn explanation_for_denial_lists_missing_and_suggestions() {
        let s = session_with(&["USER_READ"]);
        let e = explain(Some(&s), &permission_set(["AUDIT_READ"]));

        assert!(!e.granted);
        assert_eq!(e.missing, vec!["AUDIT_READ".to_string()]);
        assert_eq!(e.roles, vec!["TEST".to_string()]);
        assert_eq!(e.effective_permissions, vec!["USER_READ".to_string()]);
        assert_eq!(e.suggestions.len(), 1);
        assert!(e.reason.contains("AUDIT_READ"));
    }

    #[test]
    fn explanation_for_public_requirement_is_granted() {
        let e = explain(None, &PermissionSet::new());
        assert!(e.granted);
        assert!(e.missing.is_empty());
    }

    fn code() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "USER_READ",
            "ROLE_READ",
            "TENANT_READ",
            "TENANT_CONFIGURATION",
            "REPORT_GENERATE",
            "AUDIT_READ",
        ])
        .prop_map(str::to_string)
    }

    fn codes() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(code(), 0..6)
    }

    fn set(codes: &[String]) -> PermissionSet {
        codes.iter().cloned().map(Permission::from).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: granted exactly when the requirement is a subset of the
        /// session's permissions; otherwise the difference is reported.
        #[test]
        fn decision_matches_set_difference(held in codes(), required in codes()) {
            let refs: Vec<&str> = held.iter().map(String::as_str).collect();
            let s = session_with(&refs);
            let required = set(&required);

            let expected_missing: PermissionSet =
                required.difference(s.permissions()).cloned().collect();
            let decision = evaluate(Some(&s), &required);

            if expected_missing.is_empty() {
                prop_assert_eq!(decision, AccessDecision::Granted);
            } else {
                prop_assert_eq!(
                    decision,
                    AccessDecision::DeniedInsufficientPermissions { missing: expected_missing }
                );
            }
        }

        /// Property: without a session, any non-empty requirement is unauthenticated.
        #[test]
        fn no_session_denies_every_non_empty_requirement(required in codes()) {
            let required = set(&required);
            let decision = evaluate(None, &required);
            if required.is_empty() {
                prop_assert_eq!(decision, AccessDecision::Granted);
            } else {
                prop_assert_eq!(decision, AccessDecision::DeniedUnauthenticated);
            }
        }
    }
}
