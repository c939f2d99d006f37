//! The live authenticated identity and its flattened permission set.

use serde::{Deserialize, Serialize};

use tenantdesk_core::{TenantId, UserId};

use crate::{PermissionSet, RoleGrant};

/// Opaque bearer token.
///
/// `Debug` is redacted so sessions can be logged without leaking credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Display data about the session user and tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tenant_name: Option<String>,
}

impl SessionProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Two-letter avatar initials ("Ada Lovelace" -> "AL").
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect()
    }
}

/// Authenticated session.
///
/// # Invariants
/// - `permissions` is the union of every role's permissions and the directly
///   granted permissions, computed once at construction. A changed identity
///   yields a new `Session`; the set is never mutated on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    tenant_id: TenantId,
    profile: SessionProfile,
    roles: Vec<RoleGrant>,
    direct_permissions: PermissionSet,
    permissions: PermissionSet,
    token: BearerToken,
}

impl Session {
    pub fn new(
        user_id: UserId,
        tenant_id: TenantId,
        profile: SessionProfile,
        roles: Vec<RoleGrant>,
        direct_permissions: PermissionSet,
        token: BearerToken,
    ) -> Self {
        let permissions = flatten(&roles, &direct_permissions);
        Self {
            user_id,
            tenant_id,
            profile,
            roles,
            direct_permissions,
            permissions,
            token,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    pub fn roles(&self) -> &[RoleGrant] {
        &self.roles
    }

    pub fn direct_permissions(&self) -> &PermissionSet {
        &self.direct_permissions
    }

    /// Effective permissions (roles plus direct grants).
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    pub fn has_permission(&self, code: &str) -> bool {
        self.permissions.contains(code)
    }

    pub fn has_role(&self, code: &str) -> bool {
        self.roles.iter().any(|r| r.code.as_str() == code)
    }
}

fn flatten(roles: &[RoleGrant], direct: &PermissionSet) -> PermissionSet {
    roles
        .iter()
        .flat_map(|r| r.permissions.iter())
        .chain(direct.iter())
        .cloned()
        .collect::<PermissionSet>()
}
