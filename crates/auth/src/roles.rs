use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::PermissionSet;

/// Role code used for RBAC (e.g. `"TENANT_ADMIN"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A role held by the session user, together with the permissions it bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub code: Role,
    pub name: String,
    pub permissions: PermissionSet,
}

impl RoleGrant {
    pub fn new(code: Role, name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            code,
            name: name.into(),
            permissions,
        }
    }
}
