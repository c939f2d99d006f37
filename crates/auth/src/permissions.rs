use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Permission code.
///
/// Permissions are opaque strings issued by the identity service
/// (e.g. `"USER_READ"`). Comparison is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

/// Ordered set of permission codes; ordering keeps denial output stable.
pub type PermissionSet = BTreeSet<Permission>;

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl core::borrow::Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Build a permission set from string codes.
pub fn permission_set<I, S>(items: I) -> PermissionSet
where
    I: IntoIterator<Item = S>,
    S: Into<Permission>,
{
    items.into_iter().map(Into::into).collect()
}

/// Well-known permission codes used by the console's routes and navigation.
pub mod codes {
    pub const USER_READ: &str = "USER_READ";
    pub const ROLE_READ: &str = "ROLE_READ";
    pub const TENANT_READ: &str = "TENANT_READ";
    pub const TENANT_CONFIGURATION: &str = "TENANT_CONFIGURATION";
    pub const REPORT_GENERATE: &str = "REPORT_GENERATE";
    pub const AUDIT_READ: &str = "AUDIT_READ";
}
