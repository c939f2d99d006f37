//! Declarative route table: which targets exist and what they require.

use serde::Serialize;

use tenantdesk_auth::{PermissionSet, codes, permission_set};

/// Access requirement of a navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "permissions", rename_all = "snake_case")]
pub enum RouteAccess {
    /// Reachable without a session (login, registration).
    Public,
    /// Requires a live session holding every listed permission.
    Protected(PermissionSet),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: String,
    pub title: String,
    pub access: RouteAccess,
}

/// Result of resolving a location against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Route(&'a Route),
    Redirect(&'a str),
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    redirects: Vec<(String, String)>,
    fallback: Option<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self, path: &str, title: &str) -> Self {
        self.routes.push(Route {
            path: path.to_string(),
            title: title.to_string(),
            access: RouteAccess::Public,
        });
        self
    }

    pub fn protected(mut self, path: &str, title: &str, required: &[&'static str]) -> Self {
        self.routes.push(Route {
            path: path.to_string(),
            title: title.to_string(),
            access: RouteAccess::Protected(permission_set(required.iter().copied())),
        });
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.push((from.to_string(), to.to_string()));
        self
    }

    /// Target for locations that match nothing.
    pub fn fallback(mut self, to: &str) -> Self {
        self.fallback = Some(to.to_string());
        self
    }

    /// Resolve a location (path, optionally with query/fragment).
    ///
    /// Returns `None` only when nothing matches and no fallback is set.
    pub fn resolve(&self, location: &str) -> Option<Resolution<'_>> {
        let path = normalize_path(location);

        if let Some(route) = self.routes.iter().find(|r| r.path == path) {
            return Some(Resolution::Route(route));
        }
        if let Some((_, to)) = self.redirects.iter().find(|(from, _)| *from == path) {
            return Some(Resolution::Redirect(to));
        }
        self.fallback.as_deref().map(Resolution::Redirect)
    }

    /// Routes of the administration console.
    pub fn admin_console() -> Self {
        use codes::*;

        Self::new()
            .public("/login", "Sign in")
            .public("/register", "Register")
            .protected("/dashboard", "Dashboard", &[])
            .protected("/users", "User Management", &[USER_READ])
            .protected("/users/roles", "Role Management", &[ROLE_READ])
            .protected("/users/permissions", "Permissions", &[ROLE_READ])
            .protected("/tenants", "Tenant Management", &[TENANT_READ])
            .protected("/tenants/configuration", "Tenant Configuration", &[TENANT_CONFIGURATION])
            .protected("/reports", "Reports & Analytics", &[REPORT_GENERATE])
            .protected("/reports/users", "User Reports", &[REPORT_GENERATE])
            .protected("/reports/audit", "Audit Logs", &[AUDIT_READ])
            .protected("/settings", "Settings", &[])
            .protected("/settings/profile", "Profile", &[])
            .protected("/settings/security", "Security", &[])
            .protected("/notifications", "Notifications", &[])
            .redirect("/", "/dashboard")
            .fallback("/dashboard")
    }
}

/// Strip query and fragment, and a trailing slash except on the root.
pub fn normalize_path(location: &str) -> &str {
    let end = location.find(['?', '#']).unwrap_or(location.len());
    let path = &location[..end];
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_query_fragment_and_trailing_slash() {
        assert_eq!(normalize_path("/users/?page=2"), "/users");
        assert_eq!(normalize_path("/reports/audit#top"), "/reports/audit");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn admin_console_routes_carry_their_requirements() {
        let table = RouteTable::admin_console();

        let Some(Resolution::Route(route)) = table.resolve("/reports/audit") else {
            panic!("expected /reports/audit to resolve to a route");
        };
        assert_eq!(route.access, RouteAccess::Protected(permission_set(["AUDIT_READ"])));

        let Some(Resolution::Route(route)) = table.resolve("/login") else {
            panic!("expected /login to resolve to a route");
        };
        assert_eq!(route.access, RouteAccess::Public);
    }

    #[test]
    fn root_and_unknown_paths_redirect_to_dashboard() {
        let table = RouteTable::admin_console();
        assert_eq!(table.resolve("/"), Some(Resolution::Redirect("/dashboard")));
        assert_eq!(table.resolve("/nowhere"), Some(Resolution::Redirect("/dashboard")));
    }

    #[test]
    fn table_without_fallback_leaves_unknown_paths_unresolved() {
        let table = RouteTable::new().public("/login", "Sign in");
        assert_eq!(table.resolve("/nowhere"), None);
    }
}
