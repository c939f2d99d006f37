//! Static navigation tree and its permission filtering.

use std::collections::HashSet;

use serde::Serialize;

use tenantdesk_auth::{Permission, Session, codes, evaluate, requirement};
use tenantdesk_core::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    pub id: String,
    pub title: String,
    pub path: String,
    pub required_permission: Option<Permission>,
    pub children: Vec<NavigationEntry>,
}

impl NavigationEntry {
    pub fn new(id: &str, title: &str, path: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            path: path.to_string(),
            required_permission: None,
            children: Vec::new(),
        }
    }

    pub fn requires(mut self, permission: &'static str) -> Self {
        self.required_permission = Some(Permission::new(permission));
        self
    }

    pub fn with_children(mut self, children: Vec<NavigationEntry>) -> Self {
        self.children = children;
        self
    }
}

/// Immutable navigation tree.
///
/// # Invariants
/// - Entry ids are non-empty and unique across the whole tree, so no entry
///   can appear under two parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NavigationTree {
    roots: Vec<NavigationEntry>,
}

impl NavigationTree {
    pub fn new(roots: Vec<NavigationEntry>) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        check_ids(&roots, &mut seen)?;
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[NavigationEntry] {
        &self.roots
    }

    /// Entries the session may see, depth-first, in declaration order.
    ///
    /// A hidden entry hides its whole subtree. Recomputed on every call.
    pub fn visible_entries(&self, session: Option<&Session>) -> Vec<NavigationEntry> {
        filter(&self.roots, session)
    }

    /// Sidebar of the administration console.
    pub fn admin_console() -> Self {
        use codes::*;

        let roots = vec![
            NavigationEntry::new("dashboard", "Dashboard", "/dashboard"),
            NavigationEntry::new("user-management", "User Management", "/users")
                .requires(USER_READ)
                .with_children(vec![
                    NavigationEntry::new("users-list", "Users", "/users").requires(USER_READ),
                    NavigationEntry::new("roles", "Roles", "/users/roles").requires(ROLE_READ),
                    NavigationEntry::new("permissions", "Permissions", "/users/permissions").requires(ROLE_READ),
                ]),
            NavigationEntry::new("tenant-management", "Tenant Management", "/tenants")
                .requires(TENANT_READ)
                .with_children(vec![
                    NavigationEntry::new("tenants-list", "Tenants", "/tenants").requires(TENANT_READ),
                    NavigationEntry::new("tenant-config", "Configuration", "/tenants/configuration")
                        .requires(TENANT_CONFIGURATION),
                ]),
            NavigationEntry::new("reports", "Reports & Analytics", "/reports")
                .requires(REPORT_GENERATE)
                .with_children(vec![
                    NavigationEntry::new("user-reports", "User Reports", "/reports/users").requires(REPORT_GENERATE),
                    NavigationEntry::new("audit-logs", "Audit Logs", "/reports/audit").requires(AUDIT_READ),
                ]),
            NavigationEntry::new("notifications", "Notifications", "/notifications"),
            NavigationEntry::new("settings", "Settings", "/settings").with_children(vec![
                NavigationEntry::new("profile", "Profile", "/settings/profile"),
                NavigationEntry::new("security", "Security", "/settings/security"),
            ]),
        ];

        Self { roots }
    }
}

fn check_ids<'a>(entries: &'a [NavigationEntry], seen: &mut HashSet<&'a str>) -> DomainResult<()> {
    for entry in entries {
        if entry.id.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "navigation entry '{}' has an empty id",
                entry.title
            )));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(DomainError::invariant(format!(
                "navigation entry id '{}' appears more than once",
                entry.id
            )));
        }
        check_ids(&entry.children, seen)?;
    }
    Ok(())
}

fn filter(entries: &[NavigationEntry], session: Option<&Session>) -> Vec<NavigationEntry> {
    entries
        .iter()
        .filter(|e| evaluate(session, &requirement(e.required_permission.as_ref())).is_granted())
        .map(|e| NavigationEntry {
            id: e.id.clone(),
            title: e.title.clone(),
            path: e.path.clone(),
            required_permission: e.required_permission.clone(),
            children: filter(&e.children, session),
        })
        .collect()
}

/// Depth-first ids of a (filtered) tree.
pub fn visible_ids(entries: &[NavigationEntry]) -> Vec<&str> {
    let mut out = Vec::new();
    collect_ids(entries, &mut out);
    out
}

fn collect_ids<'a>(entries: &'a [NavigationEntry], out: &mut Vec<&'a str>) {
    for entry in entries {
        out.push(entry.id.as_str());
        collect_ids(&entry.children, out);
    }
}

/// Whether an entry pointing at `entry_path` is highlighted for `location`.
pub fn is_active(entry_path: &str, location: &str) -> bool {
    let location = crate::routes::normalize_path(location);
    location == entry_path
        || location
            .strip_prefix(entry_path)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use tenantdesk_auth::{BearerToken, PermissionSet, Role, RoleGrant, SessionProfile, permission_set};
    use tenantdesk_core::{TenantId, UserId};

    fn session_with(perms: PermissionSet) -> Session {
        Session::new(
            UserId::new(),
            TenantId::new("TNT0000001"),
            SessionProfile::default(),
            vec![RoleGrant::new(Role::new("TEST"), "Test", perms)],
            PermissionSet::new(),
            BearerToken::new("t"),
        )
    }

    fn small_tree() -> NavigationTree {
        NavigationTree::new(vec![
            NavigationEntry::new("home", "Home", "/home"),
            NavigationEntry::new("users", "Users", "/users").requires("USER_READ"),
            NavigationEntry::new("roles", "Roles", "/roles")
                .requires("ROLE_READ")
                .with_children(vec![NavigationEntry::new("role-detail", "Role", "/roles/detail")]),
        ])
        .unwrap()
    }

    #[test]
    fn user_read_session_sees_public_and_user_entries_in_order() {
        let session = session_with(permission_set(["USER_READ"]));
        let visible = small_tree().visible_entries(Some(&session));

        assert_eq!(visible_ids(&visible), vec!["home", "users"]);
    }

    #[test]
    fn hidden_parent_hides_unrestricted_children() {
        let visible = small_tree().visible_entries(None);
        assert_eq!(visible_ids(&visible), vec!["home"]);
    }

    #[test]
    fn admin_console_without_session_shows_only_unrestricted_entries() {
        let visible = NavigationTree::admin_console().visible_entries(None);
        assert_eq!(
            visible_ids(&visible),
            vec!["dashboard", "notifications", "settings", "profile", "security"]
        );
    }

    #[test]
    fn admin_console_filters_children_independently() {
        let session = session_with(permission_set(["TENANT_READ"]));
        let visible = NavigationTree::admin_console().visible_entries(Some(&session));

        let tenants = visible.iter().find(|e| e.id == "tenant-management").unwrap();
        assert_eq!(visible_ids(&tenants.children), vec!["tenants-list"]);
    }

    #[test]
    fn admin_console_tree_is_valid() {
        let tree = NavigationTree::admin_console();
        assert!(NavigationTree::new(tree.roots().to_vec()).is_ok());
    }

    #[test]
    fn duplicate_ids_are_rejected_even_across_levels() {
        let err = NavigationTree::new(vec![
            NavigationEntry::new("a", "A", "/a").with_children(vec![NavigationEntry::new("b", "B", "/b")]),
            NavigationEntry::new("b", "B again", "/b2"),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn empty_ids_are_rejected() {
        let err = NavigationTree::new(vec![NavigationEntry::new(" ", "Blank", "/")]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn active_matches_exact_and_nested_paths_only() {
        assert!(is_active("/users", "/users"));
        assert!(is_active("/users", "/users/roles?x=1"));
        assert!(!is_active("/users", "/usersettings"));
    }

    fn codes_strategy() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(
            prop::sample::select(vec![
                "USER_READ",
                "ROLE_READ",
                "TENANT_READ",
                "TENANT_CONFIGURATION",
                "REPORT_GENERATE",
                "AUDIT_READ",
            ])
            .prop_map(str::to_string),
            0..6,
        )
    }

    proptest! {
        /// Property: visibility is monotonic in the permission set.
        #[test]
        fn visibility_is_monotonic(a in codes_strategy(), extra in codes_strategy()) {
            let tree = NavigationTree::admin_console();
            let small: PermissionSet = a.iter().cloned().map(Permission::from).collect();
            let large: PermissionSet = a.union(&extra).cloned().map(Permission::from).collect();

            let small_visible = tree.visible_entries(Some(&session_with(small)));
            let large_visible = tree.visible_entries(Some(&session_with(large)));

            let large_ids: HashSet<&str> = visible_ids(&large_visible).into_iter().collect();
            for id in visible_ids(&small_visible) {
                prop_assert!(large_ids.contains(id));
            }
        }
    }
}
