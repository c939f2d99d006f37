//! Dashboard summary of users, roles and tenants.

use serde::Serialize;
use tracing::debug;

use crate::admin::AdminApi;
use crate::error::ClientError;
use crate::types::{RoleRecord, TenantRecord, UserQuery, UserRecord};

/// Page size used when sampling users for the dashboard.
pub const DASHBOARD_USER_SAMPLE: u32 = 100;
const RECENT_USERS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub inactive_users: usize,
    pub total_roles: usize,
    pub total_tenants: usize,
    /// Users that have logged in at least once.
    pub recent_logins: usize,
}

impl DashboardStats {
    pub fn from_records(users: &[UserRecord], roles: &[RoleRecord], tenants: &[TenantRecord]) -> Self {
        let active_users = users.iter().filter(|u| u.is_active()).count();
        Self {
            total_users: users.len(),
            active_users,
            inactive_users: users.len() - active_users,
            total_roles: roles.len(),
            total_tenants: tenants.len(),
            recent_logins: users.iter().filter(|u| u.last_login_at.is_some()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    /// First few users of the sampled page.
    pub recent_users: Vec<UserRecord>,
}

impl Dashboard {
    pub fn from_records(mut users: Vec<UserRecord>, roles: &[RoleRecord], tenants: &[TenantRecord]) -> Self {
        let stats = DashboardStats::from_records(&users, roles, tenants);
        users.truncate(RECENT_USERS);
        Self {
            stats,
            recent_users: users,
        }
    }

    pub async fn load(api: &AdminApi) -> Result<Self, ClientError> {
        let query = UserQuery {
            size: Some(DASHBOARD_USER_SAMPLE),
            ..UserQuery::default()
        };
        let users = api.list_users(&query).await?.content;
        let roles = api.list_roles().await?;
        let tenants = api.list_tenants().await?;

        debug!(
            users = users.len(),
            roles = roles.len(),
            tenants = tenants.len(),
            "dashboard data loaded"
        );
        Ok(Self::from_records(users, &roles, &tenants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserStatus;
    use serde_json::json;
    use tenantdesk_core::{TenantId, UserId};

    fn user(status: &str, logged_in: bool) -> UserRecord {
        serde_json::from_value(json!({
            "id": UserId::new(),
            "tenantId": TenantId::new("TNT0000001"),
            "username": "u",
            "email": "u@example.com",
            "status": status,
            "lastLoginAt": if logged_in { json!("2026-05-01T09:30:00") } else { json!(null) },
        }))
        .unwrap()
    }

    #[test]
    fn stats_count_active_inactive_and_logins() {
        let users = vec![
            user("ACTIVE", true),
            user("ACTIVE", false),
            user("SUSPENDED", true),
            user("INACTIVE", false),
        ];
        let stats = DashboardStats::from_records(&users, &[], &[]);

        assert_eq!(
            stats,
            DashboardStats {
                total_users: 4,
                active_users: 2,
                inactive_users: 2,
                total_roles: 0,
                total_tenants: 0,
                recent_logins: 2,
            }
        );
        assert_eq!(users[2].status, UserStatus::Suspended);
    }

    #[test]
    fn recent_users_keeps_the_first_five() {
        let users: Vec<UserRecord> = (0..8).map(|_| user("ACTIVE", false)).collect();
        let first = users[0].id;
        let dashboard = Dashboard::from_records(users, &[], &[]);

        assert_eq!(dashboard.stats.total_users, 8);
        assert_eq!(dashboard.recent_users.len(), 5);
        assert_eq!(dashboard.recent_users[0].id, first);
    }
}
