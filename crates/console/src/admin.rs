//! Management endpoints for users, roles, tenants and permissions.
//!
//! Business rules live on the server; this is a typed wrapper whose calls
//! share the identity client's bearer token and 401 handling.

use reqwest::Method;
use serde_json::Value;

use tenantdesk_core::{RoleId, TenantId, UserId};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::types::{
    AssignRoleRequest, CreateRoleRequest, CreateUserRequest, PaginatedResponse, PermissionRecord,
    RoleRecord, TenantRecord, UpdateUserRequest, UserInfoDto, UserQuery, UserRecord,
};

#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // Users

    pub async fn list_users(&self, query: &UserQuery) -> Result<PaginatedResponse<UserRecord>, ClientError> {
        self.client
            .fetch(self.client.request(Method::GET, "/api/users").query(query))
            .await
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<UserRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::GET, &format!("/api/users/{user_id}")))
            .await
    }

    pub async fn get_user_info(&self, user_id: UserId) -> Result<UserInfoDto, ClientError> {
        self.client
            .fetch(self.client.request(Method::GET, &format!("/api/users/{user_id}/info")))
            .await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> Result<UserRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::POST, "/api/users").json(request))
            .await
    }

    pub async fn update_user(&self, user_id: UserId, request: &UpdateUserRequest) -> Result<UserRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::PUT, &format!("/api/users/{user_id}")).json(request))
            .await
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ClientError> {
        self.client
            .fetch_empty(self.client.request(Method::DELETE, &format!("/api/users/{user_id}")))
            .await
    }

    pub async fn activate_user(&self, user_id: UserId) -> Result<UserRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::PATCH, &format!("/api/users/{user_id}/activate")))
            .await
    }

    pub async fn deactivate_user(&self, user_id: UserId) -> Result<UserRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::PATCH, &format!("/api/users/{user_id}/deactivate")))
            .await
    }

    pub async fn reset_password(&self, user_id: UserId) -> Result<(), ClientError> {
        self.client
            .fetch_empty(self.client.request(Method::POST, &format!("/api/users/{user_id}/reset-password")))
            .await
    }

    // Roles

    pub async fn list_roles(&self) -> Result<Vec<RoleRecord>, ClientError> {
        self.client.fetch(self.client.request(Method::GET, "/api/roles")).await
    }

    pub async fn get_role(&self, role_id: RoleId) -> Result<RoleRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::GET, &format!("/api/roles/{role_id}")))
            .await
    }

    pub async fn create_role(&self, request: &CreateRoleRequest) -> Result<RoleRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::POST, "/api/roles").json(request))
            .await
    }

    /// Partial update: only the fields present in `patch` are sent.
    pub async fn update_role(&self, role_id: RoleId, patch: &Value) -> Result<RoleRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::PUT, &format!("/api/roles/{role_id}")).json(patch))
            .await
    }

    pub async fn delete_role(&self, role_id: RoleId) -> Result<(), ClientError> {
        self.client
            .fetch_empty(self.client.request(Method::DELETE, &format!("/api/roles/{role_id}")))
            .await
    }

    pub async fn assign_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), ClientError> {
        let body = AssignRoleRequest { user_id };
        self.client
            .fetch_empty(
                self.client
                    .request(Method::POST, &format!("/api/roles/{role_id}/assign"))
                    .json(&body),
            )
            .await
    }

    pub async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<(), ClientError> {
        self.client
            .fetch_empty(
                self.client
                    .request(Method::DELETE, &format!("/api/roles/{role_id}/assign/{user_id}")),
            )
            .await
    }

    // Tenants

    pub async fn list_tenants(&self) -> Result<Vec<TenantRecord>, ClientError> {
        self.client.fetch(self.client.request(Method::GET, "/api/tenants")).await
    }

    pub async fn get_tenant(&self, tenant_id: &TenantId) -> Result<TenantRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::GET, &format!("/api/tenants/{tenant_id}")))
            .await
    }

    /// Partial update: only the fields present in `patch` are sent.
    pub async fn update_tenant(&self, tenant_id: &TenantId, patch: &Value) -> Result<TenantRecord, ClientError> {
        self.client
            .fetch(self.client.request(Method::PUT, &format!("/api/tenants/{tenant_id}")).json(patch))
            .await
    }

    pub async fn tenant_configuration(&self, tenant_id: &TenantId) -> Result<Value, ClientError> {
        self.client
            .fetch(self.client.request(Method::GET, &format!("/api/tenants/{tenant_id}/configuration")))
            .await
    }

    // Permissions

    pub async fn list_permissions(&self) -> Result<Vec<PermissionRecord>, ClientError> {
        self.client.fetch(self.client.request(Method::GET, "/api/permissions")).await
    }
}
