//! `tenantdesk-console`
//!
//! **Responsibility:** client side of the multi-tenant administration console.
//!
//! This crate provides:
//! - the identity service client and its single 401 hook
//! - the auth session (login, logout, generation-tagged refresh)
//! - the route guard and the permission-filtered navigation tree
//! - typed management endpoints and the dashboard summary
//!
//! Everything here gates what is displayed. The REST API remains the
//! authority for every authorization decision.

pub mod admin;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod routes;
pub mod session;
pub mod store;
pub mod types;

pub use admin::AdminApi;
pub use client::{ApiClient, CredentialCell, UnauthorizedHook};
pub use config::ConsoleConfig;
pub use dashboard::{Dashboard, DashboardStats};
pub use error::ClientError;
pub use guard::{DenialNotice, GuardState, RouteGuard, decide};
pub use navigation::{NavigationEntry, NavigationTree, is_active, visible_ids};
pub use routes::{Resolution, Route, RouteAccess, RouteTable};
pub use session::{AuthSession, AuthState};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, StoredToken, TokenStore};
