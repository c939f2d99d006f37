//! `tenantdesk-auth`: pure client-side authorization model.
//!
//! Sessions, permission codes and the access policy live here, decoupled from
//! HTTP and storage. Nothing in this crate is a security boundary: the backend
//! enforces the real authorization, this layer only decides what to display.

pub mod claims;
pub mod permissions;
pub mod policy;
pub mod roles;
pub mod session;

pub use claims::{TokenValidationError, validate_expiry};
pub use permissions::{Permission, PermissionSet, codes, permission_set};
pub use policy::{AccessDecision, AccessExplanation, AuthzError, evaluate, explain, requirement};
pub use roles::{Role, RoleGrant};
pub use session::{BearerToken, Session, SessionProfile};
