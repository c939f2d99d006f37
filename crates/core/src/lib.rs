//! `tenantdesk-core`: shared identifiers and the domain error model.
//!
//! This crate has no transport or storage concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{RoleId, TenantId, UserId};
