//! # Verdict Security
//!
//! Security core: the role-based access matrix, the tenant-isolation
//! check, and symmetric encryption with PBKDF2 key stretching. No HTTP,
//! no globals; everything is constructed explicitly and passed in.

pub mod encryption;
pub mod rbac;
pub mod tenant;

pub use encryption::EncryptionService;
pub use rbac::{check_permission, Role};
pub use tenant::validate_access;
