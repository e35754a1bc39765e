//! # TaskDesk Shared Library
//!
//! This crate contains the domain layer shared by the TaskDesk API server:
//! database models, the account lifecycle service, the access policy engine,
//! and the representation layer that projects rows into caller-dependent
//! response shapes.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `accounts`: Account + profile lifecycle service
//! - `auth`: Password hashing and access token utilities
//! - `policy`: Action-level access policies
//! - `views`: Caller-dependent response projections
//! - `db`: Pool construction and migrations
//! - `error`: Common error types

pub mod accounts;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod views;

/// Current version of the TaskDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
