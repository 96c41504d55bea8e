//! Chalkbox Core - Shared types library.
//!
//! This crate provides common types used across all Chalkbox components:
//! - `server` - Public JSON API for the catalog, enrollments, and purchases
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere, and it makes the entitlement rules trivially unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`entitlement`] - The access-decision rules for course and module content

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entitlement;
pub mod types;

pub use entitlement::{AccessDecision, AccessFacts, evaluate};
pub use types::*;
