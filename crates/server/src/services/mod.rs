//! Application services.
//!
//! Services sit between the HTTP routes and the storage backend: they own
//! the business rules (enrollment gating, purchase idempotency, access
//! evaluation, webhook mirroring) and are written against the [`Store`]
//! trait so they run unchanged on `PostgreSQL` and the in-memory backend.
//!
//! [`Store`]: crate::db::Store

pub mod accounts;
pub mod catalog;
pub mod entitlements;
pub mod ledger;

pub use accounts::{AccountService, AccountServiceError};
pub use catalog::{CatalogError, CatalogService, CourseDetail};
pub use entitlements::{EntitlementError, EntitlementService};
pub use ledger::{LedgerError, LedgerService, PurchaseIntent};
