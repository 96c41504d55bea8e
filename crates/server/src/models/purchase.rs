//! Enrollment and purchase ledger types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use chalkbox_core::{AccountId, CourseId, EnrollmentId, Price, PurchaseId, PurchaseStatus};

/// An enrollment of an account into a course.
///
/// Created once per (account, course), never mutated, never deleted by the
/// normal flow. Existence is necessary for any module access at all.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub account_id: AccountId,
    pub course_id: CourseId,
    pub created_at: DateTime<Utc>,
}

/// A purchase attempt against the payment gateway.
///
/// Multiple rows may exist per (account, course) over time, but the storage
/// layer guarantees at most one `Pending` row at a time; that row's order
/// reference is reused by retried begin-purchase calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: PurchaseId,
    pub account_id: AccountId,
    pub course_id: CourseId,
    /// Amount captured at begin time, frozen even if the course price changes.
    pub amount: Price,
    pub status: PurchaseStatus,
    /// Order reference issued by the payment gateway.
    pub external_order_ref: String,
    /// Payment reference from the settlement notification, once settled.
    pub external_payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a pending purchase.
#[derive(Debug, Clone)]
pub struct NewPendingPurchase {
    pub account_id: AccountId,
    pub course_id: CourseId,
    pub amount: Price,
    pub external_order_ref: String,
}

/// Result of attempting to insert a pending purchase.
///
/// `Existing` means another row already held the single-pending slot for
/// (account, course); callers must converge on that row's order reference.
#[derive(Debug, Clone)]
pub enum PendingPurchase {
    Created(Purchase),
    Existing(Purchase),
}

impl PendingPurchase {
    /// The purchase row, whichever way it was obtained.
    #[must_use]
    pub fn into_inner(self) -> Purchase {
        match self {
            Self::Created(p) | Self::Existing(p) => p,
        }
    }
}

/// Result of settling a purchase by order reference.
#[derive(Debug, Clone)]
pub struct SettledPurchase {
    pub purchase: Purchase,
    /// True when the order was already in a terminal state and this
    /// settlement was a no-op (duplicate webhook delivery).
    pub already_settled: bool,
}
