//! Access-decision rules for course and module content.
//!
//! The evaluator is a pure, total function over three already-fetched facts:
//! does an enrollment exist, does a successful purchase exist, and is the
//! module in question free. It performs no queries and has no side effects;
//! the server's entitlement service is responsible for resolving identifiers
//! and loading the facts before calling in here.
//!
//! Access is two-tier and the tiers are deliberately not collapsed:
//!
//! - *partial* access (enrollment alone) unlocks free modules, and is what
//!   `has_module_access` reports when no module is in question;
//! - *full* access additionally requires a successful purchase, unless the
//!   course price is zero, in which case enrollment alone is full access.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// The facts the evaluator decides from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFacts {
    /// An enrollment row exists for (account, course).
    pub is_enrolled: bool,
    /// A purchase with status `Success` exists for (account, course).
    pub has_paid: bool,
}

/// The computed access decision for one (account, course) pair,
/// optionally narrowed to a single module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub is_enrolled: bool,
    pub has_paid: bool,
    /// Access to the module under consideration, or to the enrollment-only
    /// tier when no module was given.
    pub has_module_access: bool,
    /// Access to every module of the course, free or paid.
    pub has_full_course_access: bool,
}

/// Compute the access decision for a course and, optionally, one module.
///
/// `module_is_free` is `Some(flag)` when a specific module is being checked
/// and `None` for a course-level check.
///
/// Rules, in precedence order:
///
/// 1. enrollment is necessary for any access at all;
/// 2. a free module needs enrollment only, payment is irrelevant;
/// 3. a paid module needs enrollment and payment;
/// 4. full course access needs enrollment and (zero price or payment).
#[must_use]
pub const fn evaluate(
    facts: AccessFacts,
    price: Price,
    module_is_free: Option<bool>,
) -> AccessDecision {
    let AccessFacts {
        is_enrolled,
        has_paid,
    } = facts;

    let has_full_course_access = is_enrolled && (price.is_free() || has_paid);

    let has_module_access = match module_is_free {
        Some(true) => is_enrolled,
        Some(false) => is_enrolled && (has_paid || price.is_free()),
        // Course-level check: report the enrollment-only tier.
        None => is_enrolled,
    };

    AccessDecision {
        is_enrolled,
        has_paid,
        has_module_access,
        has_full_course_access,
    }
}
