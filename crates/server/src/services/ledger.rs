//! Enrollment and purchase ledger.
//!
//! Record-keeping rules for the two ledger mutations and settlement:
//!
//! - enrollment is created once per (account, course); the second attempt
//!   surfaces a conflict instead of silently succeeding twice;
//! - beginning a purchase reuses an existing pending gateway order, so a
//!   retrying client cannot double-charge or orphan gateway orders;
//! - settlement is idempotent by order reference, because the gateway
//!   delivers notifications at least once.
//!
//! The idempotency guarantees come from the storage layer (unique
//! constraints, atomic claim of the single-pending slot, conditional
//! settlement update), not from checks in here; the early reads in
//! `begin_purchase` only short-circuit the common path.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use chalkbox_core::{AccountId, CourseId, Price, SettlementOutcome};

use crate::db::{RepositoryError, Store};
use crate::gateway::{GatewayError, PaymentGateway};
use crate::models::{Enrollment, PendingPurchase, NewPendingPurchase, SettledPurchase};

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The course identifier does not resolve.
    #[error("course not found")]
    CourseNotFound,

    /// The course exists but is not published.
    #[error("course is not available")]
    CourseUnavailable,

    /// An enrollment already exists for (account, course).
    #[error("already enrolled in this course")]
    AlreadyEnrolled,

    /// A successful purchase already exists for (account, course).
    #[error("course already purchased")]
    AlreadyPurchased,

    /// The course is free; enrollment alone grants full access and no
    /// purchase may be started.
    #[error("course is free, nothing to purchase")]
    FreeCourse,

    /// The settlement's order reference is unknown.
    #[error("unknown order reference")]
    UnknownOrder,

    /// Payment gateway failure.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What a client needs to hand to the gateway's checkout flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseIntent {
    /// Gateway order reference. Stable across begin-purchase retries while
    /// the purchase is pending.
    pub order_ref: String,
    /// Amount the order was created over.
    pub amount: Price,
}

/// The enrollment/purchase ledger service.
pub struct LedgerService {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
}

impl LedgerService {
    /// Create a ledger over a store and a payment gateway.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Enroll an account into a published course.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::CourseNotFound`] when the course does not resolve
    /// - [`LedgerError::CourseUnavailable`] when it is unpublished
    /// - [`LedgerError::AlreadyEnrolled`] when the pair is already enrolled;
    ///   callers may treat this as "already satisfied"
    #[instrument(skip(self))]
    pub async fn enroll(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Enrollment, LedgerError> {
        let course = self
            .store
            .course_by_id(course_id)
            .await?
            .ok_or(LedgerError::CourseNotFound)?;

        if !course.is_published {
            return Err(LedgerError::CourseUnavailable);
        }

        let enrollment = self
            .store
            .create_enrollment(account_id, course_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => LedgerError::AlreadyEnrolled,
                other => LedgerError::Repository(other),
            })?;

        info!(%account_id, %course_id, "enrollment created");
        Ok(enrollment)
    }

    /// Begin a purchase, creating or reusing the pending gateway order.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::CourseNotFound`] / [`LedgerError::CourseUnavailable`]
    /// - [`LedgerError::FreeCourse`] when the course price is zero
    /// - [`LedgerError::AlreadyPurchased`] when a successful purchase exists
    /// - [`LedgerError::Gateway`] when order creation fails upstream
    #[instrument(skip(self))]
    pub async fn begin_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<PurchaseIntent, LedgerError> {
        let course = self
            .store
            .course_by_id(course_id)
            .await?
            .ok_or(LedgerError::CourseNotFound)?;

        if !course.is_published {
            return Err(LedgerError::CourseUnavailable);
        }
        if course.price.is_free() {
            return Err(LedgerError::FreeCourse);
        }

        if self
            .store
            .success_purchase(account_id, course_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::AlreadyPurchased);
        }

        // Retry fast-path: hand the open order back instead of creating a
        // second one at the gateway.
        if let Some(pending) = self.store.pending_purchase(account_id, course_id).await? {
            info!(order_ref = %pending.external_order_ref, "reusing pending purchase");
            return Ok(PurchaseIntent {
                order_ref: pending.external_order_ref,
                amount: pending.amount,
            });
        }

        let receipt = Uuid::new_v4().to_string();
        let order_ref = self.gateway.create_order(course.price, &receipt).await?;

        let inserted = self
            .store
            .insert_pending_purchase(NewPendingPurchase {
                account_id,
                course_id,
                amount: course.price,
                external_order_ref: order_ref,
            })
            .await?;

        let purchase = match inserted {
            PendingPurchase::Created(purchase) => purchase,
            PendingPurchase::Existing(purchase) => {
                // A concurrent caller claimed the pending slot first. Their
                // order wins; ours is never referenced again and expires at
                // the gateway.
                warn!(order_ref = %purchase.external_order_ref,
                      "concurrent begin-purchase, converging on existing order");
                purchase
            }
        };

        Ok(PurchaseIntent {
            order_ref: purchase.external_order_ref,
            amount: purchase.amount,
        })
    }

    /// Settle the purchase for `order_ref`.
    ///
    /// Safe under duplicate delivery: a second settlement for the same
    /// order returns the already-terminal row without touching it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownOrder`] when no purchase carries the
    /// given order reference.
    #[instrument(skip(self))]
    pub async fn settle_purchase(
        &self,
        order_ref: &str,
        outcome: SettlementOutcome,
        payment_ref: Option<&str>,
    ) -> Result<SettledPurchase, LedgerError> {
        let settled = self
            .store
            .settle_purchase(order_ref, outcome.final_status(), payment_ref)
            .await?
            .ok_or(LedgerError::UnknownOrder)?;

        if settled.already_settled {
            info!(order_ref, status = %settled.purchase.status, "duplicate settlement ignored");
        } else {
            info!(order_ref, status = %settled.purchase.status, "purchase settled");
        }
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chalkbox_core::{CurrencyCode, Email, PurchaseStatus};
    use crate::db::MemoryStore;
    use crate::gateway::StaticGateway;
    use crate::models::{NewCourse, NewModule};

    struct Fixture {
        store: Arc<MemoryStore>,
        ledger: LedgerService,
        account: AccountId,
        paid_course: CourseId,
        free_course: CourseId,
        draft_course: CourseId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(StaticGateway::new());
        let ledger = LedgerService::new(store.clone(), gateway);

        let email = Email::parse("learner@example.com").expect("email");
        let account = store
            .upsert_account("user_ledger", &email)
            .await
            .expect("account");

        let paid_course = store
            .create_course(NewCourse {
                slug: "rust-101".to_owned(),
                title: "Rust 101".to_owned(),
                description: String::new(),
                price: Price::from_minor_units(49_900, CurrencyCode::INR),
                is_published: true,
            })
            .await
            .expect("course");
        store
            .create_module(
                paid_course.id,
                NewModule {
                    title: "Intro".to_owned(),
                    is_free: true,
                    position: 0,
                },
            )
            .await
            .expect("module");

        let free_course = store
            .create_course(NewCourse {
                slug: "free-intro".to_owned(),
                title: "Free Intro".to_owned(),
                description: String::new(),
                price: Price::from_minor_units(0, CurrencyCode::INR),
                is_published: true,
            })
            .await
            .expect("course");

        let draft_course = store
            .create_course(NewCourse {
                slug: "draft".to_owned(),
                title: "Draft".to_owned(),
                description: String::new(),
                price: Price::from_minor_units(9_900, CurrencyCode::INR),
                is_published: false,
            })
            .await
            .expect("course");

        Fixture {
            store,
            ledger,
            account: account.id,
            paid_course: paid_course.id,
            free_course: free_course.id,
            draft_course: draft_course.id,
        }
    }

    #[tokio::test]
    async fn enroll_twice_yields_one_row_and_a_conflict() {
        let f = fixture().await;

        f.ledger
            .enroll(f.account, f.paid_course)
            .await
            .expect("first enroll");
        let second = f.ledger.enroll(f.account, f.paid_course).await;
        assert!(matches!(second, Err(LedgerError::AlreadyEnrolled)));

        let enrollments = f.store.list_enrollments(f.account).await.expect("list");
        assert_eq!(enrollments.len(), 1);
    }

    #[tokio::test]
    async fn enrolling_in_an_unpublished_course_is_unavailable() {
        let f = fixture().await;
        let result = f.ledger.enroll(f.account, f.draft_course).await;
        assert!(matches!(result, Err(LedgerError::CourseUnavailable)));
    }

    #[tokio::test]
    async fn enrolling_in_an_unknown_course_is_not_found() {
        let f = fixture().await;
        let result = f.ledger.enroll(f.account, CourseId::new(9_999)).await;
        assert!(matches!(result, Err(LedgerError::CourseNotFound)));
    }

    #[tokio::test]
    async fn begin_purchase_reuses_the_pending_order_on_retry() {
        let f = fixture().await;

        let first = f
            .ledger
            .begin_purchase(f.account, f.paid_course)
            .await
            .expect("first begin");
        let second = f
            .ledger
            .begin_purchase(f.account, f.paid_course)
            .await
            .expect("second begin");

        assert_eq!(first.order_ref, second.order_ref);
        assert_eq!(first.amount.minor_units, 49_900);
    }

    #[tokio::test]
    async fn concurrent_begin_purchase_converges_on_one_pending_row() {
        let f = fixture().await;

        let (a, b) = tokio::join!(
            f.ledger.begin_purchase(f.account, f.paid_course),
            f.ledger.begin_purchase(f.account, f.paid_course),
        );
        let a = a.expect("begin a");
        let b = b.expect("begin b");
        assert_eq!(a.order_ref, b.order_ref);

        // Exactly one pending row exists for the pair.
        let pending = f
            .store
            .pending_purchase(f.account, f.paid_course)
            .await
            .expect("pending")
            .expect("row");
        assert_eq!(pending.external_order_ref, a.order_ref);
    }

    #[tokio::test]
    async fn begin_purchase_on_a_free_course_is_rejected() {
        let f = fixture().await;
        let result = f.ledger.begin_purchase(f.account, f.free_course).await;
        assert!(matches!(result, Err(LedgerError::FreeCourse)));
    }

    #[tokio::test]
    async fn begin_purchase_after_success_is_already_purchased() {
        let f = fixture().await;

        let intent = f
            .ledger
            .begin_purchase(f.account, f.paid_course)
            .await
            .expect("begin");
        f.ledger
            .settle_purchase(&intent.order_ref, SettlementOutcome::Captured, Some("pay_1"))
            .await
            .expect("settle");

        let again = f.ledger.begin_purchase(f.account, f.paid_course).await;
        assert!(matches!(again, Err(LedgerError::AlreadyPurchased)));
    }

    #[tokio::test]
    async fn failed_settlement_frees_the_pending_slot_for_a_new_order() {
        let f = fixture().await;

        let first = f
            .ledger
            .begin_purchase(f.account, f.paid_course)
            .await
            .expect("begin");
        f.ledger
            .settle_purchase(&first.order_ref, SettlementOutcome::Failed, None)
            .await
            .expect("settle");

        let retry = f
            .ledger
            .begin_purchase(f.account, f.paid_course)
            .await
            .expect("retry");
        assert_ne!(retry.order_ref, first.order_ref);
    }

    #[tokio::test]
    async fn settle_twice_is_a_no_op_with_one_terminal_state() {
        let f = fixture().await;

        let intent = f
            .ledger
            .begin_purchase(f.account, f.paid_course)
            .await
            .expect("begin");

        let first = f
            .ledger
            .settle_purchase(&intent.order_ref, SettlementOutcome::Captured, Some("pay_1"))
            .await
            .expect("first settle");
        assert!(!first.already_settled);
        assert_eq!(first.purchase.status, PurchaseStatus::Success);

        let second = f
            .ledger
            .settle_purchase(&intent.order_ref, SettlementOutcome::Captured, Some("pay_1"))
            .await
            .expect("second settle");
        assert!(second.already_settled);
        assert_eq!(second.purchase.status, PurchaseStatus::Success);

        // A conflicting replay does not overwrite the terminal state either.
        let conflicting = f
            .ledger
            .settle_purchase(&intent.order_ref, SettlementOutcome::Failed, None)
            .await
            .expect("conflicting settle");
        assert!(conflicting.already_settled);
        assert_eq!(conflicting.purchase.status, PurchaseStatus::Success);
    }

    #[tokio::test]
    async fn settling_an_unknown_order_is_an_error() {
        let f = fixture().await;
        let result = f
            .ledger
            .settle_purchase("order_unknown", SettlementOutcome::Captured, None)
            .await;
        assert!(matches!(result, Err(LedgerError::UnknownOrder)));
    }
}
