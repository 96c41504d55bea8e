//! Access evaluation over stored facts.
//!
//! Resolves identifiers, loads the enrollment/purchase facts, and defers
//! the actual decision to [`chalkbox_core::entitlement::evaluate`]. An
//! anonymous viewer gets the all-false fact set rather than an error, so
//! routes can render locked content uniformly.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use chalkbox_core::entitlement::{self, AccessDecision, AccessFacts};
use chalkbox_core::{AccountId, ModuleId};

use crate::db::{RepositoryError, Store};
use crate::models::Course;

/// Errors from access evaluation.
#[derive(Debug, Error)]
pub enum EntitlementError {
    /// The course slug does not resolve to a published course.
    #[error("course not found")]
    CourseNotFound,

    /// The module does not exist or belongs to a different course.
    #[error("module not found in this course")]
    ModuleNotFound,

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The access-evaluation service.
pub struct EntitlementService {
    store: Arc<dyn Store>,
}

impl EntitlementService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Evaluate access to `slug`, optionally narrowed to one module.
    ///
    /// `account_id` is `None` for anonymous viewers, whose decision is
    /// all-false without touching the ledger tables.
    ///
    /// # Errors
    ///
    /// - [`EntitlementError::CourseNotFound`] when the slug does not name a
    ///   published course
    /// - [`EntitlementError::ModuleNotFound`] when `module_id` is given but
    ///   does not belong to the course
    #[instrument(skip(self))]
    pub async fn evaluate_access(
        &self,
        account_id: Option<AccountId>,
        slug: &str,
        module_id: Option<ModuleId>,
    ) -> Result<AccessDecision, EntitlementError> {
        let course = self.resolve_course(slug).await?;

        let module_is_free = match module_id {
            None => None,
            Some(id) => {
                let module = self
                    .store
                    .module_by_id(id)
                    .await?
                    .filter(|m| m.course_id == course.id)
                    .ok_or(EntitlementError::ModuleNotFound)?;
                Some(module.is_free)
            }
        };

        let facts = match account_id {
            None => AccessFacts::default(),
            Some(account_id) => AccessFacts {
                is_enrolled: self.store.enrollment_exists(account_id, course.id).await?,
                has_paid: self
                    .store
                    .success_purchase(account_id, course.id)
                    .await?
                    .is_some(),
            },
        };

        Ok(entitlement::evaluate(facts, course.price, module_is_free))
    }

    async fn resolve_course(&self, slug: &str) -> Result<Course, EntitlementError> {
        self.store
            .course_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or(EntitlementError::CourseNotFound)
    }
}
