//! Storage backend trait.
//!
//! The ledger and entitlement services are written against this trait so
//! they can run on `PostgreSQL` in production and on the in-memory backend
//! in tests and small demo deployments. Implementations must be thread-safe
//! (`Send + Sync`); they are called concurrently from request handlers.
//!
//! Implementations own the uniqueness rules: one enrollment per
//! (account, course), at most one pending purchase per (account, course),
//! unique course and blog slugs, unique gateway order references. Those must
//! hold under concurrent callers, which is why they live behind the storage
//! boundary (constraints and atomic inserts) rather than as check-then-act
//! sequences above it.

use async_trait::async_trait;

use chalkbox_core::{
    AccountId, AccountRole, BlogPostId, CourseId, Email, EnrollmentId, ModuleId, PurchaseStatus,
};

use super::RepositoryError;
use crate::models::{
    Account, BlogPost, BlogPostUpdate, Course, CourseUpdate, Enrollment, Module, ModuleContent,
    ModuleUpdate, NewBlogPost, NewCourse, NewModule, NewModuleContent, NewPendingPurchase,
    PendingPurchase, Purchase, SettledPurchase,
};

/// Persistent storage operations for the application.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// Look up an account by the auth provider's identity string.
    async fn account_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Account>, RepositoryError>;

    /// Look up an account by internal ID.
    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;

    /// Create an account for `external_id`, or update its email if it
    /// already exists (webhooks are delivered at least once).
    async fn upsert_account(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError>;

    /// Update the email of an existing account. `None` when unknown.
    async fn update_account_email(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Option<Account>, RepositoryError>;

    /// Delete the account for `external_id`. Enrollments and purchases
    /// cascade. Returns whether a row was deleted.
    async fn delete_account(&self, external_id: &str) -> Result<bool, RepositoryError>;

    /// Change an account's role. `None` when unknown.
    async fn set_account_role(
        &self,
        id: AccountId,
        role: AccountRole,
    ) -> Result<Option<Account>, RepositoryError>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All published courses, newest first.
    async fn list_published_courses(&self) -> Result<Vec<Course>, RepositoryError>;

    /// Look up a course by slug, published or not.
    async fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, RepositoryError>;

    /// Look up a course by ID.
    async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError>;

    /// Modules of a course ordered by `(position, id)`.
    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, RepositoryError>;

    /// Look up a module by ID.
    async fn module_by_id(&self, id: ModuleId) -> Result<Option<Module>, RepositoryError>;

    /// Contents of a module ordered by `(position, id)`.
    async fn list_module_contents(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<ModuleContent>, RepositoryError>;

    /// Create a course. Fails with `Conflict` on a duplicate slug.
    async fn create_course(&self, new: NewCourse) -> Result<Course, RepositoryError>;

    /// Apply a partial update. Fails with `Conflict` when the slug of a
    /// published course is changed (slugs freeze at publication).
    async fn update_course(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError>;

    /// Delete a course and everything owned by it.
    async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError>;

    /// Create a module under a course.
    async fn create_module(
        &self,
        course_id: CourseId,
        new: NewModule,
    ) -> Result<Module, RepositoryError>;

    /// Apply a partial update to a module.
    async fn update_module(
        &self,
        id: ModuleId,
        update: ModuleUpdate,
    ) -> Result<Option<Module>, RepositoryError>;

    /// Delete a module and its contents.
    async fn delete_module(&self, id: ModuleId) -> Result<bool, RepositoryError>;

    /// Rewrite the positions of a course's modules to match `order`.
    /// All-or-nothing: fails with `Conflict` if `order` does not name
    /// exactly the modules of the course.
    async fn reorder_modules(
        &self,
        course_id: CourseId,
        order: &[ModuleId],
    ) -> Result<(), RepositoryError>;

    /// Add content to a module.
    async fn create_module_content(
        &self,
        module_id: ModuleId,
        new: NewModuleContent,
    ) -> Result<ModuleContent, RepositoryError>;

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Whether an enrollment row exists for (account, course).
    async fn enrollment_exists(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<bool, RepositoryError>;

    /// Insert an enrollment. Fails with `Conflict` if one already exists;
    /// the unique constraint is the authority, not a prior read.
    async fn create_enrollment(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Enrollment, RepositoryError>;

    /// All enrollments of an account.
    async fn list_enrollments(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Enrollment>, RepositoryError>;

    /// The successful purchase for (account, course), if any.
    async fn success_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Option<Purchase>, RepositoryError>;

    /// The pending purchase for (account, course), if any. There is at
    /// most one.
    async fn pending_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Option<Purchase>, RepositoryError>;

    /// Atomically claim the single-pending slot for (account, course).
    ///
    /// Returns `PendingPurchase::Created` when this call inserted the row,
    /// or `PendingPurchase::Existing` with the row a concurrent or earlier
    /// caller inserted. Never produces two pending rows.
    async fn insert_pending_purchase(
        &self,
        new: NewPendingPurchase,
    ) -> Result<PendingPurchase, RepositoryError>;

    /// Transition the purchase for `order_ref` out of `Pending`.
    ///
    /// The update is conditional on the current status still being
    /// `Pending`; when the row is already terminal the call is a no-op and
    /// the settled row is returned with `already_settled = true`. `None`
    /// when the order reference is unknown.
    async fn settle_purchase(
        &self,
        order_ref: &str,
        status: PurchaseStatus,
        payment_ref: Option<&str>,
    ) -> Result<Option<SettledPurchase>, RepositoryError>;

    /// Look up an enrollment by ID (admin/debug surface).
    async fn enrollment_by_id(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, RepositoryError>;

    // =========================================================================
    // Blog
    // =========================================================================

    /// All published posts, newest first.
    async fn list_published_posts(&self) -> Result<Vec<BlogPost>, RepositoryError>;

    /// Look up a post by slug.
    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError>;

    /// Create a post. Fails with `Conflict` on a duplicate slug.
    async fn create_post(&self, new: NewBlogPost) -> Result<BlogPost, RepositoryError>;

    /// Apply a partial update to a post.
    async fn update_post(
        &self,
        id: BlogPostId,
        update: BlogPostUpdate,
    ) -> Result<Option<BlogPost>, RepositoryError>;

    /// Delete a post.
    async fn delete_post(&self, id: BlogPostId) -> Result<bool, RepositoryError>;
}
