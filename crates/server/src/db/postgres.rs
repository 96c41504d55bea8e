//! `PostgreSQL` implementation of the [`Store`] trait.
//!
//! Thin delegation to the per-entity repositories; all SQL lives there.

use async_trait::async_trait;
use sqlx::PgPool;

use chalkbox_core::{
    AccountId, AccountRole, BlogPostId, CourseId, Email, EnrollmentId, ModuleId, PurchaseStatus,
};

use super::accounts::AccountRepository;
use super::blog::BlogRepository;
use super::courses::CourseRepository;
use super::enrollments::EnrollmentRepository;
use super::purchases::PurchaseRepository;
use super::{RepositoryError, Store};
use crate::models::{
    Account, BlogPost, BlogPostUpdate, Course, CourseUpdate, Enrollment, Module, ModuleContent,
    ModuleUpdate, NewBlogPost, NewCourse, NewModule, NewModuleContent, NewPendingPurchase,
    PendingPurchase, Purchase, SettledPurchase,
};

/// Production storage backend over a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (used by the CLI for migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    const fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.pool)
    }

    const fn courses(&self) -> CourseRepository<'_> {
        CourseRepository::new(&self.pool)
    }

    const fn enrollments(&self) -> EnrollmentRepository<'_> {
        EnrollmentRepository::new(&self.pool)
    }

    const fn purchases(&self) -> PurchaseRepository<'_> {
        PurchaseRepository::new(&self.pool)
    }

    const fn blog(&self) -> BlogRepository<'_> {
        BlogRepository::new(&self.pool)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn account_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        self.accounts().get_by_external_id(external_id).await
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        self.accounts().get_by_id(id).await
    }

    async fn upsert_account(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError> {
        self.accounts().upsert(external_id, email).await
    }

    async fn update_account_email(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Option<Account>, RepositoryError> {
        self.accounts().update_email(external_id, email).await
    }

    async fn delete_account(&self, external_id: &str) -> Result<bool, RepositoryError> {
        self.accounts().delete(external_id).await
    }

    async fn set_account_role(
        &self,
        id: AccountId,
        role: AccountRole,
    ) -> Result<Option<Account>, RepositoryError> {
        self.accounts().set_role(id, role).await
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>, RepositoryError> {
        self.courses().list_published().await
    }

    async fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, RepositoryError> {
        self.courses().get_by_slug(slug).await
    }

    async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        self.courses().get_by_id(id).await
    }

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, RepositoryError> {
        self.courses().list_modules(course_id).await
    }

    async fn module_by_id(&self, id: ModuleId) -> Result<Option<Module>, RepositoryError> {
        self.courses().get_module(id).await
    }

    async fn list_module_contents(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<ModuleContent>, RepositoryError> {
        self.courses().list_module_contents(module_id).await
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, RepositoryError> {
        self.courses().create(new).await
    }

    async fn update_course(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError> {
        self.courses().update(id, update).await
    }

    async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError> {
        self.courses().delete(id).await
    }

    async fn create_module(
        &self,
        course_id: CourseId,
        new: NewModule,
    ) -> Result<Module, RepositoryError> {
        self.courses().create_module(course_id, new).await
    }

    async fn update_module(
        &self,
        id: ModuleId,
        update: ModuleUpdate,
    ) -> Result<Option<Module>, RepositoryError> {
        self.courses().update_module(id, update).await
    }

    async fn delete_module(&self, id: ModuleId) -> Result<bool, RepositoryError> {
        self.courses().delete_module(id).await
    }

    async fn reorder_modules(
        &self,
        course_id: CourseId,
        order: &[ModuleId],
    ) -> Result<(), RepositoryError> {
        self.courses().reorder_modules(course_id, order).await
    }

    async fn create_module_content(
        &self,
        module_id: ModuleId,
        new: NewModuleContent,
    ) -> Result<ModuleContent, RepositoryError> {
        self.courses().create_module_content(module_id, new).await
    }

    async fn enrollment_exists(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<bool, RepositoryError> {
        self.enrollments().exists(account_id, course_id).await
    }

    async fn create_enrollment(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Enrollment, RepositoryError> {
        self.enrollments().create(account_id, course_id).await
    }

    async fn list_enrollments(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        self.enrollments().list_for_account(account_id).await
    }

    async fn success_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Option<Purchase>, RepositoryError> {
        self.purchases()
            .find_by_status(account_id, course_id, PurchaseStatus::Success)
            .await
    }

    async fn pending_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Option<Purchase>, RepositoryError> {
        self.purchases()
            .find_by_status(account_id, course_id, PurchaseStatus::Pending)
            .await
    }

    async fn insert_pending_purchase(
        &self,
        new: NewPendingPurchase,
    ) -> Result<PendingPurchase, RepositoryError> {
        self.purchases().insert_pending(new).await
    }

    async fn settle_purchase(
        &self,
        order_ref: &str,
        status: PurchaseStatus,
        payment_ref: Option<&str>,
    ) -> Result<Option<SettledPurchase>, RepositoryError> {
        self.purchases().settle(order_ref, status, payment_ref).await
    }

    async fn enrollment_by_id(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        self.enrollments().get_by_id(id).await
    }

    async fn list_published_posts(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        self.blog().list_published().await
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        self.blog().get_by_slug(slug).await
    }

    async fn create_post(&self, new: NewBlogPost) -> Result<BlogPost, RepositoryError> {
        self.blog().create(new).await
    }

    async fn update_post(
        &self,
        id: BlogPostId,
        update: BlogPostUpdate,
    ) -> Result<Option<BlogPost>, RepositoryError> {
        self.blog().update(id, update).await
    }

    async fn delete_post(&self, id: BlogPostId) -> Result<bool, RepositoryError> {
        self.blog().delete(id).await
    }
}
