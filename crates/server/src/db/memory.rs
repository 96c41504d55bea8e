//! In-memory storage backend.
//!
//! Suitable for tests and small demo deployments; production uses
//! [`PgStore`](super::PgStore). All operations take one mutex, so the
//! uniqueness rules (single enrollment per pair, single pending purchase
//! per pair, unique slugs and order refs) hold atomically under concurrent
//! callers, exactly like the SQL constraints they stand in for.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use chalkbox_core::{
    AccountId, AccountRole, BlogPostId, CourseId, Email, EnrollmentId, ModuleId, PurchaseId,
    PurchaseStatus,
};

use super::{RepositoryError, Store};
use crate::models::{
    Account, BlogPost, BlogPostUpdate, Course, CourseUpdate, Enrollment, Module, ModuleContent,
    ModuleUpdate, NewBlogPost, NewCourse, NewModule, NewModuleContent, NewPendingPurchase,
    PendingPurchase, Purchase, SettledPurchase,
};

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    courses: Vec<Course>,
    modules: Vec<Module>,
    contents: Vec<ModuleContent>,
    enrollments: Vec<Enrollment>,
    purchases: Vec<Purchase>,
    posts: Vec<BlogPost>,
    next_id: i32,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory storage backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn account_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.external_id == external_id)
            .cloned())
    }

    async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let inner = self.lock();
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn upsert_account(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Account, RepositoryError> {
        let mut inner = self.lock();
        if let Some(account) = inner
            .accounts
            .iter_mut()
            .find(|a| a.external_id == external_id)
        {
            account.email = email.clone();
            account.updated_at = Utc::now();
            return Ok(account.clone());
        }

        let now = Utc::now();
        let account = Account {
            id: AccountId::new(inner.next_id()),
            external_id: external_id.to_owned(),
            email: email.clone(),
            role: AccountRole::User,
            created_at: now,
            updated_at: now,
        };
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn update_account_email(
        &self,
        external_id: &str,
        email: &Email,
    ) -> Result<Option<Account>, RepositoryError> {
        let mut inner = self.lock();
        Ok(inner
            .accounts
            .iter_mut()
            .find(|a| a.external_id == external_id)
            .map(|account| {
                account.email = email.clone();
                account.updated_at = Utc::now();
                account.clone()
            }))
    }

    async fn delete_account(&self, external_id: &str) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let Some(pos) = inner
            .accounts
            .iter()
            .position(|a| a.external_id == external_id)
        else {
            return Ok(false);
        };
        let account_id = inner.accounts.remove(pos).id;
        inner.enrollments.retain(|e| e.account_id != account_id);
        inner.purchases.retain(|p| p.account_id != account_id);
        Ok(true)
    }

    async fn set_account_role(
        &self,
        id: AccountId,
        role: AccountRole,
    ) -> Result<Option<Account>, RepositoryError> {
        let mut inner = self.lock();
        Ok(inner.accounts.iter_mut().find(|a| a.id == id).map(|account| {
            account.role = role;
            account.updated_at = Utc::now();
            account.clone()
        }))
    }

    async fn list_published_courses(&self) -> Result<Vec<Course>, RepositoryError> {
        let inner = self.lock();
        let mut courses: Vec<Course> = inner
            .courses
            .iter()
            .filter(|c| c.is_published)
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, RepositoryError> {
        let inner = self.lock();
        Ok(inner.courses.iter().find(|c| c.slug == slug).cloned())
    }

    async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        let inner = self.lock();
        Ok(inner.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, RepositoryError> {
        let inner = self.lock();
        let mut modules: Vec<Module> = inner
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| (m.position, m.id.as_i32()));
        Ok(modules)
    }

    async fn module_by_id(&self, id: ModuleId) -> Result<Option<Module>, RepositoryError> {
        let inner = self.lock();
        Ok(inner.modules.iter().find(|m| m.id == id).cloned())
    }

    async fn list_module_contents(
        &self,
        module_id: ModuleId,
    ) -> Result<Vec<ModuleContent>, RepositoryError> {
        let inner = self.lock();
        let mut contents: Vec<ModuleContent> = inner
            .contents
            .iter()
            .filter(|c| c.module_id == module_id)
            .cloned()
            .collect();
        contents.sort_by_key(|c| (c.position, c.id));
        Ok(contents)
    }

    async fn create_course(&self, new: NewCourse) -> Result<Course, RepositoryError> {
        let mut inner = self.lock();
        if inner.courses.iter().any(|c| c.slug == new.slug) {
            return Err(RepositoryError::Conflict(
                "course slug already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let course = Course {
            id: CourseId::new(inner.next_id()),
            slug: new.slug,
            title: new.title,
            description: new.description,
            price: new.price,
            is_published: new.is_published,
            created_at: now,
            updated_at: now,
        };
        inner.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Option<Course>, RepositoryError> {
        let mut inner = self.lock();

        if let Some(ref slug) = update.slug {
            let Some(current) = inner.courses.iter().find(|c| c.id == id) else {
                return Ok(None);
            };
            if current.is_published && *slug != current.slug {
                return Err(RepositoryError::Conflict(
                    "slug is immutable once the course is published".to_owned(),
                ));
            }
            if inner.courses.iter().any(|c| c.id != id && c.slug == *slug) {
                return Err(RepositoryError::Conflict(
                    "course slug already exists".to_owned(),
                ));
            }
        }

        Ok(inner.courses.iter_mut().find(|c| c.id == id).map(|course| {
            if let Some(slug) = update.slug {
                course.slug = slug;
            }
            if let Some(title) = update.title {
                course.title = title;
            }
            if let Some(description) = update.description {
                course.description = description;
            }
            if let Some(price) = update.price {
                course.price = price;
            }
            if let Some(is_published) = update.is_published {
                course.is_published = is_published;
            }
            course.updated_at = Utc::now();
            course.clone()
        }))
    }

    async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let before = inner.courses.len();
        inner.courses.retain(|c| c.id != id);
        if inner.courses.len() == before {
            return Ok(false);
        }
        let module_ids: Vec<ModuleId> = inner
            .modules
            .iter()
            .filter(|m| m.course_id == id)
            .map(|m| m.id)
            .collect();
        inner.modules.retain(|m| m.course_id != id);
        inner.contents.retain(|c| !module_ids.contains(&c.module_id));
        inner.enrollments.retain(|e| e.course_id != id);
        inner.purchases.retain(|p| p.course_id != id);
        Ok(true)
    }

    async fn create_module(
        &self,
        course_id: CourseId,
        new: NewModule,
    ) -> Result<Module, RepositoryError> {
        let mut inner = self.lock();
        if !inner.courses.iter().any(|c| c.id == course_id) {
            return Err(RepositoryError::Conflict("unknown course".to_owned()));
        }
        let module = Module {
            id: ModuleId::new(inner.next_id()),
            course_id,
            title: new.title,
            is_free: new.is_free,
            position: new.position,
        };
        inner.modules.push(module.clone());
        Ok(module)
    }

    async fn update_module(
        &self,
        id: ModuleId,
        update: ModuleUpdate,
    ) -> Result<Option<Module>, RepositoryError> {
        let mut inner = self.lock();
        Ok(inner.modules.iter_mut().find(|m| m.id == id).map(|module| {
            if let Some(title) = update.title {
                module.title = title;
            }
            if let Some(is_free) = update.is_free {
                module.is_free = is_free;
            }
            if let Some(position) = update.position {
                module.position = position;
            }
            module.clone()
        }))
    }

    async fn delete_module(&self, id: ModuleId) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let before = inner.modules.len();
        inner.modules.retain(|m| m.id != id);
        inner.contents.retain(|c| c.module_id != id);
        Ok(inner.modules.len() != before)
    }

    async fn reorder_modules(
        &self,
        course_id: CourseId,
        order: &[ModuleId],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.lock();
        let mut expected: Vec<i32> = inner
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .map(|m| m.id.as_i32())
            .collect();
        let mut requested: Vec<i32> = order.iter().map(|id| id.as_i32()).collect();
        expected.sort_unstable();
        requested.sort_unstable();
        if expected != requested {
            return Err(RepositoryError::Conflict(
                "reorder must name exactly the modules of the course".to_owned(),
            ));
        }

        for (position, module_id) in (0i32..).zip(order.iter()) {
            if let Some(module) = inner.modules.iter_mut().find(|m| m.id == *module_id) {
                module.position = position;
            }
        }
        Ok(())
    }

    async fn create_module_content(
        &self,
        module_id: ModuleId,
        new: NewModuleContent,
    ) -> Result<ModuleContent, RepositoryError> {
        let mut inner = self.lock();
        if !inner.modules.iter().any(|m| m.id == module_id) {
            return Err(RepositoryError::Conflict("unknown module".to_owned()));
        }
        let content = ModuleContent {
            id: inner.next_id(),
            module_id,
            kind: new.kind,
            title: new.title,
            body: new.body,
            position: new.position,
        };
        inner.contents.push(content.clone());
        Ok(content)
    }

    async fn enrollment_exists(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<bool, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .enrollments
            .iter()
            .any(|e| e.account_id == account_id && e.course_id == course_id))
    }

    async fn create_enrollment(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Enrollment, RepositoryError> {
        let mut inner = self.lock();
        if inner
            .enrollments
            .iter()
            .any(|e| e.account_id == account_id && e.course_id == course_id)
        {
            return Err(RepositoryError::Conflict(
                "already enrolled in this course".to_owned(),
            ));
        }
        let enrollment = Enrollment {
            id: EnrollmentId::new(inner.next_id()),
            account_id,
            course_id,
            created_at: Utc::now(),
        };
        inner.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn list_enrollments(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        let inner = self.lock();
        let mut enrollments: Vec<Enrollment> = inner
            .enrollments
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        enrollments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(enrollments)
    }

    async fn success_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Option<Purchase>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .purchases
            .iter()
            .find(|p| {
                p.account_id == account_id
                    && p.course_id == course_id
                    && p.status == PurchaseStatus::Success
            })
            .cloned())
    }

    async fn pending_purchase(
        &self,
        account_id: AccountId,
        course_id: CourseId,
    ) -> Result<Option<Purchase>, RepositoryError> {
        let inner = self.lock();
        Ok(inner
            .purchases
            .iter()
            .find(|p| {
                p.account_id == account_id
                    && p.course_id == course_id
                    && p.status == PurchaseStatus::Pending
            })
            .cloned())
    }

    async fn insert_pending_purchase(
        &self,
        new: NewPendingPurchase,
    ) -> Result<PendingPurchase, RepositoryError> {
        let mut inner = self.lock();

        // Same rule as the partial unique index: the first pending row for
        // (account, course) wins, later callers get the winner back.
        if let Some(existing) = inner.purchases.iter().find(|p| {
            p.account_id == new.account_id
                && p.course_id == new.course_id
                && p.status == PurchaseStatus::Pending
        }) {
            return Ok(PendingPurchase::Existing(existing.clone()));
        }

        let purchase = Purchase {
            id: PurchaseId::new(inner.next_id()),
            account_id: new.account_id,
            course_id: new.course_id,
            amount: new.amount,
            status: PurchaseStatus::Pending,
            external_order_ref: new.external_order_ref,
            external_payment_ref: None,
            created_at: Utc::now(),
            settled_at: None,
        };
        inner.purchases.push(purchase.clone());
        Ok(PendingPurchase::Created(purchase))
    }

    async fn settle_purchase(
        &self,
        order_ref: &str,
        status: PurchaseStatus,
        payment_ref: Option<&str>,
    ) -> Result<Option<SettledPurchase>, RepositoryError> {
        let mut inner = self.lock();
        let Some(purchase) = inner
            .purchases
            .iter_mut()
            .find(|p| p.external_order_ref == order_ref)
        else {
            return Ok(None);
        };

        if purchase.status.is_terminal() {
            return Ok(Some(SettledPurchase {
                purchase: purchase.clone(),
                already_settled: true,
            }));
        }

        purchase.status = status;
        purchase.external_payment_ref = payment_ref.map(ToOwned::to_owned);
        purchase.settled_at = Some(Utc::now());
        Ok(Some(SettledPurchase {
            purchase: purchase.clone(),
            already_settled: false,
        }))
    }

    async fn enrollment_by_id(
        &self,
        id: EnrollmentId,
    ) -> Result<Option<Enrollment>, RepositoryError> {
        let inner = self.lock();
        Ok(inner.enrollments.iter().find(|e| e.id == id).cloned())
    }

    async fn list_published_posts(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let inner = self.lock();
        let mut posts: Vec<BlogPost> = inner
            .posts
            .iter()
            .filter(|p| p.is_published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let inner = self.lock();
        Ok(inner.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create_post(&self, new: NewBlogPost) -> Result<BlogPost, RepositoryError> {
        let mut inner = self.lock();
        if inner.posts.iter().any(|p| p.slug == new.slug) {
            return Err(RepositoryError::Conflict(
                "blog post slug already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let post = BlogPost {
            id: BlogPostId::new(inner.next_id()),
            slug: new.slug,
            title: new.title,
            body: new.body,
            is_published: new.is_published,
            created_at: now,
            updated_at: now,
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        id: BlogPostId,
        update: BlogPostUpdate,
    ) -> Result<Option<BlogPost>, RepositoryError> {
        let mut inner = self.lock();
        Ok(inner.posts.iter_mut().find(|p| p.id == id).map(|post| {
            if let Some(title) = update.title {
                post.title = title;
            }
            if let Some(body) = update.body {
                post.body = body;
            }
            if let Some(is_published) = update.is_published {
                post.is_published = is_published;
            }
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn delete_post(&self, id: BlogPostId) -> Result<bool, RepositoryError> {
        let mut inner = self.lock();
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        Ok(inner.posts.len() != before)
    }
}
