//! Catalog reads behind the revalidation cache.
//!
//! Every read tries the store first and refreshes the cache on success.
//! When the store is unreachable the last cached value is served even past
//! its TTL; a stale catalog beats an empty error page. Admin mutations call
//! [`CatalogService::invalidate`] so the next read refetches.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::cache::RevalidateCache;
use crate::db::{RepositoryError, Store};
use crate::models::{Course, Module};

/// How long catalog reads stay fresh.
const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The slug does not name a published course.
    #[error("course not found")]
    CourseNotFound,

    /// Storage failure with no cached value to fall back on.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A course together with its ordered modules.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub course: Course,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    CourseList,
    CourseDetail(String),
}

#[derive(Clone)]
enum CacheValue {
    CourseList(Vec<Course>),
    CourseDetail(CourseDetail),
}

/// Cached read access to the course catalog.
pub struct CatalogService {
    store: Arc<dyn Store>,
    cache: RevalidateCache<CacheKey, CacheValue>,
    ttl: Duration,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_ttl(store, CATALOG_TTL)
    }

    #[must_use]
    pub fn with_ttl(store: Arc<dyn Store>, ttl: Duration) -> Self {
        Self {
            store,
            cache: RevalidateCache::new(),
            ttl,
        }
    }

    /// All published courses, newest first.
    ///
    /// # Errors
    ///
    /// Fails only when the store is unreachable and nothing was ever cached.
    #[instrument(skip(self))]
    pub async fn list_courses(&self) -> Result<Vec<Course>, CatalogError> {
        match self.store.list_published_courses().await {
            Ok(courses) => {
                self.cache.set(
                    CacheKey::CourseList,
                    CacheValue::CourseList(courses.clone()),
                    self.ttl,
                );
                Ok(courses)
            }
            Err(error) => {
                if let Some(CacheValue::CourseList(courses)) =
                    self.cache.get_stale(&CacheKey::CourseList)
                {
                    warn!(%error, "serving stale course list");
                    return Ok(courses);
                }
                Err(error.into())
            }
        }
    }

    /// A published course and its modules, by slug.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::CourseNotFound`] when the slug does not resolve or
    ///   the course is unpublished; a definitive miss is never papered over
    ///   with a cached value
    /// - [`CatalogError::Repository`] when the store is unreachable and the
    ///   slug was never cached
    #[instrument(skip(self))]
    pub async fn course_detail(&self, slug: &str) -> Result<CourseDetail, CatalogError> {
        let key = CacheKey::CourseDetail(slug.to_owned());

        match self.fetch_detail(slug).await {
            Ok(Some(detail)) => {
                self.cache
                    .set(key, CacheValue::CourseDetail(detail.clone()), self.ttl);
                Ok(detail)
            }
            Ok(None) => {
                self.cache.remove(&key);
                Err(CatalogError::CourseNotFound)
            }
            Err(error) => {
                if let Some(CacheValue::CourseDetail(detail)) = self.cache.get_stale(&key) {
                    warn!(%error, slug, "serving stale course detail");
                    return Ok(detail);
                }
                Err(error.into())
            }
        }
    }

    /// Drop everything cached. Called after any admin catalog mutation.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    async fn fetch_detail(&self, slug: &str) -> Result<Option<CourseDetail>, RepositoryError> {
        let Some(course) = self
            .store
            .course_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
        else {
            return Ok(None);
        };
        let modules = self.store.list_modules(course.id).await?;
        Ok(Some(CourseDetail { course, modules }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chalkbox_core::{
        AccountId, AccountRole, BlogPostId, CourseId, CurrencyCode, Email, EnrollmentId, ModuleId,
        Price, PurchaseStatus,
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::db::MemoryStore;
    use crate::models::{
        Account, BlogPost, BlogPostUpdate, CourseUpdate, Enrollment, ModuleContent, ModuleUpdate,
        NewBlogPost, NewCourse, NewModule, NewModuleContent, NewPendingPurchase, PendingPurchase,
        Purchase, SettledPurchase,
    };

    /// Store whose catalog reads can be switched to fail. Only the methods
    /// the catalog service touches are implemented.
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                failing: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepositoryError::DataCorruption(
                    "store unavailable".to_owned(),
                ));
            }
            Ok(())
        }
    }

    #[async_trait]
    #[allow(unused_variables, clippy::unimplemented)]
    impl Store for FlakyStore {
        async fn list_published_courses(&self) -> Result<Vec<Course>, RepositoryError> {
            self.check()?;
            self.inner.list_published_courses().await
        }

        async fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, RepositoryError> {
            self.check()?;
            self.inner.course_by_slug(slug).await
        }

        async fn list_modules(&self, course_id: CourseId) -> Result<Vec<Module>, RepositoryError> {
            self.check()?;
            self.inner.list_modules(course_id).await
        }

        async fn account_by_external_id(
            &self,
            external_id: &str,
        ) -> Result<Option<Account>, RepositoryError> {
            unimplemented!()
        }

        async fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
            unimplemented!()
        }

        async fn upsert_account(
            &self,
            external_id: &str,
            email: &Email,
        ) -> Result<Account, RepositoryError> {
            unimplemented!()
        }

        async fn update_account_email(
            &self,
            external_id: &str,
            email: &Email,
        ) -> Result<Option<Account>, RepositoryError> {
            unimplemented!()
        }

        async fn delete_account(&self, external_id: &str) -> Result<bool, RepositoryError> {
            unimplemented!()
        }

        async fn set_account_role(
            &self,
            id: AccountId,
            role: AccountRole,
        ) -> Result<Option<Account>, RepositoryError> {
            unimplemented!()
        }

        async fn course_by_id(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
            unimplemented!()
        }

        async fn module_by_id(&self, id: ModuleId) -> Result<Option<Module>, RepositoryError> {
            unimplemented!()
        }

        async fn list_module_contents(
            &self,
            module_id: ModuleId,
        ) -> Result<Vec<ModuleContent>, RepositoryError> {
            unimplemented!()
        }

        async fn create_course(&self, new: NewCourse) -> Result<Course, RepositoryError> {
            unimplemented!()
        }

        async fn update_course(
            &self,
            id: CourseId,
            update: CourseUpdate,
        ) -> Result<Option<Course>, RepositoryError> {
            unimplemented!()
        }

        async fn delete_course(&self, id: CourseId) -> Result<bool, RepositoryError> {
            unimplemented!()
        }

        async fn create_module(
            &self,
            course_id: CourseId,
            new: NewModule,
        ) -> Result<Module, RepositoryError> {
            unimplemented!()
        }

        async fn update_module(
            &self,
            id: ModuleId,
            update: ModuleUpdate,
        ) -> Result<Option<Module>, RepositoryError> {
            unimplemented!()
        }

        async fn delete_module(&self, id: ModuleId) -> Result<bool, RepositoryError> {
            unimplemented!()
        }

        async fn reorder_modules(
            &self,
            course_id: CourseId,
            order: &[ModuleId],
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }

        async fn create_module_content(
            &self,
            module_id: ModuleId,
            new: NewModuleContent,
        ) -> Result<ModuleContent, RepositoryError> {
            unimplemented!()
        }

        async fn enrollment_exists(
            &self,
            account_id: AccountId,
            course_id: CourseId,
        ) -> Result<bool, RepositoryError> {
            unimplemented!()
        }

        async fn create_enrollment(
            &self,
            account_id: AccountId,
            course_id: CourseId,
        ) -> Result<Enrollment, RepositoryError> {
            unimplemented!()
        }

        async fn list_enrollments(
            &self,
            account_id: AccountId,
        ) -> Result<Vec<Enrollment>, RepositoryError> {
            unimplemented!()
        }

        async fn success_purchase(
            &self,
            account_id: AccountId,
            course_id: CourseId,
        ) -> Result<Option<Purchase>, RepositoryError> {
            unimplemented!()
        }

        async fn pending_purchase(
            &self,
            account_id: AccountId,
            course_id: CourseId,
        ) -> Result<Option<Purchase>, RepositoryError> {
            unimplemented!()
        }

        async fn insert_pending_purchase(
            &self,
            new: NewPendingPurchase,
        ) -> Result<PendingPurchase, RepositoryError> {
            unimplemented!()
        }

        async fn settle_purchase(
            &self,
            order_ref: &str,
            status: PurchaseStatus,
            payment_ref: Option<&str>,
        ) -> Result<Option<SettledPurchase>, RepositoryError> {
            unimplemented!()
        }

        async fn enrollment_by_id(
            &self,
            id: EnrollmentId,
        ) -> Result<Option<Enrollment>, RepositoryError> {
            unimplemented!()
        }

        async fn list_published_posts(&self) -> Result<Vec<BlogPost>, RepositoryError> {
            unimplemented!()
        }

        async fn post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
            unimplemented!()
        }

        async fn create_post(&self, new: NewBlogPost) -> Result<BlogPost, RepositoryError> {
            unimplemented!()
        }

        async fn update_post(
            &self,
            id: BlogPostId,
            update: BlogPostUpdate,
        ) -> Result<Option<BlogPost>, RepositoryError> {
            unimplemented!()
        }

        async fn delete_post(&self, id: BlogPostId) -> Result<bool, RepositoryError> {
            unimplemented!()
        }
    }

    async fn seed(store: &FlakyStore) {
        store
            .inner
            .create_course(NewCourse {
                slug: "rust-301".to_owned(),
                title: "Rust 301".to_owned(),
                description: String::new(),
                price: Price::from_minor_units(19_900, CurrencyCode::INR),
                is_published: true,
            })
            .await
            .expect("course");
    }

    #[tokio::test]
    async fn a_fresh_read_populates_the_cache() {
        let store = Arc::new(FlakyStore::new());
        seed(&store).await;
        let catalog = CatalogService::new(store.clone());

        let courses = catalog.list_courses().await.expect("list");
        assert_eq!(courses.len(), 1);

        // Store down, fresh cache still serves.
        store.set_failing(true);
        let courses = catalog.list_courses().await.expect("cached list");
        assert_eq!(courses.len(), 1);
    }

    #[tokio::test]
    async fn a_stale_entry_is_served_when_the_store_fails() {
        let store = Arc::new(FlakyStore::new());
        seed(&store).await;
        let catalog = CatalogService::with_ttl(store.clone(), Duration::ZERO);

        catalog.list_courses().await.expect("warm");
        std::thread::sleep(Duration::from_millis(5));

        store.set_failing(true);
        let courses = catalog.list_courses().await.expect("stale list");
        assert_eq!(courses[0].slug, "rust-301");
    }

    #[tokio::test]
    async fn a_cold_cache_surfaces_the_store_error() {
        let store = Arc::new(FlakyStore::new());
        seed(&store).await;
        store.set_failing(true);
        let catalog = CatalogService::new(store);

        let result = catalog.list_courses().await;
        assert!(matches!(result, Err(CatalogError::Repository(_))));
    }

    #[tokio::test]
    async fn a_definitive_miss_is_not_papered_over_by_the_cache() {
        let store = Arc::new(FlakyStore::new());
        seed(&store).await;
        let catalog = CatalogService::new(store);

        let result = catalog.course_detail("nope").await;
        assert!(matches!(result, Err(CatalogError::CourseNotFound)));
    }

    #[tokio::test]
    async fn detail_reads_fall_back_to_stale_values() {
        let store = Arc::new(FlakyStore::new());
        seed(&store).await;
        let catalog = CatalogService::with_ttl(store.clone(), Duration::ZERO);

        catalog.course_detail("rust-301").await.expect("warm");
        std::thread::sleep(Duration::from_millis(5));

        store.set_failing(true);
        let detail = catalog.course_detail("rust-301").await.expect("stale");
        assert_eq!(detail.course.slug, "rust-301");
    }

    #[tokio::test]
    async fn invalidate_forces_the_error_through() {
        let store = Arc::new(FlakyStore::new());
        seed(&store).await;
        let catalog = CatalogService::new(store.clone());

        catalog.list_courses().await.expect("warm");
        catalog.invalidate();

        store.set_failing(true);
        let result = catalog.list_courses().await;
        assert!(matches!(result, Err(CatalogError::Repository(_))));
    }
}
