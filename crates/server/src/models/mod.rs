//! Domain types for the server.
//!
//! These are validated domain objects, separate from database row types;
//! repositories convert rows into these at the storage boundary.

pub mod account;
pub mod blog;
pub mod catalog;
pub mod purchase;

pub use account::Account;
pub use blog::{BlogPost, BlogPostUpdate, NewBlogPost};
pub use catalog::{
    Course, CourseUpdate, Module, ModuleContent, ModuleContentKind, ModuleUpdate, NewCourse,
    NewModule, NewModuleContent,
};
pub use purchase::{Enrollment, NewPendingPurchase, PendingPurchase, Purchase, SettledPurchase};
