//! Seed the database with a demo catalog.
//!
//! Idempotent: courses and posts are matched by slug and skipped when they
//! already exist, so the command is safe to re-run against a database that
//! was seeded before.

use tracing::info;

use chalkbox_core::{CurrencyCode, Price};
use chalkbox_server::db::{self, PgStore, Store};
use chalkbox_server::models::{
    ModuleContentKind, NewBlogPost, NewCourse, NewModule, NewModuleContent,
};

struct DemoModule {
    title: &'static str,
    is_free: bool,
    lesson: &'static str,
}

struct DemoCourse {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    price_minor_units: i64,
    modules: &'static [DemoModule],
}

const DEMO_COURSES: &[DemoCourse] = &[
    DemoCourse {
        slug: "algebra-foundations",
        title: "Algebra Foundations",
        description: "Linear equations, factorisation, and word problems.",
        price_minor_units: 49_900,
        modules: &[
            DemoModule {
                title: "Welcome and course map",
                is_free: true,
                lesson: "What we cover and how to study.",
            },
            DemoModule {
                title: "Linear equations",
                is_free: false,
                lesson: "Solving for one unknown, step by step.",
            },
            DemoModule {
                title: "Factorisation",
                is_free: false,
                lesson: "Common factors, grouping, and quadratics.",
            },
        ],
    },
    DemoCourse {
        slug: "study-skills",
        title: "Study Skills",
        description: "A free short course on note-taking and revision.",
        price_minor_units: 0,
        modules: &[DemoModule {
            title: "Revision that works",
            is_free: true,
            lesson: "Spaced repetition and active recall.",
        }],
    },
];

/// Seed the demo catalog and a welcome blog post.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let store = PgStore::new(pool);

    for demo in DEMO_COURSES {
        if store.course_by_slug(demo.slug).await?.is_some() {
            info!(slug = demo.slug, "course exists, skipping");
            continue;
        }

        let course = store
            .create_course(NewCourse {
                slug: demo.slug.to_owned(),
                title: demo.title.to_owned(),
                description: demo.description.to_owned(),
                price: Price::from_minor_units(demo.price_minor_units, CurrencyCode::INR),
                is_published: true,
            })
            .await?;

        for (position, module) in demo.modules.iter().enumerate() {
            let created = store
                .create_module(
                    course.id,
                    NewModule {
                        title: module.title.to_owned(),
                        is_free: module.is_free,
                        position: i32::try_from(position).unwrap_or(i32::MAX),
                    },
                )
                .await?;

            store
                .create_module_content(
                    created.id,
                    NewModuleContent {
                        kind: ModuleContentKind::Lesson,
                        title: module.title.to_owned(),
                        body: module.lesson.to_owned(),
                        position: 0,
                    },
                )
                .await?;
        }

        info!(slug = demo.slug, "course seeded");
    }

    if store.post_by_slug("welcome").await?.is_none() {
        store
            .create_post(NewBlogPost {
                slug: "welcome".to_owned(),
                title: "Welcome to Chalkbox".to_owned(),
                body: "Our first courses are live.".to_owned(),
                is_published: true,
            })
            .await?;
        info!("welcome post seeded");
    }

    info!("Seeding complete!");
    Ok(())
}
