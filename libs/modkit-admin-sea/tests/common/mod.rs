#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;

use modkit_admin::{AdminRequest, RequestAction, ViewRegistry};
use modkit_admin_sea::{DatabaseConfig, SeaModelView, Session};
use sea_orm::ConnectionTrait;
use tempfile::TempDir;

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub email: String,
        pub score: i32,
        pub avatar: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::post::Entity")]
        Posts,
    }

    impl Related<super::post::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Posts.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod post {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "posts")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub views: i32,
        pub published: bool,
        pub user_id: Option<i32>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod membership {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "memberships")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub group_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod event {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "events")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod ticket {
    use sea_orm::entity::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
    #[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
    pub enum Status {
        #[sea_orm(string_value = "open")]
        Open,
        #[sea_orm(string_value = "closed")]
        Closed,
    }

    #[derive(Debug, Clone, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "tickets")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub status: Status,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE users (
id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
name TEXT NOT NULL,
email TEXT NOT NULL,
score INTEGER NOT NULL DEFAULT 0,
avatar TEXT NULL
)",
    "CREATE TABLE posts (
id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
title TEXT NOT NULL,
views INTEGER NOT NULL DEFAULT 0,
published BOOLEAN NOT NULL DEFAULT 0,
user_id INTEGER NULL REFERENCES users(id)
)",
    "CREATE TABLE events (
id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
at TEXT NOT NULL
)",
    "CREATE TABLE tickets (
id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
status TEXT NOT NULL
)",
];

const SEED: &[&str] = &[
    "INSERT INTO users (id, name, email, score) VALUES
(1, 'Alice', 'alice@example.com', 30),
(2, 'Bob', 'bob@example.com', 10),
(3, 'Carol_100%', 'carol@example.org', 20)",
    "INSERT INTO posts (id, title, views, published, user_id) VALUES
(1, 'Rust ownership', 120, 1, 1),
(2, 'Async in practice', 40, 0, 1),
(3, 'Gardening', 5, 1, 2),
(4, 'Untitled draft', 0, 0, NULL)",
];

/// Temporary SQLite database with both admin views registered.
pub struct Fixture {
    _dir: TempDir,
    pub session: Session,
    pub registry: ViewRegistry,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_views(|registry| {
            registry
                .register(Arc::new(SeaModelView::<user::Entity>::new().unwrap()))
                .unwrap();
            registry
                .register(Arc::new(SeaModelView::<post::Entity>::new().unwrap()))
                .unwrap();
        })
        .await
    }

    pub async fn with_views(register: impl FnOnce(&ViewRegistry)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DatabaseConfig {
            dsn: format!("sqlite://{}?mode=rwc", dir.path().join("admin.db").display()),
            max_conns: Some(4),
            ..DatabaseConfig::default()
        };
        let session = Session::connect(&cfg).await.unwrap();
        for stmt in SCHEMA.iter().chain(SEED) {
            session.conn().execute_unprepared(stmt).await.unwrap();
        }
        let registry = ViewRegistry::new();
        register(&registry);
        Self {
            _dir: dir,
            session,
            registry,
        }
    }

    pub fn request(&self, action: RequestAction) -> AdminRequest {
        AdminRequest::new(action)
            .with_registry(self.registry.clone())
            .with_extension(self.session.clone())
    }

    pub fn view(&self, identity: &str) -> Arc<dyn modkit_admin::ModelView> {
        self.registry.get(identity).unwrap()
    }
}
