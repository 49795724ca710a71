#![allow(dead_code)]

use std::sync::Arc;

use social_graph::core::IdGenerator;
use social_graph::graph::RelationshipGraph;
use social_graph::identity::UserStore;
use social_graph::posts::{FeedComposer, PostStore};
use social_graph::storage::{GraphStorage, MemoryStorage, SqliteStorage};
use social_graph::{NewUser, User};

/// All four components wired over one storage backend.
pub struct Ctx {
    pub storage: Arc<dyn GraphStorage>,
    pub users: UserStore,
    pub graph: RelationshipGraph,
    pub posts: PostStore,
    pub feed: FeedComposer,
}

impl Ctx {
    pub fn from_storage(storage: Arc<dyn GraphStorage>) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();

        let ids = Arc::new(IdGenerator::new(0));
        Self {
            users: UserStore::new(storage.clone(), ids.clone()),
            graph: RelationshipGraph::new(storage.clone()),
            posts: PostStore::new(storage.clone(), ids),
            feed: FeedComposer::new(storage.clone()),
            storage,
        }
    }

    pub fn memory() -> Self {
        Self::from_storage(Arc::new(MemoryStorage::new()))
    }

    pub async fn sqlite() -> Self {
        let storage = SqliteStorage::new_in_memory()
            .await
            .expect("in-memory sqlite");
        Self::from_storage(Arc::new(storage))
    }

    /// Every scenario runs against both backends.
    pub async fn all() -> Vec<Self> {
        vec![Self::memory(), Self::sqlite().await]
    }
}

pub fn attrs(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "secret".to_string(),
        password_confirmation: "secret".to_string(),
    }
}

pub async fn create_user(ctx: &Ctx, name: &str, email: &str) -> User {
    ctx.users
        .create(attrs(name, email))
        .await
        .expect("user creation")
}
