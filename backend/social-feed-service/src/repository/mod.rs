/// Store traits for users, posts and notifications.
///
/// Each mutation here is a single atomic unit: a like toggle touches one
/// post document, a follow toggle updates both mirrored user documents
/// together. Nothing in this layer initiates writes on its own.
use crate::domain::models::{
    Comment, FollowToggle, LikeToggle, Notification, Post, PostQuery, ProfileUpdate, User,
};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A unique field (username, email) is held by another user.
///
/// Stores return it inside `anyhow::Error` so callers can tell a lost
/// uniqueness race apart from an unavailable backend.
#[derive(Debug, thiserror::Error)]
#[error("{0} is already taken")]
pub struct AlreadyTaken(pub &'static str);

/// Identity store: user documents with embedded follow edges
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Batch lookup; unknown ids are skipped
    async fn find_users(&self, user_ids: &[Uuid]) -> Result<Vec<User>>;

    /// Pseudo-random sample of up to `size` users, excluding `exclude`
    async fn sample_users(&self, exclude: Uuid, size: usize) -> Result<Vec<User>>;

    /// Flip the actor -> target edge on both documents as one unit.
    /// Returns `None` when either user does not exist.
    async fn toggle_follow(&self, actor_id: Uuid, target_id: Uuid) -> Result<Option<FollowToggle>>;

    /// Apply a profile update. Returns `None` when the user does not exist.
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Option<User>>;
}

/// Post store: post documents with embedded likes and comments
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &Post) -> Result<()>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Atomically add or remove `user_id` from the post's like set.
    /// Returns `None` when the post does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>>;

    /// Append to the end of the comment list; false when the post is absent
    async fn push_comment(&self, post_id: Uuid, comment: &Comment) -> Result<bool>;

    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    /// Posts matching the query, newest first
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;
}

/// Notification store: fan-out records per recipient
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;

    /// Newest-first snapshot of the recipient's notifications, as stored;
    /// exactly the returned records are marked read in the same unit.
    async fn list_and_mark_read(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;

    async fn delete_for_recipient(&self, recipient_id: Uuid) -> Result<u64>;

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64>;
}

/// The three stores the services are wired against
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            notifications: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            posts: store.clone(),
            notifications: store,
        }
    }
}
