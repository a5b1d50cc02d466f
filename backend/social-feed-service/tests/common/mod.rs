//! Shared fixtures for social-feed-service integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use social_feed_service::config::FeedConfig;
use social_feed_service::domain::models::{
    FollowToggle, Notification, Post, ProfileUpdate, User,
};
use social_feed_service::middleware::Claims;
use social_feed_service::repository::{
    MemoryStore, NotificationStore, PostStore, Stores, UserStore,
};
use social_feed_service::services::{
    FeedAssembler, InteractionService, MediaStore, NotificationGateway,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn mint_token(user_id: Uuid) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("failed to mint test token")
}

/// Media store that records calls; deletes, or uploads of one content
/// type, can be made to fail
#[derive(Default)]
pub struct RecordingMedia {
    pub uploads: Mutex<Vec<String>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_deletes: AtomicBool,
    pub fail_uploads_of: Mutex<Option<String>>,
}

impl RecordingMedia {
    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaStore for RecordingMedia {
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        if self.fail_uploads_of.lock().unwrap().as_deref() == Some(content_type) {
            anyhow::bail!("bucket rejected {}", content_type);
        }
        let ext = content_type.trim_start_matches("image/");
        let url = format!("https://media.test/images/{}.{}", Uuid::new_v4(), ext);
        assert!(!bytes.is_empty());
        self.uploads.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete_image(&self, url: &str) -> anyhow::Result<()> {
        self.deletes.lock().unwrap().push(url.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            anyhow::bail!("bucket unreachable");
        }
        Ok(())
    }
}

/// Notification store whose writes can be switched off to simulate outages
pub struct FlakyNotifications {
    inner: Arc<MemoryStore>,
    pub fail_inserts: AtomicBool,
    pub fail_post_cascade: AtomicBool,
}

impl FlakyNotifications {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_inserts: AtomicBool::new(false),
            fail_post_cascade: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl NotificationStore for FlakyNotifications {
    async fn insert_notification(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("notification store unavailable");
        }
        self.inner.insert_notification(notification).await
    }

    async fn list_and_mark_read(&self, recipient_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        self.inner.list_and_mark_read(recipient_id).await
    }

    async fn delete_for_recipient(&self, recipient_id: Uuid) -> anyhow::Result<u64> {
        self.inner.delete_for_recipient(recipient_id).await
    }

    async fn delete_for_post(&self, post_id: Uuid) -> anyhow::Result<u64> {
        if self.fail_post_cascade.load(Ordering::SeqCst) {
            anyhow::bail!("notification store unavailable");
        }
        self.inner.delete_for_post(post_id).await
    }
}

/// User store that can hide usernames from lookups (another writer claims
/// the name between the availability check and the write) or fail updates
pub struct RacyUsers {
    inner: Arc<MemoryStore>,
    pub hide_usernames: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl RacyUsers {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            hide_usernames: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for RacyUsers {
    async fn insert_user(&self, user: &User) -> anyhow::Result<()> {
        self.inner.insert_user(user).await
    }

    async fn find_user(&self, user_id: Uuid) -> anyhow::Result<Option<User>> {
        self.inner.find_user(user_id).await
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        if self.hide_usernames.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_user_by_username(username).await
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<User>> {
        self.inner.find_users(user_ids).await
    }

    async fn sample_users(&self, exclude: Uuid, size: usize) -> anyhow::Result<Vec<User>> {
        self.inner.sample_users(exclude, size).await
    }

    async fn toggle_follow(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> anyhow::Result<Option<FollowToggle>> {
        self.inner.toggle_follow(actor_id, target_id).await
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> anyhow::Result<Option<User>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            anyhow::bail!("user store unavailable");
        }
        self.inner.update_profile(user_id, update).await
    }
}

/// Services wired against one in-memory store
pub struct TestContext {
    pub memory: Arc<MemoryStore>,
    pub users: Arc<RacyUsers>,
    pub notifications: Arc<FlakyNotifications>,
    pub stores: Stores,
    pub media: Arc<RecordingMedia>,
    pub interactions: InteractionService,
    pub feed: FeedAssembler,
    pub gateway: NotificationGateway,
}

impl TestContext {
    pub fn new() -> Self {
        let memory = Arc::new(MemoryStore::new());
        let users = Arc::new(RacyUsers::new(memory.clone()));
        let notifications = Arc::new(FlakyNotifications::new(memory.clone()));
        let stores = Stores {
            users: users.clone(),
            posts: memory.clone(),
            notifications: notifications.clone(),
        };
        let media = Arc::new(RecordingMedia::default());

        Self {
            interactions: InteractionService::new(&stores, media.clone()),
            feed: FeedAssembler::new(&stores, FeedConfig::default()),
            gateway: NotificationGateway::new(&stores),
            memory,
            users,
            notifications,
            stores,
            media,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let user = User::new(username, username.to_uppercase(), format!("{}@example.com", username));
        self.memory.insert_user(&user).await.unwrap();
        user
    }

    /// Insert a post `minutes_ago` minutes in the past
    pub async fn post(&self, author: &User, text: &str, minutes_ago: i64) -> Post {
        let mut post = Post::new(author.id, Some(text.to_string()), None);
        post.created_at = Utc::now() - Duration::minutes(minutes_ago);
        post.updated_at = post.created_at;
        self.memory.insert_post(&post).await.unwrap();
        post
    }

    pub async fn post_at(&self, author: &User, text: &str, created_at: DateTime<Utc>) -> Post {
        let mut post = Post::new(author.id, Some(text.to_string()), None);
        post.created_at = created_at;
        post.updated_at = created_at;
        self.memory.insert_post(&post).await.unwrap();
        post
    }

    pub async fn post_with_image(&self, author: &User, img: &str) -> Post {
        let post = Post::new(author.id, None, Some(img.to_string()));
        self.memory.insert_post(&post).await.unwrap();
        post
    }

    pub async fn reload_user(&self, user_id: Uuid) -> User {
        self.memory.find_user(user_id).await.unwrap().unwrap()
    }

    pub async fn reload_post(&self, post_id: Uuid) -> Option<Post> {
        self.memory.find_post(post_id).await.unwrap()
    }

    /// Peek at stored notifications without marking them read
    pub async fn stored_notifications(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.memory.peek_notifications(recipient_id).await
    }
}
