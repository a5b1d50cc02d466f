use super::{AlreadyTaken, NotificationStore, PostStore, UserStore};
use crate::domain::models::{
    Comment, FollowToggle, LikeToggle, Notification, Post, PostQuery, ProfileUpdate, User,
};
use anyhow::{bail, Result};
use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process store.
///
/// Each collection sits behind its own lock, so every read-modify-write on a
/// document is serialised and concurrent likes cannot lose updates.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    posts: RwLock<HashMap<Uuid, Post>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of a recipient's notifications, oldest first
    pub async fn peek_notifications(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| n.to == recipient_id)
            .cloned()
            .collect()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AlreadyTaken("Username").into());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(user_ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn sample_users(&self, exclude: Uuid, size: usize) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let candidates: Vec<&User> = users.values().filter(|u| u.id != exclude).collect();
        let mut rng = rand::thread_rng();
        Ok(candidates
            .choose_multiple(&mut rng, size)
            .map(|u| (*u).clone())
            .collect())
    }

    async fn toggle_follow(&self, actor_id: Uuid, target_id: Uuid) -> Result<Option<FollowToggle>> {
        if actor_id == target_id {
            bail!("user {} cannot follow itself", actor_id);
        }

        let mut users = self.users.write().await;
        if !users.contains_key(&actor_id) || !users.contains_key(&target_id) {
            return Ok(None);
        }

        let now = Utc::now();
        let following = users
            .get(&actor_id)
            .map(|u| u.is_following(target_id))
            .unwrap_or(false);

        // Both documents change under the same write guard.
        if let Some(actor) = users.get_mut(&actor_id) {
            if following {
                actor.following.retain(|id| *id != target_id);
            } else {
                actor.following.push(target_id);
            }
            actor.updated_at = now;
        }
        if let Some(target) = users.get_mut(&target_id) {
            if following {
                target.followers.retain(|id| *id != actor_id);
            } else if !target.followers.contains(&actor_id) {
                target.followers.push(actor_id);
            }
            target.updated_at = now;
        }

        Ok(Some(if following {
            FollowToggle::Unfollowed
        } else {
            FollowToggle::Followed
        }))
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(username) = &update.username {
            if users.values().any(|u| u.id != user_id && &u.username == username) {
                return Err(AlreadyTaken("Username").into());
            }
        }

        let Some(user) = users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(full_name) = &update.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(bio) = &update.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(link) = &update.link {
            user.link = Some(link.clone());
        }
        if let Some(img) = &update.profile_img {
            user.profile_img = Some(img.clone());
        }
        if let Some(img) = &update.cover_img {
            user.cover_img = Some(img.clone());
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &Post) -> Result<()> {
        self.posts.write().await.insert(post.id, post.clone());
        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.read().await.get(&post_id).cloned())
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let liked = if post.likes.contains(&user_id) {
            post.likes.retain(|id| *id != user_id);
            false
        } else {
            post.likes.push(user_id);
            true
        };
        post.updated_at = Utc::now();

        Ok(Some(LikeToggle {
            liked,
            author_id: post.user_id,
            likes: post.likes.clone(),
        }))
    }

    async fn push_comment(&self, post_id: Uuid, comment: &Comment) -> Result<bool> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&post_id) {
            Some(post) => {
                post.comments.push(comment.clone());
                post.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        Ok(self.posts.write().await.remove(&post_id).is_some())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut selected: Vec<Post> = posts.values().filter(|p| query.matches(p)).cloned().collect();
        PostQuery::sort(&mut selected);
        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }
        Ok(selected)
    }
}

#[async_trait::async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn list_and_mark_read(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let mut notifications = self.notifications.write().await;
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut snapshot: Vec<Notification> = notifications
            .iter()
            .rev()
            .filter(|n| n.to == recipient_id)
            .cloned()
            .collect();

        for n in notifications.iter_mut().filter(|n| n.to == recipient_id) {
            n.read = true;
        }

        newest_first(&mut snapshot, |n| n.created_at);
        Ok(snapshot)
    }

    async fn delete_for_recipient(&self, recipient_id: Uuid) -> Result<u64> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.to != recipient_id);
        Ok((before - notifications.len()) as u64)
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.post_id != Some(post_id));
        Ok((before - notifications.len()) as u64)
    }
}
