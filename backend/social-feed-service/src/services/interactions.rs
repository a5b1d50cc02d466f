/// Interaction service - the single writer for users, posts and notifications.
///
/// Write discipline: the primary state change (like set, follow edges, post
/// document) commits before any notification write is attempted. The worst
/// case is therefore "state changed, notification missing", which is
/// reported to the caller but never rolled back.
use crate::domain::models::{
    Comment, CommentView, FollowToggle, Notification, NotificationType, Post, PostView,
    ProfileUpdate, UserProfile,
};
use crate::error::{AppError, Result};
use crate::metrics::{record_interaction, MEDIA_CLEANUP_FAILURES_TOTAL, NOTIFICATIONS_WRITTEN_TOTAL};
use crate::repository::{NotificationStore, PostStore, Stores, UserStore};
use crate::services::feed::resolve_posts;
use crate::services::media::{decode_image_payload, MediaStore};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
    /// Base64 data URI
    pub img: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    /// Base64 data URI
    pub profile_img: Option<String>,
    /// Base64 data URI
    pub cover_img: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct InteractionService {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    notifications: Arc<dyn NotificationStore>,
    media: Arc<dyn MediaStore>,
}

impl InteractionService {
    pub fn new(stores: &Stores, media: Arc<dyn MediaStore>) -> Self {
        Self {
            users: stores.users.clone(),
            posts: stores.posts.clone(),
            notifications: stores.notifications.clone(),
            media,
        }
    }

    /// Like the post if the actor has not, otherwise unlike it.
    ///
    /// Only the add path notifies, and only when the actor is not the author.
    /// Returns the resulting like set.
    pub async fn toggle_like(&self, post_id: Uuid, actor_id: Uuid) -> Result<Vec<Uuid>> {
        let toggle = self
            .posts
            .toggle_like(post_id, actor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let action = if toggle.liked { "like" } else { "unlike" };
        record_interaction(action, "ok");
        info!(%post_id, user_id = %actor_id, action, "like toggled");

        if toggle.liked && toggle.author_id != actor_id {
            self.notify(Notification::new(
                toggle.author_id,
                actor_id,
                NotificationType::Like,
                Some(post_id),
            ))
            .await?;
        }

        Ok(toggle.likes)
    }

    /// Append a comment to the end of the post's comment list. Comments never notify.
    pub async fn add_comment(&self, post_id: Uuid, actor_id: Uuid, text: &str) -> Result<CommentView> {
        let text = text.trim();
        if text.is_empty() {
            record_interaction("comment", "rejected");
            return Err(AppError::InvalidArgument("Text field is required".to_string()));
        }

        let author = self
            .users
            .find_user(actor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let comment = Comment {
            id: Uuid::new_v4(),
            user_id: actor_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };

        if !self.posts.push_comment(post_id, &comment).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        record_interaction("comment", "ok");
        info!(%post_id, user_id = %actor_id, comment_id = %comment.id, "comment added");

        Ok(CommentView {
            id: comment.id,
            text: comment.text,
            user: Some(author.summary()),
            created_at: comment.created_at,
        })
    }

    /// Delete a post owned by the actor.
    ///
    /// Image removal and cascade of the post's notifications run after the
    /// document delete succeeds; their failures are logged and swallowed.
    pub async fn delete_post(&self, post_id: Uuid, actor_id: Uuid) -> Result<()> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if post.user_id != actor_id {
            record_interaction("delete_post", "forbidden");
            return Err(AppError::Forbidden(
                "You are not authorized to delete this post".to_string(),
            ));
        }

        if !self.posts.delete_post(post_id).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        record_interaction("delete_post", "ok");
        info!(%post_id, user_id = %actor_id, "post deleted");

        if let Some(img) = &post.img {
            self.cleanup_image(img).await;
        }

        match self.notifications.delete_for_post(post_id).await {
            Ok(removed) if removed > 0 => {
                info!(%post_id, removed, "post notifications removed");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%post_id, error = ?err, "failed to remove notifications of deleted post");
            }
        }

        Ok(())
    }

    /// Follow the target if not yet following, otherwise unfollow.
    ///
    /// Both mirrored edges change as one unit in the store. A follow then
    /// notifies the target; if that write fails the edges stay committed and
    /// the error is returned to the caller.
    pub async fn toggle_follow(&self, actor_id: Uuid, target_id: Uuid) -> Result<FollowToggle> {
        if actor_id == target_id {
            record_interaction("follow", "rejected");
            return Err(AppError::InvalidArgument(
                "You can't follow/unfollow yourself".to_string(),
            ));
        }

        let outcome = self
            .users
            .toggle_follow(actor_id, target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let action = if outcome.is_following() { "follow" } else { "unfollow" };
        record_interaction(action, "ok");
        info!(user_id = %actor_id, %target_id, action, "follow toggled");

        if outcome.is_following() {
            self.notify(Notification::new(
                target_id,
                actor_id,
                NotificationType::Follow,
                None,
            ))
            .await?;
        }

        Ok(outcome)
    }

    /// Create a post with text, an image, or both
    pub async fn create_post(&self, actor_id: Uuid, req: CreatePostRequest) -> Result<PostView> {
        let text = non_blank(req.text.as_deref());
        let img_payload = non_blank(req.img.as_deref());
        if text.is_none() && img_payload.is_none() {
            record_interaction("create_post", "rejected");
            return Err(AppError::InvalidArgument(
                "Post must have text or image".to_string(),
            ));
        }

        if self.users.find_user(actor_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let img = match img_payload {
            Some(raw) => Some(self.upload_image(&raw).await?),
            None => None,
        };

        let post = Post::new(actor_id, text, img);
        if let Err(err) = self.posts.insert_post(&post).await {
            if let Some(img) = &post.img {
                self.cleanup_image(img).await;
            }
            return Err(err.into());
        }

        record_interaction("create_post", "ok");
        info!(post_id = %post.id, user_id = %actor_id, "post created");

        let mut views = resolve_posts(self.users.as_ref(), vec![post]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::Unavailable("Post could not be resolved".to_string()))
    }

    /// Update display fields of the actor's own profile
    pub async fn update_profile(&self, actor_id: Uuid, req: UpdateProfileRequest) -> Result<UserProfile> {
        let current = self
            .users
            .find_user(actor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let username = match req.username.as_deref().map(str::trim) {
            Some("") => {
                return Err(AppError::InvalidArgument("Username cannot be empty".to_string()));
            }
            Some(name) if name != current.username => {
                if self.users.find_user_by_username(name).await?.is_some() {
                    return Err(AppError::Conflict("Username is already taken".to_string()));
                }
                Some(name.to_string())
            }
            _ => None,
        };

        let profile_img = match non_blank(req.profile_img.as_deref()) {
            Some(raw) => Some(self.upload_image(&raw).await?),
            None => None,
        };
        let cover_img = match non_blank(req.cover_img.as_deref()) {
            Some(raw) => match self.upload_image(&raw).await {
                Ok(url) => Some(url),
                Err(err) => {
                    if let Some(url) = &profile_img {
                        self.cleanup_image(url).await;
                    }
                    return Err(err);
                }
            },
            None => None,
        };

        let update = ProfileUpdate {
            username,
            full_name: non_blank(req.full_name.as_deref()),
            bio: req.bio.map(|b| b.trim().to_string()),
            link: req.link.map(|l| l.trim().to_string()),
            profile_img: profile_img.clone(),
            cover_img: cover_img.clone(),
        };

        // Uploads not referenced by a stored profile are removed again.
        let updated = match self.users.update_profile(actor_id, &update).await {
            Ok(Some(user)) => user,
            outcome => {
                for url in profile_img.iter().chain(cover_img.iter()) {
                    self.cleanup_image(url).await;
                }
                record_interaction("update_profile", "failed");
                return Err(match outcome {
                    Err(err) => err.into(),
                    Ok(_) => AppError::NotFound("User not found".to_string()),
                });
            }
        };

        // Replaced images go only after the new references are stored.
        if profile_img.is_some() {
            if let Some(old) = &current.profile_img {
                self.cleanup_image(old).await;
            }
        }
        if cover_img.is_some() {
            if let Some(old) = &current.cover_img {
                self.cleanup_image(old).await;
            }
        }

        record_interaction("update_profile", "ok");
        info!(user_id = %actor_id, "profile updated");
        Ok(UserProfile::from(updated))
    }

    async fn notify(&self, notification: Notification) -> Result<()> {
        let kind = notification.kind.as_str();
        match self.notifications.insert_notification(&notification).await {
            Ok(()) => {
                NOTIFICATIONS_WRITTEN_TOTAL.with_label_values(&[kind]).inc();
                Ok(())
            }
            Err(err) => {
                record_interaction(kind, "notification_failed");
                warn!(
                    to = %notification.to,
                    from = %notification.from,
                    kind,
                    error = ?err,
                    "state change committed but notification write failed"
                );
                Err(AppError::Unavailable(
                    "Notification could not be recorded".to_string(),
                ))
            }
        }
    }

    async fn upload_image(&self, raw: &str) -> Result<String> {
        if !self.media.is_enabled() {
            return Err(AppError::InvalidArgument(
                "Image uploads are not enabled".to_string(),
            ));
        }

        let payload = decode_image_payload(raw)?;
        self.media
            .upload_image(payload.bytes, &payload.content_type)
            .await
            .map_err(|err| {
                warn!(error = ?err, "image upload failed");
                AppError::Unavailable("Image upload failed".to_string())
            })
    }

    async fn cleanup_image(&self, url: &str) {
        if let Err(err) = self.media.delete_image(url).await {
            MEDIA_CLEANUP_FAILURES_TOTAL.inc();
            warn!(url, error = ?err, "best-effort image cleanup failed");
        }
    }
}
