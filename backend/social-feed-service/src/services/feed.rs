/// Feed assembly - read-only views over posts and users
use crate::config::FeedConfig;
use crate::domain::models::{
    CommentView, Post, PostCursor, PostFilter, PostQuery, PostView, UserProfile, UserSummary,
};
use crate::error::{AppError, Result};
use crate::repository::{PostStore, Stores, UserStore};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound for a paginated feed request
pub const MAX_PAGE_SIZE: usize = 100;

/// Optional cursor pagination; without it the whole feed is returned.
///
/// Pass the last post's `createdAt` as `before` and its id as `beforeId` to
/// resume exactly after it, even when several posts share a timestamp.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub before: Option<DateTime<Utc>>,
    pub before_id: Option<Uuid>,
    pub limit: Option<usize>,
}

impl FeedPage {
    /// Page that continues after the last post of `page`
    pub fn after(last: &PostView, limit: Option<usize>) -> Self {
        Self {
            before: Some(last.created_at),
            before_id: Some(last.id),
            limit,
        }
    }

    fn apply(&self, filter: PostFilter) -> PostQuery {
        let limit = self.limit.map(|l| l.clamp(1, MAX_PAGE_SIZE));
        let cursor = self.before.map(|created_at| PostCursor {
            created_at,
            id: self.before_id,
        });
        PostQuery::new(filter).page(cursor, limit)
    }
}

/// Resolve author and comment-author display fields with one batched lookup
pub(crate) async fn resolve_posts(users: &dyn UserStore, posts: Vec<Post>) -> Result<Vec<PostView>> {
    let mut ids: Vec<Uuid> = posts
        .iter()
        .flat_map(|p| std::iter::once(p.user_id).chain(p.comments.iter().map(|c| c.user_id)))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let directory: HashMap<Uuid, UserSummary> = users
        .find_users(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.summary()))
        .collect();

    Ok(posts
        .into_iter()
        .map(|post| PostView {
            id: post.id,
            user: directory.get(&post.user_id).cloned(),
            text: post.text,
            img: post.img,
            likes: post.likes,
            comments: post
                .comments
                .into_iter()
                .map(|c| CommentView {
                    id: c.id,
                    user: directory.get(&c.user_id).cloned(),
                    text: c.text,
                    created_at: c.created_at,
                })
                .collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
        .collect())
}

#[derive(Clone)]
pub struct FeedAssembler {
    users: Arc<dyn UserStore>,
    posts: Arc<dyn PostStore>,
    config: FeedConfig,
}

impl FeedAssembler {
    pub fn new(stores: &Stores, config: FeedConfig) -> Self {
        Self {
            users: stores.users.clone(),
            posts: stores.posts.clone(),
            config,
        }
    }

    async fn assemble(&self, query: PostQuery) -> Result<Vec<PostView>> {
        let posts = self.posts.list_posts(&query).await?;
        resolve_posts(self.users.as_ref(), posts).await
    }

    /// Every post, newest first
    pub async fn get_for_you_feed(&self, _viewer_id: Uuid, page: &FeedPage) -> Result<Vec<PostView>> {
        self.assemble(page.apply(PostFilter::All)).await
    }

    /// Posts whose author the viewer follows, newest first
    pub async fn get_following_feed(&self, viewer_id: Uuid, page: &FeedPage) -> Result<Vec<PostView>> {
        let viewer = self
            .users
            .find_user(viewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if viewer.following.is_empty() {
            return Ok(Vec::new());
        }

        self.assemble(page.apply(PostFilter::ByAuthors(viewer.following)))
            .await
    }

    pub async fn get_user_posts(&self, username: &str, page: &FeedPage) -> Result<Vec<PostView>> {
        let user = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        self.assemble(page.apply(PostFilter::ByAuthors(vec![user.id])))
            .await
    }

    pub async fn get_liked_posts(&self, user_id: Uuid, page: &FeedPage) -> Result<Vec<PostView>> {
        if self.users.find_user(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.assemble(page.apply(PostFilter::LikedBy(user_id))).await
    }

    /// Random sample of users the viewer does not follow yet; informational only
    pub async fn get_suggested_users(&self, viewer_id: Uuid) -> Result<Vec<UserProfile>> {
        let viewer = self
            .users
            .find_user(viewer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let sample = self
            .users
            .sample_users(viewer_id, self.config.suggested_sample_size)
            .await?;

        Ok(sample
            .into_iter()
            .filter(|u| !viewer.is_following(u.id))
            .take(self.config.suggested_users_limit)
            .map(UserProfile::from)
            .collect())
    }

    pub async fn get_user_profile(&self, username: &str) -> Result<UserProfile> {
        self.users
            .find_user_by_username(username)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
