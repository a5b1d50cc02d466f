use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User document - profile plus the embedded follow graph edges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// Credential hash owned by the identity service; never serialized out.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            full_name: full_name.into(),
            email: email.into(),
            password_hash: String::new(),
            profile_img: None,
            cover_img: None,
            bio: None,
            link: None,
            followers: Vec::new(),
            following: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_following(&self, other: Uuid) -> bool {
        self.following.contains(&other)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            profile_img: self.profile_img.clone(),
        }
    }
}

/// Author display fields resolved onto posts, comments and notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_img: Option<String>,
}

/// Partial profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
}

/// Comment embedded in a post, append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post document with its embedded like set and comment list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: Uuid, text: Option<String>, img: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            img,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of an atomic like toggle
#[derive(Debug, Clone)]
pub struct LikeToggle {
    /// True when the toggle added the like
    pub liked: bool,
    pub author_id: Uuid,
    pub likes: Vec<Uuid>,
}

/// Outcome of an atomic follow toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowToggle {
    Followed,
    Unfollowed,
}

impl FollowToggle {
    pub fn is_following(self) -> bool {
        matches!(self, FollowToggle::Followed)
    }
}

/// Notification type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    /// User started following
    Follow,
    /// User liked a post
    Like,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Follow => "follow",
            NotificationType::Like => "like",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "follow" => Some(NotificationType::Follow),
            "like" => Some(NotificationType::Like),
            _ => None,
        }
    }
}

/// Fan-out record addressed to `to`, caused by `from`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub to: Uuid,
    pub from: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Post the event refers to (likes only)
    pub post_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(to: Uuid, from: Uuid, kind: NotificationType, post_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            to,
            from,
            kind,
            post_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

/// Which posts a listing selects
#[derive(Debug, Clone)]
pub enum PostFilter {
    All,
    ByAuthors(Vec<Uuid>),
    LikedBy(Uuid),
}

/// Position in a feed: posts are ordered by `(created_at, id)` descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    pub created_at: DateTime<Utc>,
    /// Tie-break among posts sharing `created_at`; `None` skips the whole instant
    pub id: Option<Uuid>,
}

impl PostCursor {
    /// Cursor that resumes right after `post`
    pub fn after(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            id: Some(post.id),
        }
    }

    fn admits(&self, post: &Post) -> bool {
        match self.id {
            Some(id) => (post.created_at, post.id) < (self.created_at, id),
            None => post.created_at < self.created_at,
        }
    }
}

/// Post listing query, always ordered newest first
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub filter: PostFilter,
    /// Only posts strictly after this position
    pub before: Option<PostCursor>,
    pub limit: Option<usize>,
}

impl PostQuery {
    pub fn new(filter: PostFilter) -> Self {
        Self {
            filter,
            before: None,
            limit: None,
        }
    }

    pub fn page(mut self, before: Option<PostCursor>, limit: Option<usize>) -> Self {
        self.before = before;
        self.limit = limit;
        self
    }

    /// In-process evaluation of the filter, shared by stores without a query engine
    pub fn matches(&self, post: &Post) -> bool {
        let selected = match &self.filter {
            PostFilter::All => true,
            PostFilter::ByAuthors(authors) => authors.contains(&post.user_id),
            PostFilter::LikedBy(user_id) => post.likes.contains(user_id),
        };
        selected && self.before.map_or(true, |cursor| cursor.admits(post))
    }

    /// Feed order: newest first, higher id first among equal timestamps
    pub fn sort(posts: &mut [Post]) {
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    }
}

// ============================================================================
// Response views (display fields resolved)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    pub to: Uuid,
    pub from: Option<UserSummary>,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub post_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Public profile; the credential never leaves the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            profile_img: user.profile_img,
            cover_img: user.cover_img,
            bio: user.bio,
            link: user.link,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at,
        }
    }
}
