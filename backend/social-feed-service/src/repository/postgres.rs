use super::{AlreadyTaken, NotificationStore, PostStore, UserStore};
use crate::domain::models::{
    Comment, FollowToggle, LikeToggle, Notification, NotificationType, Post, PostFilter,
    PostQuery, ProfileUpdate, User,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Turn a violated `users` unique constraint into `AlreadyTaken`; any other
/// failure keeps its context.
fn unique_violation(err: sqlx::Error, context: &'static str) -> anyhow::Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("users_username_key") => return AlreadyTaken("Username").into(),
                Some("users_email_key") => return AlreadyTaken("Email").into(),
                _ => {}
            }
        }
    }
    anyhow::Error::new(err).context(context)
}

/// PostgreSQL-backed store.
///
/// Follow edges, likes and comments are embedded in their owning rows
/// (`uuid[]` / `jsonb`), so each mutation is a single-row atomic update.
/// The mirrored follow pair runs inside one transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("PostgreSQL health check failed")?;
        Ok(())
    }
}

const USER_COLUMNS: &str = "id, username, full_name, email, password_hash, profile_img, cover_img, \
                            bio, link, followers, following, created_at, updated_at";

const POST_COLUMNS: &str = "id, user_id, text, img, likes, comments, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    full_name: String,
    email: String,
    password_hash: String,
    profile_img: Option<String>,
    cover_img: Option<String>,
    bio: Option<String>,
    link: Option<String>,
    followers: Vec<Uuid>,
    following: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            profile_img: row.profile_img,
            cover_img: row.cover_img,
            bio: row.bio,
            link: row.link,
            followers: row.followers,
            following: row.following,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    text: Option<String>,
    img: Option<String>,
    likes: Vec<Uuid>,
    comments: Json<Vec<Comment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            user_id: row.user_id,
            text: row.text,
            img: row.img,
            likes: row.likes,
            comments: row.comments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    sender_id: Uuid,
    kind: String,
    post_id: Option<Uuid>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = anyhow::Error;

    fn try_from(row: NotificationRow) -> Result<Self> {
        let kind = NotificationType::parse(&row.kind)
            .ok_or_else(|| anyhow!("unknown notification kind {:?}", row.kind))?;
        Ok(Notification {
            id: row.id,
            to: row.recipient_id,
            from: row.sender_id,
            kind,
            post_id: row.post_id,
            read: row.read,
            created_at: row.created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, email, password_hash, profile_img,
                               cover_img, bio, link, followers, following, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile_img)
        .bind(&user.cover_img)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(&user.followers)
        .bind(&user.following)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Failed to insert user"))?;
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")?;
        Ok(row.map(User::from))
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(user_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .context("Failed to batch fetch users")?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn sample_users(&self, exclude: Uuid, size: usize) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id <> $1 ORDER BY random() LIMIT $2",
            USER_COLUMNS
        ))
        .bind(exclude)
        .bind(size as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to sample users")?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn toggle_follow(&self, actor_id: Uuid, target_id: Uuid) -> Result<Option<FollowToggle>> {
        let mut tx = self.pool.begin().await?;

        // Lock both rows in id order so opposite-direction toggles cannot deadlock.
        let locked: Vec<(Uuid, Vec<Uuid>)> = sqlx::query_as(
            r#"
            SELECT id, following
            FROM users
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(vec![actor_id, target_id])
        .fetch_all(&mut *tx)
        .await
        .context("Failed to lock follow pair")?;

        let Some((_, actor_following)) = locked.iter().find(|(id, _)| *id == actor_id) else {
            tx.rollback().await?;
            return Ok(None);
        };
        if !locked.iter().any(|(id, _)| *id == target_id) {
            tx.rollback().await?;
            return Ok(None);
        }

        let outcome = if actor_following.contains(&target_id) {
            sqlx::query(
                "UPDATE users SET following = array_remove(following, $2), updated_at = NOW() WHERE id = $1",
            )
            .bind(actor_id)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                "UPDATE users SET followers = array_remove(followers, $2), updated_at = NOW() WHERE id = $1",
            )
            .bind(target_id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;
            FollowToggle::Unfollowed
        } else {
            sqlx::query(
                r#"
                UPDATE users SET following = array_append(following, $2), updated_at = NOW()
                WHERE id = $1 AND NOT ($2 = ANY(following))
                "#,
            )
            .bind(actor_id)
            .bind(target_id)
            .execute(&mut *tx)
            .await?;
            sqlx::query(
                r#"
                UPDATE users SET followers = array_append(followers, $2), updated_at = NOW()
                WHERE id = $1 AND NOT ($2 = ANY(followers))
                "#,
            )
            .bind(target_id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;
            FollowToggle::Followed
        };

        tx.commit().await.context("Failed to commit follow toggle")?;

        debug!(%actor_id, %target_id, ?outcome, "follow toggled in PostgreSQL");
        Ok(Some(outcome))
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                full_name = COALESCE($3, full_name),
                bio = COALESCE($4, bio),
                link = COALESCE($5, link),
                profile_img = COALESCE($6, profile_img),
                cover_img = COALESCE($7, cover_img),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.username)
        .bind(&update.full_name)
        .bind(&update.bio)
        .bind(&update.link)
        .bind(&update.profile_img)
        .bind(&update.cover_img)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "Failed to update profile"))?;
        Ok(row.map(User::from))
    }
}

#[async_trait::async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, text, img, likes, comments, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(post.id)
        .bind(post.user_id)
        .bind(&post.text)
        .bind(&post.img)
        .bind(&post.likes)
        .bind(Json(&post.comments))
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert post")?;
        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch post")?;
        Ok(row.map(Post::from))
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        // Single-row update: concurrent toggles re-evaluate against the latest row version.
        let row: Option<(Uuid, Vec<Uuid>)> = sqlx::query_as(
            r#"
            UPDATE posts
            SET likes = CASE
                    WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
                    ELSE array_append(likes, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING user_id, likes
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to toggle like")?;

        Ok(row.map(|(author_id, likes)| LikeToggle {
            liked: likes.contains(&user_id),
            author_id,
            likes,
        }))
    }

    async fn push_comment(&self, post_id: Uuid, comment: &Comment) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET comments = comments || jsonb_build_array($2::jsonb),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(Json(comment))
        .execute(&self.pool)
        .await
        .context("Failed to append comment")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let (authors, liked_by) = match &query.filter {
            PostFilter::All => (None, None),
            PostFilter::ByAuthors(authors) => (Some(authors.clone()), None),
            PostFilter::LikedBy(user_id) => (None, Some(*user_id)),
        };

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            SELECT {}
            FROM posts
            WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
              AND ($2::uuid IS NULL OR $2 = ANY(likes))
              AND (
                $3::timestamptz IS NULL
                OR ($4::uuid IS NULL AND created_at < $3)
                OR (created_at, id) < ($3, $4)
              )
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
            POST_COLUMNS
        ))
        .bind(authors)
        .bind(liked_by)
        .bind(query.before.map(|cursor| cursor.created_at))
        .bind(query.before.and_then(|cursor| cursor.id))
        .bind(query.limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts")?;
        Ok(rows.into_iter().map(Post::from).collect())
    }
}

#[async_trait::async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, sender_id, kind, post_id, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.to)
        .bind(notification.from)
        .bind(notification.kind.as_str())
        .bind(notification.post_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert notification")?;
        Ok(())
    }

    async fn list_and_mark_read(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        // The snapshot is read before the update applies, and only its rows are marked.
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            WITH snapshot AS (
                SELECT id, recipient_id, sender_id, kind, post_id, read, created_at
                FROM notifications
                WHERE recipient_id = $1
                FOR UPDATE
            ), marked AS (
                UPDATE notifications SET read = TRUE
                WHERE id IN (SELECT id FROM snapshot) AND read = FALSE
            )
            SELECT id, recipient_id, sender_id, kind, post_id, read, created_at
            FROM snapshot
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notifications")?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn delete_for_recipient(&self, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete notifications")?;
        Ok(result.rows_affected())
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post notifications")?;
        Ok(result.rows_affected())
    }
}
