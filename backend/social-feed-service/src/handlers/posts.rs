/// Post handlers: like, comment, delete, create and the feed reads
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::{CreatePostRequest, FeedAssembler, FeedPage, InteractionService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

/// POST /api/posts/like/{post_id}
pub async fn toggle_like(
    service: web::Data<Arc<InteractionService>>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let likes = service.toggle_like(path.into_inner(), user.0).await?;
    Ok(HttpResponse::Ok().json(likes))
}

/// POST /api/posts/comment/{post_id}
pub async fn add_comment(
    service: web::Data<Arc<InteractionService>>,
    user: UserId,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let comment = service
        .add_comment(path.into_inner(), user.0, &body.text)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /api/posts/{post_id}
pub async fn delete_post(
    service: web::Data<Arc<InteractionService>>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service.delete_post(path.into_inner(), user.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully"
    })))
}

/// POST /api/posts/create
pub async fn create_post(
    service: web::Data<Arc<InteractionService>>,
    user: UserId,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.create_post(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

/// GET /api/posts/all
pub async fn get_all_posts(
    feed: web::Data<Arc<FeedAssembler>>,
    user: UserId,
    page: web::Query<FeedPage>,
) -> Result<HttpResponse> {
    let posts = feed.get_for_you_feed(user.0, &page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/following
pub async fn get_following_posts(
    feed: web::Data<Arc<FeedAssembler>>,
    user: UserId,
    page: web::Query<FeedPage>,
) -> Result<HttpResponse> {
    let posts = feed.get_following_feed(user.0, &page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/user/{username}
pub async fn get_user_posts(
    feed: web::Data<Arc<FeedAssembler>>,
    path: web::Path<String>,
    page: web::Query<FeedPage>,
) -> Result<HttpResponse> {
    let posts = feed.get_user_posts(&path, &page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/likes/{user_id}
pub async fn get_liked_posts(
    feed: web::Data<Arc<FeedAssembler>>,
    path: web::Path<Uuid>,
    page: web::Query<FeedPage>,
) -> Result<HttpResponse> {
    let posts = feed.get_liked_posts(path.into_inner(), &page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/posts")
            .route("/all", web::get().to(get_all_posts))
            .route("/following", web::get().to(get_following_posts))
            .route("/user/{username}", web::get().to(get_user_posts))
            .route("/likes/{user_id}", web::get().to(get_liked_posts))
            .route("/create", web::post().to(create_post))
            .route("/like/{post_id}", web::post().to(toggle_like))
            .route("/comment/{post_id}", web::post().to(add_comment))
            .route("/{post_id}", web::delete().to(delete_post)),
    );
}
