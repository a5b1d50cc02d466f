/// User handlers: follow toggle, suggestions and profiles
use crate::domain::models::FollowToggle;
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::{FeedAssembler, InteractionService, UpdateProfileRequest};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub following: bool,
    pub message: &'static str,
}

impl From<FollowToggle> for FollowResponse {
    fn from(outcome: FollowToggle) -> Self {
        match outcome {
            FollowToggle::Followed => Self {
                following: true,
                message: "User followed successfully",
            },
            FollowToggle::Unfollowed => Self {
                following: false,
                message: "User unfollowed successfully",
            },
        }
    }
}

/// GET|POST /api/users/follow/{user_id}
pub async fn toggle_follow(
    service: web::Data<Arc<InteractionService>>,
    user: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = service.toggle_follow(user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(FollowResponse::from(outcome)))
}

/// GET /api/users/suggested
pub async fn get_suggested_users(
    feed: web::Data<Arc<FeedAssembler>>,
    user: UserId,
) -> Result<HttpResponse> {
    let users = feed.get_suggested_users(user.0).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/users/profile/{username}
pub async fn get_user_profile(
    feed: web::Data<Arc<FeedAssembler>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let profile = feed.get_user_profile(&path).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// POST /api/users/update
pub async fn update_profile(
    service: web::Data<Arc<InteractionService>>,
    user: UserId,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let profile = service.update_profile(user.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/suggested", web::get().to(get_suggested_users))
            .route("/profile/{username}", web::get().to(get_user_profile))
            .route("/update", web::post().to(update_profile))
            .service(
                web::resource("/follow/{user_id}")
                    .route(web::get().to(toggle_follow))
                    .route(web::post().to(toggle_follow)),
            ),
    );
}
