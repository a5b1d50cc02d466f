/// HTTP handlers for social-feed-service
///
/// Every route under `/api` sits behind `JwtAuthMiddleware`; handlers read
/// the acting user from the `UserId` extractor and never from the body.
use crate::config::FeedConfig;
use crate::error::AppError;
use crate::middleware::{JwtAuthMiddleware, TokenValidator};
use crate::repository::Stores;
use crate::services::{FeedAssembler, InteractionService, MediaStore, NotificationGateway};
use actix_web::{web, HttpResponse};
use std::sync::Arc;

pub mod notifications;
pub mod posts;
pub mod users;

/// Services shared by all workers
#[derive(Clone)]
pub struct AppState {
    pub interactions: Arc<InteractionService>,
    pub feed: Arc<FeedAssembler>,
    pub notifications: Arc<NotificationGateway>,
    pub auth: JwtAuthMiddleware,
}

impl AppState {
    pub fn new(
        stores: &Stores,
        media: Arc<dyn MediaStore>,
        feed_config: FeedConfig,
        jwt_secret: &str,
    ) -> Self {
        Self {
            interactions: Arc::new(InteractionService::new(stores, media)),
            feed: Arc::new(FeedAssembler::new(stores, feed_config)),
            notifications: Arc::new(NotificationGateway::new(stores)),
            auth: JwtAuthMiddleware::new(Arc::new(TokenValidator::new(jwt_secret))),
        }
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Register app data, extractor error handling and all routes.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.interactions.clone()))
        .app_data(web::Data::new(state.feed.clone()))
        .app_data(web::Data::new(state.notifications.clone()))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::InvalidArgument(format!("Invalid request body: {}", err)).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            AppError::InvalidArgument(format!("Invalid query parameters: {}", err)).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|_err, _req| {
            AppError::NotFound("Resource not found".to_string()).into()
        }))
        .route("/health", web::get().to(health))
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/api")
                .wrap(state.auth.clone())
                .configure(posts::register_routes)
                .configure(users::register_routes)
                .configure(notifications::register_routes),
        );
}
