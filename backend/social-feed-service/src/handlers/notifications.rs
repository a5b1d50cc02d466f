/// Notification handlers, always scoped to the acting user
use crate::error::Result;
use crate::middleware::UserId;
use crate::services::NotificationGateway;
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// GET /api/notifications
pub async fn get_notifications(
    gateway: web::Data<Arc<NotificationGateway>>,
    user: UserId,
) -> Result<HttpResponse> {
    let notifications = gateway.list_and_mark_read(user.0).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

/// DELETE /api/notifications
pub async fn delete_notifications(
    gateway: web::Data<Arc<NotificationGateway>>,
    user: UserId,
) -> Result<HttpResponse> {
    gateway.delete_all(user.0).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "All notifications are deleted"
    })))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/notifications")
            .route(web::get().to(get_notifications))
            .route(web::delete().to(delete_notifications)),
    );
}
