/// Social Feed Service Library
///
/// Consistency core for the social feed: likes, comments, follows, feed
/// assembly and notification fan-out over users, posts and notifications.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers mounted under `/api`
/// - `domain`: Users, posts, notifications and their views
/// - `services`: Interaction service, feed assembler, notification gateway, media
/// - `repository`: Store traits with PostgreSQL and in-memory backends
/// - `middleware`: JWT session verification
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::AppState;
pub use repository::Stores;
