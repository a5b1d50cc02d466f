pub mod feed;
pub mod interactions;
pub mod media;
pub mod notifications;

pub use feed::{FeedAssembler, FeedPage};
pub use interactions::{CreatePostRequest, InteractionService, UpdateProfileRequest};
pub use media::{DisabledMediaStore, MediaStore, S3MediaStore};
pub use notifications::NotificationGateway;
