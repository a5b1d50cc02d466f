/// Notification gateway - recipient-scoped reads and bulk deletes
use crate::domain::models::{NotificationView, UserSummary};
use crate::error::Result;
use crate::repository::{NotificationStore, Stores, UserStore};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationGateway {
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
}

impl NotificationGateway {
    pub fn new(stores: &Stores) -> Self {
        Self {
            users: stores.users.clone(),
            notifications: stores.notifications.clone(),
        }
    }

    /// List the user's notifications newest first; listing marks them read.
    ///
    /// The returned records show the state they had before this call, so a
    /// second call returns the same set with `read = true`.
    pub async fn list_and_mark_read(&self, user_id: Uuid) -> Result<Vec<NotificationView>> {
        let notifications = self.notifications.list_and_mark_read(user_id).await?;

        let mut sender_ids: Vec<Uuid> = notifications.iter().map(|n| n.from).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();
        let senders: HashMap<Uuid, UserSummary> = self
            .users
            .find_users(&sender_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        tracing::debug!(%user_id, count = notifications.len(), "notifications listed and marked read");

        Ok(notifications
            .into_iter()
            .map(|n| NotificationView {
                id: n.id,
                to: n.to,
                from: senders.get(&n.from).cloned(),
                kind: n.kind,
                post_id: n.post_id,
                read: n.read,
                created_at: n.created_at,
            })
            .collect())
    }

    pub async fn delete_all(&self, user_id: Uuid) -> Result<()> {
        let deleted = self.notifications.delete_for_recipient(user_id).await?;
        tracing::info!(%user_id, deleted, "notifications deleted");
        Ok(())
    }
}
