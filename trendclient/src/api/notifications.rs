//! Module d'accès aux notifications

use super::{Method, SessionApi, paged, user_param};
use crate::error::Result;
use crate::models::{Notification, Page, PageRequest};
use tracing::debug;

impl SessionApi {
    pub async fn get_notifications(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Notification>> {
        self.get("/notifications", &paged(user_param(user_id), page))
            .await
    }

    pub async fn get_unread_notifications(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Notification>> {
        self.get("/notifications/unread", &paged(user_param(user_id), page))
            .await
    }

    /// Nombre de notifications non lues
    pub async fn get_unread_count(&self, user_id: i64) -> Result<u64> {
        self.get("/notifications/unread-count", &[user_param(user_id)])
            .await
    }

    pub async fn mark_as_read(&self, user_id: i64, notification_id: i64) -> Result<()> {
        debug!("Marking notification {} as read", notification_id);
        self.call(
            Method::POST,
            "/notifications/mark-read",
            &[
                user_param(user_id),
                ("notificationId", notification_id.to_string()),
            ],
            None::<&()>,
        )
        .await
    }

    pub async fn mark_all_as_read(&self, user_id: i64) -> Result<()> {
        debug!("Marking all notifications of user {} as read", user_id);
        self.call(
            Method::POST,
            "/notifications/mark-all-read",
            &[user_param(user_id)],
            None::<&()>,
        )
        .await
    }

    pub async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<()> {
        self.call(
            Method::DELETE,
            &format!("/notifications/{}/{}", user_id, notification_id),
            &[],
            None::<&()>,
        )
        .await
    }
}
