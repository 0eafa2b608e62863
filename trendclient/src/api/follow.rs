//! Module d'accès au graphe social (abonnements)

use super::{Method, SessionApi, paged, user_param};
use crate::error::Result;
use crate::models::{Page, PageRequest, User};
use tracing::{debug, info};

fn pair(follower_id: i64, following_id: i64) -> [(&'static str, String); 2] {
    [
        ("followerId", follower_id.to_string()),
        ("followingId", following_id.to_string()),
    ]
}

impl SessionApi {
    /// Abonne `follower_id` à `following_id`
    pub async fn follow(&self, follower_id: i64, following_id: i64) -> Result<()> {
        info!("User {} follows {}", follower_id, following_id);
        self.call(
            Method::POST,
            "/follow/follow",
            &pair(follower_id, following_id),
            None::<&()>,
        )
        .await
    }

    pub async fn unfollow(&self, follower_id: i64, following_id: i64) -> Result<()> {
        info!("User {} unfollows {}", follower_id, following_id);
        self.call(
            Method::POST,
            "/follow/unfollow",
            &pair(follower_id, following_id),
            None::<&()>,
        )
        .await
    }

    /// Indique si `follower_id` suit `following_id`
    pub async fn is_following(&self, follower_id: i64, following_id: i64) -> Result<bool> {
        self.get("/follow/is-following", &pair(follower_id, following_id))
            .await
    }

    pub async fn get_followers(&self, user_id: i64, page: PageRequest) -> Result<Page<User>> {
        self.get("/follow/followers", &paged(user_param(user_id), page))
            .await
    }

    pub async fn get_following(&self, user_id: i64, page: PageRequest) -> Result<Page<User>> {
        self.get("/follow/following", &paged(user_param(user_id), page))
            .await
    }

    /// Demandes d'abonnement en attente (comptes privés)
    pub async fn get_pending_follows(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<User>> {
        self.get("/follow/pending", &paged(user_param(user_id), page))
            .await
    }

    pub async fn approve_follow(&self, user_id: i64, follower_id: i64) -> Result<()> {
        debug!("User {} approves follower {}", user_id, follower_id);
        self.call(
            Method::POST,
            "/follow/approve",
            &[user_param(user_id), ("followerId", follower_id.to_string())],
            None::<&()>,
        )
        .await
    }

    pub async fn reject_follow(&self, user_id: i64, follower_id: i64) -> Result<()> {
        debug!("User {} rejects follower {}", user_id, follower_id);
        self.call(
            Method::POST,
            "/follow/reject",
            &[user_param(user_id), ("followerId", follower_id.to_string())],
            None::<&()>,
        )
        .await
    }

    /// Suggestions de comptes à suivre
    pub async fn get_recommended_users(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<User>> {
        self.get("/follow/recommended", &paged(user_param(user_id), page))
            .await
    }
}
