//! Module d'accès aux profils utilisateur

use super::{SessionApi, paged};
use crate::error::Result;
use crate::models::{Page, PageRequest, ProfileUpdate, User};
use tracing::debug;

impl SessionApi {
    /// Récupère l'utilisateur authentifié via `/users/me`
    pub async fn get_current_user(&self) -> Result<User> {
        self.get("/users/me", &[]).await
    }

    pub async fn get_user_profile(&self, user_id: i64) -> Result<User> {
        debug!("Fetching profile {}", user_id);
        self.get(&format!("/users/profile/{}", user_id), &[]).await
    }

    pub async fn get_user_profile_by_username(&self, username: &str) -> Result<User> {
        debug!("Fetching profile @{}", username);
        self.get(&format!("/users/profile/username/{}", username), &[])
            .await
    }

    /// Met à jour les champs renseignés du profil
    pub async fn update_user_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<User> {
        self.put(&format!("/users/profile/{}", user_id), &[], Some(update))
            .await
    }

    /// Recherche d'utilisateurs via l'annuaire `/users/search`
    pub async fn find_users(&self, query: &str, page: PageRequest) -> Result<Page<User>> {
        self.get("/users/search", &paged(("query", query.to_string()), page))
            .await
    }
}
