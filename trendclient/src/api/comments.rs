//! Module d'accès aux commentaires

use super::{Method, SessionApi, page_params, user_param, viewer_param};
use crate::error::Result;
use crate::models::{Comment, NewComment, Page, PageRequest};
use tracing::debug;

impl SessionApi {
    /// Commente un post ou répond à un commentaire
    /// (`parent_comment_id` renseigné)
    pub async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        comment: &NewComment,
    ) -> Result<Comment> {
        debug!(
            "Creating comment on post {} (parent {:?})",
            post_id, comment.parent_comment_id
        );
        self.post(
            &format!("/comments/post/{}", post_id),
            &[user_param(user_id)],
            Some(comment),
        )
        .await
    }

    /// Commentaires d'un post via l'endpoint dédié
    pub async fn list_post_comments(
        &self,
        post_id: i64,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        let mut params = vec![viewer_param(current_user_id)];
        params.extend(page_params(page));
        self.get(&format!("/comments/post/{}", post_id), &params)
            .await
    }

    /// Réponses à un commentaire (non paginées)
    pub async fn get_comment_replies(
        &self,
        comment_id: i64,
        current_user_id: i64,
    ) -> Result<Vec<Comment>> {
        self.get(
            &format!("/comments/{}/replies", comment_id),
            &[viewer_param(current_user_id)],
        )
        .await
    }

    pub async fn like_comment(&self, comment_id: i64, user_id: i64) -> Result<()> {
        self.post_action(&format!("/comments/{}/like", comment_id), user_id)
            .await
    }

    pub async fn unlike_comment(&self, comment_id: i64, user_id: i64) -> Result<()> {
        self.post_action(&format!("/comments/{}/unlike", comment_id), user_id)
            .await
    }

    /// Remplace le texte d'un commentaire
    ///
    /// Le backend attend le nouveau texte comme corps JSON brut (une chaîne).
    pub async fn update_comment(&self, comment_id: i64, user_id: i64, text: &str) -> Result<()> {
        self.call(
            Method::PUT,
            &format!("/comments/{}", comment_id),
            &[user_param(user_id)],
            Some(text),
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: i64, user_id: i64) -> Result<()> {
        self.call(
            Method::DELETE,
            &format!("/comments/{}", comment_id),
            &[user_param(user_id)],
            None::<&()>,
        )
        .await
    }
}
