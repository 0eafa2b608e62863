//! Module d'accès aux posts (flux, interactions, commentaires d'un post)

use super::{Method, SessionApi, page_params, paged, user_param, viewer_param};
use crate::error::Result;
use crate::models::*;
use tracing::debug;

impl SessionApi {
    /// Timeline personnalisée de l'utilisateur
    pub async fn get_timeline(&self, user_id: i64, page: PageRequest) -> Result<Page<Post>> {
        debug!("Fetching timeline for user {} (page {})", user_id, page.page);
        self.get("/posts/timeline", &paged(user_param(user_id), page))
            .await
    }

    /// Flux d'exploration
    pub async fn get_explore_feed(&self, user_id: i64, page: PageRequest) -> Result<Page<Post>> {
        debug!("Fetching explore feed for user {} (page {})", user_id, page.page);
        self.get("/posts/explore", &paged(user_param(user_id), page))
            .await
    }

    /// Récupère un post vu par `current_user_id`
    pub async fn get_post(&self, post_id: i64, current_user_id: i64) -> Result<Post> {
        debug!("Fetching post {}", post_id);
        self.get(&format!("/posts/{}", post_id), &[viewer_param(current_user_id)])
            .await
    }

    /// Posts publiés par un utilisateur
    pub async fn get_user_posts(
        &self,
        user_id: i64,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        self.get(
            &format!("/posts/user/{}", user_id),
            &paged(viewer_param(current_user_id), page),
        )
        .await
    }

    /// Réponses publiées par un utilisateur
    pub async fn get_user_replies(
        &self,
        user_id: i64,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        self.get(
            &format!("/posts/user/{}/replies", user_id),
            &paged(viewer_param(current_user_id), page),
        )
        .await
    }

    /// Reposts d'un utilisateur
    pub async fn get_user_reposts(
        &self,
        user_id: i64,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        self.get(
            &format!("/repost/user/{}", user_id),
            &paged(viewer_param(current_user_id), page),
        )
        .await
    }

    /// Réponses à un post
    pub async fn get_post_replies(
        &self,
        post_id: i64,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        self.get(
            &format!("/posts/{}/replies", post_id),
            &paged(viewer_param(current_user_id), page),
        )
        .await
    }

    /// Publie un post
    pub async fn create_post(&self, user_id: i64, post: &NewPost) -> Result<Post> {
        debug!("Creating post for user {}", user_id);
        self.post("/posts", &[user_param(user_id)], Some(post)).await
    }

    /// Supprime un post
    pub async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<()> {
        self.call(
            Method::DELETE,
            &format!("/posts/{}", post_id),
            &[user_param(user_id)],
            None::<&()>,
        )
        .await
    }

    pub async fn like_post(&self, post_id: i64, user_id: i64) -> Result<()> {
        self.post_action(&format!("/posts/{}/like", post_id), user_id)
            .await
    }

    pub async fn unlike_post(&self, post_id: i64, user_id: i64) -> Result<()> {
        self.post_action(&format!("/posts/{}/unlike", post_id), user_id)
            .await
    }

    pub async fn repost_post(&self, post_id: i64, user_id: i64) -> Result<()> {
        self.post_action(&format!("/repost/post/{}", post_id), user_id)
            .await
    }

    pub async fn share_post(&self, post_id: i64, user_id: i64) -> Result<()> {
        self.post_action(&format!("/share/post/{}", post_id), user_id)
            .await
    }

    /// Utilisateurs ayant aimé un post
    pub async fn get_post_likes(&self, post_id: i64, page: PageRequest) -> Result<Page<User>> {
        self.get(&format!("/posts/{}/likes", post_id), &page_params(page))
            .await
    }

    /// Commentaires d'un post
    pub async fn get_post_comments(
        &self,
        post_id: i64,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        self.get(
            &format!("/posts/{}/comments", post_id),
            &paged(viewer_param(current_user_id), page),
        )
        .await
    }

    /// Commente un post
    pub async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        comment: &NewComment,
    ) -> Result<Comment> {
        self.post(
            &format!("/posts/{}/comment", post_id),
            &[user_param(user_id)],
            Some(comment),
        )
        .await
    }

    pub(super) async fn post_action(&self, path: &str, user_id: i64) -> Result<()> {
        debug!("POST {} as user {}", path, user_id);
        self.call(Method::POST, path, &[user_param(user_id)], None::<&()>)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_params_order() {
        let params = paged(user_param(7), PageRequest::default());
        assert_eq!(
            params,
            vec![
                ("userId", "7".to_string()),
                ("page", "0".to_string()),
                ("size", "10".to_string()),
            ]
        );
    }
}
