//! Module de recherche (utilisateurs, hashtags, posts)

use super::{Method, SessionApi, page_params, paged, viewer_param};
use crate::error::Result;
use crate::models::{Hashtag, Page, PageRequest, Post, User};
use tracing::debug;

fn query_param(query: &str) -> (&'static str, String) {
    ("query", query.to_string())
}

impl SessionApi {
    pub async fn search_users(&self, query: &str, page: PageRequest) -> Result<Page<User>> {
        debug!("Searching users matching {:?}", query);
        self.get("/search/users", &paged(query_param(query), page))
            .await
    }

    pub async fn search_hashtags(&self, query: &str, page: PageRequest) -> Result<Page<Hashtag>> {
        debug!("Searching hashtags matching {:?}", query);
        self.get("/hashtags/search", &paged(query_param(query), page))
            .await
    }

    pub async fn search_posts(
        &self,
        query: &str,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        debug!("Searching posts matching {:?}", query);
        let mut params = vec![query_param(query), viewer_param(current_user_id)];
        params.extend(page_params(page));
        self.get("/search/posts", &params).await
    }

    /// Posts portant un hashtag (sans le `#`)
    pub async fn search_by_hashtag(
        &self,
        hashtag: &str,
        current_user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>> {
        let tag = hashtag.trim_start_matches('#');
        self.get(
            &format!("/search/hashtag/{}", tag),
            &paged(viewer_param(current_user_id), page),
        )
        .await
    }

    /// Enregistre les hashtags d'un post fraîchement publié
    pub async fn process_hashtags(&self, post_id: i64, hashtags: &[String]) -> Result<()> {
        self.call(
            Method::POST,
            "/hashtags/process",
            &[("postId", post_id.to_string())],
            Some(hashtags),
        )
        .await
    }
}
