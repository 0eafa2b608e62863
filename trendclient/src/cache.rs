//! Cache en mémoire des posts et profils déjà récupérés
//!
//! Les compteurs d'un post (likes, reposts, partages) sont mis à jour sur
//! place après une interaction, sans nouvel aller-retour serveur.

use crate::models::{FeedKind, Post, User};
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::Duration;

const POST_TTL: Duration = Duration::from_secs(600);
const USER_TTL: Duration = Duration::from_secs(1800);

/// Cache des données de flux
#[derive(Clone)]
pub struct FeedCache {
    /// Posts par id (TTL: 10 minutes)
    posts: Arc<MokaCache<i64, Post>>,
    /// Profils par id (TTL: 30 minutes)
    users: Arc<MokaCache<i64, User>>,
    /// Ordre des posts du dernier chargement de chaque flux
    feeds: Arc<MokaCache<FeedKind, Vec<i64>>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::with_capacity(500)
    }

    /// Crée un cache avec une capacité de posts spécifique
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            posts: Arc::new(
                MokaCache::builder()
                    .max_capacity(max_capacity)
                    .time_to_live(POST_TTL)
                    .build(),
            ),
            users: Arc::new(
                MokaCache::builder()
                    .max_capacity(max_capacity / 2)
                    .time_to_live(USER_TTL)
                    .build(),
            ),
            feeds: Arc::new(
                MokaCache::builder()
                    .max_capacity(4)
                    .time_to_live(POST_TTL)
                    .build(),
            ),
        }
    }

    // ============ Posts ============

    pub async fn get_post(&self, id: i64) -> Option<Post> {
        self.posts.get(&id).await
    }

    /// Ajoute un post, et son auteur au cache des profils
    pub async fn put_post(&self, post: Post) {
        self.users.insert(post.user.id, post.user.clone()).await;
        self.posts.insert(post.id, post).await;
    }

    /// Applique `update` au post en cache et retourne la nouvelle valeur
    ///
    /// Retourne `None` si le post n'est pas (ou plus) en cache.
    pub async fn update_post<F>(&self, id: i64, update: F) -> Option<Post>
    where
        F: FnOnce(&mut Post),
    {
        let mut post = self.posts.get(&id).await?;
        update(&mut post);
        self.posts.insert(id, post.clone()).await;
        Some(post)
    }

    pub async fn invalidate_post(&self, id: i64) {
        self.posts.invalidate(&id).await;
    }

    // ============ Feeds ============

    /// Remplace le contenu d'un flux
    pub async fn put_feed(&self, kind: FeedKind, posts: &[Post]) {
        for post in posts {
            self.put_post(post.clone()).await;
        }
        self.feeds
            .insert(kind, posts.iter().map(|p| p.id).collect())
            .await;
    }

    /// Posts du flux encore en cache, dans l'ordre du chargement
    pub async fn get_feed(&self, kind: FeedKind) -> Option<Vec<Post>> {
        let ids = self.feeds.get(&kind).await?;
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(post) = self.posts.get(&id).await {
                posts.push(post);
            }
        }
        Some(posts)
    }

    // ============ Users ============

    pub async fn get_user(&self, id: i64) -> Option<User> {
        self.users.get(&id).await
    }

    pub async fn put_user(&self, user: User) {
        self.users.insert(user.id, user).await;
    }

    /// Vide tous les caches
    pub async fn clear(&self) {
        self.posts.invalidate_all();
        self.users.invalidate_all();
        self.feeds.invalidate_all();
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}
