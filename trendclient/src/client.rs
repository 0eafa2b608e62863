//! Client principal pour interagir avec l'API Trendlio
//!
//! Ce module fournit un client haut-niveau avec session persistante, cache
//! des flux et nouvelles tentatives au login.

use crate::api::SessionApi;
use crate::cache::FeedCache;
use crate::error::{Result, TrendError};
use crate::models::*;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use trendconfig::Config;

/// Taille de page des notifications
const NOTIFICATION_PAGE_SIZE: u32 = 20;

/// Politique de nouvelles tentatives du login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Nombre total de tentatives (au moins 1)
    pub max_attempts: usize,
    /// Délai fixe entre deux tentatives
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Lit la politique depuis `session.login` dans la configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.get_login_max_attempts().max(1),
            delay: Duration::from_millis(config.get_login_retry_delay_ms() as u64),
        }
    }
}

/// État des notifications de l'utilisateur courant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSummary {
    pub notifications: Vec<Notification>,
    pub unread: Vec<Notification>,
    pub unread_count: u64,
}

/// Client Trendlio haut-niveau avec cache
pub struct TrendClient {
    /// API bas-niveau
    api: SessionApi,
    /// Cache en mémoire
    cache: Arc<FeedCache>,
    /// Utilisateur authentifié
    current_user: RwLock<Option<User>>,
    /// Politique appliquée par [`login`](Self::login)
    retry: RetryPolicy,
}

impl TrendClient {
    /// Crée un client autour d'une API déjà configurée
    pub fn new(api: SessionApi) -> Self {
        Self {
            api,
            cache: Arc::new(FeedCache::new()),
            current_user: RwLock::new(None),
            retry: RetryPolicy::default(),
        }
    }

    /// Crée un client en utilisant la configuration globale
    ///
    /// # Exemple
    ///
    /// ```rust,no_run
    /// use trendclient::TrendClient;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = TrendClient::from_config()?;
    ///     if client.restore_session().await?.is_none() {
    ///         client.login("me@example.com", "secret").await?;
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn from_config() -> Result<Self> {
        Self::from_config_obj(trendconfig::get_config())
    }

    /// Crée un client depuis un objet Config spécifique
    pub fn from_config_obj(config: Arc<Config>) -> Result<Self> {
        let retry = RetryPolicy::from_config(&config);
        let api = SessionApi::from_config(config)?;
        Ok(Self::new(api).with_retry_policy(retry))
    }

    /// Remplace la politique de nouvelles tentatives du login
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Accès à l'API bas-niveau
    pub fn api(&self) -> &SessionApi {
        &self.api
    }

    /// Retourne une référence au cache
    pub fn cache(&self) -> Arc<FeedCache> {
        self.cache.clone()
    }

    /// Utilisateur authentifié, s'il est connu
    pub fn current_user(&self) -> Option<User> {
        self.current_user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_current_user(&self, user: Option<User>) {
        *self
            .current_user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }

    // ============ Session ============

    /// Se connecte avec la politique de nouvelles tentatives du client
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        self.login_with_retry(email, password, self.retry).await
    }

    /// Se connecte en retentant les échecs transitoires
    ///
    /// Les refus (credentials, session, 4xx) sont retournés immédiatement.
    pub async fn login_with_retry(
        &self,
        email: &str,
        password: &str,
        policy: RetryPolicy,
    ) -> Result<User> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.api.login(email, password).await {
                Ok(user) => {
                    self.set_current_user(Some(user.clone()));
                    return Ok(user);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    warn!(
                        "Login attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, max_attempts, err, policy.delay
                    );
                    attempt += 1;
                    tokio::time::sleep(policy.delay).await;
                }
                Err(err) => {
                    warn!("Login failed after {} attempt(s): {}", attempt, err);
                    return Err(err);
                }
            }
        }
    }

    /// Reprend une session persistée
    ///
    /// Retourne l'utilisateur si le jeton stocké est encore valide.
    pub async fn restore_session(&self) -> Result<Option<User>> {
        if !self.api.check_token().await? {
            debug!("No valid stored session");
            return Ok(None);
        }
        let user = self.api.get_current_user().await?;
        info!("Session restored for {}", user.username);
        self.set_current_user(Some(user.clone()));
        Ok(Some(user))
    }

    /// Ferme la session et vide le cache
    pub async fn logout(&self) -> Result<()> {
        self.api.logout().await?;
        self.cache.clear().await;
        self.set_current_user(None);
        Ok(())
    }

    /// Retourne l'utilisateur courant, en le récupérant si besoin
    pub async fn require_user(&self) -> Result<User> {
        if let Some(user) = self.current_user() {
            return Ok(user);
        }
        if !self.api.has_session()? {
            return Err(TrendError::SessionExpired("not logged in".to_string()));
        }
        let user = self.api.get_current_user().await?;
        self.set_current_user(Some(user.clone()));
        Ok(user)
    }

    // ============ Feed ============

    /// Charge une page d'un flux et met ses posts en cache
    pub async fn fetch_feed(&self, kind: FeedKind, page: PageRequest) -> Result<Page<Post>> {
        let user = self.require_user().await?;
        let feed = match kind {
            FeedKind::ForYou => self.api.get_timeline(user.id, page).await?,
            FeedKind::Following => self.api.get_explore_feed(user.id, page).await?,
        };
        debug!("Fetched {} posts for {:?}", feed.content.len(), kind);
        self.cache.put_feed(kind, &feed.content).await;
        Ok(feed)
    }

    /// Récupère un post, depuis le cache si possible
    pub async fn get_post(&self, post_id: i64) -> Result<Post> {
        if let Some(post) = self.cache.get_post(post_id).await {
            debug!("Post {} found in cache", post_id);
            return Ok(post);
        }
        self.refresh_post(post_id).await
    }

    /// Recharge un post depuis le serveur
    pub async fn refresh_post(&self, post_id: i64) -> Result<Post> {
        let user = self.require_user().await?;
        let post = self.api.get_post(post_id, user.id).await?;
        self.cache.put_post(post.clone()).await;
        Ok(post)
    }

    /// Aime ou retire le like d'un post selon son état courant
    ///
    /// Retourne le post mis à jour s'il était en cache.
    pub async fn toggle_like(&self, post_id: i64, currently_liked: bool) -> Result<Option<Post>> {
        let user = self.require_user().await?;
        if currently_liked {
            self.api.unlike_post(post_id, user.id).await?;
        } else {
            self.api.like_post(post_id, user.id).await?;
        }

        Ok(self
            .cache
            .update_post(post_id, |post| {
                post.has_liked = !currently_liked;
                post.like_count = if currently_liked {
                    post.like_count.saturating_sub(1)
                } else {
                    post.like_count + 1
                };
            })
            .await)
    }

    pub async fn repost(&self, post_id: i64) -> Result<Option<Post>> {
        let user = self.require_user().await?;
        self.api.repost_post(post_id, user.id).await?;
        Ok(self
            .cache
            .update_post(post_id, |post| post.repost_count += 1)
            .await)
    }

    pub async fn share(&self, post_id: i64) -> Result<Option<Post>> {
        let user = self.require_user().await?;
        self.api.share_post(post_id, user.id).await?;
        Ok(self
            .cache
            .update_post(post_id, |post| post.share_count += 1)
            .await)
    }

    // ============ Notifications ============

    /// Charge notifications, non lues et compteur en parallèle
    pub async fn notification_summary(&self) -> Result<NotificationSummary> {
        let user = self.require_user().await?;
        let page = PageRequest::new(0, NOTIFICATION_PAGE_SIZE);

        let (all, unread, unread_count) = tokio::try_join!(
            self.api.get_notifications(user.id, page),
            self.api.get_unread_notifications(user.id, page),
            self.api.get_unread_count(user.id),
        )?;

        Ok(NotificationSummary {
            notifications: all.content,
            unread: unread.content,
            unread_count,
        })
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<NotificationSummary> {
        let user = self.require_user().await?;
        self.api.mark_as_read(user.id, notification_id).await?;
        self.notification_summary().await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<NotificationSummary> {
        let user = self.require_user().await?;
        self.api.mark_all_as_read(user.id).await?;
        self.notification_summary().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(RetryPolicy::from_config(&config), RetryPolicy::default());

        config.set_login_max_attempts(0).unwrap();
        config.set_login_retry_delay_ms(50).unwrap();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_require_user_without_session() {
        let client = TrendClient::new(SessionApi::builder().build().unwrap());
        let err = client.require_user().await.unwrap_err();
        assert!(err.is_session_expired());
        assert!(client.current_user().is_none());
    }
}
