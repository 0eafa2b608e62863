//! Couche d'accès à l'API REST Trendlio
//!
//! Ce module fournit [`SessionApi`], le client bas-niveau qui attache le jeton
//! d'accès à chaque requête et, sur un 401, échange une seule fois le jeton de
//! rafraîchissement avant de rejouer la requête.

pub mod auth;
pub mod comments;
pub mod follow;
pub mod notifications;
pub mod posts;
pub mod search;
pub mod users;

use crate::error::{Result, TrendError};
use crate::models::PageRequest;
use crate::token_store::{ConfigTokenStore, MemoryTokenStore, TokenStore};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trendconfig::Config;

pub use reqwest::Method;

/// Endpoint d'échange du jeton de rafraîchissement
pub const REFRESH_ENDPOINT: &str = "/auth/refresh-token";

/// Timeout par défaut des requêtes
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent par défaut
pub const DEFAULT_USER_AGENT: &str = "trendclient/0.1.0";

/// Rang d'une tentative pour une même requête logique
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Premier envoi
    Initial,
    /// Renvoi après rafraîchissement du jeton ; aucun autre renvoi possible
    Retried,
}

/// Description rejouable d'une requête
struct RequestSpec<'a> {
    method: Method,
    path: &'a str,
    query: &'a [(&'a str, String)],
    body: Option<Value>,
    headers: &'a [(&'a str, &'a str)],
    /// Requête hors session : pas de jeton, pas de rafraîchissement
    public: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// Client API bas-niveau porteur de la session
pub struct SessionApi {
    /// Client HTTP
    client: Client,
    /// Racine de l'API, sans slash final
    base_url: String,
    /// Stockage des jetons, dont ce client est l'unique écrivain
    store: Box<dyn TokenStore>,
    /// Sérialise les échanges de jeton de rafraîchissement
    refresh_lock: Mutex<()>,
}

impl SessionApi {
    /// Crée un builder
    pub fn builder() -> SessionApiBuilder {
        SessionApiBuilder::default()
    }

    /// Crée une API depuis la configuration : endpoints de l'environnement
    /// courant, timeout configuré et jetons persistés dans `config.yaml`
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let endpoints = config.get_endpoints();
        info!(api_url = %endpoints.api_url, "Creating session client");

        Self::builder()
            .base_url(endpoints.api_url)
            .timeout(config.get_api_timeout())
            .token_store(Box::new(ConfigTokenStore::new(config)))
            .build()
    }

    /// Retourne la racine de l'API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Indique si un jeton d'accès est stocké
    pub fn has_session(&self) -> Result<bool> {
        Ok(self.store.access_token()?.is_some())
    }

    /// Effectue une requête authentifiée et décode la réponse JSON
    ///
    /// Sur un 401, le jeton est rafraîchi et la requête rejouée une seule
    /// fois. Un second 401 efface la session et devient
    /// [`TrendError::SessionExpired`].
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: &[(&str, &str)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = RequestSpec {
            method,
            path,
            query: &[],
            body: body.map(serde_json::to_value).transpose()?,
            headers,
            public: false,
        };
        decode(&self.execute(&spec).await?)
    }

    /// Effectue une requête GET à l'API
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.send(Method::GET, path, query, None::<&()>).await
    }

    /// Effectue une requête POST à l'API
    pub(crate) async fn post<T, B>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, query, body).await
    }

    /// Effectue une requête PUT à l'API
    pub(crate) async fn put<T, B>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, path, query, body).await
    }

    /// Effectue une requête dont le corps de réponse est ignoré
    ///
    /// Certains endpoints d'action répondent par un message texte libre.
    pub(crate) async fn call<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let spec = RequestSpec {
            method,
            path,
            query,
            body: body.map(serde_json::to_value).transpose()?,
            headers: &[],
            public: false,
        };
        self.execute(&spec).await.map(|_| ())
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let spec = RequestSpec {
            method,
            path,
            query,
            body: body.map(serde_json::to_value).transpose()?,
            headers: &[],
            public: false,
        };
        decode(&self.execute(&spec).await?)
    }

    /// Effectue une requête POST hors session (login, inscription)
    ///
    /// Un 401 y signale des credentials invalides et remonte tel quel.
    pub(crate) async fn post_public<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        decode(&self.execute(&public_post(path, body)?).await?)
    }

    /// Comme [`post_public`](Self::post_public), corps de réponse ignoré
    pub(crate) async fn call_public<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.execute(&public_post(path, body)?).await.map(|_| ())
    }

    /// Exécute une requête avec au plus un rafraîchissement de session et
    /// retourne le corps brut
    async fn execute(&self, spec: &RequestSpec<'_>) -> Result<String> {
        if spec.public {
            return self.send_once(spec, None).await;
        }

        let mut attempt = Attempt::Initial;

        loop {
            let token = self.store.access_token()?;
            match self.send_once(spec, token.as_deref()).await {
                Ok(text) => return Ok(text),
                Err(TrendError::Unauthorized(message)) => match attempt {
                    Attempt::Initial => {
                        debug!("{} {} got 401, refreshing session", spec.method, spec.path);
                        attempt = Attempt::Retried;
                        self.refresh_session(token.as_deref()).await?;
                    }
                    Attempt::Retried => {
                        warn!(
                            "{} {} still unauthorized after refresh, dropping session",
                            spec.method, spec.path
                        );
                        self.clear_session_quietly();
                        return Err(TrendError::SessionExpired(message));
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Envoie une requête une fois et retourne le corps brut
    async fn send_once(&self, spec: &RequestSpec<'_>, token: Option<&str>) -> Result<String> {
        let url = format!("{}{}", self.base_url, spec.path);
        debug!("{} {} with {} params", spec.method, url, spec.query.len());

        let mut request = self
            .client
            .request(spec.method.clone(), &url)
            .header("Accept", "application/json");

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        for (name, value) in spec.headers {
            request = request.header(*name, *value);
        }
        if !spec.query.is_empty() {
            request = request.query(spec.query);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}) on {}: {}", status.as_u16(), spec.path, error_text);
            return Err(TrendError::from_status_code(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }

    /// Rafraîchit le jeton d'accès après un 401
    ///
    /// `stale` est le jeton envoyé avec la requête refusée : si le store en
    /// contient déjà un autre, une requête concurrente a fait l'échange et il
    /// suffit de rejouer.
    async fn refresh_session(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.store.access_token()? {
            if Some(current.as_str()) != stale {
                debug!("Session already refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.store.refresh_token()? else {
            info!("No refresh token stored, dropping session");
            self.clear_session_quietly();
            return Err(TrendError::SessionExpired(
                "no refresh token available".to_string(),
            ));
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(access_token) => {
                // Persisté avant que la requête d'origine ne soit rejouée
                self.store.store_access_token(&access_token)?;
                info!("Access token refreshed");
                Ok(access_token)
            }
            Err(err) => {
                warn!("Token refresh failed: {}", err);
                self.clear_session_quietly();
                Err(err)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, REFRESH_ENDPOINT);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status != StatusCode::OK {
            return Err(TrendError::SessionExpired(format!(
                "refresh rejected ({}): {}",
                status.as_u16(),
                text
            )));
        }

        serde_json::from_str::<RefreshResponse>(&text)
            .map(|r| r.access_token)
            .map_err(|e| TrendError::SessionExpired(format!("malformed refresh response: {}", e)))
    }

    /// Enregistre les jetons obtenus au login
    pub(crate) fn store_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.store.store_tokens(access, refresh)
    }

    /// Efface la session locale
    pub(crate) fn clear_session(&self) -> Result<()> {
        self.store.clear()
    }

    fn clear_session_quietly(&self) {
        if let Err(err) = self.store.clear() {
            warn!("Failed to clear stored session: {}", err);
        }
    }
}

fn public_post<'a, B: Serialize + ?Sized>(path: &'a str, body: &B) -> Result<RequestSpec<'a>> {
    Ok(RequestSpec {
        method: Method::POST,
        path,
        query: &[],
        body: Some(serde_json::to_value(body)?),
        headers: &[],
        public: true,
    })
}

/// Décode un corps JSON ; un corps vide vaut `null`
fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| {
        warn!("Failed to parse response: {}", e);
        TrendError::JsonParse(e)
    })
}

/// Paramètres de pagination en query string
pub(crate) fn page_params(page: PageRequest) -> [(&'static str, String); 2] {
    [("page", page.page.to_string()), ("size", page.size.to_string())]
}

pub(crate) fn user_param(user_id: i64) -> (&'static str, String) {
    ("userId", user_id.to_string())
}

pub(crate) fn viewer_param(current_user_id: i64) -> (&'static str, String) {
    ("currentUserId", current_user_id.to_string())
}

/// Concatène un paramètre de filtre et la pagination
pub(crate) fn paged(first: (&'static str, String), page: PageRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![first];
    params.extend(page_params(page));
    params
}

/// Builder pour configurer un [`SessionApi`]
pub struct SessionApiBuilder {
    client: Option<Client>,
    base_url: String,
    timeout: Duration,
    user_agent: String,
    store: Option<Box<dyn TokenStore>>,
}

impl Default for SessionApiBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: trendconfig::Environment::default()
                .default_endpoints()
                .api_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            store: None,
        }
    }
}

impl SessionApiBuilder {
    /// Utilise un client HTTP existant
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Définit la racine de l'API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Définit le timeout des requêtes
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Définit le User-Agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Définit le stockage des jetons (mémoire par défaut)
    pub fn token_store(mut self, store: Box<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Construit le client
    pub fn build(self) -> Result<SessionApi> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout)
                .user_agent(&self.user_agent)
                .build()?,
        };

        Ok(SessionApi {
            client,
            base_url: self.base_url,
            store: self
                .store
                .unwrap_or_else(|| Box::new(MemoryTokenStore::new())),
            refresh_lock: Mutex::new(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let api = SessionApi::builder().build().unwrap();
        assert_eq!(api.base_url(), "http://192.168.84.234:8080/api");
        assert!(!api.has_session().unwrap());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = SessionApi::builder()
            .base_url("http://localhost:8080/api/")
            .build()
            .unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_decode_empty_body() {
        let unit: () = decode("").unwrap();
        assert_eq!(unit, ());
        let none: Option<u32> = decode("  ").unwrap();
        assert!(none.is_none());
        let n: u32 = decode("42").unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn test_page_params() {
        let params = page_params(PageRequest::new(2, 20));
        assert_eq!(params[0], ("page", "2".to_string()));
        assert_eq!(params[1], ("size", "20".to_string()));
    }
}
