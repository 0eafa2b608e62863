//! # trendclient - Client REST Trendlio
//!
//! Cette crate fournit un client Rust pour l'API REST Trendlio, avec une
//! session persistante qui se rafraîchit d'elle-même et un cache en mémoire
//! des flux.
//!
//! ## Vue d'ensemble
//!
//! - Authentification (login, inscription, mot de passe, validation mail)
//! - Posts, commentaires, abonnements, profils, notifications et recherche
//! - Rafraîchissement transparent du jeton d'accès sur un 401, une seule
//!   fois par requête
//! - Persistance des jetons dans `trendconfig` (chiffrés par défaut)
//! - Cache des posts et profils avec TTL
//!
//! ## Structure des modules
//!
//! ```text
//! trendclient/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # Client haut-niveau
//! │   ├── models.rs           # Structures de données
//! │   ├── api/
//! │   │   ├── mod.rs          # SessionApi : requêtes et rafraîchissement
//! │   │   ├── auth.rs         # Authentification
//! │   │   ├── posts.rs        # Flux et interactions
//! │   │   ├── comments.rs     # Commentaires
//! │   │   ├── follow.rs       # Abonnements
//! │   │   ├── users.rs        # Profils
//! │   │   ├── notifications.rs
//! │   │   └── search.rs       # Recherche et hashtags
//! │   ├── cache.rs            # Cache en mémoire
//! │   ├── token_store.rs      # Stockage des jetons
//! │   ├── config_ext.rs       # Extension de trendconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use trendclient::{FeedKind, PageRequest, TrendClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Utilise automatiquement la config depuis trendconfig
//!     let client = TrendClient::from_config()?;
//!     client.login("me@example.com", "secret").await?;
//!
//!     let feed = client.fetch_feed(FeedKind::ForYou, PageRequest::default()).await?;
//!     for post in feed.content {
//!         println!("@{}: {}", post.user.username, post.caption);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Session
//!
//! Chaque requête porte le jeton d'accès stocké. Sur un 401, [`SessionApi`]
//! échange le jeton de rafraîchissement contre `/auth/refresh-token`,
//! enregistre le nouveau jeton puis rejoue la requête une seule fois. Un
//! nouvel échec, ou un échange impossible, efface la session et remonte
//! [`TrendError::SessionExpired`].

pub mod api;
pub mod cache;
pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod token_store;

pub use api::auth::RegisterRequest;
pub use api::{Method, SessionApi, SessionApiBuilder};
pub use cache::FeedCache;
pub use client::{NotificationSummary, RetryPolicy, TrendClient};
pub use config_ext::TrendConfigExt;
pub use error::{Result, TrendError};
pub use models::*;
pub use token_store::{ConfigTokenStore, MemoryTokenStore, TokenStore};
