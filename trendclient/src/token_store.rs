//! Stockage persistant des jetons de session
//!
//! Le client de session est le seul écrivain : le store lui est cédé à la
//! construction de [`SessionApi`](crate::api::SessionApi). Un `Arc` partagé
//! permet de le consulter ailleurs en lecture.

use crate::config_ext::TrendConfigExt;
use crate::error::{Result, TrendError};
use std::sync::{Arc, RwLock};
use trendconfig::Config;

/// Stockage clé-valeur des deux jetons de session
pub trait TokenStore: Send + Sync {
    /// Jeton d'accès courant
    fn access_token(&self) -> Result<Option<String>>;

    /// Jeton de rafraîchissement courant
    fn refresh_token(&self) -> Result<Option<String>>;

    /// Enregistre une nouvelle paire de jetons (login)
    fn store_tokens(&self, access: &str, refresh: &str) -> Result<()>;

    /// Remplace le seul jeton d'accès (rafraîchissement)
    fn store_access_token(&self, access: &str) -> Result<()>;

    /// Efface la session
    fn clear(&self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn access_token(&self) -> Result<Option<String>> {
        (**self).access_token()
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        (**self).refresh_token()
    }

    fn store_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        (**self).store_tokens(access, refresh)
    }

    fn store_access_token(&self, access: &str) -> Result<()> {
        (**self).store_access_token(access)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Store en mémoire, perdu à l'arrêt du processus
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<(Option<String>, Option<String>)>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crée un store déjà peuplé
    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            tokens: RwLock::new((access.map(str::to_string), refresh.map(str::to_string))),
        }
    }
}

fn poisoned() -> TrendError {
    TrendError::Storage("token store lock poisoned".to_string())
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.read().map_err(|_| poisoned())?.0.clone())
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.read().map_err(|_| poisoned())?.1.clone())
    }

    fn store_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        let mut tokens = self.tokens.write().map_err(|_| poisoned())?;
        *tokens = (Some(access.to_string()), Some(refresh.to_string()));
        Ok(())
    }

    fn store_access_token(&self, access: &str) -> Result<()> {
        self.tokens.write().map_err(|_| poisoned())?.0 = Some(access.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.tokens.write().map_err(|_| poisoned())? = (None, None);
        Ok(())
    }
}

/// Store adossé au fichier de configuration, survit aux redémarrages
pub struct ConfigTokenStore {
    config: Arc<Config>,
}

impl ConfigTokenStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl TokenStore for ConfigTokenStore {
    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.config.get_session_token()?)
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.config.get_session_refresh_token()?)
    }

    fn store_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.config.set_session_refresh_token(refresh)?;
        self.config.set_session_token(access)?;
        Ok(())
    }

    fn store_access_token(&self, access: &str) -> Result<()> {
        Ok(self.config.set_session_token(access)?)
    }

    fn clear(&self) -> Result<()> {
        Ok(self.config.clear_session()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryTokenStore::new();
        assert!(store.access_token().unwrap().is_none());

        store.store_tokens("a1", "r1").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("a1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r1"));

        store.store_access_token("a2").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("r1"));

        store.clear().unwrap();
        assert!(store.access_token().unwrap().is_none());
        assert!(store.refresh_token().unwrap().is_none());
    }

    #[test]
    fn test_config_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let config = Arc::new(Config::load_config(path).unwrap());
        config.set_encrypt_tokens(false).unwrap();

        ConfigTokenStore::new(config).store_tokens("a", "r").unwrap();

        let reloaded = ConfigTokenStore::new(Arc::new(Config::load_config(path).unwrap()));
        assert_eq!(reloaded.access_token().unwrap().as_deref(), Some("a"));
        assert_eq!(reloaded.refresh_token().unwrap().as_deref(), Some("r"));
    }
}
