//! Extension pour intégrer la session Trendlio dans trendconfig
//!
//! Ce module fournit le trait `TrendConfigExt` qui ajoute à
//! `trendconfig::Config` la lecture et l'écriture des jetons de session.
//! Les jetons sont rangés sous deux clés fixes : `session.token` et
//! `session.refresh_token`.

use anyhow::Result;
use serde_yaml::Value;
use trendconfig::Config;
use trendconfig::encryption::{open_secret, seal_secret};

const ACCESS_TOKEN_PATH: &[&str] = &["session", "token"];
const REFRESH_TOKEN_PATH: &[&str] = &["session", "refresh_token"];

/// Trait d'extension pour gérer la session dans trendconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use trendconfig::get_config;
/// use trendclient::TrendConfigExt;
///
/// let config = get_config();
/// if config.get_session_refresh_token()?.is_none() {
///     println!("Not logged in");
/// }
/// ```
pub trait TrendConfigExt {
    /// Récupère le jeton d'accès stocké, déchiffré si besoin
    fn get_session_token(&self) -> Result<Option<String>>;

    /// Récupère le jeton de rafraîchissement stocké, déchiffré si besoin
    fn get_session_refresh_token(&self) -> Result<Option<String>>;

    /// Enregistre le jeton d'accès
    fn set_session_token(&self, token: &str) -> Result<()>;

    /// Enregistre le jeton de rafraîchissement
    fn set_session_refresh_token(&self, token: &str) -> Result<()>;

    /// Efface les deux jetons
    fn clear_session(&self) -> Result<()>;
}

impl TrendConfigExt for Config {
    fn get_session_token(&self) -> Result<Option<String>> {
        read_secret(self, ACCESS_TOKEN_PATH)
    }

    fn get_session_refresh_token(&self) -> Result<Option<String>> {
        read_secret(self, REFRESH_TOKEN_PATH)
    }

    fn set_session_token(&self, token: &str) -> Result<()> {
        write_secret(self, ACCESS_TOKEN_PATH, token)
    }

    fn set_session_refresh_token(&self, token: &str) -> Result<()> {
        write_secret(self, REFRESH_TOKEN_PATH, token)
    }

    fn clear_session(&self) -> Result<()> {
        // Les deux écritures sont tentées même si la première échoue
        let access = self.set_value(ACCESS_TOKEN_PATH, Value::String(String::new()));
        let refresh = self.set_value(REFRESH_TOKEN_PATH, Value::String(String::new()));
        access.and(refresh)
    }
}

fn read_secret(config: &Config, path: &[&str]) -> Result<Option<String>> {
    match config.get_string(path) {
        Some(stored) => Ok(Some(open_secret(&stored)?)),
        None => Ok(None),
    }
}

fn write_secret(config: &Config, path: &[&str], secret: &str) -> Result<()> {
    let stored = if config.get_encrypt_tokens() {
        seal_secret(secret)?
    } else {
        secret.to_string()
    };
    config.set_value(path, Value::String(stored))
}
