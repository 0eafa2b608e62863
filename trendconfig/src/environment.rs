//! Deployment environment selection
//!
//! The client talks to one of three backends. Each one exposes an HTTP API
//! root and a WebSocket root. The built-in table below can be overridden
//! per environment under `environments.<name>` in `config.yaml`.

use std::fmt;

/// Variable d'environnement qui force l'environnement de déploiement
pub const ENV_DEPLOYMENT: &str = "TRENDLIO_ENV";

/// Deployment target of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Resolved endpoints for one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Racine de l'API REST (sans slash final)
    pub api_url: String,
    /// Racine WebSocket (déclarée, non utilisée par le client REST)
    pub socket_url: String,
}

impl Environment {
    /// Parses an environment name.
    ///
    /// Unknown names fall back to [`Environment::Development`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "staging" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Key used under `environments.<key>` in the configuration tree
    pub fn config_key(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Built-in endpoints, used when the configuration has no override
    pub fn default_endpoints(&self) -> Endpoints {
        let (api_url, socket_url) = match self {
            Environment::Development => {
                ("http://192.168.84.234:8080/api", "ws://192.168.84.234:8080")
            }
            Environment::Staging => (
                "https://staging-api.taskhub.com/api",
                "wss://staging-api.taskhub.com",
            ),
            Environment::Production => ("https://api.taskhub.com/api", "wss://api.taskhub.com"),
        };
        Endpoints {
            api_url: api_url.to_string(),
            socket_url: socket_url.to_string(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}
