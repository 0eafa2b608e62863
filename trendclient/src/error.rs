//! Gestion des erreurs pour le client Trendlio

use thiserror::Error;

/// Type Result personnalisé pour trendclient
pub type Result<T> = std::result::Result<T, TrendError>;

/// Erreurs possibles lors de l'utilisation du client Trendlio
#[derive(Error, Debug)]
pub enum TrendError {
    /// Aucun transport joignable (connexion refusée, DNS, timeout)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Jeton d'accès refusé (401). Traité en interne par le cycle
    /// rafraîchissement / nouvelle tentative.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session perdue : jeton de rafraîchissement absent ou refusé.
    /// La session stockée a été effacée.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Accès interdit (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Ressource non trouvée
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimited,

    /// Erreur renvoyée par l'API
    #[error("API error (code {code}): {message}")]
    Api { code: u16, message: String },

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Erreur du stockage des jetons
    #[error("Token storage error: {0}")]
    Storage(String),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl From<reqwest::Error> for TrendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            TrendError::NetworkUnavailable(err.to_string())
        } else {
            TrendError::Http(err)
        }
    }
}

impl TrendError {
    /// Crée une erreur depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 => Self::Unauthorized(message.into()),
            403 => Self::Forbidden(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimited,
            _ => Self::Api {
                code,
                message: message.into(),
            },
        }
    }

    /// Vérifie si l'erreur est un refus du jeton d'accès (401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TrendError::Unauthorized(_))
    }

    /// Vérifie si la session a été perdue
    pub fn is_session_expired(&self) -> bool {
        matches!(self, TrendError::SessionExpired(_))
    }

    /// Vérifie si l'erreur provient du transport
    pub fn is_network(&self) -> bool {
        matches!(self, TrendError::NetworkUnavailable(_))
    }

    /// Indique si une nouvelle tentative a une chance d'aboutir
    ///
    /// Les erreurs réseau, le rate limiting et les erreurs serveur (5xx) sont
    /// transitoires ; les refus d'authentification et les 4xx ne le sont pas.
    pub fn is_transient(&self) -> bool {
        match self {
            TrendError::NetworkUnavailable(_) | TrendError::RateLimited => true,
            TrendError::Api { code, .. } => *code >= 500,
            TrendError::Http(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(TrendError::from_status_code(401, "x").is_unauthorized());
        assert!(matches!(
            TrendError::from_status_code(403, "x"),
            TrendError::Forbidden(_)
        ));
        assert!(matches!(
            TrendError::from_status_code(404, "x"),
            TrendError::NotFound(_)
        ));
        assert!(matches!(
            TrendError::from_status_code(429, "x"),
            TrendError::RateLimited
        ));
        assert!(matches!(
            TrendError::from_status_code(500, "boom"),
            TrendError::Api { code: 500, .. }
        ));
    }

    #[test]
    fn test_is_transient() {
        assert!(TrendError::NetworkUnavailable("down".into()).is_transient());
        assert!(TrendError::from_status_code(503, "").is_transient());
        assert!(!TrendError::from_status_code(400, "").is_transient());
        assert!(!TrendError::SessionExpired("gone".into()).is_transient());
    }
}
