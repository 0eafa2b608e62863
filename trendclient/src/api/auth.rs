//! Module d'authentification pour l'API Trendlio

use super::{Method, SessionApi};
use crate::error::{Result, TrendError};
use crate::models::{AuthResponse, User};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Corps de l'endpoint /auth/login
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Corps de l'endpoint /auth/signup
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct PasswordResetRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResetConfirm<'a> {
    token: &'a str,
    new_password: &'a str,
}

impl SessionApi {
    /// Authentifie l'utilisateur et enregistre la paire de jetons
    ///
    /// Si la réponse ne contient pas l'utilisateur, il est récupéré via
    /// `/users/me` avec le jeton tout juste stocké.
    ///
    /// # Errors
    ///
    /// * `TrendError::Unauthorized` - Credentials invalides
    /// * `TrendError::NetworkUnavailable` - Serveur injoignable
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        info!("Attempting to login to Trendlio as {}", email);

        let body = LoginRequest { email, password };
        let response: AuthResponse = self.post_public("/auth/login", &body).await?;

        self.store_tokens(&response.access_token, &response.refresh_token)?;

        match response.user {
            Some(user) => {
                info!("Logged in as {} (id {})", user.username, user.id);
                Ok(user)
            }
            None => {
                debug!("Login response carries no user, fetching /users/me");
                self.get_current_user().await
            }
        }
    }

    /// Crée un compte
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        info!("Registering new account {}", request.username);
        self.call_public("/auth/signup", request).await
    }

    /// Ferme la session
    ///
    /// Le serveur est prévenu si possible ; la session locale est effacée
    /// dans tous les cas.
    pub async fn logout(&self) -> Result<()> {
        if let Err(err) = self.call(Method::POST, "/auth/logout", &[], None::<&()>).await {
            warn!("Server-side logout failed, clearing session locally: {}", err);
        }
        self.clear_session()?;
        info!("Logged out");
        Ok(())
    }

    /// Récupère l'utilisateur authentifié via `/auth/me`
    pub async fn current_user(&self) -> Result<User> {
        self.get("/auth/me", &[]).await
    }

    /// Vérifie que le jeton stocké est encore accepté
    ///
    /// Retourne `false` sans appel réseau quand aucun jeton n'est stocké, et
    /// `false` quand la session s'avère expirée.
    pub async fn check_token(&self) -> Result<bool> {
        if !self.has_session()? {
            return Ok(false);
        }
        match self
            .call(Method::GET, "/auth/validate-token", &[], None::<&()>)
            .await
        {
            Ok(_) => Ok(true),
            Err(TrendError::SessionExpired(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Demande l'envoi d'un lien de réinitialisation du mot de passe
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let body = PasswordResetRequest { email };
        self.call_public("/auth/password-reset-request", &body)
            .await
    }

    /// Définit un nouveau mot de passe à partir du jeton reçu par mail
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let body = PasswordResetConfirm {
            token,
            new_password,
        };
        self.call_public("/auth/password-reset-confirm", &body)
            .await
    }

    /// Valide une adresse mail
    pub async fn verify_email(&self, token: &str) -> Result<()> {
        let params = [("token", token.to_string())];
        self.call(Method::GET, "/auth/verify-email", &params, None::<&()>)
            .await
    }
}
