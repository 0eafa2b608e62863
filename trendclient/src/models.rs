//! Structures de données de l'API Trendlio
//!
//! Les champs suivent le JSON camelCase renvoyé par le backend. Les champs
//! que le serveur omet selon le contexte sont optionnels ou ont une valeur
//! par défaut.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Code `mediaType` d'une vidéo
pub const MEDIA_TYPE_VIDEO: i32 = 2;

/// Utilisateur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub follower_count: Option<u64>,
    #[serde(default)]
    pub following_count: Option<u64>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub private_account: Option<bool>,
    #[serde(default)]
    pub media_count: Option<u64>,
    #[serde(default)]
    pub is_following: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Mise à jour partielle d'un profil
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_account: Option<bool>,
}

/// Nature d'un média attaché à un post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

/// Média attaché à un post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    pub media_type: i32,
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub video_duration: Option<f64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub has_audio: Option<bool>,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub post_id: i64,
}

impl Media {
    /// Retourne la nature du média
    pub fn kind(&self) -> MediaKind {
        if self.media_type == MEDIA_TYPE_VIDEO {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind() == MediaKind::Video
    }
}

/// Post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user: User,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub media_type: i32,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub taken_at: Option<String>,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub repost_count: u64,
    #[serde(default)]
    pub share_count: u64,
    #[serde(default)]
    pub has_liked: bool,
    #[serde(default)]
    pub media: Vec<Media>,
}

impl Post {
    /// Médias vidéo du post, dans l'ordre d'affichage
    pub fn videos(&self) -> impl Iterator<Item = &Media> {
        self.media.iter().filter(|m| m.is_video())
    }

    /// Date de publication, si le serveur l'a fournie
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at.as_deref().and_then(parse_timestamp)
    }
}

/// Parse un horodatage du backend
///
/// Le serveur envoie selon les endpoints du RFC 3339 ou un `LocalDateTime`
/// sans fuseau, interprété en UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Contenu d'un nouveau post
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub caption: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media_urls: Vec<String>,
}

/// Commentaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub user: User,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub has_liked: bool,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

/// Contenu d'un nouveau commentaire
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
}

/// Hashtag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub post_count: u64,
}

/// Notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub actor: User,
    pub notification_type: String,
    #[serde(default)]
    pub post: Option<Post>,
    #[serde(default)]
    pub comment: Option<Comment>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Page de résultats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub number: Option<u32>,
}

impl<T> Page<T> {
    /// Indique s'il reste des pages après celle-ci
    pub fn has_next(&self) -> bool {
        match self.number {
            Some(n) => n + 1 < self.total_pages,
            None => false,
        }
    }
}

/// Pagination des requêtes de liste
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 10 }
    }
}

/// Réponse de l'endpoint /auth/login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Flux d'accueil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Onglet "For You", servi par la timeline
    ForYou,
    /// Onglet "Following", servi par le flux d'exploration
    Following,
}
