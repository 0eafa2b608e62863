//! Playback arbitration for the Trendlio feed.
//!
//! A [`PlaybackCoordinator`] decides which single video, among all the media
//! mounted by a scrolling feed and its per-post carousels, may play. UI
//! elements own their players and register non-owning [`MediaHandle`]s;
//! scroll containers feed visibility reports; screens toggle a focus gate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use trendplayback::{LayoutRect, MediaHandle, PlaybackCoordinator, ViewToken, Viewport};
//! # use trendplayback::{MediaController, PlaybackError};
//! # struct Player;
//! # #[async_trait::async_trait]
//! # impl MediaController for Player {
//! #     async fn play(&self) -> Result<(), PlaybackError> { Ok(()) }
//! #     async fn pause(&self) -> Result<(), PlaybackError> { Ok(()) }
//! # }
//!
//! # async fn demo() {
//! let coordinator = PlaybackCoordinator::new(Viewport::new(390.0, 844.0));
//! let player = Arc::new(Player);
//! coordinator.register(42, 0, MediaHandle::video(&player));
//!
//! coordinator.set_screen_focus("home", true);
//! coordinator.report_viewability(&[ViewToken::new(42, LayoutRect::new(0.0, 250.0, 390.0, 400.0))]);
//! coordinator.settle().await;
//! assert_eq!(coordinator.active_post_id(), Some(42));
//! # }
//! ```

mod events;

pub mod centering;
pub mod coordinator;
pub mod errors;
pub mod handle;
pub mod model;

pub use coordinator::PlaybackCoordinator;
pub use errors::{MediaOperation, PlaybackError};
pub use handle::{MediaController, MediaHandle};
pub use model::{
    LayoutRect, MediaKey, MediaKind, PlaybackEvent, ViewToken, ViewabilityConfig, Viewport,
};
