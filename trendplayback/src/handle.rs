use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::errors::PlaybackError;
use crate::model::MediaKind;

/// Player capability owned by a UI element.
///
/// Both calls may suspend while a decoder engages. Implementations report
/// failures with [`PlaybackError::Controller`].
#[async_trait]
pub trait MediaController: Send + Sync {
    async fn play(&self) -> Result<(), PlaybackError>;

    async fn pause(&self) -> Result<(), PlaybackError>;
}

struct InertController;

#[async_trait]
impl MediaController for InertController {
    async fn play(&self) -> Result<(), PlaybackError> {
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// Non-owning reference to a media element's controller.
///
/// The coordinator only ever keeps a [`Weak`]: dropping the controller on the
/// UI side is enough to make the handle stale.
#[derive(Clone)]
pub struct MediaHandle {
    kind: MediaKind,
    controller: Weak<dyn MediaController>,
}

impl MediaHandle {
    pub fn video<C: MediaController + 'static>(controller: &Arc<C>) -> Self {
        let controller: Weak<C> = Arc::downgrade(controller);
        let controller: Weak<dyn MediaController> = controller;
        Self {
            kind: MediaKind::Video,
            controller,
        }
    }

    /// Handle for a still image; never played
    pub fn image() -> Self {
        let controller: Weak<dyn MediaController> = Weak::<InertController>::new();
        Self {
            kind: MediaKind::Image,
            controller,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// True while the owning element keeps its controller alive
    pub fn is_alive(&self) -> bool {
        self.controller.strong_count() > 0
    }

    pub(crate) fn upgrade(&self) -> Option<Arc<dyn MediaController>> {
        self.controller.upgrade()
    }

    pub(crate) fn same_controller(&self, other: &Weak<dyn MediaController>) -> bool {
        Weak::ptr_eq(&self.controller, other)
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn MediaController> {
        self.controller.clone()
    }
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandle")
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}
