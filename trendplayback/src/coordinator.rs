//! Single-active-video arbiter.
//!
//! Every decision is taken synchronously under one lock: the active pair is
//! updated before the matching `play`/`pause` calls run. Those calls go
//! through one dispatcher task that awaits them strictly in issue order, so a
//! "pause previous" always completes before the following "play next" starts.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crossbeam_channel::Receiver;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::centering::select_centered;
use crate::errors::{MediaOperation, PlaybackError};
use crate::events::PlaybackEventBus;
use crate::handle::{MediaController, MediaHandle};
use crate::model::{MediaKey, PlaybackEvent, ViewToken, ViewabilityConfig, Viewport};

enum Command {
    Media {
        key: MediaKey,
        operation: MediaOperation,
        controller: Weak<dyn MediaController>,
    },
    Barrier(oneshot::Sender<()>),
}

#[derive(Debug)]
struct CoordinatorState {
    registry: BTreeMap<MediaKey, MediaHandle>,
    /// Post picked by the last vertical report; carousel reports are only
    /// honoured for it
    focused_post: Option<i64>,
    /// Set once the carousel of the focused post picked the media itself
    carousel_moved: bool,
    /// Pair currently allowed to play. Always a registered key.
    active: Option<MediaKey>,
    playback_allowed: bool,
    active_screen: Option<String>,
    viewport: Viewport,
}

impl CoordinatorState {
    fn first_video_of(&self, post_id: i64) -> Option<MediaKey> {
        self.registry
            .range(MediaKey::new(post_id, i64::MIN)..=MediaKey::new(post_id, i64::MAX))
            .find(|(_, handle)| handle.is_video())
            .map(|(key, _)| *key)
    }
}

/// Arbiter guaranteeing that at most one registered video plays at a time.
///
/// Build one per application and share it by reference. Construction spawns
/// the dispatcher task, so it must happen inside a Tokio runtime.
pub struct PlaybackCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
    commands: mpsc::UnboundedSender<Command>,
    events: PlaybackEventBus,
    viewability: ViewabilityConfig,
}

impl PlaybackCoordinator {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_viewability(viewport, ViewabilityConfig::default())
    }

    pub fn with_viewability(viewport: Viewport, viewability: ViewabilityConfig) -> Self {
        let state = Arc::new(Mutex::new(CoordinatorState {
            registry: BTreeMap::new(),
            focused_post: None,
            carousel_moved: false,
            active: None,
            playback_allowed: true,
            active_screen: None,
            viewport,
        }));

        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(receiver, Arc::clone(&state)));

        Self {
            state,
            commands,
            events: PlaybackEventBus::new(),
            viewability,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn viewability_config(&self) -> ViewabilityConfig {
        self.viewability
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.lock().viewport = viewport;
    }

    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // ============ Registry ============

    /// Stores the handle under `(post_id, media_id)`, replacing any previous
    /// one. Image handles only clear the key.
    ///
    /// If the key is playing, the replaced controller is paused. A new video
    /// controller takes over playback, an image deactivates the key.
    pub fn register(&self, post_id: i64, media_id: i64, handle: MediaHandle) {
        let key = MediaKey::new(post_id, media_id);
        let mut state = self.lock();

        let replaced = if handle.is_video() {
            trace!("Registering video {}", key);
            state.registry.insert(key, handle.clone())
        } else {
            trace!("Ignoring image {}", key);
            state.registry.remove(&key)
        };

        if state.active != Some(key) {
            return;
        }

        let rebound = replaced
            .as_ref()
            .is_some_and(|old| !old.same_controller(&handle.downgrade()));
        if let Some(old) = replaced.filter(|_| rebound || !handle.is_video()) {
            debug!("Controller of playing {} replaced, pausing the old one", key);
            self.send(Command::Media {
                key,
                operation: MediaOperation::Pause,
                controller: old.downgrade(),
            });
        }

        if handle.is_video() {
            if rebound {
                self.issue(&state, key, MediaOperation::Play);
            }
        } else {
            state.active = None;
            drop(state);
            self.events.broadcast(PlaybackEvent::Deactivated);
        }
    }

    /// Removes the handle. No `pause` is issued: the element is going away.
    pub fn unregister(&self, post_id: i64, media_id: i64) {
        let key = MediaKey::new(post_id, media_id);
        let mut state = self.lock();

        if state.registry.remove(&key).is_none() {
            debug!("{}", PlaybackError::HandleStale(key));
            return;
        }
        trace!("Unregistered {}", key);

        if state.active == Some(key) {
            state.active = None;
            drop(state);
            self.events.broadcast(PlaybackEvent::Deactivated);
        }
    }

    pub fn is_registered(&self, post_id: i64, media_id: i64) -> bool {
        self.lock()
            .registry
            .contains_key(&MediaKey::new(post_id, media_id))
    }

    // ============ Reports ============

    /// Entry point of the vertical scrolling list.
    ///
    /// Re-reporting the current winner is a no-op, unless its first video
    /// was registered after it got centered.
    pub fn report_viewability(&self, items: &[ViewToken]) {
        self.apply_viewability(self.lock(), items);
    }

    /// Same as [`report_viewability`](Self::report_viewability), dropped
    /// when another screen owns playback.
    pub fn report_viewability_from(&self, screen_id: &str, items: &[ViewToken]) {
        let state = self.lock();
        if state
            .active_screen
            .as_deref()
            .is_some_and(|owner| owner != screen_id)
        {
            trace!("Report from background screen {} ignored", screen_id);
            return;
        }
        self.apply_viewability(state, items);
    }

    fn apply_viewability(&self, mut state: MutexGuard<'_, CoordinatorState>, items: &[ViewToken]) {
        if !state.playback_allowed {
            trace!("Viewability report ignored: playback not allowed");
            return;
        }

        let winner = select_centered(items, &state.viewport);
        if let Some(post_id) = winner.filter(|post| state.focused_post == Some(*post)) {
            if state.active.is_some() || state.carousel_moved {
                return;
            }
            // Centered before its video was mounted
            let Some(next) = state.first_video_of(post_id) else {
                return;
            };
            debug!("Post {} still centered, playing late video {}", post_id, next);
            state.active = Some(next);
            self.issue(&state, next, MediaOperation::Play);
            drop(state);
            self.announce(None, Some(next));
            return;
        }

        let previous = state.active.take();
        if let Some(previous) = previous {
            self.issue(&state, previous, MediaOperation::Pause);
        }
        state.focused_post = winner;
        state.carousel_moved = false;

        let next = winner.and_then(|post_id| state.first_video_of(post_id));
        if let Some(next) = next {
            debug!("Post {} centered, playing {}", next.post_id, next);
            state.active = Some(next);
            self.issue(&state, next, MediaOperation::Play);
        } else if let Some(post_id) = winner {
            debug!("Post {} centered, no video registered", post_id);
        }
        drop(state);

        self.announce(previous, next);
    }

    /// Entry point of a post's horizontal media carousel.
    ///
    /// Only the focused post is considered.
    pub fn report_carousel_visibility(&self, post_id: i64, media_id: i64, is_visible: bool) {
        let key = MediaKey::new(post_id, media_id);
        let mut state = self.lock();
        if !state.playback_allowed || state.focused_post != Some(post_id) {
            return;
        }

        let previous = state.active;
        if !is_visible {
            if previous == Some(key) {
                debug!("{} scrolled out of carousel", key);
                state.active = None;
                state.carousel_moved = true;
                self.issue(&state, key, MediaOperation::Pause);
                drop(state);
                self.announce(previous, None);
            }
            return;
        }

        if previous == Some(key) {
            return;
        }

        let others: Vec<MediaKey> = state
            .registry
            .keys()
            .copied()
            .filter(|other| *other != key)
            .collect();
        for other in others {
            self.issue(&state, other, MediaOperation::Pause);
        }

        let next = state.registry.contains_key(&key).then_some(key);
        state.active = next;
        state.carousel_moved = true;
        if let Some(next) = next {
            debug!("Carousel switched to {}", next);
            self.issue(&state, next, MediaOperation::Play);
        }
        drop(state);

        self.announce(previous, next);
    }

    /// Explicit selection of one media, e.g. a tap on a video.
    pub fn select(&self, post_id: i64, media_id: i64) {
        let key = MediaKey::new(post_id, media_id);
        let mut state = self.lock();
        if !state.playback_allowed || state.active == Some(key) {
            return;
        }

        let previous = state.active.take();
        if let Some(previous) = previous {
            self.issue(&state, previous, MediaOperation::Pause);
        }
        state.focused_post = Some(post_id);
        state.carousel_moved = false;

        let next = state.registry.contains_key(&key).then_some(key);
        state.active = next;
        if let Some(next) = next {
            self.issue(&state, next, MediaOperation::Play);
        }
        drop(state);

        self.announce(previous, next);
    }

    // ============ Focus ============

    /// Screen-level kill switch.
    ///
    /// A focused screen takes over playback rights. Blurring the owning
    /// screen pauses the active media and forbids playback until a screen
    /// gains focus again. Blurring any other screen is ignored.
    pub fn set_screen_focus(&self, screen_id: &str, focused: bool) {
        let mut state = self.lock();
        let owns = state.active_screen.as_deref() == Some(screen_id);

        if !focused && !owns {
            trace!("Blur of background screen {} ignored", screen_id);
            return;
        }

        // Either the owner blurs or another screen takes over
        let previous = if !focused || (state.active_screen.is_some() && !owns) {
            state.focused_post = None;
            state.active.take()
        } else {
            None
        };
        if let Some(previous) = previous {
            self.issue(&state, previous, MediaOperation::Pause);
        }

        let was_allowed = state.playback_allowed;
        if focused {
            info!("Screen {} owns playback", screen_id);
            state.active_screen = Some(screen_id.to_string());
            state.playback_allowed = true;
        } else {
            info!("Screen {} lost focus, playback disabled", screen_id);
            state.active_screen = None;
            state.playback_allowed = false;
        }
        let allowed = state.playback_allowed;
        drop(state);

        self.announce(previous, None);
        if allowed != was_allowed {
            self.events.broadcast(PlaybackEvent::PlaybackAllowed(allowed));
        }
    }

    /// Pauses every registered handle and clears the active state.
    pub fn pause_all(&self) {
        let mut state = self.lock();
        let keys: Vec<MediaKey> = state.registry.keys().copied().collect();
        debug!("Pausing {} handles", keys.len());
        for key in keys {
            self.issue(&state, key, MediaOperation::Pause);
        }

        let previous = state.active.take();
        state.focused_post = None;
        drop(state);

        self.announce(previous, None);
    }

    /// Resolves once every `play`/`pause` issued so far has completed.
    pub async fn settle(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Barrier(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    // ============ Accessors ============

    pub fn active_post_id(&self) -> Option<i64> {
        self.lock().active.map(|key| key.post_id)
    }

    pub fn active_media_id(&self) -> Option<i64> {
        self.lock().active.map(|key| key.media_id)
    }

    pub fn active_key(&self) -> Option<MediaKey> {
        self.lock().active
    }

    pub fn focused_post_id(&self) -> Option<i64> {
        self.lock().focused_post
    }

    pub fn is_playback_allowed(&self) -> bool {
        self.lock().playback_allowed
    }

    pub fn active_screen_id(&self) -> Option<String> {
        self.lock().active_screen.clone()
    }

    // ============ Internals ============

    /// Queues an operation for a registered key. Unknown keys are stale and
    /// silently skipped.
    fn issue(&self, state: &CoordinatorState, key: MediaKey, operation: MediaOperation) {
        let Some(handle) = state.registry.get(&key) else {
            debug!("{}", PlaybackError::HandleStale(key));
            return;
        };
        self.send(Command::Media {
            key,
            operation,
            controller: handle.downgrade(),
        });
    }

    fn send(&self, command: Command) {
        if let Err(mpsc::error::SendError(Command::Media { key, operation, .. })) =
            self.commands.send(command)
        {
            warn!("Playback dispatcher is gone, {} on {} dropped", operation, key);
        }
    }

    fn announce(&self, previous: Option<MediaKey>, next: Option<MediaKey>) {
        match (previous, next) {
            (_, Some(next)) if previous != Some(next) => {
                self.events.broadcast(PlaybackEvent::Activated(next))
            }
            (Some(_), None) => self.events.broadcast(PlaybackEvent::Deactivated),
            _ => {}
        }
    }
}

/// Runs queued operations one at a time, in issue order.
async fn dispatch(
    mut receiver: mpsc::UnboundedReceiver<Command>,
    state: Arc<Mutex<CoordinatorState>>,
) {
    while let Some(command) = receiver.recv().await {
        let (key, operation, controller) = match command {
            Command::Barrier(done) => {
                let _ = done.send(());
                continue;
            }
            Command::Media {
                key,
                operation,
                controller,
            } => (key, operation, controller),
        };

        let target = {
            let state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // A play is only worth starting if its key is still the active
            // one and still bound to the same controller
            let current = state
                .registry
                .get(&key)
                .is_some_and(|handle| handle.same_controller(&controller));
            match operation {
                MediaOperation::Play if !(current && state.active == Some(key)) => None,
                _ => controller.upgrade(),
            }
        };

        let Some(target) = target else {
            debug!("{}, {} skipped", PlaybackError::HandleStale(key), operation);
            continue;
        };

        let result = match operation {
            MediaOperation::Play => target.play().await,
            MediaOperation::Pause => target.pause().await,
        };
        if let Err(err) = result {
            warn!("{}", PlaybackError::operation_failed(key, operation, err));
        }
    }
    debug!("Playback dispatcher stopped");
}
