//! Behaviour of the playback coordinator seen through fake players

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use trendplayback::{
    LayoutRect, MediaController, MediaHandle, MediaKey, PlaybackCoordinator, PlaybackError,
    ViewToken, Viewport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Play(i64),
    Pause(i64),
}

/// Shared record of what every fake player is doing
#[derive(Default)]
struct Stage {
    playing: Mutex<HashSet<i64>>,
    max_playing: AtomicUsize,
    calls: Mutex<Vec<Call>>,
}

impl Stage {
    fn playing(&self) -> HashSet<i64> {
        self.playing.lock().unwrap().clone()
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

struct FakePlayer {
    id: i64,
    stage: Arc<Stage>,
    /// When set, `play` waits for it before starting
    gate: Option<Arc<Notify>>,
    broken: bool,
}

impl FakePlayer {
    fn new(id: i64, stage: &Arc<Stage>) -> Arc<Self> {
        Arc::new(Self {
            id,
            stage: Arc::clone(stage),
            gate: None,
            broken: false,
        })
    }
}

#[async_trait]
impl MediaController for FakePlayer {
    async fn play(&self) -> Result<(), PlaybackError> {
        self.stage.calls.lock().unwrap().push(Call::Play(self.id));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.broken {
            return Err(PlaybackError::controller("decoder unavailable"));
        }
        let mut playing = self.stage.playing.lock().unwrap();
        playing.insert(self.id);
        self.stage
            .max_playing
            .fetch_max(playing.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<(), PlaybackError> {
        self.stage.calls.lock().unwrap().push(Call::Pause(self.id));
        if self.broken {
            return Err(PlaybackError::controller("decoder unavailable"));
        }
        self.stage.playing.lock().unwrap().remove(&self.id);
        Ok(())
    }
}

fn viewport() -> Viewport {
    Viewport::new(1000.0, 1000.0)
}

/// Report where `post_id` sits squarely in the central band
fn centered(post_id: i64) -> Vec<ViewToken> {
    vec![ViewToken::new(
        post_id,
        LayoutRect::new(0.0, 300.0, 1000.0, 400.0),
    )]
}

/// Report of a feed scrolled by `offset` pixels, posts 400 px tall
fn feed_at(posts: &[i64], offset: f64) -> Vec<ViewToken> {
    posts
        .iter()
        .enumerate()
        .map(|(i, post)| {
            ViewToken::new(
                *post,
                LayoutRect::new(0.0, i as f64 * 400.0 - offset, 1000.0, 400.0),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_scroll_switches_video() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    let b = FakePlayer::new(20, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));
    coordinator.register(2, 20, MediaHandle::video(&b));

    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;
    assert_eq!(coordinator.active_post_id(), Some(1));
    assert_eq!(coordinator.active_media_id(), Some(10));
    assert_eq!(stage.playing(), HashSet::from([10]));

    coordinator.report_viewability(&centered(2));
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), Some(MediaKey::new(2, 20)));
    assert_eq!(stage.playing(), HashSet::from([20]));
    assert_eq!(
        stage.calls(),
        vec![Call::Play(10), Call::Pause(10), Call::Play(20)]
    );

    // A never comes back without a report naming it
    coordinator.report_viewability(&centered(2));
    coordinator.settle().await;
    assert_eq!(coordinator.active_post_id(), Some(2));
}

#[tokio::test]
async fn test_at_most_one_playing_during_scroll() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let posts = [1, 2, 3, 4, 5];

    let mut players = Vec::new();
    for post in posts {
        for media in 0..3 {
            let player = FakePlayer::new(post * 10 + media, &stage);
            coordinator.register(post, post * 10 + media, MediaHandle::video(&player));
            players.push(player);
        }
    }

    let mut offset = 0.0;
    while offset <= 1600.0 {
        coordinator.report_viewability(&feed_at(&posts, offset));
        if offset as i64 % 200 == 0 {
            let focused = coordinator.focused_post_id().unwrap_or(1);
            coordinator.report_carousel_visibility(focused, focused * 10 + 2, true);
            coordinator.report_carousel_visibility(focused, focused * 10 + 1, true);
        }
        offset += 50.0;
    }
    coordinator.settle().await;

    assert!(stage.max_playing.load(Ordering::SeqCst) <= 1);
    assert!(stage.playing().len() <= 1);
    assert!(stage.call_count() > 0);
}

#[tokio::test]
async fn test_same_winner_twice_is_idempotent() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));

    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;
    let before = stage.call_count();

    // Same winner, slightly different layout
    coordinator.report_viewability(&[ViewToken::new(
        1,
        LayoutRect::new(0.0, 280.0, 1000.0, 400.0),
    )]);
    coordinator.settle().await;

    assert_eq!(stage.call_count(), before);
}

#[tokio::test]
async fn test_no_candidate_pauses_active() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));

    coordinator.report_viewability(&centered(1));
    coordinator.report_viewability(&[ViewToken::new(
        1,
        LayoutRect::new(0.0, 0.0, 1000.0, 300.0),
    )]);
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), None);
    assert_eq!(coordinator.focused_post_id(), None);
    assert!(stage.playing().is_empty());
}

#[tokio::test]
async fn test_blur_stops_playback_until_focus_returns() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    let b = FakePlayer::new(20, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));
    coordinator.register(2, 20, MediaHandle::video(&b));

    coordinator.set_screen_focus("home", true);
    coordinator.report_viewability_from("home", &centered(1));
    coordinator.settle().await;
    assert_eq!(stage.playing(), HashSet::from([10]));

    coordinator.set_screen_focus("home", false);
    coordinator.settle().await;
    assert!(!coordinator.is_playback_allowed());
    assert!(stage.playing().is_empty());
    assert_eq!(coordinator.active_key(), None);

    // Reports while unfocused have no effect
    let calls = stage.call_count();
    coordinator.report_viewability(&centered(2));
    coordinator.report_carousel_visibility(2, 20, true);
    coordinator.select(2, 20);
    coordinator.settle().await;
    assert_eq!(stage.call_count(), calls);
    assert!(stage.playing().is_empty());

    coordinator.set_screen_focus("home", true);
    coordinator.report_viewability_from("home", &centered(2));
    coordinator.settle().await;
    assert_eq!(stage.playing(), HashSet::from([20]));
}

#[tokio::test]
async fn test_background_screen_cannot_drive_playback() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));

    coordinator.set_screen_focus("profile", true);
    coordinator.report_viewability_from("home", &centered(1));
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), None);

    // Blur of a screen that does not own playback changes nothing
    coordinator.set_screen_focus("home", false);
    assert!(coordinator.is_playback_allowed());
    assert_eq!(coordinator.active_screen_id().as_deref(), Some("profile"));
}

#[tokio::test]
async fn test_focus_change_pauses_previous_screen() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));

    coordinator.set_screen_focus("home", true);
    coordinator.report_viewability(&centered(1));
    coordinator.set_screen_focus("search", true);
    coordinator.settle().await;

    assert_eq!(coordinator.active_screen_id().as_deref(), Some("search"));
    assert_eq!(coordinator.active_key(), None);
    assert!(stage.playing().is_empty());
}

#[tokio::test]
async fn test_unregister_before_play_runs() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));

    coordinator.report_viewability(&centered(1));
    coordinator.unregister(1, 10);
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), None);
    assert!(stage.calls().is_empty());
}

#[tokio::test]
async fn test_unregister_while_play_in_flight() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let gate = Arc::new(Notify::new());
    let a = Arc::new(FakePlayer {
        id: 10,
        stage: Arc::clone(&stage),
        gate: Some(Arc::clone(&gate)),
        broken: false,
    });
    coordinator.register(1, 10, MediaHandle::video(&a));

    coordinator.report_viewability(&centered(1));
    // Let the dispatcher enter play()
    while stage.call_count() == 0 {
        tokio::task::yield_now().await;
    }

    coordinator.unregister(1, 10);
    drop(a);
    gate.notify_one();
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), None);
    assert!(!coordinator.is_registered(1, 10));
}

#[tokio::test]
async fn test_dropped_controller_is_stale() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));
    drop(a);

    coordinator.report_viewability(&centered(1));
    coordinator.pause_all();
    coordinator.settle().await;

    assert!(stage.calls().is_empty());
    assert_eq!(coordinator.active_key(), None);
}

#[tokio::test]
async fn test_failed_operations_do_not_corrupt_state() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let broken = Arc::new(FakePlayer {
        id: 10,
        stage: Arc::clone(&stage),
        gate: None,
        broken: true,
    });
    let healthy = FakePlayer::new(20, &stage);
    coordinator.register(1, 10, MediaHandle::video(&broken));
    coordinator.register(2, 20, MediaHandle::video(&healthy));

    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), Some(MediaKey::new(1, 10)));

    coordinator.report_viewability(&centered(2));
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), Some(MediaKey::new(2, 20)));
    assert_eq!(stage.playing(), HashSet::from([20]));
}

#[tokio::test]
async fn test_carousel_only_acts_on_focused_post() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let first = FakePlayer::new(10, &stage);
    let second = FakePlayer::new(11, &stage);
    let other = FakePlayer::new(20, &stage);
    coordinator.register(1, 10, MediaHandle::video(&first));
    coordinator.register(1, 11, MediaHandle::video(&second));
    coordinator.register(2, 20, MediaHandle::video(&other));

    coordinator.report_viewability(&centered(1));

    // Post 2 is not focused: a horizontal swipe there never starts it
    coordinator.report_carousel_visibility(2, 20, true);
    coordinator.settle().await;
    assert_eq!(stage.playing(), HashSet::from([10]));

    coordinator.report_carousel_visibility(1, 11, true);
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), Some(MediaKey::new(1, 11)));
    assert_eq!(stage.playing(), HashSet::from([11]));

    coordinator.report_carousel_visibility(1, 11, false);
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), None);
    assert_eq!(coordinator.focused_post_id(), Some(1));
    assert!(stage.playing().is_empty());
}

#[tokio::test]
async fn test_carousel_image_pauses_video() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let video = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&video));
    coordinator.register(1, 11, MediaHandle::image());

    coordinator.report_viewability(&centered(1));
    coordinator.report_carousel_visibility(1, 11, true);
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), None);
    assert!(stage.playing().is_empty());
}

#[tokio::test]
async fn test_select_switches_explicitly() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    let b = FakePlayer::new(20, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));
    coordinator.register(2, 20, MediaHandle::video(&b));

    coordinator.select(1, 10);
    coordinator.select(2, 20);
    coordinator.select(2, 20);
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), Some(MediaKey::new(2, 20)));
    assert_eq!(coordinator.focused_post_id(), Some(2));
    assert_eq!(stage.playing(), HashSet::from([20]));
}

#[tokio::test]
async fn test_pause_all_pauses_every_handle() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let a = FakePlayer::new(10, &stage);
    let b = FakePlayer::new(20, &stage);
    coordinator.register(1, 10, MediaHandle::video(&a));
    coordinator.register(2, 20, MediaHandle::video(&b));

    coordinator.report_viewability(&centered(1));
    coordinator.pause_all();
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), None);
    assert!(stage.playing().is_empty());
    let calls = stage.calls();
    assert!(calls.contains(&Call::Pause(10)));
    assert!(calls.contains(&Call::Pause(20)));
}

#[tokio::test]
async fn test_remounted_player_takes_over_playing_key() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let old = FakePlayer::new(10, &stage);
    let other = FakePlayer::new(20, &stage);
    coordinator.register(1, 0, MediaHandle::video(&old));
    coordinator.register(2, 0, MediaHandle::video(&other));

    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;
    assert_eq!(stage.playing(), HashSet::from([10]));

    let remounted = FakePlayer::new(11, &stage);
    coordinator.register(1, 0, MediaHandle::video(&remounted));
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), Some(MediaKey::new(1, 0)));
    assert_eq!(stage.playing(), HashSet::from([11]));

    coordinator.report_viewability(&centered(2));
    coordinator.settle().await;
    assert_eq!(stage.playing(), HashSet::from([20]));
    assert!(stage.max_playing.load(Ordering::SeqCst) <= 1);
}

#[tokio::test]
async fn test_same_player_registered_twice_keeps_playing() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let player = FakePlayer::new(10, &stage);
    coordinator.register(1, 0, MediaHandle::video(&player));

    coordinator.report_viewability(&centered(1));
    coordinator.register(1, 0, MediaHandle::video(&player));
    coordinator.settle().await;

    assert_eq!(stage.calls(), vec![Call::Play(10)]);
    assert_eq!(stage.playing(), HashSet::from([10]));
}

#[tokio::test]
async fn test_image_over_playing_key_pauses_old_player() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let old = FakePlayer::new(10, &stage);
    let other = FakePlayer::new(20, &stage);
    coordinator.register(1, 0, MediaHandle::video(&old));
    coordinator.register(2, 0, MediaHandle::video(&other));

    coordinator.report_viewability(&centered(1));
    coordinator.register(1, 0, MediaHandle::image());
    coordinator.settle().await;
    assert_eq!(coordinator.active_key(), None);
    assert!(stage.playing().is_empty());

    coordinator.report_viewability(&centered(2));
    coordinator.settle().await;
    assert_eq!(stage.playing(), HashSet::from([20]));
    assert!(stage.max_playing.load(Ordering::SeqCst) <= 1);
}

#[tokio::test]
async fn test_video_registered_after_centering_plays_on_next_report() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());

    coordinator.report_viewability(&centered(1));
    assert_eq!(coordinator.focused_post_id(), Some(1));

    let late = FakePlayer::new(10, &stage);
    coordinator.register(1, 0, MediaHandle::video(&late));
    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), Some(MediaKey::new(1, 0)));
    assert_eq!(stage.playing(), HashSet::from([10]));

    // Already playing: the next identical report is a no-op again
    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;
    assert_eq!(stage.calls(), vec![Call::Play(10)]);
}

#[tokio::test]
async fn test_report_does_not_undo_carousel_choice() {
    let stage = Arc::new(Stage::default());
    let coordinator = PlaybackCoordinator::new(viewport());
    let video = FakePlayer::new(10, &stage);
    coordinator.register(1, 10, MediaHandle::video(&video));
    coordinator.register(1, 11, MediaHandle::image());

    coordinator.report_viewability(&centered(1));
    coordinator.report_carousel_visibility(1, 11, true);
    coordinator.report_viewability(&centered(1));
    coordinator.settle().await;

    assert_eq!(coordinator.active_key(), None);
    assert!(stage.playing().is_empty());
}
