use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::model::PlaybackEvent;

#[derive(Clone, Default)]
pub(crate) struct PlaybackEventBus {
    subscribers: Arc<Mutex<Vec<Sender<PlaybackEvent>>>>,
}

impl PlaybackEventBus {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = unbounded::<PlaybackEvent>();
        {
            let mut subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            subscribers.push(tx);
        }
        rx
    }

    /// Sends to every live subscriber and forgets the dropped ones
    pub(crate) fn broadcast(&self, event: PlaybackEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
