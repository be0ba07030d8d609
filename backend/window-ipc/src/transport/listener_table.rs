use crate::transport::{BroadcastListener, Payload};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One-shot broadcast listeners of a single presentation surface.
#[derive(Default)]
pub struct ListenerTable {
    listeners: Mutex<HashMap<String, Vec<BroadcastListener>>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<BroadcastListener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, channel: &str, listener: BroadcastListener) {
        self.lock()
            .entry(channel.to_string())
            .or_default()
            .push(listener);
    }

    pub fn count(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, Vec::len)
    }

    /// Deliver to and detach every listener on `channel`. Returns how many
    /// listeners received the payload.
    pub fn emit(&self, channel: &str, payload: &Payload) -> usize {
        // Taken out first: a listener may re-arm itself on the same channel
        let listeners = self.lock().remove(channel).unwrap_or_default();
        let delivered = listeners.len();
        for listener in listeners {
            listener(payload.clone());
        }
        delivered
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
