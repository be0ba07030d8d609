use crate::error::transport::TransportError;
use crate::transport::{Payload, RequestHandler};

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::Location;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::trace;

struct Entry {
    handler: RequestHandler,
    once: bool,
}

/// Channel -> handler map shared by the host-side transports.
///
/// At most one handler per channel. The lock is never held while a handler
/// runs, so handlers may register or remove channels themselves.
#[derive(Default)]
pub struct HandlerTable {
    entries: Mutex<HashMap<String, Entry>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[track_caller]
    pub fn insert(
        &self,
        channel: &str,
        handler: RequestHandler,
        once: bool,
    ) -> Result<(), TransportError> {
        let mut entries = self.lock();
        if entries.contains_key(channel) {
            return Err(TransportError::HandlerAlreadyRegistered {
                channel: channel.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        entries.insert(channel.to_string(), Entry { handler, once });
        trace!("Handler attached: {channel} (once: {once})");
        Ok(())
    }

    pub fn remove(&self, channel: &str) -> bool {
        self.lock().remove(channel).is_some()
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.lock().contains_key(channel)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.lock().keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Run the handler for `channel`, consuming it if it was registered once.
    pub async fn dispatch(&self, channel: &str, payload: Payload) -> Result<Payload, TransportError> {
        let handler = {
            let mut entries = self.lock();
            match entries.get(channel).map(|entry| entry.once) {
                Some(true) => entries.remove(channel).map(|entry| entry.handler),
                Some(false) => entries.get(channel).map(|entry| entry.handler.clone()),
                None => None,
            }
        };

        let Some(handler) = handler else {
            return Err(TransportError::NoHandler {
                channel: channel.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        Ok(handler(payload).await)
    }
}
