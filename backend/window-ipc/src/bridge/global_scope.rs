use crate::bridge::ExposedApi;
use crate::error::bridge::BridgeError;
use crate::transport::{MainWorld, Payload};

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;

/// In-memory page global scope.
///
/// Each key can be published once. Calling anything that was not published
/// fails the way a page calling an undefined function would.
#[derive(Debug, Default)]
pub struct GlobalScope {
    globals: Mutex<BTreeMap<String, Arc<ExposedApi>>>,
}

impl GlobalScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Arc<ExposedApi>>> {
        self.globals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<Arc<ExposedApi>> {
        self.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Call `key.method(payload)` as page script would.
    pub async fn call(&self, key: &str, method: &str, payload: Payload) -> Result<Payload, BridgeError> {
        let function = self
            .get(key)
            .and_then(|api| api.get(method).cloned())
            .ok_or_else(|| BridgeError::NotExposed {
                key: key.to_string(),
                method: method.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(function(payload).await?)
    }
}

impl MainWorld for GlobalScope {
    fn expose_in_main_world(&self, key: &str, api: ExposedApi) -> Result<(), BridgeError> {
        let mut globals = self.lock();
        if globals.contains_key(key) {
            return Err(BridgeError::AlreadyExposed {
                key: key.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        info!("Exposed '{key}' with {} function(s)", api.len());
        globals.insert(key.to_string(), Arc::new(api));
        Ok(())
    }
}
