use crate::error::HostError;

use window_ipc::{WindowController, WindowState};

use common::{ErrorLocation, WindowId};

use std::collections::BTreeMap;
use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock, mpsc};

/// Read-side view of one live window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSummary {
    pub window_id: WindowId,
    pub window_type: String,
}

/// Commands that mutate the set of live windows.
///
/// All mutations go through the state actor via these commands, so
/// controllers are created and dropped in a single task.
pub enum StateCommand {
    /// Take ownership of a freshly built controller
    Register(WindowController),

    /// Drop a controller, tearing its window down
    Unregister(WindowId),
}

/// Live-window bookkeeping.
///
/// Uses an actor pattern: the actor task owns every [`WindowController`]
/// and processes commands sequentially. Reads go through a shared
/// `RwLock` of summaries and never wait on the actor.
#[derive(Clone)]
pub struct HostState {
    command_tx: Arc<Mutex<Option<mpsc::Sender<StateCommand>>>>,

    windows: Arc<RwLock<BTreeMap<WindowId, WindowSummary>>>,

    actor_init: Arc<Mutex<bool>>,
}

impl HostState {
    /// The actor is spawned lazily on first use within an async context.
    pub fn new() -> Self {
        Self {
            command_tx: Arc::new(Mutex::new(None)),
            windows: Arc::new(RwLock::new(BTreeMap::new())),
            actor_init: Arc::new(Mutex::new(false)),
        }
    }

    /// Send a state update command.
    ///
    /// # Errors
    ///
    /// [`HostError::State`] if the actor has stopped.
    pub async fn update(&self, command: StateCommand) -> Result<(), HostError> {
        self.ensure_actor().await;

        let tx_guard = self.command_tx.lock().await;
        let Some(tx) = tx_guard.as_ref() else {
            return Err(HostError::State {
                message: String::from("State actor not initialized"),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        tx.send(command).await.map_err(|_| HostError::State {
            message: String::from("State actor died"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Register `controller` and unregister it once its window reaches
    /// [`WindowState::Closed`].
    pub async fn track(&self, controller: WindowController) -> Result<(), HostError> {
        let window_id = controller.window_id().clone();
        let mut states = controller.window().subscribe();

        self.update(StateCommand::Register(controller)).await?;

        let state = self.clone();
        tokio::spawn(async move {
            // Ends with Err when the window handle is dropped, which also means closed
            let _ = states.wait_for(|state| *state == WindowState::Closed).await;
            if let Err(e) = state.update(StateCommand::Unregister(window_id.clone())).await {
                warn!("Failed to unregister window {window_id}: {e}");
            }
        });

        Ok(())
    }

    pub async fn windows(&self) -> Vec<WindowSummary> {
        self.windows.read().await.values().cloned().collect()
    }

    pub async fn window_count(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn contains(&self, window_id: &WindowId) -> bool {
        self.windows.read().await.contains_key(window_id)
    }

    async fn ensure_actor(&self) {
        let mut init_guard = self.actor_init.lock().await;
        if !*init_guard {
            let (tx, rx) = mpsc::channel(100);
            let windows = Arc::clone(&self.windows);

            // Store tx before spawning
            let mut tx_guard = self.command_tx.lock().await;
            *tx_guard = Some(tx);
            drop(tx_guard);

            tokio::spawn(state_actor(rx, windows));
            *init_guard = true;
            info!("State actor spawned");
        }
    }
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the controllers and applies commands in order.
async fn state_actor(
    mut command_rx: mpsc::Receiver<StateCommand>,
    windows: Arc<RwLock<BTreeMap<WindowId, WindowSummary>>>,
) {
    info!("State actor started");

    let mut controllers: BTreeMap<WindowId, WindowController> = BTreeMap::new();

    while let Some(command) = command_rx.recv().await {
        match command {
            StateCommand::Register(controller) => {
                let summary = WindowSummary {
                    window_id: controller.window_id().clone(),
                    window_type: controller.window_type().to_string(),
                };
                info!(
                    "Tracking window {} ({})",
                    summary.window_id, summary.window_type
                );

                if let Some(replaced) = controllers.insert(summary.window_id.clone(), controller)
                {
                    warn!(
                        "Window id {} was already tracked, dropping the old controller",
                        replaced.window_id()
                    );
                }
                windows
                    .write()
                    .await
                    .insert(summary.window_id.clone(), summary);
            }
            StateCommand::Unregister(window_id) => {
                windows.write().await.remove(&window_id);
                match controllers.remove(&window_id) {
                    Some(controller) => {
                        debug!(
                            "Window {window_id} closed, {} window(s) left",
                            controllers.len()
                        );
                        drop(controller);
                    }
                    None => warn!("Unregister requested for unknown window {window_id}"),
                }
            }
        }
    }

    info!("State actor stopped, dropping {} window(s)", controllers.len());
}
