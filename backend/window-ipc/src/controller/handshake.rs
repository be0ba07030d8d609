//! Reliable delivery of a window's initial data.
//!
//! A single broadcast races the page's own startup, so after each load the
//! controller re-broadcasts `{...data, windowId}` on `window:data` at a fixed
//! interval until the page acknowledges on `"<id>:ack"`.

use crate::error::transport::TransportError;
use crate::transport::{HostTransport, WindowHandle, request_handler};

use common::WindowId;
use common::channel::{DATA_CHANNEL, ack_channel};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, trace};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

pub(crate) struct Handshake {
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
    ack_pending: Arc<AtomicBool>,
    acknowledged: Arc<AtomicBool>,
}

impl Handshake {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
            ack_pending: Arc::new(AtomicBool::new(false)),
            acknowledged: Arc::new(AtomicBool::new(false)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_broadcasting(&self) -> bool {
        self.lock().as_ref().is_some_and(|task| !task.is_finished())
    }

    pub(crate) fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    /// Begin broadcasting `payload` until the page acks. A no-op while a
    /// previous round is still unacknowledged.
    pub(crate) fn start(
        &self,
        window_id: &WindowId,
        window: Arc<dyn WindowHandle>,
        transport: &dyn HostTransport,
        payload: Value,
    ) -> Result<(), TransportError> {
        let mut task = self.lock();
        if task.as_ref().is_some_and(|running| !running.is_finished()) {
            debug!("Handshake for window {window_id} already in progress");
            return Ok(());
        }

        let (ack_tx, ack_rx) = oneshot::channel::<()>();
        let ack_tx = Mutex::new(Some(ack_tx));
        let ack_pending = Arc::clone(&self.ack_pending);

        transport.handle_once(
            &ack_channel(window_id),
            request_handler(move |_| {
                ack_pending.store(false, Ordering::SeqCst);
                let sender = ack_tx.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(sender) = sender {
                    let _ = sender.send(());
                }
                async { Value::Null }
            }),
        )?;
        self.ack_pending.store(true, Ordering::SeqCst);
        self.acknowledged.store(false, Ordering::SeqCst);

        let interval = self.interval;
        let acknowledged = Arc::clone(&self.acknowledged);
        let window_id = window_id.clone();

        *task = Some(tokio::spawn(async move {
            let mut ack_rx = ack_rx;
            let mut ticker = interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    biased;
                    ack = &mut ack_rx => {
                        if ack.is_ok() {
                            acknowledged.store(true, Ordering::SeqCst);
                            info!("Window {window_id} acknowledged its initial data");
                        } else {
                            debug!("Ack channel for window {window_id} released");
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        trace!("Broadcasting initial data to window {window_id}");
                        window.send(DATA_CHANNEL, payload.clone());
                    }
                }
            }
        }));

        Ok(())
    }

    /// Stop broadcasting and release the ack channel if it never fired.
    pub(crate) fn stop(&self, window_id: &WindowId, transport: &dyn HostTransport) {
        if let Some(task) = self.lock().take() {
            task.abort();
        }
        if self.ack_pending.swap(false, Ordering::SeqCst) {
            transport.remove_handler(&ack_channel(window_id));
        }
    }
}
