//! Background runner for a sync transport
//!
//! The transport runs on a dedicated thread with its own current-thread tokio
//! runtime. The UI thread drains the handle once per redraw cycle and applies
//! everything synchronously, so the store is only ever touched by one thread.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::watch;
use uuid::Uuid;

use super::transport::SyncTransport;
use super::{ConnectionStatus, SyncMessage};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::floorplan::LayoutStore;

/// Retry delay while the UI side is not draining
const SEND_BACKOFF: Duration = Duration::from_millis(20);

pub struct SyncChannel;

impl SyncChannel {
    /// Start the feed for one exhibition
    pub fn spawn<T>(transport: T, exhibition_id: Uuid, config: &SyncConfig) -> SyncHandle
    where
        T: SyncTransport + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reconnect = Duration::from_millis(config.reconnect_interval_ms);

        let spawned = thread::Builder::new()
            .name("floorplan-sync".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to build sync runtime");
                        return;
                    }
                };
                rt.block_on(run_feed(transport, exhibition_id, reconnect, tx, shutdown_rx));
            });

        let thread = match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn sync thread");
                None
            }
        };

        SyncHandle {
            rx,
            shutdown: shutdown_tx,
            thread,
            exhibition_id,
        }
    }
}

/// UI-side end of a running sync channel. Dropping it stops the thread.
pub struct SyncHandle {
    rx: Receiver<SyncMessage>,
    shutdown: watch::Sender<bool>,
    thread: Option<JoinHandle<()>>,
    exhibition_id: Uuid,
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("exhibition_id", &self.exhibition_id)
            .field("queued", &self.rx.len())
            .finish_non_exhaustive()
    }
}

impl SyncHandle {
    pub fn exhibition_id(&self) -> Uuid {
        self.exhibition_id
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Everything received so far, without blocking
    pub fn drain(&self) -> Vec<SyncMessage> {
        self.rx.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SyncMessage> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Apply queued messages to the store in arrival order.
    /// Returns how many messages were handled.
    pub fn drain_into(&self, store: &mut LayoutStore, now_ms: u64) -> usize {
        let mut handled = 0;
        for message in self.rx.try_iter() {
            handled += 1;
            match message {
                SyncMessage::Status(status) => store.set_connection(status, now_ms),
                SyncMessage::Event(event) => {
                    if let Err(err) = store.apply_sync_event(&event) {
                        tracing::warn!(
                            kind = %event.entity_kind,
                            id = %event.entity_id,
                            error = %err,
                            "sync event ignored"
                        );
                    }
                }
            }
        }
        handled
    }

    /// Stop the feed and wait for the thread
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        // disconnect the queue so a runner stuck on a full channel sees it
        drop(std::mem::replace(&mut self.rx, crossbeam_channel::never()));
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("sync thread panicked");
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

// =============================================================================
// RUNNER
// =============================================================================

enum PumpEnd {
    Shutdown,
    ReceiverGone,
    Disconnected(String),
    /// Ended and cannot be reopened
    Closed,
}

/// Queue one message without blocking the runtime, so shutdown stays
/// observable while the UI side is not draining.
async fn deliver(
    tx: &Sender<SyncMessage>,
    mut message: SyncMessage,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), PumpEnd> {
    loop {
        match tx.try_send(message) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Disconnected(_)) => return Err(PumpEnd::ReceiverGone),
            Err(TrySendError::Full(back)) => {
                message = back;
                if *shutdown.borrow() {
                    return Err(PumpEnd::Shutdown);
                }
                tokio::select! {
                    _ = tokio::time::sleep(SEND_BACKOFF) => {}
                    _ = shutdown.changed() => return Err(PumpEnd::Shutdown),
                }
            }
        }
    }
}

async fn run_feed<T: SyncTransport>(
    mut transport: T,
    exhibition_id: Uuid,
    reconnect: Duration,
    tx: Sender<SyncMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;
    loop {
        if *shutdown.borrow() {
            break;
        }
        attempt += 1;
        match deliver(&tx, SyncMessage::Status(ConnectionStatus::Connecting), &mut shutdown).await {
            Ok(()) => {}
            Err(PumpEnd::Shutdown) => break,
            Err(_) => return,
        }

        let connected = tokio::select! {
            result = transport.connect(exhibition_id) => result,
            _ = shutdown.changed() => break,
        };

        match connected {
            Ok(()) => {
                tracing::info!(
                    %exhibition_id,
                    transport = transport.name(),
                    attempt,
                    "sync feed connected"
                );
                attempt = 0;
                match deliver(&tx, SyncMessage::Status(ConnectionStatus::Online), &mut shutdown).await {
                    Ok(()) => {}
                    Err(PumpEnd::Shutdown) => break,
                    Err(_) => return,
                }
                match pump(&mut transport, &tx, &mut shutdown).await {
                    PumpEnd::Shutdown => break,
                    PumpEnd::ReceiverGone => return,
                    PumpEnd::Disconnected(reason) => {
                        tracing::warn!(%exhibition_id, reason = %reason, "sync feed disconnected");
                    }
                    PumpEnd::Closed => {
                        tracing::info!(%exhibition_id, "sync feed closed for good");
                        let _ = deliver(&tx, SyncMessage::Status(ConnectionStatus::Offline), &mut shutdown).await;
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%exhibition_id, attempt, error = %err, "sync connect failed");
            }
        }

        match deliver(&tx, SyncMessage::Status(ConnectionStatus::Offline), &mut shutdown).await {
            Ok(()) => {}
            Err(PumpEnd::Shutdown) => break,
            Err(_) => return,
        }
        tracing::debug!(delay_ms = reconnect.as_millis() as u64, "reconnecting after delay");
        tokio::select! {
            _ = tokio::time::sleep(reconnect) => {}
            _ = shutdown.changed() => break,
        }
    }
    tracing::debug!(%exhibition_id, "sync feed stopped");
}

async fn pump<T: SyncTransport>(
    transport: &mut T,
    tx: &Sender<SyncMessage>,
    shutdown: &mut watch::Receiver<bool>,
) -> PumpEnd {
    loop {
        let next = tokio::select! {
            next = transport.next_event() => next,
            _ = shutdown.changed() => return PumpEnd::Shutdown,
        };
        match next {
            Ok(Some(event)) => {
                if let Err(end) = deliver(tx, SyncMessage::Event(event), shutdown).await {
                    return end;
                }
            }
            Ok(None) if !transport.can_reopen() => return PumpEnd::Closed,
            Ok(None) => return PumpEnd::Disconnected("feed closed".into()),
            Err(SyncError::Decode(err)) => {
                tracing::warn!(error = %err, "skipping malformed feed line");
            }
            Err(err) => return PumpEnd::Disconnected(err.to_string()),
        }
    }
}
