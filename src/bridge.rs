//! Bridge runtime.
//!
//! A dedicated OS thread running a single-threaded tokio runtime. It is the
//! only execution context that touches the transport, the connection cache,
//! or a live link; other threads hand work over a job channel and block on
//! a bounded reply.

use parking_lot::RwLock;
use std::future::Future;
use std::sync::mpsc::{RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::ble::connection::ConnectionCache;
use crate::ble::transport::BtleplugTransport;
use crate::ble::writer::TextWriter;
use crate::error::{Error, Result};

/// How long a locate scan may run when the bridge (re)connects.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

/// Startup configuration owned by the bridge runtime. Set once, never
/// mutated.
#[derive(Debug, Clone)]
pub struct BridgeContext {
    /// Advertised name of the target device.
    pub device_name: String,
    /// The writable text characteristic.
    pub characteristic: Uuid,
    /// Scan window for each locate.
    pub scan_timeout: Duration,
}

impl BridgeContext {
    /// Context for `device_name` and `characteristic` with the default scan
    /// window.
    pub fn new(device_name: impl Into<String>, characteristic: Uuid) -> Self {
        Self {
            device_name: device_name.into(),
            characteristic,
            scan_timeout: SCAN_TIMEOUT,
        }
    }
}

/// One unit of work: text to write, and where to send the outcome.
struct BridgeJob {
    text: String,
    reply: SyncSender<Result<()>>,
}

/// Cloneable, thread-safe face of the bridge runtime.
#[derive(Clone)]
pub struct BridgeHandle {
    jobs: mpsc::UnboundedSender<BridgeJob>,
}

impl BridgeHandle {
    /// Submit `text` for writing and block up to `timeout` for the result.
    ///
    /// A timeout abandons the wait but does not cancel the write: it keeps
    /// running on the bridge runtime and may still refresh the cached
    /// connection after this call has returned. Ordering between such an
    /// orphaned write and a later submission is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the deadline expires, or
    /// [`Error::BridgeClosed`] when the runtime has shut down.
    pub fn submit(&self, text: impl Into<String>, timeout: Duration) -> Result<()> {
        let (reply_tx, reply_rx) = std::sync::mpsc::sync_channel(1);

        self.jobs
            .send(BridgeJob {
                text: text.into(),
                reply: reply_tx,
            })
            .map_err(|_| Error::BridgeClosed)?;

        match reply_rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(Error::BridgeClosed),
        }
    }
}

/// Owns the bridge thread and its job channel.
pub struct BridgeRuntime {
    /// Handle cloned out to submitters.
    handle: BridgeHandle,
    /// Signals the bridge loop to stop.
    shutdown_tx: RwLock<Option<oneshot::Sender<()>>>,
    /// The bridge thread itself.
    thread: RwLock<Option<std::thread::JoinHandle<()>>>,
}

impl BridgeRuntime {
    /// Spawn a bridge over the production btleplug transport.
    ///
    /// The transport is constructed on the bridge thread itself so that
    /// every BLE operation, from adapter setup onward, lives on the one
    /// runtime. If Bluetooth is unavailable at startup the bridge stays up
    /// and answers every job with the failure.
    pub fn spawn(ctx: BridgeContext) -> Self {
        Self::spawn_with(move || async move {
            let transport = BtleplugTransport::new(ctx.scan_timeout).await?;
            let cache = Arc::new(ConnectionCache::new(Arc::new(transport), ctx.device_name));
            Ok(TextWriter::new(cache, ctx.characteristic))
        })
    }

    /// Spawn a bridge whose writer is produced by `build` on the bridge
    /// thread.
    pub fn spawn_with<F, Fut>(build: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TextWriter>> + 'static,
    {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("ble-bridge".to_string())
            .spawn(move || run_bridge(build, jobs_rx, shutdown_rx));

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to spawn bridge thread: {}", e);
                None
            }
        };

        Self {
            handle: BridgeHandle { jobs: jobs_tx },
            shutdown_tx: RwLock::new(Some(shutdown_tx)),
            thread: RwLock::new(thread),
        }
    }

    /// Get a cloneable handle for submitting work.
    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    /// Stop the bridge loop and wait for the thread to finish.
    ///
    /// In-flight writes are dropped with the runtime; subsequent submits
    /// fail with [`Error::BridgeClosed`].
    pub fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.write().take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.write().take() {
            let _ = thread.join();
        }
    }
}

/// Body of the bridge thread: build the writer, then serve jobs until the
/// channel closes or shutdown is signalled.
fn run_bridge<F, Fut>(
    build: F,
    mut jobs: mpsc::UnboundedReceiver<BridgeJob>,
    mut shutdown: oneshot::Receiver<()>,
) where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<TextWriter>>,
{
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to build bridge runtime: {}", e);
            return;
        }
    };

    runtime.block_on(async move {
        let writer = match build().await {
            Ok(writer) => writer,
            Err(e) => {
                error!("BLE transport unavailable: {}", e);
                // Keep draining so each request surfaces the failure
                // instead of hanging until its timeout.
                loop {
                    tokio::select! {
                        job = jobs.recv() => match job {
                            Some(job) => {
                                let _ = job.reply.try_send(Err(Error::BluetoothUnavailable));
                            }
                            None => break,
                        },
                        _ = &mut shutdown => break,
                    }
                }
                return;
            }
        };

        info!("Bridge runtime ready");

        loop {
            tokio::select! {
                job = jobs.recv() => match job {
                    Some(job) => {
                        let writer = writer.clone();
                        tokio::spawn(async move {
                            let result = writer.write_text(&job.text).await;
                            // The caller may have stopped waiting. The write
                            // still ran, and the cache keeps whatever state
                            // it produced.
                            if job.reply.try_send(result).is_err() {
                                debug!("Dropping result for a caller that timed out");
                            }
                        });
                    }
                    None => break,
                },
                _ = &mut shutdown => {
                    debug!("Bridge shutdown requested");
                    break;
                }
            }
        }

        debug!("Bridge loop ended");
    });
}
