use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::handlers::dispatcher::Dispatcher,
    domain::{
        errors::QueueFull,
        models::{ListingEvent, SubmissionAck},
    },
};

/// Fire-and-forget entry point: accepts a listing immediately and lets a
/// worker pool deliver it off the request path.
///
/// The queue is bounded; when it is full, `submit` fails synchronously with
/// `QueueFull` instead of buffering without limit. FIFO per queue, but
/// completion order across listings is not guaranteed (a retrying item can be
/// overtaken by a later one).
pub struct SubmissionQueue {
    tx: mpsc::Sender<ListingEvent>,
}

impl SubmissionQueue {
    /// Builds the queue and spawns `workers` consumer loops over it.
    pub fn start(
        dispatcher: Arc<Dispatcher>,
        capacity: usize,
        workers: usize,
    ) -> (Self, QueueWorkerPool) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers.max(1));
        for worker_id in 0..workers.max(1) {
            let rx = rx.clone();
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(worker_loop(worker_id, rx, dispatcher)));
        }

        (Self { tx }, QueueWorkerPool { handles })
    }

    /// Accepts the listing or rejects it right away when the queue is full.
    /// Never blocks the caller.
    pub fn submit(&self, listing: ListingEvent) -> Result<SubmissionAck, QueueFull> {
        let ack = SubmissionAck {
            submission_id: Uuid::new_v4(),
            listing_id: listing.id.clone(),
            accepted_at: Utc::now(),
        };
        self.tx.try_send(listing).map_err(|_| QueueFull)?;
        Ok(ack)
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<ListingEvent>>>,
    dispatcher: Arc<Dispatcher>,
) {
    loop {
        // Hold the lock only for the recv; delivery runs unlocked so the
        // other workers keep pulling.
        let next = { rx.lock().await.recv().await };
        let Some(listing) = next else {
            info!(worker_id, "submission queue closed, worker exiting");
            return;
        };
        let result = dispatcher.deliver(&listing).await;
        if !result.is_delivered() {
            error!(worker_id, listing_id = %result.listing_id, "async delivery failed");
        }
    }
}

/// Handles for the consumer loops, kept so shutdown can drain explicitly:
/// drop the `SubmissionQueue` (closing the channel), then await the pool.
pub struct QueueWorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl QueueWorkerPool {
    /// Waits for the workers to finish everything still queued. Call after
    /// the last `SubmissionQueue` clone is dropped.
    pub async fn drain(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!(error = %err, "queue worker panicked");
            }
        }
    }
}
