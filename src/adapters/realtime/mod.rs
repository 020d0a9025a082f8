pub mod memory;
pub mod redis_pubsub;

use crate::entities::channels::EventEnvelope;
use async_trait::async_trait;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 256;

/// A pub/sub service able to deliver events published on a named channel.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn subscribe(&self, channel_name: &str) -> anyhow::Result<Channel>;
}

/// A live subscription whose events have not been bound to a handler yet.
pub struct Channel {
    name: String,
    events: mpsc::Receiver<EventEnvelope>,
    shutdown: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

/// Handed to a transport worker: where to forward events, and when to stop.
pub struct ChannelFeed {
    pub events: mpsc::Sender<EventEnvelope>,
    pub shutdown: oneshot::Receiver<()>,
}

impl Channel {
    /// Spawns `worker` with the feed of a new channel. The worker must forward
    /// events into `feed.events` and return once `feed.shutdown` fires.
    pub fn spawn<F, Fut>(name: impl Into<String>, worker: F) -> Self
    where
        F: FnOnce(ChannelFeed) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (events_tx, events) = mpsc::channel(EVENT_BUFFER);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let worker = tokio::spawn(worker(ChannelFeed {
            events: events_tx,
            shutdown: shutdown_rx,
        }));
        Self {
            name: name.into(),
            events,
            shutdown,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Routes every `event_name` event to `handler`; other events are skipped.
    pub fn bind<H>(self, event_name: &'static str, handler: H) -> BoundChannel
    where
        H: Fn(serde_json::Value) + Send + 'static,
    {
        let Channel {
            name,
            mut events,
            shutdown,
            worker,
        } = self;
        let channel = name.clone();
        let pump = tokio::spawn(async move {
            while let Some(envelope) = events.recv().await {
                if envelope.event == event_name {
                    let delivered =
                        panic::catch_unwind(AssertUnwindSafe(|| handler(envelope.data)));
                    if delivered.is_err() {
                        warn!(channel, event = event_name, "Realtime event handler panicked");
                    }
                } else {
                    debug!(channel, event = envelope.event, "Ignoring unbound event");
                }
            }
        });
        BoundChannel {
            name,
            shutdown: Some(shutdown),
            worker: Some(worker),
            pump: Some(pump),
        }
    }
}

pub struct BoundChannel {
    name: String,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
    pump: Option<JoinHandle<()>>,
}

impl BoundChannel {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tears the subscription down. Once this returns the handler will not run again.
    pub async fn unsubscribe(mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            if let Err(e) = pump.await {
                if e.is_panic() {
                    warn!(channel = self.name, "Realtime pump panicked");
                }
            }
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!(channel = self.name, "Realtime transport worker failed: {e}");
            }
        }
    }
}

impl Drop for BoundChannel {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
