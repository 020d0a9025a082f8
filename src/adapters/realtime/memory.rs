use crate::adapters::realtime::{Channel, ChannelFeed, RealtimeTransport};
use crate::common::sync::lock;
use crate::entities::channels::EventEnvelope;
use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOp {
    Subscribed(String),
    Unsubscribed(String),
}

#[derive(Default)]
struct Broker {
    channels: HashMap<String, broadcast::Sender<EventEnvelope>>,
    ops: Vec<TransportOp>,
    failing_subscribes: usize,
}

/// In-process pub/sub broker. Cloning yields another handle to the same broker.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    broker: Arc<Mutex<Broker>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes to every live subscriber of `channel_name`, returning how many received it.
    pub fn publish(&self, channel_name: &str, event: &str, data: serde_json::Value) -> usize {
        let broker = lock(&self.broker);
        match broker.channels.get(channel_name) {
            Some(sender) => sender
                .send(EventEnvelope {
                    event: event.to_string(),
                    data,
                })
                .unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscriber_count(&self, channel_name: &str) -> usize {
        let broker = lock(&self.broker);
        broker
            .channels
            .get(channel_name)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Subscribe and unsubscribe operations, in the order they completed.
    pub fn ops(&self) -> Vec<TransportOp> {
        lock(&self.broker).ops.clone()
    }

    /// Makes the next `count` subscribe attempts fail.
    pub fn fail_subscribes(&self, count: usize) {
        lock(&self.broker).failing_subscribes = count;
    }
}

#[async_trait]
impl RealtimeTransport for MemoryTransport {
    async fn subscribe(&self, channel_name: &str) -> anyhow::Result<Channel> {
        let mut receiver = {
            let mut broker = lock(&self.broker);
            if broker.failing_subscribes > 0 {
                broker.failing_subscribes -= 1;
                anyhow::bail!("subscription to {channel_name} refused");
            }
            let receiver = broker
                .channels
                .entry(channel_name.to_string())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe();
            broker
                .ops
                .push(TransportOp::Subscribed(channel_name.to_string()));
            receiver
        };

        let broker = self.broker.clone();
        let name = channel_name.to_string();
        Ok(Channel::spawn(channel_name, move |feed: ChannelFeed| async move {
            let ChannelFeed {
                events,
                mut shutdown,
            } = feed;
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    received = receiver.recv() => match received {
                        Ok(envelope) => {
                            if events.send(envelope).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(channel = name, skipped, "Subscriber lagged behind");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            drop(receiver);
            lock(&broker).ops.push(TransportOp::Unsubscribed(name));
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_bound_events_until_unsubscribed() {
        let transport = MemoryTransport::new();
        let channel = transport.subscribe("chat1").await.unwrap();
        let (tx, rx) = mpsc::channel();
        let bound = channel.bind("ping", move |data| {
            let _ = tx.send(data);
        });

        assert_eq!(transport.publish("chat1", "ping", serde_json::json!(1)), 1);
        assert_eq!(transport.publish("chat1", "pong", serde_json::json!(2)), 1);
        assert_eq!(transport.publish("chat1", "ping", serde_json::json!(3)), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;

        bound.unsubscribe().await;
        assert_eq!(transport.publish("chat1", "ping", serde_json::json!(4)), 0);

        let received: Vec<_> = rx.try_iter().collect();
        assert_eq!(received, vec![serde_json::json!(1), serde_json::json!(3)]);
        assert_eq!(
            transport.ops(),
            vec![
                TransportOp::Subscribed("chat1".to_string()),
                TransportOp::Unsubscribed("chat1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn refused_subscriptions_are_errors() {
        let transport = MemoryTransport::new();
        transport.fail_subscribes(1);
        assert!(transport.subscribe("chat1").await.is_err());
        assert!(transport.subscribe("chat1").await.is_ok());
    }

    #[tokio::test]
    async fn publishing_to_an_unknown_channel_reaches_nobody() {
        let transport = MemoryTransport::new();
        assert_eq!(transport.publish("chat9", "ping", serde_json::Value::Null), 0);
        assert_eq!(transport.subscriber_count("chat9"), 0);
    }
}
