//! In-process topic exchange
//!
//! Models the broker semantics the pipeline depends on: per-topic fan-out
//! to every bound queue, ephemeral exclusive queues per subscriber, and
//! at-most-once delivery (a full or dropped queue loses the message; there
//! is no redelivery). Within one queue, delivery order matches publish
//! order for a given publisher; nothing is guaranteed across publishers.

use autopatch_types::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Per-queue buffer depth. Subscribers slower than this lose messages,
/// which is the at-most-once contract, not an error.
const QUEUE_CAPACITY: usize = 256;

/// Topic exchange shared by every connection
#[derive(Debug, Default)]
pub struct Broker {
    /// Bound queues per topic
    topics: Mutex<HashMap<String, Vec<mpsc::Sender<Event>>>>,
}

impl Broker {
    /// Create a new broker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fan an event out to every queue bound to `topic`.
    ///
    /// Queues that are full or whose subscriber has gone away are skipped;
    /// dead queues are pruned. Publishing to a topic with no subscribers
    /// is a no-op, not an error.
    pub async fn publish(&self, topic: &str, event: &Event) {
        let mut topics = self.topics.lock().await;
        let Some(queues) = topics.get_mut(topic) else {
            return;
        };

        queues.retain(|queue| !queue.is_closed());
        for queue in queues.iter() {
            if let Err(e) = queue.try_send(event.clone()) {
                // At-most-once: drop and move on.
                tracing::warn!(topic, key = %event.routing_key, "dropped delivery: {e}");
            }
        }
    }

    /// Bind a new ephemeral, exclusive queue to every routing key under
    /// `topic` (the `#` wildcard). The queue lives as long as the returned
    /// subscription.
    pub async fn bind(&self, topic: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let mut topics = self.topics.lock().await;
        topics.entry(topic.to_string()).or_default().push(tx);
        Subscription { rx }
    }

    /// Number of live queues bound to `topic`
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().await;
        topics
            .get(topic)
            .map(|queues| queues.iter().filter(|q| !q.is_closed()).count())
            .unwrap_or(0)
    }
}

/// An ephemeral exclusive queue bound to a topic wildcard.
///
/// Auto-ack: once an event is yielded it is gone; a handler that fails to
/// process it does not see it again.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Event>,
}

impl Subscription {
    /// Receive the next delivered event. Returns `None` once the broker
    /// side of the queue is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Shared handle used by connectors and tests
pub type SharedBroker = Arc<Broker>;

#[cfg(test)]
mod tests {
    use super::*;
    use autopatch_types::{routing, AgentKind, Event};

    fn status_event(message: &str) -> Event {
        Event::status(AgentKind::System, routing::SYSTEM_START, message)
    }

    #[tokio::test]
    async fn publish_fans_out_to_all_queues() {
        let broker = Broker::new();
        let mut sub_a = broker.bind("swarm_logs").await;
        let mut sub_b = broker.bind("swarm_logs").await;

        broker.publish("swarm_logs", &status_event("hello")).await;

        assert!(sub_a.recv().await.is_some());
        assert!(sub_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_noop() {
        let broker = Broker::new();
        broker.publish("swarm_logs", &status_event("nobody home")).await;
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let broker = Broker::new();
        let mut sub = broker.bind("swarm_logs").await;

        broker.publish("other_topic", &status_event("wrong room")).await;
        broker.publish("swarm_logs", &status_event("right room")).await;

        let event = sub.recv().await.unwrap();
        match event.payload {
            autopatch_types::Payload::Status { ref message, .. } => {
                assert_eq!(message, "right room");
            }
            _ => panic!("unexpected payload"),
        }
    }

    #[tokio::test]
    async fn dropped_subscriber_is_pruned() {
        let broker = Broker::new();
        let sub = broker.bind("swarm_logs").await;
        assert_eq!(broker.subscriber_count("swarm_logs").await, 1);

        drop(sub);
        broker.publish("swarm_logs", &status_event("into the void")).await;
        assert_eq!(broker.subscriber_count("swarm_logs").await, 0);
    }

    #[tokio::test]
    async fn delivery_order_matches_publish_order_per_queue() {
        let broker = Broker::new();
        let mut sub = broker.bind("swarm_logs").await;

        for i in 0..5 {
            broker
                .publish("swarm_logs", &status_event(&format!("msg {i}")))
                .await;
        }

        for i in 0..5 {
            let event = sub.recv().await.unwrap();
            match event.payload {
                autopatch_types::Payload::Status { ref message, .. } => {
                    assert_eq!(message, &format!("msg {i}"));
                }
                _ => panic!("unexpected payload"),
            }
        }
    }
}
