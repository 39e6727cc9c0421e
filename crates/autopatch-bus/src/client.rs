//! Bus client
//!
//! `BusClient::connect` blocks the calling agent with a fixed retry delay
//! until the broker accepts the connection; this is the only intentional
//! blocking point besides oracle calls. Every publish also emits to the
//! local trace sink, so the trail stays observable even when the broker
//! is not.

use crate::broker::{Broker, SharedBroker, Subscription};
use crate::BusError;
use autopatch_types::Event;
use std::sync::Arc;
use std::time::Duration;

/// Fixed delay between connection attempts
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Seam between the client and a concrete broker transport.
///
/// Production wiring hands every agent a connector over the shared
/// in-process broker; tests substitute flaky connectors to exercise the
/// retry loop.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Attempt a single connection
    async fn try_connect(&self) -> Result<Connection, BusError>;
}

/// Connector over a shared in-process broker. Always succeeds.
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    broker: SharedBroker,
}

impl MemoryConnector {
    /// Connector handing out connections to `broker`
    #[inline]
    #[must_use]
    pub fn new(broker: SharedBroker) -> Self {
        Self { broker }
    }

    /// Convenience: fresh broker plus a connector to it
    #[must_use]
    pub fn standalone() -> (SharedBroker, Self) {
        let broker = Arc::new(Broker::new());
        (Arc::clone(&broker), Self::new(Arc::clone(&broker)))
    }
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    async fn try_connect(&self) -> Result<Connection, BusError> {
        Ok(Connection {
            broker: Arc::clone(&self.broker),
        })
    }
}

/// Bus client entry point
#[derive(Debug, Clone, Copy, Default)]
pub struct BusClient;

impl BusClient {
    /// Connect to the broker, retrying indefinitely with a fixed delay
    /// until it accepts.
    pub async fn connect<C: Connector>(connector: &C) -> Connection {
        Self::connect_with_delay(connector, CONNECT_RETRY_DELAY).await
    }

    /// `connect` with an explicit retry delay (tests use short delays)
    pub async fn connect_with_delay<C: Connector>(connector: &C, delay: Duration) -> Connection {
        loop {
            match connector.try_connect().await {
                Ok(conn) => {
                    tracing::info!("connected to bus");
                    return conn;
                }
                Err(e) => {
                    tracing::warn!("bus not ready: {e}; retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// An established broker connection
#[derive(Debug, Clone)]
pub struct Connection {
    broker: SharedBroker,
}

impl Connection {
    /// Publish an event under `topic`.
    ///
    /// The local trace sink is fed before the broker fan-out, regardless
    /// of broker reachability.
    pub async fn publish(&self, topic: &str, event: &Event) {
        tracing::info!(
            target: "autopatch::bus",
            topic,
            agent = %event.agent,
            key = %event.routing_key,
            payload = event.payload.label(),
            "publish"
        );
        self.broker.publish(topic, event).await;
    }

    /// Bind an ephemeral exclusive queue to every routing key under
    /// `topic` and return it.
    pub async fn subscribe_all(&self, topic: &str) -> Subscription {
        self.broker.bind(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopatch_types::{routing, AgentKind, Event};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Connector that refuses the first N attempts
    struct FlakyConnector {
        inner: MemoryConnector,
        failures_left: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Connector for FlakyConnector {
        async fn try_connect(&self) -> Result<Connection, BusError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(BusError::Unreachable("broker still booting".into()));
            }
            self.inner.try_connect().await
        }
    }

    #[tokio::test]
    async fn connect_retries_until_broker_accepts() {
        let (broker, memory) = MemoryConnector::standalone();
        let connector = FlakyConnector {
            inner: memory,
            failures_left: AtomicUsize::new(3),
        };

        let conn = BusClient::connect_with_delay(&connector, Duration::from_millis(1)).await;

        let mut sub = conn.subscribe_all("swarm_logs").await;
        conn.publish(
            "swarm_logs",
            &Event::status(AgentKind::System, routing::SYSTEM_START, "up"),
        )
        .await;
        assert!(sub.recv().await.is_some());
        assert_eq!(broker.subscriber_count("swarm_logs").await, 1);
    }

    #[tokio::test]
    async fn publish_and_subscribe_roundtrip() {
        let (_broker, connector) = MemoryConnector::standalone();
        let conn = connector.try_connect().await.unwrap();

        let mut sub = conn.subscribe_all("swarm_logs").await;
        let event = Event::status(AgentKind::Probe, routing::PROBE_ACTION, "registering");
        conn.publish("swarm_logs", &event).await;

        assert_eq!(sub.recv().await.unwrap(), event);
    }
}
