//! Named scalar topics.

use std::collections::HashMap;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

const LOG_TARGET: &str = "speedloop::transport";

/// Registry of topics, used while wiring nodes together.
#[derive(Debug)]
pub struct Bus {
    capacity: usize,
    topics: HashMap<String, broadcast::Sender<f64>>,
}

impl Bus {
    /// `capacity` is the per-subscriber backlog kept before old samples are dropped.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: HashMap::new(),
        }
    }

    fn sender(&mut self, topic: &str) -> broadcast::Sender<f64> {
        let capacity = self.capacity;
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .clone()
    }

    pub fn publisher(&mut self, topic: &str) -> Publisher {
        Publisher {
            topic: topic.to_string(),
            tx: self.sender(topic),
        }
    }

    /// Subscribe to `topic`. Only samples published after this call are seen.
    pub fn subscribe(&mut self, topic: &str) -> Subscriber {
        Subscriber {
            topic: topic.to_string(),
            rx: self.sender(topic).subscribe(),
        }
    }

}

impl Default for Bus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Sending half of a topic.
#[derive(Debug, Clone)]
pub struct Publisher {
    topic: String,
    tx: broadcast::Sender<f64>,
}

impl Publisher {
    /// Publish a sample. Returns how many subscribers it reached; a topic nobody
    /// listens to is not an error.
    pub fn publish(&self, value: f64) -> usize {
        match self.tx.send(value) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(target: LOG_TARGET, topic = %self.topic, "no subscribers");
                0
            }
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Receiving half of a topic.
#[derive(Debug)]
pub struct Subscriber {
    topic: String,
    rx: broadcast::Receiver<f64>,
}

impl Subscriber {
    /// Next sample, or `None` once every publisher is gone.
    ///
    /// Samples lost to a full backlog are skipped; the caller only ever sees
    /// newer values.
    pub async fn recv(&mut self) -> Option<f64> {
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(target: LOG_TARGET, topic = %self.topic, skipped, "subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Sample already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<f64> {
        loop {
            match self.rx.try_recv() {
                Ok(value) => return Some(value),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_published_samples_in_order() {
        let mut bus = Bus::new(8);
        let mut sub = bus.subscribe("speed");
        let publisher = bus.publisher("speed");

        assert_eq!(publisher.publish(1.0), 1);
        publisher.publish(2.0);
        assert_eq!(sub.recv().await, Some(1.0));
        assert_eq!(sub.recv().await, Some(2.0));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newer_values() {
        let mut bus = Bus::new(2);
        let mut sub = bus.subscribe("speed");
        let publisher = bus.publisher("speed");
        for v in 0..5 {
            publisher.publish(v as f64);
        }
        assert_eq!(sub.recv().await, Some(3.0));
        assert_eq!(sub.recv().await, Some(4.0));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let mut bus = Bus::default();
        let publisher = bus.publisher("nobody");
        assert_eq!(publisher.publish(1.0), 0);
        assert_eq!(publisher.topic(), "nobody");
    }

    #[tokio::test]
    async fn closed_topic_ends_stream() {
        let mut bus = Bus::new(4);
        let mut sub = bus.subscribe("speed");
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }
}
