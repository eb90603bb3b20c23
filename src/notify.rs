use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

/// Change signals broadcast to every subscribed page after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Notification {
    ChannelsUpdated,
    SettingsUpdated,
    FiltersUpdated,
    PageUpdated,
}

const SUBSCRIBER_BUFFER: usize = 64;

/// Best-effort fan-out. Publishing never fails: a subscriber whose channel
/// is closed (page gone) is pruned, a full buffer drops the signal for that
/// subscriber only. Pages converge on the next signal they do receive.
#[derive(Default)]
pub struct Broadcaster {
    subscribers: RwLock<Vec<mpsc::Sender<Notification>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<Notification> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.subscribers.write().unwrap().push(tx);
        rx
    }

    pub fn publish(&self, notification: Notification) {
        let mut subscribers = self.subscribers.write().unwrap();
        subscribers.retain(|tx| match tx.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Subscriber buffer full, dropping {:?}", notification);
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Pruning closed subscriber");
                false
            }
        });
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.publish(Notification::ChannelsUpdated);

        assert_eq!(a.recv().await, Some(Notification::ChannelsUpdated));
        assert_eq!(b.recv().await, Some(Notification::ChannelsUpdated));
    }

    #[tokio::test]
    async fn test_publish_survives_dropped_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut alive = broadcaster.subscribe();
        let dead = broadcaster.subscribe();
        drop(dead);

        // Must not error and must prune the dead channel.
        broadcaster.publish(Notification::FiltersUpdated);
        assert_eq!(alive.recv().await, Some(Notification::FiltersUpdated));
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_full_buffer_drops_signal_but_keeps_subscriber() {
        let broadcaster = Broadcaster::new();
        let mut rx = broadcaster.subscribe();

        for _ in 0..(SUBSCRIBER_BUFFER + 10) {
            broadcaster.publish(Notification::PageUpdated);
        }
        assert_eq!(broadcaster.subscriber_count(), 1);

        // Drain what fit in the buffer.
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_BUFFER);
    }
}
