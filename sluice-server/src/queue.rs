//! Dispatch queue
//!
//! Planned builds are published here and pulled by workers.

use async_trait::async_trait;
use sluice_core::dto::queue::QueueItem;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,
}

/// Hands planned builds to workers
#[async_trait]
pub trait Queue: Send + Sync {
    async fn publish(&self, item: QueueItem) -> Result<(), QueueError>;

    /// Next item, or `None` when nothing is queued
    async fn pop(&self) -> Result<Option<QueueItem>, QueueError>;
}

/// Bounded in-process queue over a tokio channel
pub struct ChannelQueue {
    sender: mpsc::Sender<QueueItem>,
    receiver: Mutex<mpsc::Receiver<QueueItem>>,
}

impl ChannelQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }
}

#[async_trait]
impl Queue for ChannelQueue {
    async fn publish(&self, item: QueueItem) -> Result<(), QueueError> {
        self.sender.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    async fn pop(&self) -> Result<Option<QueueItem>, QueueError> {
        let mut receiver = self.receiver.lock().await;
        match receiver.try_recv() {
            Ok(item) => Ok(Some(item)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(QueueError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sample_build;
    use sluice_core::pipeline::Pipeline;
    use uuid::Uuid;

    fn item() -> QueueItem {
        QueueItem {
            build: sample_build(Uuid::new_v4()),
            pipeline: Pipeline::default(),
        }
    }

    #[tokio::test]
    async fn test_publish_then_pop_in_order() {
        let queue = ChannelQueue::new(4);
        let first = item();
        let second = item();

        queue.publish(first.clone()).await.unwrap();
        queue.publish(second.clone()).await.unwrap();

        assert_eq!(queue.pop().await.unwrap().unwrap().build.id, first.build.id);
        assert_eq!(queue.pop().await.unwrap().unwrap().build.id, second.build.id);
        assert!(queue.pop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_publish() {
        let queue = ChannelQueue::new(1);

        queue.publish(item()).await.unwrap();
        assert!(matches!(queue.publish(item()).await, Err(QueueError::Full)));
    }
}
