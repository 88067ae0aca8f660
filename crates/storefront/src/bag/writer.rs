//! In-order, fire-and-forget queue for remote writes.
//!
//! Every bag owns one queue drained by one task, so writes reach the remote
//! store in the order the mutations happened. Two quick quantity changes on
//! the same line therefore land as "last logical mutation wins".

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};
use valiero_core::{BagItem, UserId};

use super::remote::{RemoteError, RemoteStore};

/// A remote persistence failure, surfaced to the visitor without blocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncNotice {
    /// Which bag failed (`cart` or `wishlist`).
    pub concern: &'static str,
    /// Operation that failed.
    pub operation: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl SyncNotice {
    pub(crate) fn new(concern: &'static str, operation: &'static str, err: &RemoteError) -> Self {
        Self {
            concern,
            operation,
            message: format!("We couldn't save your {concern} to your account: {err}"),
        }
    }
}

enum WriteOp<T: BagItem> {
    Upsert { account: UserId, item: T },
    Delete { account: UserId, key: T::Key },
    DeleteAll { account: UserId },
    Flush(oneshot::Sender<()>),
}

/// Sender half of a bag's write queue.
pub struct RemoteWriter<T: BagItem> {
    concern: &'static str,
    tx: mpsc::UnboundedSender<WriteOp<T>>,
}

impl<T: BagItem> RemoteWriter<T> {
    /// Spawn the draining task and return the queue handle.
    ///
    /// The task exits once every handle is dropped and the queue is empty,
    /// so writes queued by a discarded bag still complete.
    pub fn spawn<R: RemoteStore<T>>(
        concern: &'static str,
        remote: Arc<R>,
        notices: mpsc::UnboundedSender<SyncNotice>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain(concern, remote, rx, notices));
        Self { concern, tx }
    }

    /// Queue an upsert.
    pub fn upsert(&self, account: UserId, item: T) {
        self.send(WriteOp::Upsert { account, item });
    }

    /// Queue a single-row delete.
    pub fn delete(&self, account: UserId, key: T::Key) {
        self.send(WriteOp::Delete { account, key });
    }

    /// Queue a delete of every row for the account.
    pub fn delete_all(&self, account: UserId) {
        self.send(WriteOp::DeleteAll { account });
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    fn send(&self, op: WriteOp<T>) {
        if self.tx.send(op).is_err() {
            warn!(concern = self.concern, "Remote write queue is closed, dropping write");
        }
    }
}

async fn drain<T, R>(
    concern: &'static str,
    remote: Arc<R>,
    mut rx: mpsc::UnboundedReceiver<WriteOp<T>>,
    notices: mpsc::UnboundedSender<SyncNotice>,
) where
    T: BagItem,
    R: RemoteStore<T>,
{
    while let Some(op) = rx.recv().await {
        let (operation, result) = match op {
            WriteOp::Upsert { account, item } => ("upsert", remote.upsert(account, item).await),
            WriteOp::Delete { account, key } => ("delete", remote.delete(account, key).await),
            WriteOp::DeleteAll { account } => ("delete_all", remote.delete_all(account).await),
            WriteOp::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        if let Err(e) = result {
            error!(concern, operation, error = %e, "Remote bag write failed");
            // The bag may already be gone; nobody is left to notify then.
            let _ = notices.send(SyncNotice::new(concern, operation, &e));
        }
    }
    debug!(concern, "Remote write queue drained and closed");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use valiero_core::{LineItem, LineKey, ProductId};

    use super::*;
    use crate::bag::testing::MemoryRemote;

    fn line(quantity: u32) -> LineItem {
        LineItem {
            id: ProductId::new("tee"),
            name: "Pocket Tee".to_string(),
            price: Decimal::new(2800, 2),
            original_price: None,
            image: String::new(),
            size: "S".to_string(),
            color: "White".to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_writes_land_in_order() {
        let remote = Arc::new(MemoryRemote::<LineItem>::with_latency());
        let (tx, _rx) = mpsc::unbounded_channel();
        let writer = RemoteWriter::spawn("cart", Arc::clone(&remote), tx);
        let account = UserId::new(7);

        for quantity in 1..=5 {
            writer.upsert(account, line(quantity));
        }
        writer.flush().await;

        assert_eq!(remote.rows(account), vec![line(5)]);
        assert_eq!(
            remote.log(),
            vec!["upsert 1", "upsert 2", "upsert 3", "upsert 4", "upsert 5"]
        );
    }

    #[tokio::test]
    async fn test_failures_become_notices() {
        let remote = Arc::new(MemoryRemote::<LineItem>::default());
        remote.fail_writes(true);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let writer = RemoteWriter::spawn("cart", Arc::clone(&remote), tx);

        writer.delete(UserId::new(1), LineKey::new("tee", "S", "White"));
        writer.flush().await;

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.concern, "cart");
        assert_eq!(notice.operation, "delete");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_queued_writes_finish_after_handle_drop() {
        let remote = Arc::new(MemoryRemote::<LineItem>::with_latency());
        let (tx, _rx) = mpsc::unbounded_channel();
        let writer = RemoteWriter::spawn("cart", Arc::clone(&remote), tx);
        let account = UserId::new(3);

        writer.upsert(account, line(2));
        drop(writer);

        for _ in 0..50 {
            if !remote.rows(account).is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(remote.rows(account), vec![line(2)]);
    }
}
