//! # Lock Handoff
//!
//! When a holder releases, the locker publishes the promoted record on
//! `{prefix}.{key}.promoted`. A worker waiting for its turn opens a durable
//! subscriber on that subject instead of polling the store.

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_json::json;
    use shared_bus::{handler_fn, InMemoryBroker, Message, MessageHandler};
    use shared_types::FixedTimeSource;
    use sp_02_events::{Subscriber, SubscriberConfig};
    use sp_03_locker::{
        LockKey, LockRecord, LockStatus, Locker, LockerConfig, SqliteKeyValueStore,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    fn promotions(
        broker: &Arc<InMemoryBroker>,
        subject: &str,
        durable: &str,
        start_at: &str,
    ) -> (Subscriber, mpsc::UnboundedReceiver<LockRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: Arc<dyn MessageHandler> = Arc::new(handler_fn(move |msg: Message| {
            let tx = tx.clone();
            async move {
                if let Ok(record) = msg.decode::<LockRecord>() {
                    let _ = tx.send(record);
                }
            }
        }));
        let config = SubscriberConfig::new(subject, "workers", durable, start_at);
        (Subscriber::new(broker.clone(), config, handler), rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<LockRecord>) -> anyhow::Result<LockRecord> {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .context("timed out waiting for promotion")?
            .context("promotion channel closed")
    }

    #[tokio::test]
    async fn test_waiter_is_notified_when_promoted() -> anyhow::Result<()> {
        let broker = Arc::new(InMemoryBroker::new());
        let clock = Arc::new(FixedTimeSource::from_unix_secs(1_700_000_000));
        let locker = Locker::connect(
            Arc::new(SqliteKeyValueStore::open_in_memory()?),
            LockerConfig::default(),
        )
        .await?
        .with_clock(clock.clone())
        .with_notifier(broker.clone());

        let key = LockKey::new("payments", "settle", "batch-7").to_string();
        let subject = locker.config().promotion_subject(&key);
        let (subscriber, mut promoted) = promotions(&broker, &subject, "settler", "");
        let _sub = subscriber.subscribe().await.context("subscription refused")?;

        let first = locker
            .acquire_or_queue("payments", "settle", "batch-7", json!({ "worker": "a" }))
            .await?;
        clock.advance(Duration::from_secs(2));
        let second = locker
            .acquire_or_queue("payments", "settle", "batch-7", json!({ "worker": "b" }))
            .await?;
        assert_eq!(second.status, LockStatus::Pending);

        locker
            .release("payments", "settle", "batch-7", first.ticket)
            .await?;

        let notice = next(&mut promoted).await?;
        assert_eq!(notice.ticket, second.ticket);
        assert_eq!(notice.status, LockStatus::Locked);
        assert_eq!(notice.data["worker"], "b");
        assert_eq!(notice.timestamp, 1_700_000_002);

        let holder = locker.holder("payments", "settle", "batch-7").await?;
        assert_eq!(holder, Some(notice));
        Ok(())
    }

    #[tokio::test]
    async fn test_promotions_replay_by_sequence() -> anyhow::Result<()> {
        let broker = Arc::new(InMemoryBroker::new());
        let locker = Locker::connect(
            Arc::new(SqliteKeyValueStore::open_in_memory()?),
            LockerConfig::default(),
        )
        .await?
        .with_notifier(broker.clone());

        let mut tickets = Vec::new();
        for worker in ["a", "b", "c"] {
            let record = locker
                .acquire_or_queue("reports", "render", "q3", json!({ "worker": worker }))
                .await?;
            tickets.push(record.ticket);
        }
        for ticket in &tickets[..2] {
            locker.release("reports", "render", "q3", *ticket).await?;
        }

        let subject = locker
            .config()
            .promotion_subject(&LockKey::new("reports", "render", "q3").to_string());
        assert_eq!(broker.last_sequence(&subject), 2);

        let (subscriber, mut promoted) = promotions(&broker, &subject, "late", "seqno:2");
        let _sub = subscriber.subscribe().await.context("subscription refused")?;

        let notice = next(&mut promoted).await?;
        assert_eq!(notice.ticket, tickets[2]);
        assert!(timeout(Duration::from_millis(100), promoted.recv()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_waiter_produces_no_notice() -> anyhow::Result<()> {
        let broker = Arc::new(InMemoryBroker::new());
        let locker = Locker::connect(
            Arc::new(SqliteKeyValueStore::open_in_memory()?),
            LockerConfig::default(),
        )
        .await?
        .with_notifier(broker.clone());

        let holder = locker
            .acquire_or_queue("mail", "send", "42", json!(null))
            .await?;
        let waiter = locker
            .acquire_or_queue("mail", "send", "42", json!(null))
            .await?;

        assert_eq!(locker.release("mail", "send", "42", waiter.ticket).await?, None);
        assert_eq!(locker.release("mail", "send", "42", holder.ticket).await?, None);

        let subject = locker
            .config()
            .promotion_subject(&LockKey::new("mail", "send", "42").to_string());
        assert_eq!(broker.last_sequence(&subject), 0);
        assert!(locker.queue("mail", "send", "42").await?.is_empty());
        Ok(())
    }
}
