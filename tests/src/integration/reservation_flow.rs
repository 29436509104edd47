//! # Reservation Flow
//!
//! A stock-reservation endpoint built from every layer of the pack:
//!
//! ```text
//! call ──► EventPublisher ──► inventory.stock.begin
//!              │
//!              ▼
//!          Locker (inventory-reserve-{sku})
//!              │ locked?
//!              ▼
//!          run_in_transaction_with_db ──► UPDATE + SELECT
//!              │ Ok
//!              ▼
//!          inventory.stock.commit ──► durable Subscriber
//! ```
//!
//! A busy SKU fails with `Locked`; a reservation that would drive stock
//! negative fails on the CHECK constraint with `Conflict` and rolls back.

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use shared_bus::{handler_fn, InMemoryBroker, Message, MessageHandler};
    use shared_types::{DomainError, ErrorKind};
    use sp_01_queryable::{run_in_transaction_with_db, Database, Queryable, RunError};
    use sp_02_events::{
        endpoint_fn, Endpoint, Envelope, EventPublisher, Subscriber, SubscriberConfig,
    };
    use sp_03_locker::{InMemoryKeyValueStore, LockStatus, Locker, LockerConfig};
    use sp_telemetry::log_event;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    #[derive(Debug, Serialize, Deserialize)]
    struct Reservation {
        sku: String,
        qty: i64,
    }

    #[derive(Debug, Serialize)]
    struct Reserved {
        sku: String,
        remaining: i64,
    }

    fn inventory() -> anyhow::Result<Database> {
        let db = Database::open_in_memory()?;
        db.execute_batch(
            "CREATE TABLE inventory (
                 sku   TEXT PRIMARY KEY,
                 stock INTEGER NOT NULL CHECK (stock >= 0)
             );
             INSERT INTO inventory (sku, stock) VALUES ('sku-1', 10), ('sku-2', 3);",
        )?;
        Ok(db)
    }

    fn stock(db: &Database, sku: &str) -> anyhow::Result<i64> {
        Ok(db.query_one("SELECT stock FROM inventory WHERE sku = ?1", [sku])?)
    }

    async fn reserve(
        db: Database,
        locker: Arc<Locker>,
        req: Reservation,
    ) -> Result<Reserved, DomainError> {
        let record = locker
            .acquire_or_queue("inventory", "reserve", &req.sku, json!({ "qty": req.qty }))
            .await?;

        if record.status != LockStatus::Locked {
            locker
                .release("inventory", "reserve", &req.sku, record.ticket)
                .await?;
            log_event!(info, "inventory", "reservation rejected, sku busy", sku = %req.sku);
            return Err(DomainError::new(
                format!("sku {} is being reserved", req.sku),
                ErrorKind::Locked,
                "sku_busy",
            ));
        }

        let outcome = run_in_transaction_with_db(&db, |tx| {
            tx.execute(
                "UPDATE inventory SET stock = stock - ?1 WHERE sku = ?2",
                rusqlite::params![req.qty, req.sku],
            )?;
            tx.query_one::<i64, _>("SELECT stock FROM inventory WHERE sku = ?1", [&req.sku])
        });

        locker
            .release("inventory", "reserve", &req.sku, record.ticket)
            .await?;

        let remaining = outcome.map_err(|e| match e {
            RunError::Begin(query) | RunError::Work(query) | RunError::Commit(query) => {
                DomainError::from(query)
            }
        })?;
        Ok(Reserved {
            sku: req.sku,
            remaining,
        })
    }

    struct Harness {
        db: Database,
        broker: Arc<InMemoryBroker>,
        locker: Arc<Locker>,
        publisher: EventPublisher,
    }

    impl Harness {
        async fn new() -> anyhow::Result<Self> {
            let broker = Arc::new(InMemoryBroker::new());
            let store = Arc::new(InMemoryKeyValueStore::new());
            let locker = Locker::connect(store, LockerConfig::default()).await?;
            Ok(Self {
                db: inventory()?,
                publisher: EventPublisher::new(broker.clone()),
                broker,
                locker: Arc::new(locker),
            })
        }

        fn endpoint(
            &self,
        ) -> impl Endpoint<
            Request = Reservation,
            Response = Reserved,
            Error = sp_02_events::PublishedError<DomainError>,
        > {
            let db = self.db.clone();
            let locker = self.locker.clone();
            self.publisher.store(
                "inventory",
                "stock",
                "reserved",
                "inventory.stock",
                endpoint_fn(move |req: Reservation| reserve(db.clone(), locker.clone(), req)),
            )
        }

        async fn subscribe(
            &self,
            subject: &str,
            durable: &str,
        ) -> anyhow::Result<(shared_bus::Subscription, mpsc::UnboundedReceiver<Message>)> {
            let (tx, rx) = mpsc::unbounded_channel();
            let handler: Arc<dyn MessageHandler> = Arc::new(handler_fn(move |msg: Message| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(msg);
                }
            }));
            let sub = Subscriber::new(
                self.broker.clone(),
                SubscriberConfig::new(subject, "projector", durable, "all"),
                handler,
            )
            .subscribe()
            .await
            .context("subscription refused")?;
            Ok((sub, rx))
        }
    }

    async fn next_envelope(rx: &mut mpsc::UnboundedReceiver<Message>) -> anyhow::Result<Envelope> {
        let msg = timeout(Duration::from_secs(1), rx.recv())
            .await
            .context("timed out waiting for event")?
            .context("subscription channel closed")?;
        Ok(Envelope::from_message(&msg)?)
    }

    async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Message>) {
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_successful_reservation_commits_and_publishes() -> anyhow::Result<()> {
        let harness = Harness::new().await?;
        let (_begin_sub, mut begins) = harness.subscribe("inventory.stock.begin", "audit").await?;
        let (_commit_sub, mut commits) = harness.subscribe("inventory.stock.commit", "ledger").await?;

        let reserved = harness
            .endpoint()
            .call(Reservation {
                sku: "sku-1".into(),
                qty: 4,
            })
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        assert_eq!(reserved.remaining, 6);
        assert_eq!(stock(&harness.db, "sku-1")?, 6);

        let begin = next_envelope(&mut begins).await?;
        assert_eq!(begin.domain, "inventory");
        assert_eq!(begin.data["qty"], 4);

        let commit = next_envelope(&mut commits).await?;
        assert_eq!(commit.event_type, "reserved");
        assert_eq!(commit.data, json!({ "sku": "sku-1", "remaining": 6 }));

        assert!(harness.locker.queue("inventory", "reserve", "sku-1").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_overdraw_rolls_back_without_commit_event() -> anyhow::Result<()> {
        let harness = Harness::new().await?;
        let (_begin_sub, mut begins) = harness.subscribe("inventory.stock.begin", "audit").await?;
        let (_commit_sub, mut commits) = harness.subscribe("inventory.stock.commit", "ledger").await?;

        let err = harness
            .endpoint()
            .call(Reservation {
                sku: "sku-2".into(),
                qty: 5,
            })
            .await
            .err()
            .and_then(|e| e.into_endpoint())
            .context("overdraw should fail in the endpoint")?;

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.message(), "record_conflict");
        assert_eq!(stock(&harness.db, "sku-2")?, 3);
        assert!(!harness.db.in_transaction());

        next_envelope(&mut begins).await?;
        assert_quiet(&mut commits).await;
        assert_eq!(harness.publisher.stats().commits(), 0);

        assert!(harness.locker.holder("inventory", "reserve", "sku-2").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_busy_sku_is_rejected_and_queue_left_intact() -> anyhow::Result<()> {
        let harness = Harness::new().await?;
        let (_commit_sub, mut commits) = harness.subscribe("inventory.stock.commit", "ledger").await?;

        let held = harness
            .locker
            .acquire_or_queue("inventory", "reserve", "sku-1", json!({ "by": "recount" }))
            .await?;
        assert_eq!(held.status, LockStatus::Locked);

        let err = harness
            .endpoint()
            .call(Reservation {
                sku: "sku-1".into(),
                qty: 1,
            })
            .await
            .err()
            .and_then(|e| e.into_endpoint())
            .context("busy sku should fail in the endpoint")?;
        assert_eq!(err.kind(), ErrorKind::Locked);
        assert_eq!(err.kind().http_status(), 423);

        let queue = harness.locker.queue("inventory", "reserve", "sku-1").await?;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].ticket, held.ticket);
        assert_eq!(stock(&harness.db, "sku-1")?, 10);
        assert_quiet(&mut commits).await;

        harness
            .locker
            .release("inventory", "reserve", "sku-1", held.ticket)
            .await?;
        let reserved = harness
            .endpoint()
            .call(Reservation {
                sku: "sku-1".into(),
                qty: 1,
            })
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(reserved.remaining, 9);
        assert_eq!(next_envelope(&mut commits).await?.data["remaining"], 9);
        Ok(())
    }

    #[tokio::test]
    async fn test_late_subscriber_replays_committed_history() -> anyhow::Result<()> {
        let harness = Harness::new().await?;
        let endpoint = harness.endpoint();
        for qty in [1, 2, 3] {
            endpoint
                .call(Reservation {
                    sku: "sku-1".into(),
                    qty,
                })
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
        }

        let (_sub, mut commits) = harness.subscribe("inventory.stock.commit", "late").await?;
        let mut remaining = Vec::new();
        for _ in 0..3 {
            remaining.push(next_envelope(&mut commits).await?.data["remaining"].clone());
        }
        assert_eq!(remaining, vec![json!(9), json!(7), json!(4)]);
        assert_eq!(harness.broker.last_sequence("inventory.stock.commit"), 3);
        Ok(())
    }
}
