//! # Lock Queue
//!
//! Pure state machine over the records stored under one key.

use super::record::{LockRecord, LockStatus};
use serde_json::Value;
use uuid::Uuid;

/// Outcome of removing a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Released {
    /// The record taken out of the queue.
    pub removed: LockRecord,
    /// The record that became the holder, when the head was released.
    pub promoted: Option<LockRecord>,
}

/// Ordered lock records; the head holds the lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockQueue {
    records: Vec<LockRecord>,
}

impl LockQueue {
    /// Queue from stored records.
    pub fn from_records(records: Vec<LockRecord>) -> Self {
        Self { records }
    }

    /// Decode a stored JSON array.
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes).map(Self::from_records)
    }

    /// Encode as a JSON array.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.records)
    }

    pub fn records(&self) -> &[LockRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LockRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record holding the lock.
    pub fn holder(&self) -> Option<&LockRecord> {
        self.records
            .first()
            .filter(|record| record.status == LockStatus::Locked)
    }

    /// Append a record: `locked` on an empty queue, `pending` otherwise.
    pub fn push(&mut self, timestamp: u64, data: Value, ticket: Uuid) -> LockRecord {
        let status = if self.records.is_empty() {
            LockStatus::Locked
        } else {
            LockStatus::Pending
        };
        let record = LockRecord {
            timestamp,
            data,
            status,
            ticket,
        };
        self.records.push(record.clone());
        record
    }

    /// Remove the record with `ticket`. Removing the head promotes the next
    /// record. `None` when no record carries the ticket.
    pub fn release(&mut self, ticket: Uuid) -> Option<Released> {
        let idx = self.records.iter().position(|r| r.ticket == ticket)?;
        let removed = self.records.remove(idx);

        let promoted = match self.records.first_mut() {
            Some(next) if idx == 0 && next.status == LockStatus::Pending => {
                next.status = LockStatus::Locked;
                Some(next.clone())
            }
            _ => None,
        };

        Some(Released { removed, promoted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn queue_of(n: usize) -> (LockQueue, Vec<Uuid>) {
        let mut queue = LockQueue::default();
        let tickets: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
        for (i, ticket) in tickets.iter().enumerate() {
            queue.push(i as u64, json!({ "n": i }), *ticket);
        }
        (queue, tickets)
    }

    #[test]
    fn test_first_push_locks_rest_pend() {
        let (queue, tickets) = queue_of(3);
        let statuses: Vec<LockStatus> = queue.records().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![LockStatus::Locked, LockStatus::Pending, LockStatus::Pending]
        );
        assert_eq!(queue.holder().unwrap().ticket, tickets[0]);
    }

    #[test]
    fn test_release_head_promotes_next() {
        let (mut queue, tickets) = queue_of(3);
        let released = queue.release(tickets[0]).unwrap();

        assert_eq!(released.removed.ticket, tickets[0]);
        let promoted = released.promoted.unwrap();
        assert_eq!(promoted.ticket, tickets[1]);
        assert_eq!(promoted.status, LockStatus::Locked);
        assert_eq!(queue.holder().unwrap().ticket, tickets[1]);
        assert_eq!(queue.records()[1].status, LockStatus::Pending);
    }

    #[test]
    fn test_release_pending_cancels_only() {
        let (mut queue, tickets) = queue_of(3);
        let released = queue.release(tickets[2]).unwrap();

        assert!(released.promoted.is_none());
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.holder().unwrap().ticket, tickets[0]);
    }

    #[test]
    fn test_release_unknown_ticket() {
        let (mut queue, _) = queue_of(1);
        assert!(queue.release(Uuid::new_v4()).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_release_last_empties() {
        let (mut queue, tickets) = queue_of(1);
        let released = queue.release(tickets[0]).unwrap();
        assert!(released.promoted.is_none());
        assert!(queue.is_empty());
        assert!(queue.holder().is_none());
    }

    #[test]
    fn test_stored_format_is_json_array() {
        let (queue, _) = queue_of(2);
        let value: Value = serde_json::from_slice(&queue.encode().unwrap()).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["status"], "locked");
        assert_eq!(array[1]["status"], "pending");
        assert_eq!(LockQueue::decode(&queue.encode().unwrap()).unwrap(), queue);
    }
}
