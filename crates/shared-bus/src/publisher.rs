//! # Message Broker
//!
//! The broker port and its in-memory implementation.

use crate::error::BusError;
use crate::message::{Message, StartPosition, SubscriptionOptions};
use crate::subscriber::{MessageHandler, Subscription, SubscriptionRegistry};
use crate::DEFAULT_RETAINED_MESSAGES;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{SystemTimeSource, TimeSource};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Trait for talking to a streaming message broker.
///
/// This is the only surface the event publisher, subscriber and locker use,
/// so any broker client (or a test fake) can stand behind it.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish `data` to `subject`.
    ///
    /// # Returns
    ///
    /// The sequence number the broker assigned to the message.
    async fn publish(&self, subject: &str, data: Vec<u8>) -> Result<u64, BusError>;

    /// Open a subscription.
    ///
    /// Within a non-empty `queue_group` each message goes to exactly one
    /// member. An empty `queue_group` opens a plain subscription that sees
    /// every message.
    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
        options: SubscriptionOptions,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Subscription, BusError>;
}

/// In-memory broker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Messages kept per subject for replay; older ones are discarded.
    pub max_retained_messages: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_retained_messages: DEFAULT_RETAINED_MESSAGES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DurableKey {
    subject: String,
    queue_group: String,
    durable: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Queue(String),
    Plain(u64),
}

struct Member {
    id: u64,
    sender: mpsc::UnboundedSender<Message>,
}

#[derive(Default)]
struct Group {
    members: Vec<Member>,
    next: usize,
}

impl Group {
    /// Hand the message to the next live member, pruning dead ones.
    fn deliver(&mut self, message: &Message) -> bool {
        while !self.members.is_empty() {
            let idx = self.next % self.members.len();
            if self.members[idx].sender.send(message.clone()).is_ok() {
                self.next = idx + 1;
                return true;
            }
            self.members.remove(idx);
        }
        false
    }
}

#[derive(Default)]
struct SubjectState {
    last_sequence: u64,
    log: VecDeque<Message>,
    groups: HashMap<GroupKey, Group>,
}

struct MemberInfo {
    subject: String,
    group: GroupKey,
    durable: Option<DurableKey>,
}

#[derive(Default)]
struct BrokerState {
    closed: bool,
    next_id: u64,
    subjects: HashMap<String, SubjectState>,
    /// Last acknowledged sequence per durable.
    cursors: HashMap<DurableKey, u64>,
    /// Plain durable subscriptions currently open.
    active_durables: HashMap<DurableKey, u64>,
    members: HashMap<u64, MemberInfo>,
}

struct BrokerShared {
    state: Mutex<BrokerState>,
    config: BrokerConfig,
}

impl BrokerShared {
    fn ack(&self, key: &DurableKey, sequence: u64) {
        let mut state = self.state.lock();
        let cursor = state.cursors.entry(key.clone()).or_insert(0);
        *cursor = (*cursor).max(sequence);
    }
}

impl SubscriptionRegistry for BrokerShared {
    fn remove(&self, id: u64, forget_durable: bool) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let Some(info) = state.members.remove(&id) else {
            return;
        };

        let mut group_empty = true;
        if let Some(subject) = state.subjects.get_mut(&info.subject) {
            if let Some(group) = subject.groups.get_mut(&info.group) {
                group.members.retain(|m| m.id != id);
                group_empty = group.members.is_empty();
                if group_empty {
                    subject.groups.remove(&info.group);
                }
            }
        }

        if let Some(key) = info.durable {
            if matches!(info.group, GroupKey::Plain(_)) {
                state.active_durables.remove(&key);
            }
            if forget_durable && group_empty {
                state.cursors.remove(&key);
            }
        }
    }
}

/// In-memory implementation of the broker.
///
/// Suitable for single-process operation and tests; distributed deployments
/// put a real broker client behind [`MessageBroker`].
pub struct InMemoryBroker {
    shared: Arc<BrokerShared>,
    clock: Arc<dyn TimeSource>,
    events_published: AtomicU64,
    subscriptions_opened: AtomicU64,
}

impl InMemoryBroker {
    /// Create a broker with default retention and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create a broker with the given configuration.
    #[must_use]
    pub fn with_config(config: BrokerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Create a broker that stamps messages with `clock`.
    #[must_use]
    pub fn with_clock(config: BrokerConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            shared: Arc::new(BrokerShared {
                state: Mutex::new(BrokerState::default()),
                config,
            }),
            clock,
            events_published: AtomicU64::new(0),
            subscriptions_opened: AtomicU64::new(0),
        }
    }

    /// Stop accepting publishes and subscriptions, ending all deliveries.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        for subject in state.subjects.values_mut() {
            subject.groups.clear();
        }
        state.members.clear();
        state.active_durables.clear();
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.state.lock().members.len()
    }

    /// Total messages accepted.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Total subscriptions successfully opened.
    #[must_use]
    pub fn subscriptions_opened(&self) -> u64 {
        self.subscriptions_opened.load(Ordering::Relaxed)
    }

    /// Retained history of a subject, oldest first.
    #[must_use]
    pub fn retained(&self, subject: &str) -> Vec<Message> {
        self.shared
            .state
            .lock()
            .subjects
            .get(subject)
            .map(|s| s.log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sequence number of the newest message on a subject (0 if none).
    #[must_use]
    pub fn last_sequence(&self, subject: &str) -> u64 {
        self.shared
            .state
            .lock()
            .subjects
            .get(subject)
            .map_or(0, |s| s.last_sequence)
    }

    /// Last acknowledged sequence stored for a durable.
    #[must_use]
    pub fn durable_cursor(&self, subject: &str, queue_group: &str, durable: &str) -> Option<u64> {
        let key = DurableKey {
            subject: subject.to_string(),
            queue_group: queue_group.to_string(),
            durable: durable.to_string(),
        };
        self.shared.state.lock().cursors.get(&key).copied()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_subject(subject: &str) -> Result<(), BusError> {
    if subject.is_empty() || subject.chars().any(char::is_whitespace) {
        return Err(BusError::InvalidSubject(subject.to_string()));
    }
    Ok(())
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, subject: &str, data: Vec<u8>) -> Result<u64, BusError> {
        validate_subject(subject)?;
        let timestamp = self.clock.now();
        let max_retained = self.shared.config.max_retained_messages;

        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(BusError::Closed);
        }

        let entry = state.subjects.entry(subject.to_string()).or_default();
        entry.last_sequence += 1;
        let message = Message {
            subject: subject.to_string(),
            sequence: entry.last_sequence,
            timestamp,
            data,
            redelivered: false,
        };

        entry.log.push_back(message.clone());
        while entry.log.len() > max_retained {
            entry.log.pop_front();
        }

        let receivers = entry
            .groups
            .values_mut()
            .map(|group| group.deliver(&message))
            .filter(|delivered| *delivered)
            .count();
        drop(state);

        self.events_published.fetch_add(1, Ordering::Relaxed);
        debug!(
            subject = subject,
            sequence = message.sequence,
            receivers = receivers,
            "Message published"
        );
        Ok(message.sequence)
    }

    async fn queue_subscribe(
        &self,
        subject: &str,
        queue_group: &str,
        options: SubscriptionOptions,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Subscription, BusError> {
        validate_subject(subject)?;
        if options
            .durable_name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(BusError::InvalidDurableName {
                subject: subject.to_string(),
            });
        }

        let durable = options.durable_name.clone().map(|durable| DurableKey {
            subject: subject.to_string(),
            queue_group: queue_group.to_string(),
            durable,
        });
        let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();

        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.closed {
            return Err(BusError::Closed);
        }
        if let Some(key) = durable.as_ref().filter(|_| queue_group.is_empty()) {
            if state.active_durables.contains_key(key) {
                return Err(BusError::DuplicateDurable {
                    subject: subject.to_string(),
                    durable: key.durable.clone(),
                });
            }
        }

        state.next_id += 1;
        let id = state.next_id;
        let group_key = if queue_group.is_empty() {
            GroupKey::Plain(id)
        } else {
            GroupKey::Queue(queue_group.to_string())
        };

        let subject_state = state.subjects.entry(subject.to_string()).or_default();
        let group = subject_state.groups.entry(group_key.clone()).or_default();

        // A member joining a live queue group shares the group's position.
        if group.members.is_empty() {
            let start = match durable.as_ref().and_then(|k| state.cursors.get(k)) {
                Some(last_acked) => StartPosition::AtSequence(last_acked + 1),
                None => options.start,
            };
            for message in subject_state.log.iter().filter(|m| start.includes(m)) {
                let mut replayed = message.clone();
                replayed.redelivered = true;
                // Receiver is held locally, so this cannot fail.
                let _ = sender.send(replayed);
            }
        }
        group.members.push(Member { id, sender });

        if let Some(key) = durable.as_ref().filter(|_| queue_group.is_empty()) {
            state.active_durables.insert(key.clone(), id);
        }
        state.members.insert(
            id,
            MemberInfo {
                subject: subject.to_string(),
                group: group_key,
                durable: durable.clone(),
            },
        );
        drop(guard);

        let weak_shared = Arc::downgrade(&self.shared);
        let task_subject = subject.to_string();
        let task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let sequence = message.sequence;
                handler.handle(message).await;

                if let Some(key) = durable.as_ref() {
                    match weak_shared.upgrade() {
                        Some(shared) => shared.ack(key, sequence),
                        None => {
                            warn!(subject = %task_subject, "Broker dropped during delivery");
                            break;
                        }
                    }
                }
            }
        });

        self.subscriptions_opened.fetch_add(1, Ordering::Relaxed);
        debug!(
            subject = subject,
            queue_group = queue_group,
            durable = ?options.durable_name,
            start = ?options.start,
            "Subscription opened"
        );

        let weak = Arc::downgrade(&self.shared);
        let registry: Weak<dyn SubscriptionRegistry> = weak;
        Ok(Subscription::new(
            id,
            subject.to_string(),
            queue_group.to_string(),
            options.durable_name,
            task,
            registry,
        ))
    }
}
