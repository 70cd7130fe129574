//! Mock ticket API with simulated latency.
//!
//! The collection lives either in process memory or mirrored to a
//! [`KvStore`] under [`keys::TICKETS`]. Every operation sleeps for its
//! configured latency before touching the collection.
//!
//! # Invariants
//!
//! - Ids are unique and never reused: the next id is
//!   `max(high-water mark, highest live id, 100) + 1`, and the high-water
//!   mark is persisted under [`keys::TICKET_SEQ`].
//! - [`TicketStore::list`] returns tickets descending by id.
//! - Operations on one store are serialized through an async mutex held
//!   across the latency sleep and the mutation.
//! - A persisted operation reads, mutates and writes back inside one
//!   [`KvStore::exclusive`] section, so stores in other processes sharing
//!   the directory never lose an update or reuse an id. The sequence is
//!   written before the tickets, so the stored high-water mark is never
//!   below a stored id.
//! - A future dropped before its sleep completes has not mutated anything.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ErrorCode;
use crate::model::{Priority, Status, Ticket, TicketDraft, TicketId, ValidationError};
use crate::model::ticket::normalize_description;
use crate::storage::{KvStore, KvStoreExt, StorageError, keys};

/// Ids are assigned above this floor.
pub const ID_FLOOR: TicketId = 100;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Ticket #{id} not found.")]
    NotFound { id: TicketId },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl TicketError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(err) => err.code(),
            Self::NotFound { .. } => ErrorCode::TicketNotFound,
            Self::Storage(err) => err.code(),
            Self::Task(_) => ErrorCode::InternalUnexpected,
        }
    }
}

// ---------------------------------------------------------------------------
// Latency
// ---------------------------------------------------------------------------

/// Per-operation simulated latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub list: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            list: Duration::from_millis(500),
            create: Duration::from_millis(400),
            update: Duration::from_millis(400),
            delete: Duration::from_millis(300),
        }
    }
}

impl Latency {
    #[must_use]
    pub const fn uniform(delay: Duration) -> Self {
        Self {
            list: delay,
            create: delay,
            update: delay,
            delete: delay,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self::uniform(Duration::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

enum Backing {
    Memory,
    Persisted(Arc<dyn KvStore>),
}

#[derive(Debug, Default)]
struct Collection {
    tickets: Vec<Ticket>,
    high_water: TicketId,
    /// A ticket list exists in storage (persisted backing only).
    stored: bool,
    dirty: bool,
}

impl Collection {
    fn next_id(&mut self) -> TicketId {
        let live_max = self.tickets.iter().map(|t| t.id).max().unwrap_or(0);
        let next = self.high_water.max(live_max).max(ID_FLOOR) + 1;
        self.high_water = next;
        next
    }

    fn find(&self, id: TicketId) -> Result<&Ticket, TicketError> {
        self.tickets
            .iter()
            .find(|t| t.id == id)
            .ok_or(TicketError::NotFound { id })
    }

    fn find_mut(&mut self, id: TicketId) -> Result<&mut Ticket, TicketError> {
        self.dirty = true;
        self.tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TicketError::NotFound { id })
    }

    fn push_front(&mut self, ticket: Ticket) {
        self.tickets.insert(0, ticket);
        self.dirty = true;
    }

    fn remove(&mut self, id: TicketId) -> Result<(), TicketError> {
        let index = self
            .tickets
            .iter()
            .position(|t| t.id == id)
            .ok_or(TicketError::NotFound { id })?;
        self.tickets.remove(index);
        self.dirty = true;
        Ok(())
    }

    fn replace(&mut self, tickets: Vec<Ticket>) {
        let live_max = tickets.iter().map(|t| t.id).max().unwrap_or(0);
        self.high_water = self.high_water.max(live_max);
        self.tickets = tickets;
        self.dirty = true;
    }

    fn load(&mut self, kv: &dyn KvStore) -> Result<(), StorageError> {
        let tickets: Option<Vec<Ticket>> = kv.get_json(keys::TICKETS)?;
        self.stored = tickets.is_some();
        self.tickets = tickets.unwrap_or_default();
        let stored_seq: TicketId = kv.get_json(keys::TICKET_SEQ)?.unwrap_or(0);
        self.high_water = self.high_water.max(stored_seq);
        self.dirty = false;
        Ok(())
    }

    fn save(&self, kv: &dyn KvStore) -> Result<(), StorageError> {
        kv.set_json(keys::TICKET_SEQ, &self.high_water)?;
        kv.set_json(keys::TICKETS, &self.tickets)
    }
}

pub struct TicketStore {
    backing: Backing,
    latency: Latency,
    collection: Mutex<Collection>,
}

impl TicketStore {
    /// Empty store held in process memory.
    #[must_use]
    pub fn in_memory(latency: Latency) -> Self {
        Self::with_tickets(Vec::new(), latency)
    }

    /// Memory store preloaded with `tickets`.
    #[must_use]
    pub fn with_tickets(tickets: Vec<Ticket>, latency: Latency) -> Self {
        let high_water = tickets.iter().map(|t| t.id).max().unwrap_or(0);
        Self {
            backing: Backing::Memory,
            latency,
            collection: Mutex::new(Collection {
                tickets,
                high_water,
                ..Collection::default()
            }),
        }
    }

    /// Store mirrored to durable storage. Nothing is read until the first
    /// operation.
    #[must_use]
    pub fn persisted(kv: Arc<dyn KvStore>, latency: Latency) -> Self {
        Self {
            backing: Backing::Persisted(kv),
            latency,
            collection: Mutex::new(Collection::default()),
        }
    }

    #[must_use]
    pub const fn latency(&self) -> Latency {
        self.latency
    }

    /// Write the demo tickets when no collection exists yet.
    ///
    /// Returns `true` if the demo data was written. A memory store is
    /// seeded only while it is empty and has never assigned an id.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if storage cannot be read or written.
    pub async fn seed_demo_if_absent(&self) -> Result<bool, TicketError> {
        let persisted = matches!(self.backing, Backing::Persisted(_));
        self.run(Duration::ZERO, move |collection| {
            let absent = if persisted {
                !collection.stored
            } else {
                collection.tickets.is_empty() && collection.high_water == 0
            };
            if !absent {
                return Ok(false);
            }
            collection.replace(demo_tickets(Utc::now()));
            debug!(count = collection.tickets.len(), "seeded demo tickets");
            Ok(true)
        })
        .await
    }

    /// All tickets, newest (highest id) first.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Storage`] if the mirror cannot be read.
    pub async fn list(&self) -> Result<Vec<Ticket>, TicketError> {
        let mut tickets = self
            .run(self.latency.list, |collection| Ok(collection.tickets.clone()))
            .await?;
        tickets.sort_by(|a, b| b.id.cmp(&a.id));
        debug!(count = tickets.len(), "tickets listed");
        Ok(tickets)
    }

    /// One ticket by id.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`] if no ticket has `id`.
    pub async fn get(&self, id: TicketId) -> Result<Ticket, TicketError> {
        self.run(self.latency.list, move |collection| {
            collection.find(id).cloned()
        })
        .await
    }

    /// Assign an id and creation time, apply defaults, and prepend.
    ///
    /// # Errors
    ///
    /// - [`TicketError::Validation`] for a blank title or long description.
    /// - [`TicketError::Storage`] if the mirror cannot be written.
    pub async fn create(&self, draft: TicketDraft) -> Result<Ticket, TicketError> {
        draft.validate()?;
        self.run(self.latency.create, move |collection| {
            let id = collection.next_id();
            let ticket = draft.into_ticket(id, Utc::now());
            collection.push_front(ticket.clone());
            debug!(id, status = %ticket.status, "ticket created");
            Ok(ticket)
        })
        .await
    }

    /// Replace every mutable field of an existing ticket.
    ///
    /// `createdAt` keeps its stored value whatever the caller passes.
    ///
    /// # Errors
    ///
    /// - [`TicketError::Validation`] for a blank title or long description.
    /// - [`TicketError::NotFound`] if `ticket.id` is absent; nothing changes.
    pub async fn update(&self, ticket: Ticket) -> Result<Ticket, TicketError> {
        ticket.validate()?;
        self.run(self.latency.update, move |collection| {
            let stored = collection.find_mut(ticket.id)?;
            stored.title = ticket.title.trim().to_string();
            stored.description = normalize_description(ticket.description);
            stored.status = ticket.status;
            stored.priority = ticket.priority;
            debug!(id = stored.id, status = %stored.status, "ticket updated");
            Ok(stored.clone())
        })
        .await
    }

    /// Remove one ticket.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`] if no ticket has `id`; nothing changes.
    pub async fn delete(&self, id: TicketId) -> Result<(), TicketError> {
        self.run(self.latency.delete, move |collection| {
            collection.remove(id)?;
            debug!(id, "ticket deleted");
            Ok(())
        })
        .await
    }

    /// Take the queue slot, wait out the latency, then apply `op`.
    ///
    /// A persisted store loads, applies and saves inside one exclusive
    /// storage section on the blocking pool. A failed `op` saves nothing.
    async fn run<T, F>(&self, delay: Duration, op: F) -> Result<T, TicketError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Collection) -> Result<T, TicketError> + Send + 'static,
    {
        let mut collection = self.collection.lock().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let Backing::Persisted(kv) = &self.backing else {
            return op(&mut *collection);
        };
        let kv = Arc::clone(kv);
        let high_water = collection.high_water;
        let (outcome, high_water) = tokio::task::spawn_blocking(move || {
            let mut working = Collection {
                high_water,
                ..Collection::default()
            };
            let outcome = kv.with_exclusive(|view| {
                working.load(view)?;
                let result = op(&mut working);
                if result.is_ok() && working.dirty {
                    working.save(view)?;
                }
                Ok(result)
            });
            (outcome, working.high_water)
        })
        .await?;

        collection.high_water = high_water;
        outcome?
    }
}

/// The three sample tickets written on first use.
#[must_use]
pub fn demo_tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    vec![
        Ticket {
            id: 101,
            title: "Database Migration Failure".to_string(),
            description: Some(
                "The nightly migration script failed to connect to the staging database."
                    .to_string(),
            ),
            status: Status::Open,
            priority: Priority::High,
            created_at: now - chrono::Duration::milliseconds(500_000),
        },
        Ticket {
            id: 102,
            title: "Update Button Styling".to_string(),
            description: Some(
                "The primary blue button on the dashboard is slightly off-brand.".to_string(),
            ),
            status: Status::InProgress,
            priority: Priority::Low,
            created_at: now - chrono::Duration::milliseconds(300_000),
        },
        Ticket {
            id: 103,
            title: "Authentication Flow Test".to_string(),
            description: Some(
                "Confirmed that the new logout function clears the session correctly."
                    .to_string(),
            ),
            status: Status::Closed,
            priority: Priority::Medium,
            created_at: now - chrono::Duration::milliseconds(100_000),
        },
    ]
}
