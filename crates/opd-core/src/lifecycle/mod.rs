//! Lifecycle orchestrator.
//!
//! Record writes report [`Event`]s to an [`Orchestrator`], which runs every
//! registered [`Reaction`] matching the event's (entity, phase) pair in
//! registration order. Reactions may emit follow-up events; those are queued
//! and processed in the same dispatch, which is how the registration cascade
//! walks principal → doctor → OPD → inventory.
//!
//! ```text
//! Principal created ─┬─ issue_credentials
//!                    └─ create_placeholder_doctor ── Doctor created
//!                                                        │
//!                                  create_placeholder_opd ┘── Opd created
//!                                                                │
//!                                              create_inventory ─┘
//! ```
//!
//! Dispatch runs on the caller's [`Store`], so inside a unit of work every
//! reaction commits or rolls back together with the write that triggered it.

mod reactions;

pub use reactions::*;

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::db::{DbError, Store};

/// Entity types that take part in lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Principal,
    Address,
    Doctor,
    Opd,
    Inventory,
    Appointment,
    Patient,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Principal => "principal",
            EntityKind::Address => "address",
            EntityKind::Doctor => "doctor",
            EntityKind::Opd => "opd",
            EntityKind::Inventory => "inventory",
            EntityKind::Appointment => "appointment",
            EntityKind::Patient => "patient",
        };
        f.write_str(name)
    }
}

/// Point in a record's lifecycle an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Created,
    /// Fired before the record is deleted, while it can still be read
    PreDelete,
    Deleted,
}

/// A lifecycle event for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EntityKind,
    pub phase: Phase,
    pub id: String,
    /// Owning doctor for doctor-owned records. Deleted rows can no longer be
    /// read, so the owner travels with the event.
    pub owner: Option<String>,
}

impl Event {
    pub fn created(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            phase: Phase::Created,
            id: id.into(),
            owner: None,
        }
    }

    pub fn pre_delete(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            phase: Phase::PreDelete,
            id: id.into(),
            owner: None,
        }
    }

    pub fn deleted(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            phase: Phase::Deleted,
            id: id.into(),
            owner: None,
        }
    }

    pub fn owned_by(mut self, doctor_id: impl Into<String>) -> Self {
        self.owner = Some(doctor_id.into());
        self
    }
}

/// Errors raised inside a single reaction.
#[derive(Error, Debug)]
pub enum ReactionError {
    #[error("{kind} {id} has no {missing} to update")]
    OrphanReference {
        kind: EntityKind,
        id: String,
        missing: &'static str,
    },

    #[error("Store error: {0}")]
    Database(#[from] DbError),
}

pub type ReactionResult<T> = Result<T, ReactionError>;

/// A reaction failure with the context needed for manual reconciliation.
#[derive(Error, Debug)]
#[error("reaction {reaction} failed for {kind} {id}: {source}")]
pub struct LifecycleError {
    pub reaction: &'static str,
    pub kind: EntityKind,
    pub id: String,
    #[source]
    pub source: ReactionError,
}

/// Handler signature. Returns the follow-up events it caused.
pub type Handler = fn(&Store<'_>, &Event) -> ReactionResult<Vec<Event>>;

/// A handler bound to one (entity, phase) pair.
#[derive(Clone)]
pub struct Reaction {
    pub name: &'static str,
    pub kind: EntityKind,
    pub phase: Phase,
    pub handler: Handler,
}

impl Reaction {
    pub fn new(name: &'static str, kind: EntityKind, phase: Phase, handler: Handler) -> Self {
        Self {
            name,
            kind,
            phase,
            handler,
        }
    }

    fn matches(&self, event: &Event) -> bool {
        self.kind == event.kind && self.phase == event.phase
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("phase", &self.phase)
            .finish()
    }
}

/// Ordered reaction registry, built once at startup and passed to the
/// access layer.
#[derive(Debug, Default)]
pub struct Orchestrator {
    reactions: Vec<Reaction>,
    failures: AtomicU64,
}

impl Orchestrator {
    /// Orchestrator with no reactions registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Orchestrator carrying the standard cascade and counter reactions.
    pub fn with_default_reactions() -> Self {
        let mut orchestrator = Self::empty();
        for reaction in default_reactions() {
            orchestrator.register(reaction);
        }
        orchestrator
    }

    /// Append a reaction. It runs after every reaction already registered
    /// for the same pair.
    pub fn register(&mut self, reaction: Reaction) {
        self.reactions.push(reaction);
    }

    /// Registered reactions in dispatch order.
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// Reaction failures observed since construction.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Run every reaction for `event` and for the events they emit.
    ///
    /// Stops at the first failing reaction. Writes made so far stay on the
    /// store; the caller's unit of work decides whether they are rolled back.
    pub fn dispatch(&self, store: &Store<'_>, event: Event) -> Result<(), LifecycleError> {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for reaction in self.reactions.iter().filter(|r| r.matches(&event)) {
                tracing::debug!(
                    reaction = reaction.name,
                    entity = %event.kind,
                    id = %event.id,
                    "running lifecycle reaction"
                );

                match (reaction.handler)(store, &event) {
                    Ok(follow_ups) => queue.extend(follow_ups),
                    Err(source) => {
                        self.failures.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(
                            reaction = reaction.name,
                            entity = %event.kind,
                            id = %event.id,
                            error = %source,
                            "lifecycle reaction failed"
                        );
                        return Err(LifecycleError {
                            reaction: reaction.name,
                            kind: event.kind,
                            id: event.id.clone(),
                            source,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn emit_doctor(_: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
        Ok(vec![Event::created(EntityKind::Doctor, format!("{}-doctor", event.id))])
    }

    fn fail_orphan(_: &Store<'_>, event: &Event) -> ReactionResult<Vec<Event>> {
        Err(ReactionError::OrphanReference {
            kind: event.kind,
            id: event.id.clone(),
            missing: "opd",
        })
    }

    #[test]
    fn test_default_registry_order() {
        let orchestrator = Orchestrator::with_default_reactions();
        let names: Vec<_> = orchestrator.reactions().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "issue_credentials",
                "create_placeholder_doctor",
                "create_placeholder_opd",
                "create_inventory",
                "cascade_principal_delete",
                "count_appointment_created",
                "count_appointment_deleted",
                "count_patient_created",
                "count_patient_deleted",
            ]
        );
    }

    #[test]
    fn test_follow_up_events_are_dispatched() {
        let db = Database::open_in_memory().unwrap();
        let mut orchestrator = Orchestrator::empty();
        orchestrator.register(Reaction::new(
            "emit_doctor",
            EntityKind::Principal,
            Phase::Created,
            emit_doctor,
        ));
        orchestrator.register(Reaction::new(
            "fail_on_doctor",
            EntityKind::Doctor,
            Phase::Created,
            fail_orphan,
        ));

        let err = orchestrator
            .dispatch(&db.store(), Event::created(EntityKind::Principal, "p1"))
            .unwrap_err();

        assert_eq!(err.reaction, "fail_on_doctor");
        assert_eq!(err.kind, EntityKind::Doctor);
        assert_eq!(err.id, "p1-doctor");
        assert_eq!(orchestrator.failure_count(), 1);
    }

    #[test]
    fn test_unmatched_event_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let orchestrator = Orchestrator::with_default_reactions();

        orchestrator
            .dispatch(&db.store(), Event::deleted(EntityKind::Inventory, "i1"))
            .unwrap();
        assert_eq!(orchestrator.failure_count(), 0);
    }
}
