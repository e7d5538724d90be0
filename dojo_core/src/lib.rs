#![forbid(unsafe_code)]

//! Core domain model and persistence for the Dojo training system.
//!
//! This crate provides:
//! - The workout plan data model (blocks, workouts)
//! - The training session state machine and its domain events
//! - Event-sourced persistence (append-only streams, snapshots)
//! - Repositories and the application command surface

pub mod bus;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event_store;
pub mod events;
pub mod export;
pub mod logging;
pub mod service;
pub mod session;
pub mod session_repo;
pub mod types;
pub mod workout_repo;

// Re-export commonly used types
pub use bus::EventBus;
pub use catalog::seed_plans;
pub use config::Config;
pub use error::{Error, Result};
pub use event_store::{EventStore, InMemoryEventStore, JsonlEventStore};
pub use events::{DomainEvent, EventPayload, EventRegistry, StoredEvent};
pub use service::TrainingService;
pub use session::{SessionStatus, TrainingSession};
pub use session_repo::{SessionRepository, SessionSnapshot};
pub use types::*;
pub use workout_repo::WorkoutRepository;
