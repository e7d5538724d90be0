//! Domain events emitted by training sessions.
//!
//! Events are immutable facts with a stable name, a timestamp and a schema
//! version. The in-memory shape ([`DomainEvent`]) is kept separate from the
//! storage envelope ([`StoredEvent`]) so the persisted format can evolve
//! independently.

use crate::{BlockType, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Current schema version stamped on newly created events
pub const EVENT_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Event payloads
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub workout_id: Uuid,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionPaused {
    pub session_id: Uuid,
    pub paused_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResumed {
    pub session_id: Uuid,
    pub resumed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionCompleted {
    pub session_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// Emitted on every tick that ends inside a valid block
///
/// Carries the full positional state; this is the sole feed for downstream
/// coaching and audio consumers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionTicked {
    pub session_id: Uuid,
    pub current_block_index: usize,
    pub block_type: BlockType,
    pub current_round: u32,
    pub time_left: u32,
    pub is_work_phase: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockStarted {
    pub session_id: Uuid,
    pub block_index: usize,
    pub block_type: BlockType,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoundStarted {
    pub session_id: Uuid,
    pub round_number: u32,
    pub total_rounds: u32,
    /// Phase duration in seconds
    pub duration: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RestStarted {
    pub session_id: Uuid,
    pub duration: u32,
}

/// Requests a voice announcement from the audio boundary
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnnouncementTriggered {
    pub session_id: Uuid,
    pub text: String,
}

/// The closed catalogue of event kinds
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    SessionStarted(SessionStarted),
    SessionPaused(SessionPaused),
    SessionResumed(SessionResumed),
    SessionCompleted(SessionCompleted),
    SessionTicked(SessionTicked),
    BlockStarted(BlockStarted),
    RoundStarted(RoundStarted),
    RestStarted(RestStarted),
    AnnouncementTriggered(AnnouncementTriggered),
}

impl EventPayload {
    /// Stable event-type name used in storage and for bus subscriptions
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::SessionStarted(_) => "SessionStarted",
            EventPayload::SessionPaused(_) => "SessionPaused",
            EventPayload::SessionResumed(_) => "SessionResumed",
            EventPayload::SessionCompleted(_) => "SessionCompleted",
            EventPayload::SessionTicked(_) => "SessionTicked",
            EventPayload::BlockStarted(_) => "BlockStarted",
            EventPayload::RoundStarted(_) => "RoundStarted",
            EventPayload::RestStarted(_) => "RestStarted",
            EventPayload::AnnouncementTriggered(_) => "AnnouncementTriggered",
        }
    }

    /// Serialize just the payload fields (the envelope carries the type name)
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            EventPayload::SessionStarted(p) => serde_json::to_string(p)?,
            EventPayload::SessionPaused(p) => serde_json::to_string(p)?,
            EventPayload::SessionResumed(p) => serde_json::to_string(p)?,
            EventPayload::SessionCompleted(p) => serde_json::to_string(p)?,
            EventPayload::SessionTicked(p) => serde_json::to_string(p)?,
            EventPayload::BlockStarted(p) => serde_json::to_string(p)?,
            EventPayload::RoundStarted(p) => serde_json::to_string(p)?,
            EventPayload::RestStarted(p) => serde_json::to_string(p)?,
            EventPayload::AnnouncementTriggered(p) => serde_json::to_string(p)?,
        };
        Ok(json)
    }
}

// ============================================================================
// Domain event
// ============================================================================

/// An immutable, versioned domain fact
#[derive(Clone, Debug, PartialEq)]
pub struct DomainEvent {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub schema_version: u32,
    pub correlation_id: Option<String>,
    pub payload: EventPayload,
}

impl DomainEvent {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_on: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            correlation_id: None,
            payload,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

// ============================================================================
// Storage envelope
// ============================================================================

/// On-disk representation of an event, one JSON object per line
///
/// A storage-format wrapper distinct from [`DomainEvent`]: the serialized
/// payload travels as an opaque string keyed by `event_type`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_version: u64,
    pub event_type: String,
    pub event_data: String,
    pub schema_version: u32,
    pub stored_at: DateTime<Utc>,
    pub correlation_id: Option<String>,
}

impl StoredEvent {
    /// Wrap a domain event for storage at the given stream position
    pub fn from_domain(
        aggregate_id: Uuid,
        aggregate_version: u64,
        event: &DomainEvent,
    ) -> Result<Self> {
        Ok(Self {
            event_id: event.event_id,
            aggregate_id,
            aggregate_version,
            event_type: event.event_type().to_string(),
            event_data: event.payload.to_json()?,
            schema_version: event.schema_version,
            stored_at: Utc::now(),
            correlation_id: event.correlation_id.clone(),
        })
    }
}

// ============================================================================
// Decoder registry
// ============================================================================

type DecodeFn = fn(&str) -> Result<EventPayload>;

/// Explicit mapping from event-type name to payload decoder
///
/// Assembled once at startup and handed to the event store; replay of an
/// event type the registry does not know is skipped with a warning rather
/// than failing the whole read.
#[derive(Clone)]
pub struct EventRegistry {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl EventRegistry {
    /// An empty registry; mainly useful in tests
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// The full catalogue of event types this crate knows how to decode
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("SessionStarted", |data| {
            Ok(EventPayload::SessionStarted(serde_json::from_str(data)?))
        });
        registry.register("SessionPaused", |data| {
            Ok(EventPayload::SessionPaused(serde_json::from_str(data)?))
        });
        registry.register("SessionResumed", |data| {
            Ok(EventPayload::SessionResumed(serde_json::from_str(data)?))
        });
        registry.register("SessionCompleted", |data| {
            Ok(EventPayload::SessionCompleted(serde_json::from_str(data)?))
        });
        registry.register("SessionTicked", |data| {
            Ok(EventPayload::SessionTicked(serde_json::from_str(data)?))
        });
        registry.register("BlockStarted", |data| {
            Ok(EventPayload::BlockStarted(serde_json::from_str(data)?))
        });
        registry.register("RoundStarted", |data| {
            Ok(EventPayload::RoundStarted(serde_json::from_str(data)?))
        });
        registry.register("RestStarted", |data| {
            Ok(EventPayload::RestStarted(serde_json::from_str(data)?))
        });
        registry.register("AnnouncementTriggered", |data| {
            Ok(EventPayload::AnnouncementTriggered(serde_json::from_str(
                data,
            )?))
        });
        registry
    }

    pub fn register(&mut self, event_type: &'static str, decode: DecodeFn) {
        self.decoders.insert(event_type, decode);
    }

    /// Decode a stored record back into a domain event
    ///
    /// Returns `Ok(None)` for event types the registry does not know.
    pub fn decode(&self, stored: &StoredEvent) -> Result<Option<DomainEvent>> {
        let Some(decode) = self.decoders.get(stored.event_type.as_str()) else {
            return Ok(None);
        };

        let payload = decode(&stored.event_data).map_err(|e| {
            Error::Other(format!(
                "Failed to decode {} payload: {}",
                stored.event_type, e
            ))
        })?;

        Ok(Some(DomainEvent {
            event_id: stored.event_id,
            occurred_on: stored.stored_at,
            schema_version: stored.schema_version,
            correlation_id: stored.correlation_id.clone(),
            payload,
        }))
    }
}
