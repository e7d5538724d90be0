//! Session persistence: event stream plus state snapshot.
//!
//! The event stream is the source of truth; the snapshot is a cache of
//! current state so loads do not replay from the beginning. Saves append
//! first, snapshot second, and publish last; loads detect a snapshot that
//! fell behind the stream and replay the missed events onto it.

use crate::bus::EventBus;
use crate::event_store::EventStore;
use crate::events::DomainEvent;
use crate::session::TrainingSession;
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Full-state snapshot document, one per session id
///
/// `version` records the stream length the snapshot reflects; a stream
/// that is ahead of it means a snapshot write was lost.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u64,
    pub session: TrainingSession,
}

/// Mediates save/load for training sessions
pub struct SessionRepository<S: EventStore> {
    store: S,
    snapshot_dir: PathBuf,
    bus: Option<EventBus>,
}

impl<S: EventStore> SessionRepository<S> {
    pub fn new(store: S, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            snapshot_dir: snapshot_dir.into(),
            bus: None,
        }
    }

    /// Attach a bus; drained events are published after each durable append
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    pub fn event_store(&self) -> &S {
        &self.store
    }

    /// Persist a command's outcome: append its events under the current
    /// stream version, overwrite the snapshot, then publish.
    pub fn save(&self, session: &TrainingSession, events: &[DomainEvent]) -> Result<()> {
        let version = if events.is_empty() {
            self.store.version(session.id)?
        } else {
            let expected = self.store.version(session.id)?;
            self.store.append(session.id, events, expected)?
        };

        let snapshot = SessionSnapshot {
            version,
            session: session.clone(),
        };
        self.write_snapshot(&snapshot)?;

        if let Some(bus) = &self.bus {
            bus.publish(events);
        }

        Ok(())
    }

    /// Load the session for `id`, catching the snapshot up to the stream
    /// when the two have diverged
    pub fn get_by_id(&self, id: Uuid) -> Result<TrainingSession> {
        let snapshot = self
            .read_snapshot(id)?
            .ok_or(Error::SessionNotFound(id))?;

        let mut session = snapshot.session;
        let stream_version = self.store.version(id)?;

        if stream_version > snapshot.version {
            tracing::warn!(
                "Snapshot for session {} is behind its stream ({} < {}); replaying missed events",
                id,
                snapshot.version,
                stream_version
            );
            for event in self.store.load_since(id, snapshot.version)? {
                session.apply(&event);
            }
        }

        Ok(session)
    }

    fn snapshot_path(&self, id: Uuid) -> PathBuf {
        self.snapshot_dir.join(format!("{}.json", id))
    }

    /// Atomic snapshot write: temp file, sync, rename over the old one
    fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.snapshot_dir)?;

        let temp = NamedTempFile::new_in(&self.snapshot_dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(snapshot)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        let path = self.snapshot_path(snapshot.session.id);
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(
            "Saved snapshot for session {} at stream version {}",
            snapshot.session.id,
            snapshot.version
        );
        Ok(())
    }

    fn read_snapshot(&self, id: Uuid) -> Result<Option<SessionSnapshot>> {
        let path = self.snapshot_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        reader.read_to_string(&mut contents)?;
        file.unlock()?;

        let snapshot: SessionSnapshot = serde_json::from_str(&contents)?;
        Ok(Some(snapshot))
    }
}
