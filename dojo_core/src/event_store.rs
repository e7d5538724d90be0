//! Append-only event streams with optimistic concurrency.
//!
//! Each aggregate gets its own JSONL file: one self-describing record per
//! line, each carrying its stream version. Streams rebuild by linear scan,
//! and a crash mid-append corrupts at most the last line.

use crate::events::{DomainEvent, EventRegistry, StoredEvent};
use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Per-aggregate append-only event log
///
/// `append` rejects with [`Error::VersionConflict`] unless the stream's
/// current version matches `expected_version`; there is no bypass. Callers
/// read the current version first and pass it back.
pub trait EventStore: Send + Sync {
    /// Append `events` after position `expected_version`; returns the new
    /// stream version.
    fn append(
        &self,
        aggregate_id: Uuid,
        events: &[DomainEvent],
        expected_version: u64,
    ) -> Result<u64>;

    /// Replay the full stream in append order
    fn load(&self, aggregate_id: Uuid) -> Result<Vec<DomainEvent>>;

    /// Replay only the events stored after position `after_version`
    fn load_since(&self, aggregate_id: Uuid, after_version: u64) -> Result<Vec<DomainEvent>>;

    /// Current stream version (0 for an unknown aggregate)
    fn version(&self, aggregate_id: Uuid) -> Result<u64>;
}

/// JSONL-backed event store with advisory file locking
pub struct JsonlEventStore {
    base_dir: PathBuf,
    registry: EventRegistry,
}

impl JsonlEventStore {
    /// Create a store rooted at `base_dir`, decoding replayed events
    /// through the given registry
    pub fn new(base_dir: impl Into<PathBuf>, registry: EventRegistry) -> Self {
        Self {
            base_dir: base_dir.into(),
            registry,
        }
    }

    fn stream_path(&self, aggregate_id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.jsonl", aggregate_id))
    }

    fn ensure_base_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

impl EventStore for JsonlEventStore {
    fn append(
        &self,
        aggregate_id: Uuid,
        events: &[DomainEvent],
        expected_version: u64,
    ) -> Result<u64> {
        if events.is_empty() {
            return self.version(aggregate_id);
        }

        self.ensure_base_dir()?;

        let path = self.stream_path(aggregate_id);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        // Exclusive lock for the read-check-write cycle
        file.lock_exclusive()?;

        let result = append_locked(&file, aggregate_id, events, expected_version);

        file.unlock()?;

        let new_version = result?;
        tracing::debug!(
            "Appended {} events to stream {} (version {})",
            events.len(),
            aggregate_id,
            new_version
        );
        Ok(new_version)
    }

    fn load(&self, aggregate_id: Uuid) -> Result<Vec<DomainEvent>> {
        self.load_since(aggregate_id, 0)
    }

    fn load_since(&self, aggregate_id: Uuid, after_version: u64) -> Result<Vec<DomainEvent>> {
        let path = self.stream_path(aggregate_id);
        let records = read_records(&path)?;

        let mut events = Vec::new();
        for record in records {
            if record.aggregate_version <= after_version {
                continue;
            }
            match self.registry.decode(&record) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {
                    tracing::warn!(
                        "Skipping unknown event type '{}' in stream {}",
                        record.event_type,
                        aggregate_id
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping undecodable {} record in stream {}: {}",
                        record.event_type,
                        aggregate_id,
                        e
                    );
                }
            }
        }

        tracing::debug!("Loaded {} events from stream {}", events.len(), aggregate_id);
        Ok(events)
    }

    fn version(&self, aggregate_id: Uuid) -> Result<u64> {
        let records = read_records(&self.stream_path(aggregate_id))?;
        Ok(records.last().map(|r| r.aggregate_version).unwrap_or(0))
    }
}

/// The check-then-write cycle run while holding the exclusive lock
fn append_locked(
    file: &File,
    aggregate_id: Uuid,
    events: &[DomainEvent],
    expected_version: u64,
) -> Result<u64> {
    let actual = last_version_in(file)?;
    if actual != expected_version {
        return Err(Error::VersionConflict {
            aggregate_id,
            expected: expected_version,
            actual,
        });
    }

    // A torn trailing line from a crashed append must not swallow the next
    // record; start a fresh line if the file does not end in one.
    if !ends_with_newline(file)? {
        let mut writer = BufWriter::new(file);
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    let mut version = expected_version;
    let mut writer = BufWriter::new(file);
    for event in events {
        version += 1;
        let record = StoredEvent::from_domain(aggregate_id, version, event)?;
        let line = serde_json::to_string(&record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    file.sync_all()?;

    Ok(version)
}

/// True when the file is empty or its last byte is a newline
fn ends_with_newline(file: &File) -> Result<bool> {
    use std::io::Read;

    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }

    let mut handle = file.try_clone()?;
    handle.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    handle.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Version of the last well-formed record in an open stream file
fn last_version_in(file: &File) -> Result<u64> {
    let mut reader = BufReader::new(file.try_clone()?);
    reader.seek(SeekFrom::Start(0))?;

    let mut last_version = 0u64;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<StoredEvent>(&line) {
            last_version = record.aggregate_version;
        }
    }
    Ok(last_version)
}

/// Read all well-formed records from a stream file
///
/// A torn or garbled line (crash mid-append) is logged and skipped; the
/// rest of the stream stays readable.
fn read_records(path: &Path) -> Result<Vec<StoredEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<StoredEvent>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse event record at {:?}:{}: {}",
                    path,
                    line_num + 1,
                    e
                );
            }
        }
    }

    file.unlock()?;
    Ok(records)
}

/// In-memory event store with the same concurrency contract
///
/// Used by unit tests and anywhere persistence is not wanted.
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<Uuid, Vec<DomainEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        aggregate_id: Uuid,
        events: &[DomainEvent],
        expected_version: u64,
    ) -> Result<u64> {
        let mut streams = self
            .streams
            .lock()
            .map_err(|_| Error::Other("event store lock poisoned".into()))?;
        let stream = streams.entry(aggregate_id).or_default();

        let actual = stream.len() as u64;
        if actual != expected_version {
            return Err(Error::VersionConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        stream.extend(events.iter().cloned());
        Ok(stream.len() as u64)
    }

    fn load(&self, aggregate_id: Uuid) -> Result<Vec<DomainEvent>> {
        let streams = self
            .streams
            .lock()
            .map_err(|_| Error::Other("event store lock poisoned".into()))?;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    fn load_since(&self, aggregate_id: Uuid, after_version: u64) -> Result<Vec<DomainEvent>> {
        let streams = self
            .streams
            .lock()
            .map_err(|_| Error::Other("event store lock poisoned".into()))?;
        let events = streams
            .get(&aggregate_id)
            .map(|stream| {
                stream
                    .iter()
                    .skip(after_version as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(events)
    }

    fn version(&self, aggregate_id: Uuid) -> Result<u64> {
        let streams = self
            .streams
            .lock()
            .map_err(|_| Error::Other("event store lock poisoned".into()))?;
        Ok(streams.get(&aggregate_id).map(|s| s.len() as u64).unwrap_or(0))
    }
}
