//! CSV export of session snapshots.
//!
//! Flattens every session snapshot into one summary row, appending to an
//! existing CSV so repeated exports keep accumulating history.

use crate::session_repo::SessionSnapshot;
use crate::Result;
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    session_id: String,
    workout_name: String,
    status: String,
    block_index: usize,
    block_count: usize,
    current_round: u32,
    time_left: u32,
    is_work_phase: bool,
    stream_version: u64,
}

impl From<&SessionSnapshot> for CsvRow {
    fn from(snapshot: &SessionSnapshot) -> Self {
        let session = &snapshot.session;
        CsvRow {
            session_id: session.id.to_string(),
            workout_name: session.workout.name.clone(),
            status: session.status.to_string(),
            block_index: session.current_block_index,
            block_count: session.workout.blocks.len(),
            current_round: session.current_round,
            time_left: session.time_left,
            is_work_phase: session.is_work_phase,
            stream_version: snapshot.version,
        }
    }
}

/// Write one summary row per session snapshot found under `snapshot_dir`
///
/// Appends to `csv_path`, writing headers only when the file is empty.
/// Unreadable snapshot documents are logged and skipped. Returns the number
/// of rows written.
pub fn export_sessions(snapshot_dir: &Path, csv_path: &Path) -> Result<usize> {
    let snapshots = read_snapshots(snapshot_dir)?;

    if snapshots.is_empty() {
        tracing::info!("No session snapshots to export");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for snapshot in &snapshots {
        writer.serialize(CsvRow::from(snapshot))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} sessions to {:?}", snapshots.len(), csv_path);
    Ok(snapshots.len())
}

/// Load all readable snapshots, sorted by session id for stable output
fn read_snapshots(snapshot_dir: &Path) -> Result<Vec<SessionSnapshot>> {
    if !snapshot_dir.exists() {
        return Ok(Vec::new());
    }

    let mut snapshots = Vec::new();
    for entry in std::fs::read_dir(snapshot_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map(|ext| ext == "json") != Some(true) {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<SessionSnapshot>(&contents) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    tracing::warn!("Skipping unreadable snapshot at {:?}: {}", path, e);
                }
            },
            Err(e) => {
                tracing::warn!("Skipping unreadable snapshot at {:?}: {}", path, e);
            }
        }
    }

    snapshots.sort_by_key(|s| s.session.id);
    Ok(snapshots)
}
