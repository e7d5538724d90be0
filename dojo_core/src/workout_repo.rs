//! Workout document persistence.
//!
//! Plain key-value CRUD: one JSON file per workout id. Workouts are not
//! event-sourced; the document is the whole truth.

use crate::types::Workout;
use crate::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-backed workout store
pub struct WorkoutRepository {
    base_dir: PathBuf,
}

impl WorkoutRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn document_path(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }

    pub fn save(&self, workout: &Workout) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        let contents = serde_json::to_string_pretty(workout)?;
        std::fs::write(self.document_path(workout.id), contents)?;
        tracing::debug!("Saved workout {} ({})", workout.id, workout.name);
        Ok(())
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<Option<Workout>> {
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// All readable workout documents, sorted by creation time
    ///
    /// Unreadable documents are logged and skipped rather than failing the
    /// whole listing.
    pub fn list_all(&self) -> Result<Vec<Workout>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut workouts = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "json") != Some(true) {
                continue;
            }
            match read_workout(&path) {
                Ok(workout) => workouts.push(workout),
                Err(e) => {
                    tracing::warn!("Skipping unreadable workout at {:?}: {}", path, e);
                }
            }
        }

        workouts.sort_by_key(|w| w.created_at);
        Ok(workouts)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        let path = self.document_path(id);
        if path.exists() {
            std::fs::remove_file(&path)?;
            tracing::debug!("Deleted workout {}", id);
        }
        Ok(())
    }
}

fn read_workout(path: &Path) -> Result<Workout> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Block, BlockDetail};

    fn sample_workout(name: &str) -> Workout {
        Workout::new(name, vec![Block::new(BlockDetail::Warmup, 2, 120, 30)])
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = WorkoutRepository::new(temp_dir.path());

        let workout = sample_workout("morning session");
        repo.save(&workout).unwrap();

        let loaded = repo.get_by_id(workout.id).unwrap().unwrap();
        assert_eq!(loaded, workout);
    }

    #[test]
    fn test_get_missing_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = WorkoutRepository::new(temp_dir.path());

        assert!(repo.get_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_all_skips_unreadable_documents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = WorkoutRepository::new(temp_dir.path());

        repo.save(&sample_workout("plan a")).unwrap();
        repo.save(&sample_workout("plan b")).unwrap();
        std::fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();

        let workouts = repo.list_all().unwrap();
        assert_eq!(workouts.len(), 2);
    }

    #[test]
    fn test_delete_removes_document() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = WorkoutRepository::new(temp_dir.path());

        let workout = sample_workout("short lived");
        repo.save(&workout).unwrap();
        repo.delete(workout.id).unwrap();

        assert!(repo.get_by_id(workout.id).unwrap().is_none());

        // Deleting twice is harmless
        repo.delete(workout.id).unwrap();
    }

    #[test]
    fn test_list_all_sorted_by_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = WorkoutRepository::new(temp_dir.path());

        let mut first = sample_workout("first");
        first.created_at = chrono::Utc::now() - chrono::Duration::hours(1);
        let second = sample_workout("second");

        repo.save(&second).unwrap();
        repo.save(&first).unwrap();

        let names: Vec<_> = repo.list_all().unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
