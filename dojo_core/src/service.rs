//! Application service over the training domain.
//!
//! Resolves aggregates by id, applies one command, persists the outcome.
//! Lookup failures surface as typed errors; commands that do not apply in
//! the current session state are no-ops by design and still save cleanly.

use crate::bus::EventBus;
use crate::catalog;
use crate::event_store::{EventStore, JsonlEventStore};
use crate::events::EventRegistry;
use crate::export;
use crate::session::TrainingSession;
use crate::session_repo::SessionRepository;
use crate::types::{Block, Workout};
use crate::workout_repo::WorkoutRepository;
use crate::{Error, Result};
use std::path::Path;
use uuid::Uuid;

/// Command surface consumed by callers (CLI, tickers, UIs)
pub struct TrainingService<S: EventStore> {
    workouts: WorkoutRepository,
    sessions: SessionRepository<S>,
}

impl TrainingService<JsonlEventStore> {
    /// Wire the file-backed repositories under one data directory
    pub fn open(data_dir: &Path) -> Self {
        let store = JsonlEventStore::new(data_dir.join("events"), EventRegistry::standard());
        Self {
            workouts: WorkoutRepository::new(data_dir.join("workouts")),
            sessions: SessionRepository::new(store, data_dir.join("sessions")),
        }
    }

    /// Like [`Self::open`], with a bus receiving events after each save
    pub fn open_with_bus(data_dir: &Path, bus: EventBus) -> Self {
        let store = JsonlEventStore::new(data_dir.join("events"), EventRegistry::standard());
        Self {
            workouts: WorkoutRepository::new(data_dir.join("workouts")),
            sessions: SessionRepository::new(store, data_dir.join("sessions")).with_bus(bus),
        }
    }
}

impl<S: EventStore> TrainingService<S> {
    pub fn new(workouts: WorkoutRepository, sessions: SessionRepository<S>) -> Self {
        Self { workouts, sessions }
    }

    // ------------------------------------------------------------------
    // Workout commands and queries
    // ------------------------------------------------------------------

    pub fn create_workout(&self, name: impl Into<String>, blocks: Vec<Block>) -> Result<Uuid> {
        let workout = Workout::new(name, blocks);
        self.workouts.save(&workout)?;
        Ok(workout.id)
    }

    /// Persist plan edits (add/remove/update/duplicate/move of blocks)
    pub fn save_workout(&self, workout: &Workout) -> Result<()> {
        self.workouts.save(workout)
    }

    pub fn list_workouts(&self) -> Result<Vec<Workout>> {
        self.workouts.list_all()
    }

    pub fn get_workout(&self, workout_id: Uuid) -> Result<Workout> {
        self.workouts
            .get_by_id(workout_id)?
            .ok_or(Error::WorkoutNotFound(workout_id))
    }

    pub fn delete_workout(&self, workout_id: Uuid) -> Result<()> {
        self.workouts.delete(workout_id)
    }

    /// Install the built-in plans unless workouts already exist
    pub fn seed_workouts(&self) -> Result<Vec<Workout>> {
        let existing = self.workouts.list_all()?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        for plan in catalog::seed_plans() {
            self.workouts.save(&plan)?;
        }
        tracing::info!("Seeded built-in workout plans");
        self.workouts.list_all()
    }

    // ------------------------------------------------------------------
    // Session commands and queries
    // ------------------------------------------------------------------

    /// Create and start a session over the given workout
    ///
    /// Passing an id that already has a session is idempotent: the existing
    /// session is left untouched and its id returned.
    pub fn start_session(&self, workout_id: Uuid, session_id: Option<Uuid>) -> Result<Uuid> {
        let id = session_id.unwrap_or_else(Uuid::new_v4);
        if self.sessions.get_by_id(id).is_ok() {
            return Ok(id);
        }

        let workout = self.get_workout(workout_id)?;
        let mut session = TrainingSession::new(id, workout);
        let events = session.start();
        self.sessions.save(&session, &events)?;
        Ok(id)
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<TrainingSession> {
        self.sessions.get_by_id(session_id)
    }

    pub fn tick_session(&self, session_id: Uuid) -> Result<TrainingSession> {
        self.apply_command(session_id, TrainingSession::tick)
    }

    pub fn pause_session(&self, session_id: Uuid) -> Result<TrainingSession> {
        self.apply_command(session_id, TrainingSession::pause)
    }

    pub fn resume_session(&self, session_id: Uuid) -> Result<TrainingSession> {
        // Resuming is `start` on a paused session
        self.apply_command(session_id, TrainingSession::start)
    }

    pub fn skip_block(&self, session_id: Uuid) -> Result<TrainingSession> {
        self.apply_command(session_id, TrainingSession::skip_block)
    }

    pub fn skip_round(&self, session_id: Uuid) -> Result<TrainingSession> {
        self.apply_command(session_id, TrainingSession::skip_round)
    }

    /// Summarize all session snapshots into a CSV file
    pub fn export_sessions(&self, csv_path: &Path) -> Result<usize> {
        export::export_sessions(self.sessions.snapshot_dir(), csv_path)
    }

    /// Load, run one command, persist its events, return the new state
    fn apply_command<F>(&self, session_id: Uuid, command: F) -> Result<TrainingSession>
    where
        F: FnOnce(&mut TrainingSession) -> Vec<crate::events::DomainEvent>,
    {
        let mut session = self.sessions.get_by_id(session_id)?;
        let events = command(&mut session);
        self.sessions.save(&session, &events)?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;
    use crate::types::BlockDetail;

    fn service(dir: &Path) -> TrainingService<JsonlEventStore> {
        TrainingService::open(dir)
    }

    fn quick_workout(svc: &TrainingService<JsonlEventStore>) -> Uuid {
        svc.create_workout(
            "quick plan",
            vec![Block::new(BlockDetail::JumpRope, 1, 3, 0)],
        )
        .unwrap()
    }

    #[test]
    fn test_seed_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());

        let first = svc.seed_workouts().unwrap();
        assert_eq!(first.len(), 3);

        let second = svc.seed_workouts().unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(
            first.iter().map(|w| w.id).collect::<Vec<_>>(),
            second.iter().map(|w| w.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_start_session_requires_existing_workout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());

        let err = svc.start_session(Uuid::new_v4(), None).unwrap_err();
        assert!(matches!(err, Error::WorkoutNotFound(_)));
    }

    #[test]
    fn test_start_session_is_idempotent_per_id() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());
        let workout_id = quick_workout(&svc);

        let id = svc.start_session(workout_id, None).unwrap();
        svc.tick_session(id).unwrap();

        // Starting again with the same id must not reset the session
        let again = svc.start_session(workout_id, Some(id)).unwrap();
        assert_eq!(again, id);
        assert_eq!(svc.get_session(id).unwrap().time_left, 2);
    }

    #[test]
    fn test_session_commands_require_existing_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());
        let missing = Uuid::new_v4();

        assert!(matches!(
            svc.tick_session(missing).unwrap_err(),
            Error::SessionNotFound(_)
        ));
        assert!(matches!(
            svc.pause_session(missing).unwrap_err(),
            Error::SessionNotFound(_)
        ));
        assert!(matches!(
            svc.skip_block(missing).unwrap_err(),
            Error::SessionNotFound(_)
        ));
    }

    #[test]
    fn test_full_session_lifecycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());
        let workout_id = quick_workout(&svc);

        let id = svc.start_session(workout_id, None).unwrap();
        assert_eq!(svc.get_session(id).unwrap().status, SessionStatus::Running);

        svc.pause_session(id).unwrap();
        assert_eq!(svc.get_session(id).unwrap().status, SessionStatus::Paused);

        svc.resume_session(id).unwrap();

        // work=3, rounds=1, rest=0: four ticks finish the session
        for _ in 0..4 {
            svc.tick_session(id).unwrap();
        }
        let done = svc.get_session(id).unwrap();
        assert_eq!(done.status, SessionStatus::Completed);

        // Ticking a completed session stays a no-op
        let still_done = svc.tick_session(id).unwrap();
        assert_eq!(still_done.status, SessionStatus::Completed);
    }

    #[test]
    fn test_skip_block_through_service() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());
        let workout_id = svc
            .create_workout(
                "two blocks",
                vec![
                    Block::new(BlockDetail::Warmup, 1, 60, 0),
                    Block::new(BlockDetail::JumpRope, 1, 30, 0),
                ],
            )
            .unwrap();

        let id = svc.start_session(workout_id, None).unwrap();
        let session = svc.skip_block(id).unwrap();

        assert_eq!(session.current_block_index, 1);
        assert_eq!(session.time_left, 30);
    }

    #[test]
    fn test_export_after_sessions() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());
        let workout_id = quick_workout(&svc);

        svc.start_session(workout_id, None).unwrap();
        svc.start_session(workout_id, None).unwrap();

        let csv_path = temp_dir.path().join("sessions.csv");
        let count = svc.export_sessions(&csv_path).unwrap();
        assert_eq!(count, 2);
        assert!(csv_path.exists());
    }

    #[test]
    fn test_workout_crud_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let svc = service(temp_dir.path());

        let id = quick_workout(&svc);
        let mut workout = svc.get_workout(id).unwrap();

        workout.add_block(Block::new(BlockDetail::Cooldown, 1, 60, 0));
        svc.save_workout(&workout).unwrap();
        assert_eq!(svc.get_workout(id).unwrap().blocks.len(), 2);

        svc.delete_workout(id).unwrap();
        assert!(matches!(
            svc.get_workout(id).unwrap_err(),
            Error::WorkoutNotFound(_)
        ));
    }
}
