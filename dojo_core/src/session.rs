//! Training session aggregate.
//!
//! A session walks a workout plan one second at a time:
//! - `idle → running ⇄ paused`, `running → completed` (terminal)
//! - every state change is returned to the caller as domain events
//! - phase completion branches on the block type (timed rounds vs strength
//!   sets with round-robin exercise selection)

use crate::events::{
    AnnouncementTriggered, BlockStarted, DomainEvent, EventPayload, RestStarted, RoundStarted,
    SessionCompleted, SessionPaused, SessionResumed, SessionStarted, SessionTicked,
};
use crate::{Block, BlockDetail, StrengthExercise, Workout};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds allotted per rep when deriving a strength set duration
pub const SECONDS_PER_REP: u32 = 2;

/// Set duration for a strength block with no named exercises
pub const STRENGTH_FALLBACK_SECS: u32 = 60;

/// Session lifecycle states
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}

/// The aggregate that advances a workout plan and emits domain events
///
/// Commands return the events they raised; an empty vec means the command
/// was a policy no-op in the current state. Nothing is buffered internally,
/// so events cannot be silently dropped by forgetting to drain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: Uuid,
    /// Plan copy taken at session creation; never mutated by the session
    pub workout: Workout,
    pub status: SessionStatus,
    pub current_block_index: usize,
    pub current_round: u32,
    pub time_left: u32,
    pub is_work_phase: bool,
    /// Cursor into the current strength block's exercise list
    #[serde(default)]
    current_exercise_index: usize,
}

impl TrainingSession {
    pub fn new(id: Uuid, workout: Workout) -> Self {
        Self {
            id,
            workout,
            status: SessionStatus::Idle,
            current_block_index: 0,
            current_round: 1,
            time_left: 0,
            is_work_phase: true,
            current_exercise_index: 0,
        }
    }

    /// Start an idle session, or resume a paused one
    ///
    /// Resuming does not reinitialize the current block; the timer picks up
    /// where it stopped. Any other state is a no-op.
    pub fn start(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        match self.status {
            SessionStatus::Idle => {
                self.status = SessionStatus::Running;
                self.emit(
                    &mut events,
                    EventPayload::SessionStarted(SessionStarted {
                        session_id: self.id,
                        workout_id: self.workout.id,
                        started_at: Utc::now(),
                    }),
                );
                self.initialize_current_block(&mut events);
            }
            SessionStatus::Paused => {
                self.status = SessionStatus::Running;
                self.emit(
                    &mut events,
                    EventPayload::SessionResumed(SessionResumed {
                        session_id: self.id,
                        resumed_at: Utc::now(),
                    }),
                );
            }
            _ => {}
        }
        events
    }

    /// Pause a running session; no-op otherwise
    pub fn pause(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        if self.status == SessionStatus::Running {
            self.status = SessionStatus::Paused;
            self.emit(
                &mut events,
                EventPayload::SessionPaused(SessionPaused {
                    session_id: self.id,
                    paused_at: Utc::now(),
                }),
            );
        }
        events
    }

    /// Advance the session by one second
    ///
    /// No-op unless running. Decrements the timer, fires countdown
    /// announcements at fixed thresholds, completes the phase when the timer
    /// lands on zero, and finishes with exactly one `SessionTicked` whenever
    /// the session still points at a valid block.
    pub fn tick(&mut self) -> Vec<DomainEvent> {
        if self.status != SessionStatus::Running {
            return Vec::new();
        }

        let mut events = Vec::new();

        if self.time_left > 0 {
            self.time_left -= 1;
            self.countdown_announcements(&mut events);
        }

        if self.time_left == 0 {
            self.handle_phase_complete(&mut events);
        }

        if let Some(block) = self.workout.blocks.get(self.current_block_index) {
            let block_type = block.block_type();
            self.emit(
                &mut events,
                EventPayload::SessionTicked(SessionTicked {
                    session_id: self.id,
                    current_block_index: self.current_block_index,
                    block_type,
                    current_round: self.current_round,
                    time_left: self.time_left,
                    is_work_phase: self.is_work_phase,
                }),
            );
        }

        events
    }

    /// Jump to the next block regardless of the current round or phase
    pub fn skip_block(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        if !self.is_active() {
            return events;
        }
        self.go_to_next_block(&mut events);
        events
    }

    /// Jump to the next round's work phase, or to the next block when the
    /// current block has no rounds left
    pub fn skip_round(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        if !self.is_active() {
            return events;
        }
        let Some(block) = self.workout.blocks.get(self.current_block_index).cloned() else {
            return events;
        };

        if self.current_round < block.rounds {
            self.current_round += 1;
            self.is_work_phase = true;
            self.time_left = match &block.detail {
                BlockDetail::Strength { exercises } => {
                    let (duration, index) = strength_set_duration(exercises, self.current_round);
                    self.current_exercise_index = index;
                    duration
                }
                _ => block.work_time,
            };
            self.emit(
                &mut events,
                EventPayload::RoundStarted(RoundStarted {
                    session_id: self.id,
                    round_number: self.current_round,
                    total_rounds: block.rounds,
                    duration: self.time_left,
                }),
            );
        } else {
            self.go_to_next_block(&mut events);
        }
        events
    }

    /// Fold a persisted event back into session state
    ///
    /// Used by the repository to catch a stale snapshot up to the event
    /// stream. Announcements are state-neutral.
    pub fn apply(&mut self, event: &DomainEvent) {
        match &event.payload {
            EventPayload::SessionStarted(_) => self.status = SessionStatus::Running,
            EventPayload::SessionPaused(_) => self.status = SessionStatus::Paused,
            EventPayload::SessionResumed(_) => self.status = SessionStatus::Running,
            EventPayload::SessionCompleted(_) => {
                self.status = SessionStatus::Completed;
                self.current_block_index = self.workout.blocks.len();
            }
            EventPayload::BlockStarted(p) => {
                self.current_block_index = p.block_index;
                self.current_round = 1;
                self.is_work_phase = true;
                self.current_exercise_index = 0;
            }
            EventPayload::RoundStarted(p) => {
                self.current_round = p.round_number;
                self.time_left = p.duration;
                self.is_work_phase = true;
            }
            EventPayload::RestStarted(p) => {
                self.time_left = p.duration;
                self.is_work_phase = false;
            }
            EventPayload::SessionTicked(p) => {
                self.current_block_index = p.current_block_index;
                self.current_round = p.current_round;
                self.time_left = p.time_left;
                self.is_work_phase = p.is_work_phase;
            }
            EventPayload::AnnouncementTriggered(_) => {}
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Running | SessionStatus::Paused)
    }

    /// Countdown triggers evaluated right after a decrement: "10" near the
    /// end of a work phase, then the final 3, 2, 1 in any phase.
    fn countdown_announcements(&self, events: &mut Vec<DomainEvent>) {
        if self.time_left == 10 && self.is_work_phase {
            self.announce(events, "10");
        } else if self.time_left <= 3 && self.time_left > 0 {
            self.announce(events, self.time_left.to_string());
        }
    }

    fn handle_phase_complete(&mut self, events: &mut Vec<DomainEvent>) {
        let Some(block) = self.workout.blocks.get(self.current_block_index).cloned() else {
            return;
        };

        match &block.detail {
            BlockDetail::Strength { exercises } => {
                self.complete_strength_phase(&block, exercises, events);
            }
            _ => self.complete_timed_phase(&block, events),
        }
    }

    /// Work → rest → next round (or next block) for the timed block types
    fn complete_timed_phase(&mut self, block: &Block, events: &mut Vec<DomainEvent>) {
        if self.is_work_phase {
            self.is_work_phase = false;
            self.time_left = block.rest_time;
            self.emit(
                events,
                EventPayload::RestStarted(RestStarted {
                    session_id: self.id,
                    duration: self.time_left,
                }),
            );
            self.announce(events, "Rest");
        } else if self.current_round < block.rounds {
            self.current_round += 1;
            self.is_work_phase = true;
            self.time_left = block.work_time;
            self.emit(
                events,
                EventPayload::RoundStarted(RoundStarted {
                    session_id: self.id,
                    round_number: self.current_round,
                    total_rounds: block.rounds,
                    duration: self.time_left,
                }),
            );
            self.announce(events, format!("Round {}", self.current_round));
        } else {
            self.go_to_next_block(events);
        }
    }

    /// Strength rounds are sets: the round advances when the reps finish,
    /// and the next set's exercise is picked round-robin after the rest.
    fn complete_strength_phase(
        &mut self,
        block: &Block,
        exercises: &[StrengthExercise],
        events: &mut Vec<DomainEvent>,
    ) {
        if self.is_work_phase {
            if self.current_round < block.rounds {
                self.current_round += 1;
                self.is_work_phase = false;
                self.time_left = block.rest_time;
                self.emit(
                    events,
                    EventPayload::RestStarted(RestStarted {
                        session_id: self.id,
                        duration: self.time_left,
                    }),
                );
                self.announce(events, "Rest");
            } else {
                self.go_to_next_block(events);
            }
        } else {
            self.is_work_phase = true;
            let (duration, index) = strength_set_duration(exercises, self.current_round);
            self.current_exercise_index = index;
            self.time_left = duration;
            if let Some(exercise) = exercises.get(index) {
                self.announce(
                    events,
                    format!("Set {}: {}", self.current_round, exercise.name),
                );
            }
            self.emit(
                events,
                EventPayload::RoundStarted(RoundStarted {
                    session_id: self.id,
                    round_number: self.current_round,
                    total_rounds: block.rounds,
                    duration: self.time_left,
                }),
            );
        }
    }

    fn go_to_next_block(&mut self, events: &mut Vec<DomainEvent>) {
        self.current_block_index += 1;
        self.initialize_current_block(events);
    }

    /// Reset round/phase state for the block at `current_block_index`, or
    /// complete the session when the plan is exhausted.
    fn initialize_current_block(&mut self, events: &mut Vec<DomainEvent>) {
        if self.current_block_index >= self.workout.blocks.len() {
            self.status = SessionStatus::Completed;
            self.current_block_index = self.workout.blocks.len();
            self.emit(
                events,
                EventPayload::SessionCompleted(SessionCompleted {
                    session_id: self.id,
                    completed_at: Utc::now(),
                }),
            );
            return;
        }

        let block = self.workout.blocks[self.current_block_index].clone();
        self.current_round = 1;
        self.is_work_phase = true;
        self.current_exercise_index = 0;

        self.emit(
            events,
            EventPayload::BlockStarted(BlockStarted {
                session_id: self.id,
                block_index: self.current_block_index,
                block_type: block.block_type(),
            }),
        );

        self.time_left = match &block.detail {
            BlockDetail::Strength { exercises } => {
                let (duration, index) = strength_set_duration(exercises, 1);
                self.current_exercise_index = index;
                duration
            }
            _ => block.work_time,
        };

        self.emit(
            events,
            EventPayload::RoundStarted(RoundStarted {
                session_id: self.id,
                round_number: 1,
                total_rounds: block.rounds,
                duration: self.time_left,
            }),
        );

        tracing::debug!(
            "Session {} entered block {} ({})",
            self.id,
            self.current_block_index,
            block.block_type()
        );
    }

    fn announce(&self, events: &mut Vec<DomainEvent>, text: impl Into<String>) {
        self.emit(
            events,
            EventPayload::AnnouncementTriggered(AnnouncementTriggered {
                session_id: self.id,
                text: text.into(),
            }),
        );
    }

    fn emit(&self, events: &mut Vec<DomainEvent>, payload: EventPayload) {
        events.push(DomainEvent::new(payload));
    }
}

/// Duration of one strength set plus the round-robin exercise index
///
/// `reps × 2` seconds for the exercise at `(round − 1) mod len`; a fixed 60
/// seconds when the block names no exercises.
fn strength_set_duration(exercises: &[StrengthExercise], round: u32) -> (u32, usize) {
    if exercises.is_empty() {
        return (STRENGTH_FALLBACK_SECS, 0);
    }
    let index = (round.saturating_sub(1) as usize) % exercises.len();
    (exercises[index].reps * SECONDS_PER_REP, index)
}
