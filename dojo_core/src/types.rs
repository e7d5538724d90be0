//! Core domain types for the Dojo training system.
//!
//! This module defines the workout plan data model:
//! - Blocks and their type-specific payloads
//! - Technique categories for striking blocks
//! - Workouts as ordered, editable block sequences

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Block Types
// ============================================================================

/// Discriminant for a block's exercise type
///
/// Derived from [`BlockDetail`]; carried in events and summaries where the
/// payload itself is not needed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Warmup,
    JumpRope,
    ShadowBoxing,
    HeavyBag,
    Sparring,
    Strength,
    Cooldown,
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BlockType::Warmup => "warmup",
            BlockType::JumpRope => "jump_rope",
            BlockType::ShadowBoxing => "shadow_boxing",
            BlockType::HeavyBag => "heavy_bag",
            BlockType::Sparring => "sparring",
            BlockType::Strength => "strength",
            BlockType::Cooldown => "cooldown",
        };
        write!(f, "{}", name)
    }
}

/// Technique families callable during striking blocks
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueCategory {
    Punches,
    Kicks,
    Knees,
    Elbows,
    Combos,
}

/// One named exercise within a strength block
///
/// Kept as an ordered list entry rather than a map key: set selection is
/// positional (round-robin by index), so order is load-bearing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrengthExercise {
    pub name: String,
    pub reps: u32,
}

impl StrengthExercise {
    pub fn new(name: impl Into<String>, reps: u32) -> Self {
        Self {
            name: name.into(),
            reps,
        }
    }
}

/// Type-specific payload of a block
///
/// The variant fixes which extra data a block carries: striking blocks name
/// the technique families to call out, strength blocks carry an ordered
/// exercise list, and the remaining types need nothing beyond the timer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDetail {
    Warmup,
    JumpRope,
    ShadowBoxing { techniques: Vec<TechniqueCategory> },
    HeavyBag { techniques: Vec<TechniqueCategory> },
    Sparring { techniques: Vec<TechniqueCategory> },
    Strength { exercises: Vec<StrengthExercise> },
    Cooldown,
}

impl BlockDetail {
    /// The fieldless discriminant for this payload
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockDetail::Warmup => BlockType::Warmup,
            BlockDetail::JumpRope => BlockType::JumpRope,
            BlockDetail::ShadowBoxing { .. } => BlockType::ShadowBoxing,
            BlockDetail::HeavyBag { .. } => BlockType::HeavyBag,
            BlockDetail::Sparring { .. } => BlockType::Sparring,
            BlockDetail::Strength { .. } => BlockType::Strength,
            BlockDetail::Cooldown => BlockType::Cooldown,
        }
    }

    /// Exercise list for strength blocks, empty for every other type
    pub fn exercises(&self) -> &[StrengthExercise] {
        match self {
            BlockDetail::Strength { exercises } => exercises,
            _ => &[],
        }
    }
}

/// One timed segment of a workout plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: Uuid,
    pub rounds: u32,
    /// Work phase duration in seconds (strength blocks derive their own)
    pub work_time: u32,
    /// Rest phase duration in seconds
    pub rest_time: u32,
    pub detail: BlockDetail,
}

impl Block {
    /// Create a block with a fresh identity
    pub fn new(detail: BlockDetail, rounds: u32, work_time: u32, rest_time: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            rounds: rounds.max(1),
            work_time,
            rest_time,
            detail,
        }
    }

    pub fn block_type(&self) -> BlockType {
        self.detail.block_type()
    }
}

// ============================================================================
// Workout
// ============================================================================

/// A workout plan: an ordered, editable sequence of blocks
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

impl Workout {
    pub fn new(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            blocks,
        }
    }

    /// Append a block to the end of the plan
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Remove the block at `index`; out of bounds is a no-op
    pub fn remove_block_at(&mut self, index: usize) {
        if index < self.blocks.len() {
            self.blocks.remove(index);
        }
    }

    /// Replace the block at `index`; out of bounds is a no-op
    pub fn update_block_at(&mut self, index: usize, block: Block) {
        if index < self.blocks.len() {
            self.blocks[index] = block;
        }
    }

    /// Insert a copy of the block at `index` right after it, with a fresh id
    pub fn duplicate_block_at(&mut self, index: usize) {
        if index < self.blocks.len() {
            let mut copy = self.blocks[index].clone();
            copy.id = Uuid::new_v4();
            self.blocks.insert(index + 1, copy);
        }
    }

    /// Reorder: pop the block at `from` and insert it at `to`
    ///
    /// No-op unless both indices are in bounds. Identity is preserved.
    pub fn move_block(&mut self, from: usize, to: usize) {
        if from < self.blocks.len() && to < self.blocks.len() {
            let block = self.blocks.remove(from);
            self.blocks.insert(to, block);
        }
    }
}
