//! Built-in workout plans.
//!
//! Three presets scaled by total duration. Every call mints plans with
//! fresh workout and block ids, so seeding twice never collides.

use crate::types::{Block, BlockDetail, StrengthExercise, TechniqueCategory, Workout};

/// Build the standard 30/60/90-minute session plans
pub fn seed_plans() -> Vec<Workout> {
    vec![
        Workout::new("30-Minute Session", thirty_minute_blocks()),
        Workout::new("60-Minute Session", sixty_minute_blocks()),
        Workout::new("90-Minute Session", ninety_minute_blocks()),
    ]
}

fn thirty_minute_blocks() -> Vec<Block> {
    vec![
        Block::new(BlockDetail::Warmup, 2, 120, 30),
        Block::new(BlockDetail::JumpRope, 2, 180, 60),
        Block::new(
            BlockDetail::Strength {
                exercises: vec![
                    StrengthExercise::new("pushups", 15),
                    StrengthExercise::new("squats", 20),
                ],
            },
            2,
            60,
            30,
        ),
        Block::new(
            BlockDetail::HeavyBag {
                techniques: vec![
                    TechniqueCategory::Punches,
                    TechniqueCategory::Kicks,
                    TechniqueCategory::Combos,
                ],
            },
            3,
            120,
            60,
        ),
        Block::new(BlockDetail::ShadowBoxing { techniques: vec![] }, 2, 60, 30),
        Block::new(BlockDetail::Cooldown, 1, 60, 0),
    ]
}

fn sixty_minute_blocks() -> Vec<Block> {
    vec![
        Block::new(BlockDetail::Warmup, 2, 180, 60),
        Block::new(BlockDetail::JumpRope, 4, 180, 60),
        Block::new(
            BlockDetail::Strength {
                exercises: vec![
                    StrengthExercise::new("pushups", 20),
                    StrengthExercise::new("squats", 25),
                    StrengthExercise::new("burpees", 10),
                ],
            },
            3,
            60,
            30,
        ),
        Block::new(
            BlockDetail::HeavyBag {
                techniques: vec![
                    TechniqueCategory::Punches,
                    TechniqueCategory::Kicks,
                    TechniqueCategory::Knees,
                    TechniqueCategory::Combos,
                ],
            },
            5,
            180,
            60,
        ),
        Block::new(BlockDetail::ShadowBoxing { techniques: vec![] }, 3, 120, 60),
        Block::new(BlockDetail::Cooldown, 2, 60, 30),
    ]
}

fn ninety_minute_blocks() -> Vec<Block> {
    vec![
        Block::new(BlockDetail::Warmup, 3, 180, 60),
        Block::new(BlockDetail::JumpRope, 6, 180, 60),
        Block::new(
            BlockDetail::Strength {
                exercises: vec![
                    StrengthExercise::new("pushups", 25),
                    StrengthExercise::new("squats", 30),
                    StrengthExercise::new("burpees", 15),
                    StrengthExercise::new("abs", 30),
                ],
            },
            4,
            60,
            30,
        ),
        Block::new(
            BlockDetail::HeavyBag {
                techniques: vec![
                    TechniqueCategory::Punches,
                    TechniqueCategory::Kicks,
                    TechniqueCategory::Knees,
                    TechniqueCategory::Elbows,
                    TechniqueCategory::Combos,
                ],
            },
            8,
            180,
            60,
        ),
        Block::new(BlockDetail::ShadowBoxing { techniques: vec![] }, 4, 120, 60),
        Block::new(BlockDetail::Cooldown, 2, 90, 30),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockType;

    #[test]
    fn test_three_presets_with_six_blocks_each() {
        let plans = seed_plans();
        assert_eq!(plans.len(), 3);
        for plan in &plans {
            assert_eq!(plan.blocks.len(), 6);
            assert_eq!(plan.blocks[0].block_type(), BlockType::Warmup);
            assert_eq!(plan.blocks[5].block_type(), BlockType::Cooldown);
        }
    }

    #[test]
    fn test_strength_exercises_are_ordered() {
        let plans = seed_plans();
        let strength = &plans[2].blocks[2];
        let names: Vec<_> = strength
            .detail
            .exercises()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["pushups", "squats", "burpees", "abs"]);
    }

    #[test]
    fn test_each_call_mints_fresh_ids() {
        let first = seed_plans();
        let second = seed_plans();

        assert_ne!(first[0].id, second[0].id);
        assert_ne!(first[0].blocks[0].id, second[0].blocks[0].id);
    }
}
