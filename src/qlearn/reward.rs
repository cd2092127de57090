use crate::qlearn::config::{RatchetConfig, RewardConfig};
use crate::qlearn::types::{Difficulty, ExerciseType, LevelCatalog};

/// Scalar feedback for one attempt, fed into the table update.
pub fn shape_reward(
    config: &RewardConfig,
    is_correct: bool,
    difficulty: Difficulty,
    exercise_type: &ExerciseType,
) -> f64 {
    let mut reward = if is_correct { config.correct } else { config.incorrect };

    match exercise_type {
        ExerciseType::SpeakingSentence => reward *= config.sentence_multiplier,
        ExerciseType::Writing if difficulty >= config.writing_multiplier_min_level => {
            reward *= config.writing_multiplier
        }
        _ => {}
    }

    reward + f64::from(difficulty) * config.difficulty_bonus
}

/// Coarse post-answer adjustment reported to the client. Independent of the table.
pub fn ratchet_difficulty(
    config: &RatchetConfig,
    catalog: &LevelCatalog,
    difficulty: Difficulty,
    is_correct: bool,
    streak: u32,
) -> Difficulty {
    let max = catalog.max_level();
    let min = catalog.min_level();

    if is_correct && difficulty < max {
        let step = if streak >= config.streak_threshold {
            config.streak_step
        } else {
            1
        };
        difficulty.saturating_add(step).min(max)
    } else if !is_correct && difficulty > min {
        difficulty - 1
    } else {
        difficulty
    }
}

/// Sentence exercises, and writing once the learner is past the warm-up, start at the
/// sentence level.
pub fn apply_sentence_floor(
    config: &RatchetConfig,
    difficulty: Difficulty,
    exercise_type: &ExerciseType,
    questions_completed: u32,
) -> Difficulty {
    let needs_floor = match exercise_type {
        ExerciseType::SpeakingSentence => true,
        ExerciseType::Writing => questions_completed >= config.writing_floor_after_questions,
        _ => false,
    };

    if needs_floor {
        difficulty.max(config.sentence_min_level)
    } else {
        difficulty
    }
}
