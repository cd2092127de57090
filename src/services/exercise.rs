use crate::qlearn::reward::{apply_sentence_floor, ratchet_difficulty, shape_reward};
use crate::qlearn::{AdaptiveSelector, Difficulty, ExerciseType, SelectionSource, SelectorError};

#[derive(Debug, Clone)]
pub struct NextExerciseInput {
    pub learner_id: String,
    pub last_correct: bool,
    pub current_difficulty: i64,
    pub force_exercise_type: Option<ExerciseType>,
    pub questions_completed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NextExercise {
    pub difficulty: Difficulty,
    pub exercise_type: ExerciseType,
    pub source: SelectionSource,
}

#[derive(Debug, Clone)]
pub struct SubmitAnswerInput {
    pub learner_id: String,
    pub difficulty: i64,
    pub exercise_type: ExerciseType,
    pub is_correct: bool,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    /// Ratchet result; not derived from the value table.
    pub new_difficulty: Difficulty,
    pub reward: f64,
    pub value: f64,
}

pub fn next_exercise(
    selector: &AdaptiveSelector,
    input: &NextExerciseInput,
) -> Result<NextExercise, SelectorError> {
    let selection = selector.select_next(
        &input.learner_id,
        input.last_correct,
        input.current_difficulty,
        input.force_exercise_type.as_ref(),
    )?;

    let difficulty = apply_sentence_floor(
        &selector.config().ratchet,
        selection.difficulty,
        &selection.exercise_type,
        input.questions_completed,
    );

    tracing::debug!(
        learner_id = %input.learner_id,
        difficulty,
        exercise_type = %selection.exercise_type,
        source = selection.source.as_str(),
        "next exercise selected"
    );

    Ok(NextExercise {
        difficulty,
        exercise_type: selection.exercise_type,
        source: selection.source,
    })
}

pub fn submit_answer(
    selector: &AdaptiveSelector,
    input: &SubmitAnswerInput,
) -> Result<AnswerOutcome, SelectorError> {
    let catalog = selector.catalog();
    if !catalog.contains(input.difficulty) {
        return Err(SelectorError::UnknownDifficulty(input.difficulty));
    }
    let difficulty = catalog.clamp(input.difficulty);
    let config = selector.config();

    let reward = shape_reward(&config.reward, input.is_correct, difficulty, &input.exercise_type);
    let value = selector.record_outcome(
        &input.learner_id,
        input.difficulty,
        &input.exercise_type,
        reward,
    )?;
    let new_difficulty = ratchet_difficulty(
        &config.ratchet,
        catalog,
        difficulty,
        input.is_correct,
        input.streak,
    );

    tracing::info!(
        learner_id = %input.learner_id,
        difficulty,
        new_difficulty,
        is_correct = input.is_correct,
        reward,
        "answer recorded"
    );

    Ok(AnswerOutcome {
        new_difficulty,
        reward,
        value,
    })
}
