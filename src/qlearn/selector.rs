use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use rand::Rng;
use thiserror::Error;

use crate::qlearn::config::SelectorConfig;
use crate::qlearn::store::{StoreError, TableDocument, TableStore};
use crate::qlearn::types::{
    Difficulty, ExerciseType, LevelCatalog, Selection, SelectionSource, StateKey,
};

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("learner id must not be empty")]
    EmptyLearnerId,
    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(i64),
    #[error("invalid exercise type: {0:?}")]
    InvalidExerciseType(String),
    #[error("reward must be a finite number")]
    InvalidReward,
    #[error("no exercise types configured for level {0}")]
    NoExerciseTypes(Difficulty),
    #[error("failed to persist value table: {0}")]
    Persistence(#[from] StoreError),
}

impl SelectorError {
    /// Persistence failures keep the in-memory update; retrying the flush is enough.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

#[derive(Debug, Default)]
struct ValueTable {
    entries: BTreeMap<StateKey, Vec<f64>>,
}

impl ValueTable {
    fn learner_entries<'a>(
        &'a self,
        learner_id: &'a str,
    ) -> impl Iterator<Item = (&'a StateKey, &'a Vec<f64>)> + 'a {
        // (learner, 0, Listening) is the smallest key a learner can own
        let start = StateKey::new(learner_id, 0, ExerciseType::Listening);
        self.entries
            .range(start..)
            .take_while(move |(key, _)| key.learner_id == learner_id)
    }

    fn to_document(&self) -> TableDocument {
        self.entries
            .iter()
            .map(|(key, values)| (key.to_string(), values.clone()))
            .collect()
    }
}

/// Q-learning exercise picker over a persisted (learner, difficulty, type) value table.
///
/// One instance per process. `record_outcome` holds the table lock across the
/// update and the durable write. `unsaved` and `entry_count` are only written
/// while that lock is held, and are read without it.
pub struct AdaptiveSelector {
    config: SelectorConfig,
    catalog: LevelCatalog,
    store: Arc<dyn TableStore>,
    table: Mutex<ValueTable>,
    unsaved: AtomicBool,
    entry_count: AtomicUsize,
}

impl AdaptiveSelector {
    pub fn new(config: SelectorConfig, store: Arc<dyn TableStore>) -> Self {
        Self::with_catalog(config, LevelCatalog::default(), store)
    }

    pub fn with_catalog(
        config: SelectorConfig,
        catalog: LevelCatalog,
        store: Arc<dyn TableStore>,
    ) -> Self {
        let entries = match store.load() {
            Ok(Some(document)) => entries_from_document(document, catalog.level_count()),
            Ok(None) => BTreeMap::new(),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    store = %store.describe(),
                    "value table load failed, starting empty"
                );
                BTreeMap::new()
            }
        };

        tracing::info!(entries = entries.len(), store = %store.describe(), "value table loaded");

        Self {
            config,
            catalog,
            store,
            entry_count: AtomicUsize::new(entries.len()),
            unsaved: AtomicBool::new(false),
            table: Mutex::new(ValueTable { entries }),
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count.load(Ordering::Acquire)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.load(Ordering::Acquire)
    }

    pub fn values(&self, key: &StateKey) -> Option<Vec<f64>> {
        self.table.lock().entries.get(key).cloned()
    }

    pub fn learner_states(&self, learner_id: &str) -> Vec<(StateKey, Vec<f64>)> {
        let table = self.table.lock();
        table
            .learner_entries(learner_id)
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect()
    }

    /// Applies the update law to the slot of `difficulty` and persists the whole table.
    ///
    /// On a persistence error the new value stays in memory and is written by the
    /// next successful save or `flush`.
    pub fn record_outcome(
        &self,
        learner_id: &str,
        difficulty: i64,
        exercise_type: &ExerciseType,
        reward: f64,
    ) -> Result<f64, SelectorError> {
        let learner_id = validate_learner_id(learner_id)?;
        let difficulty = self.validate_difficulty(difficulty)?;
        validate_exercise_type(exercise_type)?;
        if !reward.is_finite() {
            return Err(SelectorError::InvalidReward);
        }

        let alpha = self.config.learning.alpha;
        let gamma = self.config.learning.gamma;
        let slot = self.catalog.slot(difficulty);
        let width = self.catalog.level_count();

        let mut table = self.table.lock();
        let key = StateKey::new(learner_id, difficulty, exercise_type.clone());
        let values = table.entries.entry(key).or_insert_with(|| vec![0.0; width]);

        let old_value = values[slot];
        let next_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let new_value = (1.0 - alpha) * old_value + alpha * (reward + gamma * next_max);
        values[slot] = new_value;
        self.entry_count.store(table.entries.len(), Ordering::Release);
        self.unsaved.store(true, Ordering::Release);

        tracing::debug!(
            learner_id,
            difficulty,
            exercise_type = %exercise_type,
            reward,
            old_value,
            new_value,
            "value table updated"
        );

        let document = table.to_document();
        match self.store.save(&document) {
            Ok(()) => {
                self.unsaved.store(false, Ordering::Release);
                Ok(new_value)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    store = %self.store.describe(),
                    "value table persist failed"
                );
                Err(err.into())
            }
        }
    }

    /// Writes the in-memory table if a previous save failed. Returns whether a write happened.
    pub fn flush(&self) -> Result<bool, SelectorError> {
        let table = self.table.lock();
        if !self.unsaved.load(Ordering::Acquire) {
            return Ok(false);
        }

        self.store.save(&table.to_document())?;
        self.unsaved.store(false, Ordering::Release);
        tracing::info!(entries = table.entries.len(), "value table flushed");
        Ok(true)
    }

    /// One step toward harder or easier material, always inside the catalog.
    pub fn propose_difficulty(&self, last_correct: bool, current_difficulty: i64) -> Difficulty {
        let current = i64::from(self.catalog.clamp(current_difficulty));
        let next = if last_correct { current + 1 } else { current - 1 };
        self.catalog.clamp(next)
    }

    pub fn select_next(
        &self,
        learner_id: &str,
        last_correct: bool,
        current_difficulty: i64,
        forced_type: Option<&ExerciseType>,
    ) -> Result<Selection, SelectorError> {
        let mut rng = rand::rng();
        self.select_next_with_rng(
            &mut rng,
            learner_id,
            last_correct,
            current_difficulty,
            forced_type,
        )
    }

    pub fn select_next_with_rng<R: Rng>(
        &self,
        rng: &mut R,
        learner_id: &str,
        last_correct: bool,
        current_difficulty: i64,
        forced_type: Option<&ExerciseType>,
    ) -> Result<Selection, SelectorError> {
        let learner_id = validate_learner_id(learner_id)?;
        let proposed = self.propose_difficulty(last_correct, current_difficulty);

        if let Some(forced) = forced_type {
            if self.catalog.get(proposed).is_some_and(|level| level.allows(forced)) {
                return Ok(Selection {
                    difficulty: proposed,
                    exercise_type: forced.clone(),
                    source: SelectionSource::Forced,
                });
            }
            tracing::debug!(
                learner_id,
                proposed,
                forced = %forced,
                "forced type not allowed at proposed level"
            );
        }

        let best = {
            let table = self.table.lock();
            let mut entries = table.learner_entries(learner_id).peekable();
            let has_history = entries.peek().is_some();

            if !has_history || rng.random::<f64>() < self.config.learning.epsilon {
                None
            } else {
                let mut best: Option<(&StateKey, f64)> = None;
                for (key, values) in entries.filter(|(key, _)| key.difficulty == proposed) {
                    let score = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    if best.map_or(true, |(_, top)| score > top) {
                        best = Some((key, score));
                    }
                }
                best.map(|(key, _)| (key.difficulty, key.exercise_type.clone()))
            }
        };

        if let Some((difficulty, exercise_type)) = best {
            return Ok(Selection {
                difficulty,
                exercise_type,
                source: SelectionSource::Exploit,
            });
        }

        let exercise_type = self
            .catalog
            .allowed_types(proposed)
            .choose(rng)
            .cloned()
            .ok_or(SelectorError::NoExerciseTypes(proposed))?;

        Ok(Selection {
            difficulty: proposed,
            exercise_type,
            source: SelectionSource::Explore,
        })
    }

    fn validate_difficulty(&self, difficulty: i64) -> Result<Difficulty, SelectorError> {
        if self.catalog.contains(difficulty) {
            Ok(self.catalog.clamp(difficulty))
        } else {
            Err(SelectorError::UnknownDifficulty(difficulty))
        }
    }
}

/// Ids are keys as given; only blank ids are rejected.
fn validate_learner_id(learner_id: &str) -> Result<&str, SelectorError> {
    if learner_id.trim().is_empty() {
        Err(SelectorError::EmptyLearnerId)
    } else {
        Ok(learner_id)
    }
}

// `-` separates key fields; a dash in the type would not survive a reload.
fn validate_exercise_type(exercise_type: &ExerciseType) -> Result<(), SelectorError> {
    let tag = exercise_type.as_str();
    if tag.trim().is_empty() || tag.contains('-') {
        Err(SelectorError::InvalidExerciseType(tag.to_string()))
    } else {
        Ok(())
    }
}

fn entries_from_document(document: TableDocument, width: usize) -> BTreeMap<StateKey, Vec<f64>> {
    let mut entries = BTreeMap::new();

    for (raw_key, mut values) in document {
        let Some(key) = StateKey::parse(&raw_key) else {
            tracing::warn!(key = %raw_key, "skipping malformed value table key");
            continue;
        };

        if values.len() != width {
            tracing::warn!(key = %raw_key, len = values.len(), width, "resizing value vector");
            values.resize(width, 0.0);
        }

        entries.insert(key, values);
    }

    entries
}
