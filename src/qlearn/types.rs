use std::fmt;

use serde::{Deserialize, Serialize};

pub type Difficulty = u8;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseType {
    Listening,
    Writing,
    SpeakingWord,
    SpeakingSentence,
    /// Generic allow-list tag satisfied by either speaking variant.
    Speaking,
    Other(String),
}

impl ExerciseType {
    pub fn parse(s: &str) -> Self {
        match s {
            "listening" => Self::Listening,
            "writing" => Self::Writing,
            "speaking_word" => Self::SpeakingWord,
            "speaking_sentence" => Self::SpeakingSentence,
            "speaking" => Self::Speaking,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Listening => "listening",
            Self::Writing => "writing",
            Self::SpeakingWord => "speaking_word",
            Self::SpeakingSentence => "speaking_sentence",
            Self::Speaking => "speaking",
            Self::Other(tag) => tag.as_str(),
        }
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, Self::SpeakingWord | Self::SpeakingSentence)
    }
}

impl From<String> for ExerciseType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ExerciseType> for String {
    fn from(value: ExerciseType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSpec {
    pub level: Difficulty,
    pub description: String,
    pub exercise_types: Vec<ExerciseType>,
}

impl LevelSpec {
    fn new(level: Difficulty, description: &str, exercise_types: Vec<ExerciseType>) -> Self {
        Self {
            level,
            description: description.to_string(),
            exercise_types,
        }
    }

    /// Speaking variants also match a generic `speaking` entry.
    pub fn allows(&self, exercise_type: &ExerciseType) -> bool {
        self.exercise_types.contains(exercise_type)
            || (exercise_type.is_speaking()
                && self.exercise_types.contains(&ExerciseType::Speaking))
    }
}

/// Ordered, contiguous set of difficulty levels.
#[derive(Debug, Clone, Serialize)]
pub struct LevelCatalog {
    levels: Vec<LevelSpec>,
}

impl LevelCatalog {
    pub fn levels(&self) -> &[LevelSpec] {
        &self.levels
    }

    /// Also the width of every value vector.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn min_level(&self) -> Difficulty {
        self.levels.first().map(|l| l.level).unwrap_or(1)
    }

    pub fn max_level(&self) -> Difficulty {
        self.levels.last().map(|l| l.level).unwrap_or(1)
    }

    pub fn get(&self, level: Difficulty) -> Option<&LevelSpec> {
        self.levels.iter().find(|l| l.level == level)
    }

    pub fn contains(&self, level: i64) -> bool {
        level >= i64::from(self.min_level()) && level <= i64::from(self.max_level())
    }

    pub fn clamp(&self, level: i64) -> Difficulty {
        level.clamp(i64::from(self.min_level()), i64::from(self.max_level())) as Difficulty
    }

    /// Vector slot holding the value of moving into `level`.
    pub fn slot(&self, level: Difficulty) -> usize {
        usize::from(level.saturating_sub(self.min_level()))
    }

    pub fn allowed_types(&self, level: Difficulty) -> &[ExerciseType] {
        self.get(level)
            .map(|l| l.exercise_types.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        use ExerciseType::*;

        Self {
            levels: vec![
                LevelSpec::new(
                    1,
                    "Single words with audio and native-language support",
                    vec![SpeakingWord, Listening, Writing],
                ),
                LevelSpec::new(
                    2,
                    "2-word phrases with images",
                    vec![SpeakingWord, Listening, Writing],
                ),
                LevelSpec::new(3, "Simple sentences", vec![SpeakingSentence, Listening, Writing]),
                LevelSpec::new(
                    4,
                    "Questions & answers",
                    vec![SpeakingSentence, Listening, Writing],
                ),
                LevelSpec::new(
                    5,
                    "Short conversations",
                    vec![SpeakingSentence, Listening, Writing],
                ),
            ],
        }
    }
}

/// (learner, difficulty, exercise type) key of the value table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey {
    pub learner_id: String,
    pub difficulty: Difficulty,
    pub exercise_type: ExerciseType,
}

impl StateKey {
    pub fn new(
        learner_id: impl Into<String>,
        difficulty: Difficulty,
        exercise_type: ExerciseType,
    ) -> Self {
        Self {
            learner_id: learner_id.into(),
            difficulty,
            exercise_type,
        }
    }

    /// Parses `<learner>-<difficulty>-<type>` from the right so learner ids may contain `-`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.rsplitn(3, '-');
        let exercise_type = parts.next().filter(|s| !s.is_empty())?;
        let difficulty = parts.next()?.parse::<Difficulty>().ok()?;
        let learner_id = parts.next().filter(|s| !s.is_empty())?;

        Some(Self::new(learner_id, difficulty, ExerciseType::parse(exercise_type)))
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.learner_id, self.difficulty, self.exercise_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub difficulty: Difficulty,
    pub exercise_type: ExerciseType,
    pub source: SelectionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Forced,
    Explore,
    Exploit,
}

impl SelectionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::Explore => "explore",
            Self::Exploit => "exploit",
        }
    }
}
