use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningParams {
    /// Learning rate.
    pub alpha: f64,
    /// Discount factor.
    pub gamma: f64,
    /// Exploration rate.
    pub epsilon: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.6,
            epsilon: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardConfig {
    pub correct: f64,
    pub incorrect: f64,
    pub sentence_multiplier: f64,
    pub writing_multiplier: f64,
    pub writing_multiplier_min_level: u8,
    pub difficulty_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            correct: 2.0,
            incorrect: -1.0,
            sentence_multiplier: 1.5,
            writing_multiplier: 1.3,
            writing_multiplier_min_level: 3,
            difficulty_bonus: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatchetConfig {
    pub streak_threshold: u32,
    pub streak_step: u8,
    pub sentence_min_level: u8,
    pub writing_floor_after_questions: u32,
}

impl Default for RatchetConfig {
    fn default() -> Self {
        Self {
            streak_threshold: 3,
            streak_step: 2,
            sentence_min_level: 3,
            writing_floor_after_questions: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub learning: LearningParams,
    pub reward: RewardConfig,
    pub ratchet: RatchetConfig,
}

impl SelectorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = env_rate("QL_ALPHA") {
            config.learning.alpha = val;
        }
        if let Some(val) = env_rate("QL_GAMMA") {
            config.learning.gamma = val;
        }
        if let Some(val) = env_rate("QL_EPSILON") {
            config.learning.epsilon = val;
        }

        config
    }
}

fn env_rate(key: &str) -> Option<f64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v.clamp(0.0, 1.0)),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid learning parameter");
            None
        }
    }
}
