use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::qlearn::AdaptiveSelector;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    selector: Arc<AdaptiveSelector>,
}

impl AppState {
    pub fn new(selector: Arc<AdaptiveSelector>) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            selector,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn selector(&self) -> Arc<AdaptiveSelector> {
        Arc::clone(&self.selector)
    }
}
