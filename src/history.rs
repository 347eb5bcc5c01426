use std::collections::VecDeque;

use crate::models::PredictionEntry;

pub const HISTORY_CAPACITY: usize = 10;

/// The most recent predictions, oldest first.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    entries: VecDeque<PredictionEntry>,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }
}

impl RollingHistory {
    pub fn append(&mut self, entry: PredictionEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredictionEntry> {
        self.entries.iter()
    }
}
