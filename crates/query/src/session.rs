use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentContext {
    pub entry_id: String,
    pub drug_name: String,
    pub updated_at: DateTime<Utc>,
}

/// Per-session record of the last drug an answer was about. Advisory only:
/// retrieval never reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionMemory {
    current: Option<CurrentContext>,
    questions_answered: usize,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry_id: &str, drug_name: &str) {
        self.record_at(entry_id, drug_name, Utc::now());
    }

    pub fn record_at(&mut self, entry_id: &str, drug_name: &str, at: DateTime<Utc>) {
        self.current = Some(CurrentContext {
            entry_id: entry_id.to_string(),
            drug_name: drug_name.to_string(),
            updated_at: at,
        });
        self.questions_answered += 1;
    }

    pub fn current(&self) -> Option<&CurrentContext> {
        self.current.as_ref()
    }

    pub fn current_drug(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.drug_name.as_str())
    }

    pub fn questions_answered(&self) -> usize {
        self.questions_answered
    }
}
