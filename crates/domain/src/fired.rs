use serde::{Deserialize, Serialize};

/// The set of composite keys already notified for one calendar day.
/// Persisted as a plain JSON array under the day's `fired_` store key;
/// an absent key is the same as an empty record. Grows monotonically
/// through the day and is only emptied by an explicit reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FireRecord(Vec<String>);

impl FireRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self, fire_key: &str) -> bool {
        self.0.iter().any(|k| k == fire_key)
    }

    /// Appends the key if absent. Returns whether the record changed,
    /// so callers can skip the write-back for repeats.
    pub fn mark_fired(&mut self, fire_key: &str) -> bool {
        if self.has_fired(fire_key) {
            return false;
        }
        self.0.push(fire_key.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
