use crate::date::TimeOfDay;
use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// How often a medication is taken. The scheduler only fires on the
/// configured times of day; the frequency classification is carried
/// along for the management UI and the backup data shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Interval,
    /// Taken only when needed ("頓服").
    #[serde(rename = "prn")]
    AsNeeded,
}

/// A medication record as supplied by the medication-management
/// collaborator. The scheduler never mutates these, it only observes
/// snapshots when compiling notification schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: ID,
    pub name: String,
    pub dose_amount: f64,
    pub unit: String,
    /// Times of day the dose should be taken at.
    #[serde(default)]
    pub selected_times: Vec<TimeOfDay>,
    /// Legacy single-time field from records created before
    /// `selected_times` existed. Only consulted when the list is empty.
    #[serde(default)]
    pub time: Option<TimeOfDay>,
    pub frequency: Frequency,
}

impl Medication {
    /// The times this medication can fire a reminder at: the selected
    /// list when non-empty, otherwise the legacy single time.
    pub fn notification_times(&self) -> Vec<TimeOfDay> {
        if !self.selected_times.is_empty() {
            return self.selected_times.clone();
        }
        match self.time {
            Some(time) => vec![time],
            None => Vec::new(),
        }
    }
}

impl Entity for Medication {
    fn id(&self) -> ID {
        self.id.clone()
    }
}
