use crate::date::TimeOfDay;
use crate::medication::Medication;
use crate::notification::NotificationSettings;
use crate::shared::entity::ID;
use serde::{Deserialize, Serialize};

/// One fireable (medication, time-of-day) occurrence, derived from a
/// medication snapshot and its notification setting. Entries are
/// recomputed from scratch on every compilation; the compiled list is
/// what gets persisted and pushed to the background engine, never the
/// individual entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub med_id: ID,
    pub time: TimeOfDay,
    pub title: String,
    pub body: String,
}

impl ScheduleEntry {
    /// Composite key identifying this dose occurrence within a day,
    /// also used as the presentation-layer notification tag.
    pub fn fire_key(&self) -> String {
        fire_key(&self.med_id, &self.time)
    }
}

pub fn fire_key(med_id: &ID, time: &TimeOfDay) -> String {
    format!("{}_{}", med_id, time)
}

/// Compiles the flat notification schedule from the current medication
/// collection and notification settings. Always a full rebuild.
///
/// A medication contributes entries only when it has an enabled setting
/// and at least one time of day. Output order is medication iteration
/// order, then per-medication time order.
pub fn compile_schedules(
    medications: &[Medication],
    settings: &NotificationSettings,
) -> Vec<ScheduleEntry> {
    let mut entries = Vec::new();

    for med in medications {
        let setting = match settings.get(&med.id) {
            Some(setting) if setting.enabled => setting,
            _ => continue,
        };

        for time in med.notification_times() {
            entries.push(ScheduleEntry {
                med_id: med.id.clone(),
                time,
                title: setting.message_style.title().to_string(),
                body: format!(
                    "{}を{} {}服用してください",
                    med.name, med.dose_amount, med.unit
                ),
            });
        }
    }

    entries
}
