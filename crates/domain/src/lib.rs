mod date;
mod fired;
mod medication;
mod notification;
mod schedule;
mod shared;

pub use date::{format_day, TimeOfDay};
pub use fired::FireRecord;
pub use medication::{Frequency, Medication};
pub use notification::{MessageStyle, NotificationSetting, NotificationSettings};
pub use schedule::{compile_schedules, fire_key, ScheduleEntry};
pub use shared::entity::{Entity, ID};
