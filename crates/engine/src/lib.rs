mod clients;
mod controller;
mod engine;
mod messages;
mod notify;

pub use clients::{ClientHandle, IContextRegistry, InProcessContextRegistry};
pub use controller::{Controller, IMedicationSource, InMemoryMedicationSource};
pub use engine::{EngineHandle, NotificationEngine};
pub use messages::{ClientMessage, EngineMessage};
pub use notify::{
    INotificationHost, LogNotificationHost, NotificationData, RecordingNotificationHost,
    ShowNotificationOptions,
};
