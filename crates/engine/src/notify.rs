use pilltime_domain::ID;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

pub const NOTIFICATION_ICON: &str = "/logo192.png";
pub const NOTIFICATION_BADGE: &str = "/favicon-32x32.png";
pub const VIBRATION_PATTERN: [u32; 5] = [200, 100, 200, 100, 200];

/// Payload carried by a displayed notification and handed back on click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub med_id: ID,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowNotificationOptions {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Presentation-layer identity: two notifications with the same tag
    /// replace each other instead of stacking, which bounds the damage
    /// of a duplicate fire.
    pub tag: String,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub data: NotificationData,
}

/// The notification presentation host. Permission handling lives with
/// the host; the engine assumes it has already been granted.
#[async_trait::async_trait]
pub trait INotificationHost: Send + Sync {
    async fn show(&self, notification: ShowNotificationOptions) -> anyhow::Result<()>;
}

/// Host that logs reminders instead of displaying them. Used by the
/// daemon when running without a real presentation surface.
pub struct LogNotificationHost;

#[async_trait::async_trait]
impl INotificationHost for LogNotificationHost {
    async fn show(&self, notification: ShowNotificationOptions) -> anyhow::Result<()> {
        info!(
            tag = %notification.tag,
            title = %notification.title,
            body = %notification.body,
            "Displaying medication reminder"
        );
        Ok(())
    }
}

/// Host that records every shown notification, for assertions in tests.
#[derive(Clone, Default)]
pub struct RecordingNotificationHost {
    shown: Arc<Mutex<Vec<ShowNotificationOptions>>>,
}

impl RecordingNotificationHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<ShowNotificationOptions> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl INotificationHost for RecordingNotificationHost {
    async fn show(&self, notification: ShowNotificationOptions) -> anyhow::Result<()> {
        self.shown.lock().unwrap().push(notification);
        Ok(())
    }
}
