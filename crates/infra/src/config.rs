use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the sqlite store file. When unset the in-memory store is
    /// used, which only lives as long as the process.
    pub database_path: Option<String>,
    /// How often the background engine polls the schedule.
    pub check_interval: Duration,
    /// How many days of fire records to keep before pruning old
    /// `fired_` keys from the store.
    pub fired_retention_days: u32,
    /// Target url carried in notification payloads, used by the
    /// click handler to open or focus a foreground context.
    pub app_url: String,
    /// How long a connecting controller waits for the engine to take
    /// control before falling back to best-effort direct messaging.
    pub handshake_timeout: Duration,
}

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;
const DEFAULT_FIRED_RETENTION_DAYS: u32 = 7;

impl Config {
    pub fn new() -> Self {
        let database_path = std::env::var("PILLTIME_DATABASE_PATH").ok();

        let check_interval_secs = match std::env::var("PILLTIME_CHECK_INTERVAL_SECS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!(
                        "The given PILLTIME_CHECK_INTERVAL_SECS: {} is not valid, falling back to the default: {}.",
                        raw, DEFAULT_CHECK_INTERVAL_SECS
                    );
                    DEFAULT_CHECK_INTERVAL_SECS
                }
            },
            Err(_) => DEFAULT_CHECK_INTERVAL_SECS,
        };

        let fired_retention_days = match std::env::var("PILLTIME_FIRED_RETENTION_DAYS") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(days) if days > 0 => days,
                _ => {
                    warn!(
                        "The given PILLTIME_FIRED_RETENTION_DAYS: {} is not valid, falling back to the default: {}.",
                        raw, DEFAULT_FIRED_RETENTION_DAYS
                    );
                    DEFAULT_FIRED_RETENTION_DAYS
                }
            },
            Err(_) => DEFAULT_FIRED_RETENTION_DAYS,
        };

        let app_url = std::env::var("PILLTIME_APP_URL").unwrap_or_else(|_| "/".into());

        Self {
            database_path,
            check_interval: Duration::from_secs(check_interval_secs),
            fired_retention_days,
            app_url,
            handshake_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
