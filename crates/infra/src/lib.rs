mod config;
mod ledger;
mod repos;
mod store;
mod system;

pub use config::Config;
pub use ledger::{FireLedger, FIRED_KEY_PREFIX};
pub use repos::{IKVRepo, InMemoryKVRepo, Repos, SqliteKVRepo};
pub use store::{KVStore, SCHEDULES_KEY};
pub use system::{FakeSys, ISys, RealSys};

use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct PillTimeContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

impl PillTimeContext {
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }

    pub async fn create_sqlite(database_path: &str) -> anyhow::Result<Self> {
        Ok(Self {
            repos: Repos::create_sqlite(database_path).await?,
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        })
    }
}

/// Will setup the infrastructure context given the environment.
///
/// A store that cannot be opened degrades to the in-memory repo instead
/// of failing: the engine is expected to keep running unattended, and
/// the next compile/push repopulates the schedule.
pub async fn setup_context() -> PillTimeContext {
    let config = Config::new();
    match &config.database_path {
        Some(path) => match PillTimeContext::create_sqlite(path).await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(
                    "Could not open sqlite store at {}: {:?}. Falling back to in-memory store.",
                    path, e
                );
                PillTimeContext::create_inmemory()
            }
        },
        None => PillTimeContext::create_inmemory(),
    }
}
