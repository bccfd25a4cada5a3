mod kv;

pub use kv::{IKVRepo, InMemoryKVRepo, SqliteKVRepo};

use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub kv: Arc<dyn IKVRepo>,
}

impl Repos {
    pub async fn create_sqlite(database_path: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let kv = SqliteKVRepo::open(database_path).await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self { kv: Arc::new(kv) })
    }

    pub fn create_inmemory() -> Self {
        Self {
            kv: Arc::new(InMemoryKVRepo::new()),
        }
    }
}
