mod inmemory;
mod sqlite;

pub use inmemory::InMemoryKVRepo;
pub use sqlite::SqliteKVRepo;

use serde_json::Value;

/// Durable key-value storage shared by the foreground controller and
/// the background engine. Values are arbitrary JSON; writes are
/// last-write-wins per key with no multi-key atomicity.
#[async_trait::async_trait]
pub trait IKVRepo: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    async fn put(&self, key: &str, value: &Value) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    async fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>>;
}
