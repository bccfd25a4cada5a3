use crate::repos::IKVRepo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Store key holding the current compiled schedule.
pub const SCHEDULES_KEY: &str = "notification_schedules";

/// Typed, non-throwing facade over the kv repo.
///
/// The scheduler's correctness model tolerates lost writes (the next
/// poll cycle self-corrects) but not crashes, so a failed read is
/// reported as "absent" and a failed write is dropped. Both are logged.
#[derive(Clone)]
pub struct KVStore {
    repo: Arc<dyn IKVRepo>,
}

impl KVStore {
    pub fn new(repo: Arc<dyn IKVRepo>) -> Self {
        Self { repo }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.repo.get(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Malformed value under store key {}: {:?}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Store read failed for key {}: {:?}", key, e);
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not serialize value for store key {}: {:?}", key, e);
                return;
            }
        };
        if let Err(e) = self.repo.put(key, &value).await {
            warn!("Store write failed for key {}: {:?}", key, e);
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.repo.delete(key).await {
            warn!("Store delete failed for key {}: {:?}", key, e);
        }
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        match self.repo.keys_with_prefix(prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Store key listing failed for prefix {}: {:?}", prefix, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::InMemoryKVRepo;
    use serde_json::json;

    #[tokio::test]
    async fn absent_keys_read_as_none() {
        let store = KVStore::new(Arc::new(InMemoryKVRepo::new()));
        assert_eq!(store.get::<Vec<String>>("missing").await, None);
    }

    #[tokio::test]
    async fn malformed_values_read_as_none() {
        let repo = Arc::new(InMemoryKVRepo::new());
        repo.put("schedules", &json!({"not": "a list"}))
            .await
            .unwrap();
        let store = KVStore::new(repo);
        assert_eq!(store.get::<Vec<String>>("schedules").await, None);
    }

    #[tokio::test]
    async fn typed_values_round_trip() {
        let store = KVStore::new(Arc::new(InMemoryKVRepo::new()));
        store.put(SCHEDULES_KEY, &vec!["m1_08:00".to_string()]).await;
        assert_eq!(
            store.get::<Vec<String>>(SCHEDULES_KEY).await,
            Some(vec!["m1_08:00".to_string()])
        );
    }
}
