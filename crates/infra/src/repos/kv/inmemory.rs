use super::IKVRepo;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct InMemoryKVRepo {
    values: Mutex<HashMap<String, Value>>,
}

impl InMemoryKVRepo {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryKVRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IKVRepo for InMemoryKVRepo {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let values = self.values.lock().unwrap();
        Ok(values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut values = self.values.lock().unwrap();
        values.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let values = self.values.lock().unwrap();
        Ok(values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
