use crate::store::KVStore;
use pilltime_domain::FireRecord;

/// Prefix of the day-stamped store keys holding fire records.
pub const FIRED_KEY_PREFIX: &str = "fired_";

/// Day-scoped ledger of already-fired composite keys, persisted under
/// `fired_<YYYY-MM-DD>` store keys.
///
/// `mark_fired` is an optimistic read-append-write with no mutual
/// exclusion against concurrent passes. A lost update can at worst
/// repeat a notification with the same presentation tag, which the
/// host de-duplicates, so no lock is taken.
#[derive(Clone)]
pub struct FireLedger {
    store: KVStore,
}

impl FireLedger {
    pub fn new(store: KVStore) -> Self {
        Self { store }
    }

    fn day_key(day: &str) -> String {
        format!("{}{}", FIRED_KEY_PREFIX, day)
    }

    /// The full fire record for a day; an absent key is an empty record.
    pub async fn load(&self, day: &str) -> FireRecord {
        self.store
            .get(&Self::day_key(day))
            .await
            .unwrap_or_default()
    }

    pub async fn has_fired(&self, day: &str, fire_key: &str) -> bool {
        self.load(day).await.has_fired(fire_key)
    }

    pub async fn mark_fired(&self, day: &str, fire_key: &str) {
        let mut record = self.load(day).await;
        if record.mark_fired(fire_key) {
            self.store.put(&Self::day_key(day), &record).await;
        }
    }

    /// Empties the day's record. Used by the manual reset command.
    pub async fn reset(&self, day: &str) {
        self.store.put(&Self::day_key(day), &FireRecord::new()).await;
    }

    /// Deletes fire records for days strictly before `cutoff_day`
    /// (`YYYY-MM-DD`, compared lexicographically).
    pub async fn prune_before(&self, cutoff_day: &str) {
        for key in self.store.keys_with_prefix(FIRED_KEY_PREFIX).await {
            let day = &key[FIRED_KEY_PREFIX.len()..];
            if day < cutoff_day {
                self.store.delete(&key).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::InMemoryKVRepo;
    use std::sync::Arc;

    fn ledger() -> FireLedger {
        FireLedger::new(KVStore::new(Arc::new(InMemoryKVRepo::new())))
    }

    #[tokio::test]
    async fn marks_are_visible_within_the_same_day_only() {
        let ledger = ledger();
        assert!(!ledger.has_fired("2026-08-23", "m1_08:00").await);

        ledger.mark_fired("2026-08-23", "m1_08:00").await;

        assert!(ledger.has_fired("2026-08-23", "m1_08:00").await);
        // A new day key starts from an empty record
        assert!(!ledger.has_fired("2026-08-24", "m1_08:00").await);
    }

    #[tokio::test]
    async fn reset_empties_the_day() {
        let ledger = ledger();
        ledger.mark_fired("2026-08-23", "m1_08:00").await;
        ledger.mark_fired("2026-08-23", "m2_12:00").await;

        ledger.reset("2026-08-23").await;

        assert!(!ledger.has_fired("2026-08-23", "m1_08:00").await);
        assert!(ledger.load("2026-08-23").await.is_empty());
    }

    #[tokio::test]
    async fn pruning_removes_only_days_before_the_cutoff() {
        let ledger = ledger();
        ledger.mark_fired("2026-08-10", "m1_08:00").await;
        ledger.mark_fired("2026-08-16", "m1_08:00").await;
        ledger.mark_fired("2026-08-23", "m1_08:00").await;

        ledger.prune_before("2026-08-16").await;

        assert!(ledger.load("2026-08-10").await.is_empty());
        assert!(ledger.has_fired("2026-08-16", "m1_08:00").await);
        assert!(ledger.has_fired("2026-08-23", "m1_08:00").await);
    }
}
