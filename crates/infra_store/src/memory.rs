//! In-memory versioned aggregate store

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use uuid::Uuid;

use core_kernel::{AggregateStore, LedgerError, Version, Versioned};

/// Thread-safe in-memory store with optimistic version checks
///
/// Versions start at 1 on insert and bump on every successful update.
/// An update whose expected version is stale fails with
/// `LedgerError::Conflict` and changes nothing: of two racing writers
/// that read the same version, exactly one commits.
#[derive(Debug)]
pub struct MemoryStore<T> {
    kind: &'static str,
    entries: RwLock<HashMap<Uuid, (Version, T)>>,
}

impl<T: Clone> MemoryStore<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone + Send + Sync> AggregateStore<T> for MemoryStore<T> {
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn get(&self, id: Uuid) -> Result<Versioned<T>, LedgerError> {
        let entries = self.entries.read().expect("store lock poisoned");
        let (version, value) = entries
            .get(&id)
            .ok_or_else(|| LedgerError::not_found(self.kind, id))?;
        Ok(Versioned {
            version: *version,
            value: value.clone(),
        })
    }

    fn insert(&self, id: Uuid, value: T) -> Result<Version, LedgerError> {
        let mut entries = self.entries.write().expect("store lock poisoned");
        if entries.contains_key(&id) {
            return Err(LedgerError::invalid_state(format!(
                "{} {} already exists",
                self.kind, id
            )));
        }
        let version = Version::initial();
        entries.insert(id, (version, value));
        Ok(version)
    }

    fn update(&self, id: Uuid, expected: Version, value: T) -> Result<Version, LedgerError> {
        let mut entries = self.entries.write().expect("store lock poisoned");
        let entry = entries
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found(self.kind, id))?;
        if entry.0 != expected {
            debug!(kind = self.kind, %id, %expected, found = %entry.0, "version conflict");
            return Err(LedgerError::Conflict {
                aggregate: self.kind,
                expected_version: expected,
                found_version: entry.0,
            });
        }
        let next = expected.next();
        *entry = (next, value);
        Ok(next)
    }

    fn update_many(&self, writes: Vec<(Uuid, Version, T)>) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().expect("store lock poisoned");

        // Validate every version under the same lock before applying
        // anything: the batch commits whole or not at all.
        for (id, expected, _) in &writes {
            let (current, _) = entries
                .get(id)
                .ok_or_else(|| LedgerError::not_found(self.kind, *id))?;
            if current != expected {
                debug!(kind = self.kind, %id, %expected, found = %current, "version conflict in batch");
                return Err(LedgerError::Conflict {
                    aggregate: self.kind,
                    expected_version: *expected,
                    found_version: *current,
                });
            }
        }

        for (id, expected, value) in writes {
            entries.insert(id, (expected.next(), value));
        }
        Ok(())
    }

    fn list(&self) -> Vec<(Uuid, Versioned<T>)> {
        let entries = self.entries.read().expect("store lock poisoned");
        entries
            .iter()
            .map(|(id, (version, value))| {
                (
                    *id,
                    Versioned {
                        version: *version,
                        value: value.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore<String> {
        MemoryStore::new("Widget")
    }

    #[test]
    fn test_insert_then_get() {
        let store = store();
        let id = Uuid::new_v4();
        let version = store.insert(id, "a".to_string()).unwrap();
        assert_eq!(version, Version::initial());

        let loaded = store.get(id).unwrap();
        assert_eq!(loaded.value, "a");
        assert_eq!(loaded.version, Version::initial());
    }

    #[test]
    fn test_double_insert_rejected() {
        let store = store();
        let id = Uuid::new_v4();
        store.insert(id, "a".to_string()).unwrap();
        assert!(store.insert(id, "b".to_string()).is_err());
    }

    #[test]
    fn test_stale_update_conflicts() {
        let store = store();
        let id = Uuid::new_v4();
        let v1 = store.insert(id, "a".to_string()).unwrap();

        let v2 = store.update(id, v1, "b".to_string()).unwrap();
        assert_eq!(v2, v1.next());

        // A second writer still holding v1 loses the race
        let err = store.update(id, v1, "c".to_string()).unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { .. }));
        assert!(err.is_retryable());
        assert_eq!(store.get(id).unwrap().value, "b");
    }

    #[test]
    fn test_update_many_is_all_or_nothing() {
        let store = store();
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let va = store.insert(id_a, "a".to_string()).unwrap();
        let vb = store.insert(id_b, "b".to_string()).unwrap();

        // Invalidate b's version first
        store.update(id_b, vb, "b2".to_string()).unwrap();

        let err = store
            .update_many(vec![
                (id_a, va, "a2".to_string()),
                (id_b, vb, "b3".to_string()),
            ])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { .. }));
        // Nothing applied, including the valid write
        assert_eq!(store.get(id_a).unwrap().value, "a");
        assert_eq!(store.get(id_b).unwrap().value, "b2");

        let va = store.get(id_a).unwrap().version;
        let vb = store.get(id_b).unwrap().version;
        store
            .update_many(vec![
                (id_a, va, "a3".to_string()),
                (id_b, vb, "b3".to_string()),
            ])
            .unwrap();
        assert_eq!(store.get(id_a).unwrap().value, "a3");
        assert_eq!(store.get(id_b).unwrap().value, "b3");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let err = store().get(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }
}
