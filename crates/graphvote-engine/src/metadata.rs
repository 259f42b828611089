//! Node metadata mirror.
//!
//! Each tier's resolved stance is mirrored as a `{"status": ...}` record on the
//! node's view-model metadata so a remounted node starts from its last known
//! stance. The synchronizer writes on every state change; the controller reads
//! only once, at construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use graphvote_core::VoteStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::context::VoteIntentContext;
use crate::state::{VoteObserver, VoteState};

/// Record stored under a tier's metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: VoteStatus,
}

/// Key-value metadata attached to node view-models.
pub trait MetadataStore: Send + Sync {
    fn read(&self, entity_id: &str, key: &str) -> Option<VoteStatus>;
    fn write(&self, entity_id: &str, key: &str, status: VoteStatus);
}

/// Metadata kept as one JSON object per entity.
#[derive(Debug, Default)]
pub struct InMemoryMetadata {
    entries: Mutex<HashMap<String, Map<String, Value>>>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Map<String, Value>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whole metadata object for an entity.
    pub fn record(&self, entity_id: &str) -> Option<Value> {
        self.lock()
            .get(entity_id)
            .map(|map| Value::Object(map.clone()))
    }

    /// Replace an entity's metadata, e.g. when a node is loaded with cached state.
    pub fn load(&self, entity_id: &str, metadata: Value) -> crate::Result<()> {
        match metadata {
            Value::Object(map) => {
                self.lock().insert(entity_id.to_string(), map);
                Ok(())
            }
            other => Err(crate::Error::InvalidResponse(format!(
                "metadata for {} must be an object, got {}",
                entity_id, other
            ))),
        }
    }
}

impl MetadataStore for InMemoryMetadata {
    fn read(&self, entity_id: &str, key: &str) -> Option<VoteStatus> {
        let value = self.lock().get(entity_id)?.get(key)?.clone();
        match serde_json::from_value::<StatusRecord>(value) {
            Ok(record) => Some(record.status),
            Err(e) => {
                warn!(entity_id, key, error = %e, "Ignoring malformed vote metadata");
                None
            }
        }
    }

    fn write(&self, entity_id: &str, key: &str, status: VoteStatus) {
        match serde_json::to_value(StatusRecord { status }) {
            Ok(value) => {
                self.lock()
                    .entry(entity_id.to_string())
                    .or_default()
                    .insert(key.to_string(), value);
            }
            Err(e) => warn!(entity_id, key, error = %e, "Failed to encode vote metadata"),
        }
    }
}

/// Mirrors a controller's stance into the metadata store.
pub struct MetadataSynchronizer {
    store: Arc<dyn MetadataStore>,
}

impl MetadataSynchronizer {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub fn write(&self, context: &VoteIntentContext, status: VoteStatus) {
        trace!(
            entity_id = %context.entity_id,
            tier = %context.tier,
            %status,
            "Mirroring vote status"
        );
        self.store.write(&context.entity_id, &context.metadata_key, status);
    }
}

impl VoteObserver for MetadataSynchronizer {
    fn state_changed(&self, context: &VoteIntentContext, state: &VoteState) {
        self.write(context, state.user_status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn write_then_read() {
        let store = InMemoryMetadata::new();
        store.write("s-1", "inclusionVoteStatus", VoteStatus::Agree);
        store.write("s-1", "contentVoteStatus", VoteStatus::Disagree);

        assert_eq!(store.read("s-1", "inclusionVoteStatus"), Some(VoteStatus::Agree));
        assert_eq!(store.read("s-1", "contentVoteStatus"), Some(VoteStatus::Disagree));
        assert_eq!(store.read("s-2", "inclusionVoteStatus"), None);
        assert_eq!(
            store.record("s-1").unwrap(),
            json!({
                "inclusionVoteStatus": {"status": "agree"},
                "contentVoteStatus": {"status": "disagree"},
            })
        );
    }

    #[test]
    fn malformed_record_reads_as_missing() {
        let store = InMemoryMetadata::new();
        store
            .load("s-1", json!({"inclusionVoteStatus": "agree", "label": "x"}))
            .unwrap();
        assert_eq!(store.read("s-1", "inclusionVoteStatus"), None);
        assert!(store.load("s-1", json!([1, 2])).is_err());
    }
}
