// In-memory store: reference semantics for the persistence contract and
// the backing for the test suite. A single mutex per map serializes
// writers, which is exactly the per-requisition exclusivity the
// coordinator requires.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::requisition::{
    FieldPatch, HistoryRecord, Requisition, RequisitionId, RequisitionItem, Role, Status, UserId,
};
use crate::storage::{RequisitionFilter, RequisitionStore, StorageError, UserDirectory};

#[derive(Default)]
pub struct InMemoryStore {
    requisitions: Mutex<HashMap<RequisitionId, Requisition>>,
    sequences: Mutex<HashMap<i32, u32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequisitionStore for InMemoryStore {
    async fn load(&self, id: &RequisitionId) -> Result<Option<Requisition>, StorageError> {
        Ok(self.requisitions.lock().await.get(id).cloned())
    }

    async fn create(&self, requisition: Requisition) -> Result<Requisition, StorageError> {
        let mut map = self.requisitions.lock().await;
        if map.contains_key(&requisition.id) {
            return Err(StorageError::Backend(format!(
                "duplicate requisition id {}",
                requisition.id
            )));
        }
        map.insert(requisition.id.clone(), requisition.clone());
        Ok(requisition)
    }

    async fn update_status(
        &self,
        id: &RequisitionId,
        expected: Status,
        new_status: Status,
        rejection_reason: Option<String>,
        record: HistoryRecord,
    ) -> Result<Requisition, StorageError> {
        let mut map = self.requisitions.lock().await;
        let requisition = map.get_mut(id).ok_or(StorageError::NotFound)?;
        if requisition.status != expected {
            return Err(StorageError::Conflict {
                expected,
                found: requisition.status,
            });
        }
        requisition.status = new_status;
        requisition.rejection_reason = rejection_reason;
        requisition.updated_at = record.timestamp;
        requisition.history.push(record);
        Ok(requisition.clone())
    }

    async fn update_fields(
        &self,
        id: &RequisitionId,
        patch: FieldPatch,
    ) -> Result<Requisition, StorageError> {
        let mut map = self.requisitions.lock().await;
        let requisition = map.get_mut(id).ok_or(StorageError::NotFound)?;
        patch.apply_to(requisition);
        requisition.updated_at = Utc::now();
        Ok(requisition.clone())
    }

    async fn replace_items(
        &self,
        id: &RequisitionId,
        items: Vec<RequisitionItem>,
    ) -> Result<Requisition, StorageError> {
        let mut map = self.requisitions.lock().await;
        let requisition = map.get_mut(id).ok_or(StorageError::NotFound)?;
        requisition.items = items;
        requisition.updated_at = Utc::now();
        Ok(requisition.clone())
    }

    async fn delete(&self, id: &RequisitionId) -> Result<(), StorageError> {
        self.requisitions
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn allocate_next_sequence(&self, year: i32) -> Result<u32, StorageError> {
        let mut sequences = self.sequences.lock().await;
        let counter = sequences.entry(year).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn list(&self, filter: &RequisitionFilter) -> Result<Vec<Requisition>, StorageError> {
        let map = self.requisitions.lock().await;
        let mut matches: Vec<Requisition> = map
            .values()
            .filter(|requisition| filter.matches(requisition))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matches)
    }
}

/// Fixed-fixture user directory for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct StaticUserDirectory {
    users: Vec<(UserId, Role, bool)>,
}

impl StaticUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: UserId, role: Role, active: bool) -> Self {
        self.users.push((id, role, active));
        self
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn active_user_ids(&self, role: Role) -> Result<Vec<UserId>, StorageError> {
        Ok(self
            .users
            .iter()
            .filter(|(_, user_role, active)| *user_role == role && *active)
            .map(|(id, _, _)| *id)
            .collect())
    }
}
