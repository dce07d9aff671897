// Persistence and identity contracts. The engine talks to storage only
// through these traits; transport and schema concerns live behind them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::requisition::{
    FieldPatch, HistoryRecord, Priority, Requisition, RequisitionId, RequisitionItem, Role,
    Status, UserId,
};

pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

pub use memory::{InMemoryStore, StaticUserDirectory};
#[cfg(feature = "database")]
pub use sqlite::SqliteStore;

/// Storage-layer failures, mapped onto the engine taxonomy by the
/// coordinator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,

    /// A conditional update observed a different stored status than the
    /// caller expected.
    #[error("conditional update failed: expected status {expected}, found {found}")]
    Conflict { expected: Status, found: Status },

    /// Timeout or contention; the whole operation is safe to retry.
    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Listing filter. `search` matches id, work order, justification, or
/// supplier as a case-insensitive substring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequisitionFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub created_by: Option<UserId>,
    pub search: Option<String>,
}

impl RequisitionFilter {
    /// Shared matching rule so every store implementation filters the
    /// same way.
    pub fn matches(&self, requisition: &Requisition) -> bool {
        if let Some(status) = self.status {
            if requisition.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if requisition.priority != priority {
                return false;
            }
        }
        if let Some(created_by) = self.created_by {
            if requisition.created_by != created_by {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystacks = [
                Some(requisition.id.as_str()),
                requisition.work_order.as_deref(),
                requisition.justification.as_deref(),
                requisition.supplier.as_deref(),
            ];
            let hit = haystacks
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Persistence contract for requisitions and the per-year sequence
/// counter.
///
/// Mutations that touch several fields (entity plus history, items
/// replacement) must be applied as one atomic unit: either everything is
/// visible afterwards or nothing is.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait RequisitionStore: Send + Sync {
    async fn load(&self, id: &RequisitionId) -> Result<Option<Requisition>, StorageError>;

    /// Persists a new entity together with its creation history record.
    async fn create(&self, requisition: Requisition) -> Result<Requisition, StorageError>;

    /// Conditionally moves `id` from `expected` to `new_status`, replaces
    /// the rejection reason, and appends `record`, all atomically.
    /// Returns `Conflict` when the stored status is not `expected`.
    async fn update_status(
        &self,
        id: &RequisitionId,
        expected: Status,
        new_status: Status,
        rejection_reason: Option<String>,
        record: HistoryRecord,
    ) -> Result<Requisition, StorageError>;

    async fn update_fields(
        &self,
        id: &RequisitionId,
        patch: FieldPatch,
    ) -> Result<Requisition, StorageError>;

    async fn replace_items(
        &self,
        id: &RequisitionId,
        items: Vec<RequisitionItem>,
    ) -> Result<Requisition, StorageError>;

    /// Hard delete; the record and its history are gone afterwards.
    async fn delete(&self, id: &RequisitionId) -> Result<(), StorageError>;

    /// Atomically reserves the next sequence number for `year`, starting
    /// at 1. Two concurrent callers must never receive the same number;
    /// gaps from failed operations are acceptable.
    async fn allocate_next_sequence(&self, year: i32) -> Result<u32, StorageError>;

    /// Matching requisitions, newest first.
    async fn list(&self, filter: &RequisitionFilter) -> Result<Vec<Requisition>, StorageError>;
}

/// Identity collaborator: who currently holds a role. Only active users
/// are notification targets.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn active_user_ids(&self, role: Role) -> Result<Vec<UserId>, StorageError>;
}
