// Solped Engine - purchase requisition lifecycle engine
// This exposes the core components for embedding and testing

pub mod config;
pub mod errors;
pub mod lifecycle;
pub mod requisition;
pub mod sequence;
pub mod storage;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{DatabaseConfig, SequenceConfig, SolpedEngineConfig, StorageConfig};
pub use errors::EngineError;
pub use lifecycle::{
    EditGuard, LifecycleCoordinator, NotificationCategory, NotificationIntent, SideData,
    Statistics, TransitionAuthority, TransitionOutcome,
};
pub use requisition::{
    Actor, FieldGroup, FieldPatch, HistoryRecord, NewRequisition, PatchValue, Priority,
    Requisition, RequisitionId, RequisitionItem, Role, Status, UserId,
};
pub use sequence::SequenceAllocator;
pub use storage::{
    InMemoryStore, RequisitionFilter, RequisitionStore, StaticUserDirectory, StorageError,
    UserDirectory,
};
pub use telemetry::{generate_correlation_id, init_telemetry, shutdown_telemetry};

#[cfg(feature = "database")]
pub use storage::SqliteStore;
