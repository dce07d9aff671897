// Requisition data model: identifiers, statuses, roles, and the entity
// itself. Permission logic lives in crate::lifecycle.

pub mod id;
pub mod roles;
pub mod status;
pub mod types;

pub use id::{InvalidRequisitionId, RequisitionId};
pub use roles::{Actor, Role, UserId};
pub use status::{Priority, Status};
pub use types::{
    validate_items, FieldGroup, FieldPatch, HistoryRecord, NewRequisition, PatchValue,
    Requisition, RequisitionItem,
};
