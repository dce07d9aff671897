// The lifecycle engine: who may move a requisition where, who may touch
// which fields, and who hears about it.

pub mod coordinator;
pub mod edit_guard;
pub mod notifications;
pub mod transition_authority;

pub use coordinator::{LifecycleCoordinator, Statistics, TransitionOutcome};
pub use edit_guard::{EditGuard, ADMINISTRATION_EDITABLE_STATUSES};
pub use notifications::{Audience, NotificationCategory, NotificationIntent};
pub use transition_authority::{SideData, TransitionAuthority};
