use serde::{Deserialize, Serialize};

use crate::requisition::{Actor, Role, RequisitionId, Status, UserId};

/// Categories understood by the notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    New,
    ValidationRequired,
    StatusChange,
}

/// One planned notification. The engine only plans; durable storage,
/// delivery, and read-state belong to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub requisition_id: RequisitionId,
    pub for_user: UserId,
    pub message: String,
    pub category: NotificationCategory,
}

/// Who hears about a transition into a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every active user holding the role.
    ActiveRole(Role),
    /// The requisition's original creator, unless the creator performed
    /// the transition themselves.
    Creator,
}

/// The fan-out table, keyed by the transition target. Kept as data so the
/// rule set stays exhaustively testable.
pub fn audience_for(target: Status) -> Audience {
    match target {
        Status::SubmittedToAdmin => Audience::ActiveRole(Role::Administration),
        Status::PendingPriceValidation => Audience::ActiveRole(Role::Validator),
        _ => Audience::Creator,
    }
}

pub fn category_for(target: Status) -> NotificationCategory {
    match target {
        Status::SubmittedToAdmin => NotificationCategory::New,
        Status::PendingPriceValidation => NotificationCategory::ValidationRequired,
        _ => NotificationCategory::StatusChange,
    }
}

pub fn message_for(id: &RequisitionId, target: Status) -> String {
    match target {
        Status::SubmittedToAdmin => format!("New requisition {} submitted for review", id),
        Status::PendingPriceValidation => {
            format!("Requisition {} awaiting price validation", id)
        }
        _ => format!("Requisition {} changed status to {}", id, target),
    }
}

/// Applies the creator skip rule: the actor never notifies themselves.
pub fn creator_recipients(created_by: UserId, actor: &Actor) -> Vec<UserId> {
    if created_by == actor.id {
        Vec::new()
    } else {
        vec![created_by]
    }
}

/// Builds intents for already-resolved recipients.
pub fn intents(
    id: &RequisitionId,
    target: Status,
    recipients: &[UserId],
) -> Vec<NotificationIntent> {
    recipients
        .iter()
        .map(|user| NotificationIntent {
            requisition_id: id.clone(),
            for_user: *user,
            message: message_for(id, target),
            category: category_for(target),
        })
        .collect()
}
