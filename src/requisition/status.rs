use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a requisition.
///
/// The serialized names are a wire contract shared with every consumer of
/// the engine (frontend, database, notification sink). They are
/// case-sensitive and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Draft,
    SubmittedToAdmin,
    InReviewQuoting,
    PendingPriceValidation,
    RejectedValidation,
    ApprovedForPurchase,
    PurchaseOrderIssued,
    Purchased,
    ReceivedDelivered,
    Cancelled,
}

impl Status {
    /// Every status, in lifecycle order. Used by table-driven permission
    /// checks and by exhaustive tests.
    pub const ALL: [Status; 10] = [
        Status::Draft,
        Status::SubmittedToAdmin,
        Status::InReviewQuoting,
        Status::PendingPriceValidation,
        Status::RejectedValidation,
        Status::ApprovedForPurchase,
        Status::PurchaseOrderIssued,
        Status::Purchased,
        Status::ReceivedDelivered,
        Status::Cancelled,
    ];

    /// Terminal states have no outgoing transitions for any role.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::ReceivedDelivered | Status::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "DRAFT",
            Status::SubmittedToAdmin => "SUBMITTED_TO_ADMIN",
            Status::InReviewQuoting => "IN_REVIEW_QUOTING",
            Status::PendingPriceValidation => "PENDING_PRICE_VALIDATION",
            Status::RejectedValidation => "REJECTED_VALIDATION",
            Status::ApprovedForPurchase => "APPROVED_FOR_PURCHASE",
            Status::PurchaseOrderIssued => "PURCHASE_ORDER_ISSUED",
            Status::Purchased => "PURCHASED",
            Status::ReceivedDelivered => "RECEIVED_DELIVERED",
            Status::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority levels for requisitions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        };
        write!(f, "{}", label)
    }
}
