use crate::requisition::{Role, Status};

/// Extra data a transition requires before it may be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideData {
    None,
    /// The transition must carry a non-empty note explaining the
    /// rejection; the note becomes the requisition's rejection reason.
    RejectionNote,
}

/// The authoritative transition table: which statuses a role may move a
/// requisition into from its current status.
///
/// The happy path runs DRAFT through RECEIVED_DELIVERED with a re-quote
/// loop out of REJECTED_VALIDATION. Each stage is advanced by its owner;
/// the supervisor can do everything an owner can, and can additionally
/// cancel from any non-terminal state. Stage owners may cancel only up to
/// and including the price-validation stage.
pub struct TransitionAuthority;

impl TransitionAuthority {
    /// Legal target set for (current status, acting role). Empty means
    /// the role has no transition available from this status.
    pub fn legal_targets(current: Status, role: Role) -> &'static [Status] {
        use Status::*;
        match (current, role) {
            (Draft, Role::Requester | Role::Supervisor) => &[SubmittedToAdmin, Cancelled],

            (SubmittedToAdmin, Role::Administration | Role::Supervisor) => {
                &[InReviewQuoting, Cancelled]
            }

            (InReviewQuoting, Role::Administration | Role::Supervisor) => {
                &[PendingPriceValidation, Cancelled]
            }

            (PendingPriceValidation, Role::Validator | Role::Supervisor) => {
                &[ApprovedForPurchase, RejectedValidation, Cancelled]
            }

            (RejectedValidation, Role::Administration) => &[InReviewQuoting],
            (RejectedValidation, Role::Supervisor) => &[InReviewQuoting, Cancelled],

            (ApprovedForPurchase, Role::Administration) => &[PurchaseOrderIssued],
            (ApprovedForPurchase, Role::Supervisor) => &[PurchaseOrderIssued, Cancelled],

            (PurchaseOrderIssued, Role::Administration) => &[Purchased],
            (PurchaseOrderIssued, Role::Supervisor) => &[Purchased, Cancelled],

            (Purchased, Role::Administration) => &[ReceivedDelivered],
            (Purchased, Role::Supervisor) => &[ReceivedDelivered, Cancelled],

            _ => &[],
        }
    }

    pub fn can_transition(current: Status, role: Role, target: Status) -> bool {
        Self::legal_targets(current, role).contains(&target)
    }

    /// What the transition must carry besides the target status itself.
    pub fn side_data(target: Status) -> SideData {
        match target {
            Status::RejectedValidation => SideData::RejectionNote,
            _ => SideData::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;
    use Status::*;

    // The full (status, role) -> legal set table, spelled out as ground
    // truth. Any drift in the implementation fails here.
    const TABLE: [((Status, Role), &[Status]); 40] = [
        ((Draft, Requester), &[SubmittedToAdmin, Cancelled]),
        ((Draft, Administration), &[]),
        ((Draft, Validator), &[]),
        ((Draft, Supervisor), &[SubmittedToAdmin, Cancelled]),
        ((SubmittedToAdmin, Requester), &[]),
        ((SubmittedToAdmin, Administration), &[InReviewQuoting, Cancelled]),
        ((SubmittedToAdmin, Validator), &[]),
        ((SubmittedToAdmin, Supervisor), &[InReviewQuoting, Cancelled]),
        ((InReviewQuoting, Requester), &[]),
        (
            (InReviewQuoting, Administration),
            &[PendingPriceValidation, Cancelled],
        ),
        ((InReviewQuoting, Validator), &[]),
        (
            (InReviewQuoting, Supervisor),
            &[PendingPriceValidation, Cancelled],
        ),
        ((PendingPriceValidation, Requester), &[]),
        ((PendingPriceValidation, Administration), &[]),
        (
            (PendingPriceValidation, Validator),
            &[ApprovedForPurchase, RejectedValidation, Cancelled],
        ),
        (
            (PendingPriceValidation, Supervisor),
            &[ApprovedForPurchase, RejectedValidation, Cancelled],
        ),
        ((RejectedValidation, Requester), &[]),
        ((RejectedValidation, Administration), &[InReviewQuoting]),
        ((RejectedValidation, Validator), &[]),
        ((RejectedValidation, Supervisor), &[InReviewQuoting, Cancelled]),
        ((ApprovedForPurchase, Requester), &[]),
        ((ApprovedForPurchase, Administration), &[PurchaseOrderIssued]),
        ((ApprovedForPurchase, Validator), &[]),
        (
            (ApprovedForPurchase, Supervisor),
            &[PurchaseOrderIssued, Cancelled],
        ),
        ((PurchaseOrderIssued, Requester), &[]),
        ((PurchaseOrderIssued, Administration), &[Purchased]),
        ((PurchaseOrderIssued, Validator), &[]),
        ((PurchaseOrderIssued, Supervisor), &[Purchased, Cancelled]),
        ((Purchased, Requester), &[]),
        ((Purchased, Administration), &[ReceivedDelivered]),
        ((Purchased, Validator), &[]),
        ((Purchased, Supervisor), &[ReceivedDelivered, Cancelled]),
        ((ReceivedDelivered, Requester), &[]),
        ((ReceivedDelivered, Administration), &[]),
        ((ReceivedDelivered, Validator), &[]),
        ((ReceivedDelivered, Supervisor), &[]),
        ((Cancelled, Requester), &[]),
        ((Cancelled, Administration), &[]),
        ((Cancelled, Validator), &[]),
        ((Cancelled, Supervisor), &[]),
    ];

    #[test]
    fn test_table_covers_every_status_role_pair() {
        assert_eq!(TABLE.len(), Status::ALL.len() * Role::ALL.len());
        for status in Status::ALL {
            for role in Role::ALL {
                assert!(
                    TABLE.iter().any(|((s, r), _)| *s == status && *r == role),
                    "missing ({}, {})",
                    status,
                    role
                );
            }
        }
    }

    #[test]
    fn test_legal_targets_match_ground_truth() {
        for ((status, role), expected) in TABLE {
            assert_eq!(
                TransitionAuthority::legal_targets(status, role),
                expected,
                "({}, {})",
                status,
                role
            );
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_outgoing_transitions() {
        for status in Status::ALL.into_iter().filter(|s| s.is_terminal()) {
            for role in Role::ALL {
                assert!(TransitionAuthority::legal_targets(status, role).is_empty());
            }
        }
    }

    #[test]
    fn test_supervisor_can_do_everything_any_owner_can() {
        for status in Status::ALL {
            let supervisor = TransitionAuthority::legal_targets(status, Supervisor);
            for role in [Requester, Administration, Validator] {
                for target in TransitionAuthority::legal_targets(status, role) {
                    assert!(
                        supervisor.contains(target),
                        "supervisor misses {} -> {} (owned by {})",
                        status,
                        target,
                        role
                    );
                }
            }
        }
    }

    #[test]
    fn test_supervisor_can_cancel_from_every_non_terminal_status() {
        for status in Status::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(
                TransitionAuthority::can_transition(status, Supervisor, Cancelled),
                "{}",
                status
            );
        }
    }

    #[test]
    fn test_only_rejection_requires_a_note() {
        for status in Status::ALL {
            let expected = if status == RejectedValidation {
                SideData::RejectionNote
            } else {
                SideData::None
            };
            assert_eq!(TransitionAuthority::side_data(status), expected);
        }
    }

    #[test]
    fn test_validator_owns_only_the_price_validation_stage() {
        for status in Status::ALL {
            let targets = TransitionAuthority::legal_targets(status, Validator);
            if status == PendingPriceValidation {
                assert!(!targets.is_empty());
            } else {
                assert!(targets.is_empty(), "{}", status);
            }
        }
    }
}
