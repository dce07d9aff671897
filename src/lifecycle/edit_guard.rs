use crate::requisition::{Actor, FieldGroup, Requisition, Role, Status};

/// Statuses in which administration-owned fields are writable: every
/// non-terminal status except DRAFT.
pub const ADMINISTRATION_EDITABLE_STATUSES: [Status; 7] = [
    Status::SubmittedToAdmin,
    Status::InReviewQuoting,
    Status::PendingPriceValidation,
    Status::RejectedValidation,
    Status::ApprovedForPurchase,
    Status::PurchaseOrderIssued,
    Status::Purchased,
];

/// Field-level mutation permissions, as pure functions over the
/// requisition's status and the caller's identity.
pub struct EditGuard;

impl EditGuard {
    /// Which field groups the actor may write on this requisition. Empty
    /// means editing is forbidden outright.
    pub fn editable_groups(requisition: &Requisition, actor: &Actor) -> &'static [FieldGroup] {
        match actor.role {
            Role::Requester
                if requisition.status == Status::Draft
                    && requisition.created_by == actor.id =>
            {
                &[FieldGroup::Requester]
            }
            Role::Requester => &[],
            Role::Administration
                if ADMINISTRATION_EDITABLE_STATUSES.contains(&requisition.status) =>
            {
                &[FieldGroup::Administration]
            }
            Role::Administration => &[],
            // The validator only approves or rejects; it never edits.
            Role::Validator => &[],
            Role::Supervisor => &[FieldGroup::Requester, FieldGroup::Administration],
        }
    }

    pub fn can_edit(requisition: &Requisition, actor: &Actor) -> bool {
        !Self::editable_groups(requisition, actor).is_empty()
    }

    /// Item-list replacement follows the same rule as field edits.
    pub fn can_replace_items(requisition: &Requisition, actor: &Actor) -> bool {
        Self::can_edit(requisition, actor)
    }

    /// Deletion is narrower than editing: the requester may purge only
    /// their own DRAFT; the supervisor may purge anything.
    pub fn can_delete(requisition: &Requisition, actor: &Actor) -> bool {
        match actor.role {
            Role::Supervisor => true,
            Role::Requester => {
                requisition.status == Status::Draft && requisition.created_by == actor.id
            }
            Role::Administration | Role::Validator => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requisition::{NewRequisition, RequisitionId, RequisitionItem};
    use chrono::Utc;

    fn requisition(status: Status, created_by: i64) -> Requisition {
        let mut req = Requisition::draft(
            RequisitionId::new(2025, 1),
            created_by,
            NewRequisition {
                items: vec![RequisitionItem {
                    quantity: 1.0,
                    unit: "pcs".to_string(),
                    name: "filter".to_string(),
                    specification: None,
                    brand: None,
                    suggested_link: None,
                    observations: None,
                    unit_price: None,
                }],
                ..Default::default()
            },
            Utc::now(),
        );
        req.status = status;
        req
    }

    #[test]
    fn test_requester_edits_only_own_draft() {
        let own_draft = requisition(Status::Draft, 1);
        let actor = Actor::new(1, Role::Requester);
        assert_eq!(
            EditGuard::editable_groups(&own_draft, &actor),
            &[FieldGroup::Requester]
        );

        let foreign_draft = requisition(Status::Draft, 2);
        assert!(EditGuard::editable_groups(&foreign_draft, &actor).is_empty());

        for status in Status::ALL.into_iter().filter(|s| *s != Status::Draft) {
            let own = requisition(status, 1);
            assert!(
                EditGuard::editable_groups(&own, &actor).is_empty(),
                "{}",
                status
            );
        }
    }

    #[test]
    fn test_administration_edits_every_non_terminal_status_except_draft() {
        let actor = Actor::new(10, Role::Administration);
        for status in Status::ALL {
            let req = requisition(status, 1);
            let expected = !status.is_terminal() && status != Status::Draft;
            assert_eq!(EditGuard::can_edit(&req, &actor), expected, "{}", status);
            if expected {
                assert_eq!(
                    EditGuard::editable_groups(&req, &actor),
                    &[FieldGroup::Administration]
                );
            }
        }
    }

    #[test]
    fn test_validator_never_edits() {
        let actor = Actor::new(20, Role::Validator);
        for status in Status::ALL {
            let req = requisition(status, 20);
            assert!(!EditGuard::can_edit(&req, &actor), "{}", status);
            assert!(!EditGuard::can_replace_items(&req, &actor), "{}", status);
        }
    }

    #[test]
    fn test_supervisor_edits_both_groups_at_any_status() {
        let actor = Actor::new(30, Role::Supervisor);
        for status in Status::ALL {
            let req = requisition(status, 1);
            assert_eq!(
                EditGuard::editable_groups(&req, &actor),
                &[FieldGroup::Requester, FieldGroup::Administration],
                "{}",
                status
            );
        }
    }

    #[test]
    fn test_item_replacement_follows_edit_permission() {
        let req = requisition(Status::InReviewQuoting, 1);
        assert!(EditGuard::can_replace_items(&req, &Actor::new(10, Role::Administration)));
        assert!(!EditGuard::can_replace_items(&req, &Actor::new(1, Role::Requester)));
    }

    #[test]
    fn test_delete_rules() {
        let requester = Actor::new(1, Role::Requester);
        assert!(EditGuard::can_delete(&requisition(Status::Draft, 1), &requester));
        assert!(!EditGuard::can_delete(&requisition(Status::Draft, 2), &requester));
        assert!(!EditGuard::can_delete(
            &requisition(Status::SubmittedToAdmin, 1),
            &requester
        ));

        for status in Status::ALL {
            let req = requisition(status, 1);
            assert!(EditGuard::can_delete(&req, &Actor::new(30, Role::Supervisor)));
            assert!(!EditGuard::can_delete(&req, &Actor::new(10, Role::Administration)));
            assert!(!EditGuard::can_delete(&req, &Actor::new(20, Role::Validator)));
        }
    }
}
