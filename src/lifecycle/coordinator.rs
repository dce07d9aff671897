use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SolpedEngineConfig;
use crate::errors::EngineError;
use crate::lifecycle::edit_guard::EditGuard;
use crate::lifecycle::notifications::{self, Audience, NotificationIntent};
use crate::lifecycle::transition_authority::{SideData, TransitionAuthority};
use crate::requisition::{
    validate_items, Actor, FieldPatch, HistoryRecord, NewRequisition, Requisition, RequisitionId,
    RequisitionItem, Role, Status,
};
use crate::sequence::SequenceAllocator;
use crate::storage::{RequisitionFilter, RequisitionStore, StorageError, UserDirectory};

/// Result of a successful status change: the updated entity plus the
/// notification plan the caller's unit of work must dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub requisition: Requisition,
    pub notifications: Vec<NotificationIntent>,
}

/// Per-status counts for dashboards. Every status is present, zero or
/// not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub by_status: HashMap<Status, usize>,
}

/// Single entry point for every mutating operation on a requisition.
///
/// The coordinator validates through `TransitionAuthority` and
/// `EditGuard` before touching storage, persists each mutation as one
/// atomic store call, and returns notification plans as pure data. It is
/// stateless between calls; serialization of concurrent writers happens
/// in the store (conditional updates surface as `Conflict`).
pub struct LifecycleCoordinator {
    store: Arc<dyn RequisitionStore>,
    directory: Arc<dyn UserDirectory>,
    allocator: SequenceAllocator,
    storage_timeout: Duration,
}

impl LifecycleCoordinator {
    pub fn new(
        store: Arc<dyn RequisitionStore>,
        directory: Arc<dyn UserDirectory>,
        config: &SolpedEngineConfig,
    ) -> Self {
        Self {
            allocator: SequenceAllocator::new(store.clone(), config.sequence.clone()),
            storage_timeout: Duration::from_secs(config.storage.timeout_seconds),
            store,
            directory,
        }
    }

    /// Creates a DRAFT requisition owned by the actor. The entity and its
    /// creation history record are persisted as one atomic unit. No
    /// notification is generated on creation.
    pub async fn create(
        &self,
        actor: &Actor,
        payload: NewRequisition,
    ) -> Result<Requisition, EngineError> {
        validate_items(&payload.items).map_err(|reason| EngineError::ValidationFailed { reason })?;

        let now = Utc::now();
        let id = self.allocator.next(now.year()).await?;
        let entity = Requisition::draft(id.clone(), actor.id, payload, now);

        let created = self
            .with_timeout(self.store.create(entity))
            .await
            .map_err(|err| EngineError::from_storage(&id, err))?;

        info!(
            requisition.id = %created.id,
            actor.id = actor.id,
            actor.role = %actor.role,
            "requisition created"
        );
        Ok(created)
    }

    /// Moves a requisition to `target` if the transition table allows it
    /// for the actor's role, appending a history record atomically with
    /// the status write. Returns the updated entity and the notification
    /// fan-out plan.
    pub async fn change_status(
        &self,
        id: &RequisitionId,
        actor: &Actor,
        target: Status,
        notes: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        let requisition = self.fetch(id).await?;
        let current = requisition.status;

        let allowed = TransitionAuthority::legal_targets(current, actor.role);
        if !allowed.contains(&target) {
            warn!(
                requisition.id = %id,
                actor.id = actor.id,
                actor.role = %actor.role,
                from = %current,
                to = %target,
                "transition refused"
            );
            return Err(EngineError::InvalidTransition {
                from: current,
                to: target,
                allowed: allowed.to_vec(),
            });
        }

        let notes = notes.and_then(|n| {
            let trimmed = n.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        });
        if TransitionAuthority::side_data(target) == SideData::RejectionNote && notes.is_none() {
            return Err(EngineError::ValidationFailed {
                reason: "a rejection reason is required".to_string(),
            });
        }

        // The reason lives only while the rejection is the latest
        // transition; any other target clears it.
        let rejection_reason = if target == Status::RejectedValidation {
            notes.clone()
        } else {
            None
        };

        let record = HistoryRecord {
            actor: actor.id,
            previous_status: Some(current),
            new_status: target,
            action: format!("Status changed from {} to {}", current, target),
            notes,
            timestamp: Utc::now(),
        };

        let updated = self
            .with_timeout(
                self.store
                    .update_status(id, current, target, rejection_reason, record),
            )
            .await
            .map_err(|err| EngineError::from_storage(id, err))?;

        let plan = self.plan_notifications(&updated, actor, target).await?;

        info!(
            requisition.id = %id,
            actor.id = actor.id,
            actor.role = %actor.role,
            from = %current,
            to = %target,
            notifications = plan.len(),
            "status changed"
        );
        Ok(TransitionOutcome {
            requisition: updated,
            notifications: plan,
        })
    }

    /// Applies a field patch. Fields outside the actor's writable groups
    /// are dropped silently; an actor with no writable group at all is
    /// refused.
    pub async fn edit(
        &self,
        id: &RequisitionId,
        actor: &Actor,
        mut patch: FieldPatch,
    ) -> Result<Requisition, EngineError> {
        let requisition = self.fetch(id).await?;

        let groups = EditGuard::editable_groups(&requisition, actor);
        if groups.is_empty() {
            return Err(EngineError::Forbidden {
                reason: format!(
                    "role {} may not edit requisition {} while in {}",
                    actor.role, id, requisition.status
                ),
            });
        }
        patch.retain_groups(groups);
        patch
            .validate()
            .map_err(|reason| EngineError::ValidationFailed { reason })?;

        let updated = self
            .with_timeout(self.store.update_fields(id, patch))
            .await
            .map_err(|err| EngineError::from_storage(id, err))?;

        info!(
            requisition.id = %id,
            actor.id = actor.id,
            actor.role = %actor.role,
            "fields updated"
        );
        Ok(updated)
    }

    /// Replaces the whole item list. Same permission rule as field edits;
    /// the replacement must still contain at least one valid item.
    pub async fn replace_items(
        &self,
        id: &RequisitionId,
        actor: &Actor,
        items: Vec<RequisitionItem>,
    ) -> Result<Requisition, EngineError> {
        let requisition = self.fetch(id).await?;

        if !EditGuard::can_replace_items(&requisition, actor) {
            return Err(EngineError::Forbidden {
                reason: format!(
                    "role {} may not replace items of requisition {} while in {}",
                    actor.role, id, requisition.status
                ),
            });
        }
        validate_items(&items).map_err(|reason| EngineError::ValidationFailed { reason })?;

        let updated = self
            .with_timeout(self.store.replace_items(id, items))
            .await
            .map_err(|err| EngineError::from_storage(id, err))?;

        info!(
            requisition.id = %id,
            actor.id = actor.id,
            items = updated.items.len(),
            "items replaced"
        );
        Ok(updated)
    }

    /// Hard delete. Requesters may purge only their own DRAFT; the
    /// supervisor may purge anything. Nothing survives, history included.
    pub async fn delete(&self, id: &RequisitionId, actor: &Actor) -> Result<(), EngineError> {
        let requisition = self.fetch(id).await?;

        if !EditGuard::can_delete(&requisition, actor) {
            return Err(EngineError::Forbidden {
                reason: format!(
                    "role {} may not delete requisition {} while in {}",
                    actor.role, id, requisition.status
                ),
            });
        }

        self.with_timeout(self.store.delete(id))
            .await
            .map_err(|err| EngineError::from_storage(id, err))?;

        info!(
            requisition.id = %id,
            actor.id = actor.id,
            actor.role = %actor.role,
            "requisition deleted"
        );
        Ok(())
    }

    /// Loads one requisition. Requesters may only see their own.
    pub async fn load(
        &self,
        id: &RequisitionId,
        actor: &Actor,
    ) -> Result<Requisition, EngineError> {
        let requisition = self.fetch(id).await?;
        if actor.role == Role::Requester && requisition.created_by != actor.id {
            return Err(EngineError::Forbidden {
                reason: "requesters may only view their own requisitions".to_string(),
            });
        }
        Ok(requisition)
    }

    /// Lists matching requisitions, newest first. A requester's view is
    /// always scoped to their own documents, whatever the filter says.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: RequisitionFilter,
    ) -> Result<Vec<Requisition>, EngineError> {
        if actor.role == Role::Requester {
            filter.created_by = Some(actor.id);
        }
        self.with_timeout(self.store.list(&filter))
            .await
            .map_err(|err| EngineError::Transient {
                reason: err.to_string(),
            })
    }

    /// Per-status counts over the actor's visible requisitions.
    pub async fn statistics(&self, actor: &Actor) -> Result<Statistics, EngineError> {
        let visible = self.list(actor, RequisitionFilter::default()).await?;
        let mut by_status: HashMap<Status, usize> =
            Status::ALL.into_iter().map(|s| (s, 0)).collect();
        for requisition in &visible {
            *by_status.entry(requisition.status).or_default() += 1;
        }
        Ok(Statistics {
            total: visible.len(),
            by_status,
        })
    }

    async fn plan_notifications(
        &self,
        requisition: &Requisition,
        actor: &Actor,
        target: Status,
    ) -> Result<Vec<NotificationIntent>, EngineError> {
        let recipients = match notifications::audience_for(target) {
            Audience::ActiveRole(role) => self
                .with_timeout(self.directory.active_user_ids(role))
                .await
                .map_err(|err| EngineError::Transient {
                    reason: format!("user directory lookup failed: {}", err),
                })?,
            Audience::Creator => notifications::creator_recipients(requisition.created_by, actor),
        };
        Ok(notifications::intents(&requisition.id, target, &recipients))
    }

    async fn fetch(&self, id: &RequisitionId) -> Result<Requisition, EngineError> {
        self.with_timeout(self.store.load(id))
            .await
            .map_err(|err| EngineError::from_storage(id, err))?
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })
    }

    /// Persistence calls must complete within a bounded window; anything
    /// slower surfaces as a retryable transient failure.
    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        match tokio::time::timeout(self.storage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Transient(format!(
                "storage call exceeded {}s",
                self.storage_timeout.as_secs()
            ))),
        }
    }
}
