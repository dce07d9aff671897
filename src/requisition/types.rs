use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::requisition::id::RequisitionId;
use crate::requisition::roles::UserId;
use crate::requisition::status::{Priority, Status};

/// One line of a requisition. Items are replaced as a whole list, never
/// patched individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequisitionItem {
    pub quantity: f64,
    pub unit: String,
    pub name: String,
    pub specification: Option<String>,
    pub brand: Option<String>,
    pub suggested_link: Option<String>,
    pub observations: Option<String>,
    pub unit_price: Option<f64>,
}

/// Append-only audit record. `previous_status` is `None` only for the
/// record written at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub actor: UserId,
    pub previous_status: Option<Status>,
    pub new_status: Status,
    pub action: String,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The purchase-requisition document tracked by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: RequisitionId,
    pub status: Status,
    pub priority: Priority,
    pub created_by: UserId,

    // Requester-owned fields, writable only in DRAFT.
    pub area: Option<String>,
    pub needed_by: Option<NaiveDate>,
    pub work_order: Option<String>,
    pub justification: Option<String>,
    pub observations: Option<String>,

    // Administration-owned fields, writable once past DRAFT.
    pub supplier: Option<String>,
    pub supplier_contact: Option<String>,
    pub conditions: Option<String>,
    pub total_price: Option<f64>,
    pub currency: Option<String>,
    pub quotation_date: Option<NaiveDate>,
    pub purchase_order: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub estimated_delivery: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,

    /// Set on transition into REJECTED_VALIDATION, cleared by the next
    /// transition away from it.
    pub rejection_reason: Option<String>,

    pub items: Vec<RequisitionItem>,
    pub history: Vec<HistoryRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requisition {
    /// Builds a fresh DRAFT entity with its creation history record. The
    /// caller persists entity and record as one atomic unit.
    pub fn draft(
        id: RequisitionId,
        created_by: UserId,
        payload: NewRequisition,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: Status::Draft,
            priority: payload.priority.unwrap_or_default(),
            created_by,
            area: payload.area,
            needed_by: payload.needed_by,
            work_order: payload.work_order,
            justification: payload.justification,
            observations: payload.observations,
            supplier: None,
            supplier_contact: None,
            conditions: None,
            total_price: None,
            currency: None,
            quotation_date: None,
            purchase_order: None,
            purchase_date: None,
            estimated_delivery: None,
            received_date: None,
            rejection_reason: None,
            items: payload.items,
            history: vec![HistoryRecord {
                actor: created_by,
                previous_status: None,
                new_status: Status::Draft,
                action: "Requisition created".to_string(),
                notes: None,
                timestamp: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }
}

/// Creation payload. Priority defaults to MEDIUM when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRequisition {
    pub priority: Option<Priority>,
    pub area: Option<String>,
    pub needed_by: Option<NaiveDate>,
    pub work_order: Option<String>,
    pub justification: Option<String>,
    pub observations: Option<String>,
    pub items: Vec<RequisitionItem>,
}

/// The two ownership groups of writable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldGroup {
    /// area, needed-by, work order, justification, observations, priority.
    Requester,
    /// supplier, contact, conditions, price, currency, quotation date,
    /// purchase order, purchase date, estimated delivery, received date.
    Administration,
}

/// Three-way patch slot: leave the field untouched, clear it, or set it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatchValue<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for PatchValue<T> {
    fn default() -> Self {
        PatchValue::Keep
    }
}

impl<T> PatchValue<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, PatchValue::Keep)
    }

    fn take(&mut self) -> PatchValue<T> {
        std::mem::replace(self, PatchValue::Keep)
    }

    fn apply(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            PatchValue::Keep => {}
            PatchValue::Clear => *slot = None,
            PatchValue::Set(value) => *slot = Some(value.clone()),
        }
    }
}

impl<T> From<Option<T>> for PatchValue<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => PatchValue::Set(v),
            None => PatchValue::Clear,
        }
    }
}

/// Field-level mutation request. Fields outside the caller's writable
/// groups are dropped silently before persistence, so unrelated form
/// submissions do not fail outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    // Requester group.
    pub priority: Option<Priority>,
    pub area: PatchValue<String>,
    pub needed_by: PatchValue<NaiveDate>,
    pub work_order: PatchValue<String>,
    pub justification: PatchValue<String>,
    pub observations: PatchValue<String>,

    // Administration group.
    pub supplier: PatchValue<String>,
    pub supplier_contact: PatchValue<String>,
    pub conditions: PatchValue<String>,
    pub total_price: PatchValue<f64>,
    pub currency: PatchValue<String>,
    pub quotation_date: PatchValue<NaiveDate>,
    pub purchase_order: PatchValue<String>,
    pub purchase_date: PatchValue<NaiveDate>,
    pub estimated_delivery: PatchValue<NaiveDate>,
    pub received_date: PatchValue<NaiveDate>,
}

impl FieldPatch {
    /// Drops every field that does not belong to one of `groups`.
    pub fn retain_groups(&mut self, groups: &[FieldGroup]) {
        if !groups.contains(&FieldGroup::Requester) {
            self.priority = None;
            self.area.take();
            self.needed_by.take();
            self.work_order.take();
            self.justification.take();
            self.observations.take();
        }
        if !groups.contains(&FieldGroup::Administration) {
            self.supplier.take();
            self.supplier_contact.take();
            self.conditions.take();
            self.total_price.take();
            self.currency.take();
            self.quotation_date.take();
            self.purchase_order.take();
            self.purchase_date.take();
            self.estimated_delivery.take();
            self.received_date.take();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_none()
            && self.area.is_keep()
            && self.needed_by.is_keep()
            && self.work_order.is_keep()
            && self.justification.is_keep()
            && self.observations.is_keep()
            && self.supplier.is_keep()
            && self.supplier_contact.is_keep()
            && self.conditions.is_keep()
            && self.total_price.is_keep()
            && self.currency.is_keep()
            && self.quotation_date.is_keep()
            && self.purchase_order.is_keep()
            && self.purchase_date.is_keep()
            && self.estimated_delivery.is_keep()
            && self.received_date.is_keep()
    }

    /// Type-level sanity only; business validation of content is out of
    /// scope.
    pub fn validate(&self) -> Result<(), String> {
        if let PatchValue::Set(price) = self.total_price {
            if !price.is_finite() || price < 0.0 {
                return Err(format!("total price must be a non-negative number, got {}", price));
            }
        }
        Ok(())
    }

    /// Writes the patch onto the entity. Callers are expected to have
    /// filtered the patch through `retain_groups` first.
    pub fn apply_to(&self, requisition: &mut Requisition) {
        if let Some(priority) = self.priority {
            requisition.priority = priority;
        }
        self.area.apply(&mut requisition.area);
        self.needed_by.apply(&mut requisition.needed_by);
        self.work_order.apply(&mut requisition.work_order);
        self.justification.apply(&mut requisition.justification);
        self.observations.apply(&mut requisition.observations);
        self.supplier.apply(&mut requisition.supplier);
        self.supplier_contact.apply(&mut requisition.supplier_contact);
        self.conditions.apply(&mut requisition.conditions);
        self.total_price.apply(&mut requisition.total_price);
        self.currency.apply(&mut requisition.currency);
        self.quotation_date.apply(&mut requisition.quotation_date);
        self.purchase_order.apply(&mut requisition.purchase_order);
        self.purchase_date.apply(&mut requisition.purchase_date);
        self.estimated_delivery
            .apply(&mut requisition.estimated_delivery);
        self.received_date.apply(&mut requisition.received_date);
    }
}

/// A requisition always carries at least one item, and quantities and
/// prices must be sane numbers.
pub fn validate_items(items: &[RequisitionItem]) -> Result<(), String> {
    if items.is_empty() {
        return Err("a requisition must contain at least one item".to_string());
    }
    for (index, item) in items.iter().enumerate() {
        if !item.quantity.is_finite() || item.quantity <= 0.0 {
            return Err(format!(
                "item {} has an invalid quantity: {}",
                index, item.quantity
            ));
        }
        if let Some(price) = item.unit_price {
            if !price.is_finite() || price < 0.0 {
                return Err(format!("item {} has an invalid unit price: {}", index, price));
            }
        }
    }
    Ok(())
}
