use chrono::Utc;
use shared::*;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    CadUploadRequest, FeedbackEntry, ItemRecord, PrototypeSubmissionRequest, SpecEditRequest,
    SubmitBidRequest,
};
use crate::store::ItemStore;

/// Supplier and operator operations: everything that moves an item forward
/// without being a requester intent.
pub struct BackOffice {
    store: Arc<ItemStore>,
}

impl BackOffice {
    pub fn new(store: Arc<ItemStore>) -> Self {
        Self { store }
    }

    pub async fn create_item(&self, item: Item) -> ServiceResult<ItemSnapshot> {
        let mut tables = self.store.lock().await;
        if tables.items.contains_key(&item.id) {
            return Err(ServiceError::Conflict(format!("Item {} already exists", item.id)));
        }
        let record = ItemRecord::new(item);
        let snapshot = record.to_snapshot();
        info!(
            "Created item {} ({:?})",
            record.item_id(),
            snapshot.metrics().sourcing_type
        );
        tables.items.insert(record.item_id(), record);
        Ok(snapshot)
    }

    pub async fn snapshot(&self, item_id: i64) -> ServiceResult<ItemSnapshot> {
        let tables = self.store.lock().await;
        Ok(tables.item(item_id)?.to_snapshot())
    }

    pub async fn timeline(&self, item_id: i64) -> ServiceResult<Timeline> {
        let tables = self.store.lock().await;
        Ok(tables.item(item_id)?.timeline())
    }

    pub async fn feedback(&self, item_id: i64) -> ServiceResult<Vec<FeedbackEntry>> {
        let tables = self.store.lock().await;
        Ok(tables.item(item_id)?.feedback.clone())
    }

    /// Applies whichever fields are present. Each one is checked against the
    /// item's editability; a quantity or dimension change after versioned bids
    /// cuts a new RFQ revision.
    pub async fn edit_specs(&self, item_id: i64, edit: SpecEditRequest) -> ServiceResult<ItemSnapshot> {
        self.store
            .update(item_id, |record, _| {
                let editability = record.snapshot.editability();
                let item = &mut record.snapshot.item;
                let mut spec_changed = false;

                if let Some(category) = edit.category {
                    editability.ensure(ItemField::Category)?;
                    item.category = category;
                }
                if let Some(description) = edit.description {
                    editability.ensure(ItemField::Description)?;
                    item.description = description;
                }
                if let Some(keywords) = edit.keywords {
                    editability.ensure(ItemField::Keywords)?;
                    item.keywords = keywords;
                }
                if let Some(notes) = edit.supplier_notes {
                    editability.ensure(ItemField::SupplierNotes)?;
                    item.supplier_notes = Some(notes);
                }
                if let Some(quantity) = edit.quantity {
                    editability.ensure(ItemField::Quantity)?;
                    if quantity <= 0 {
                        return Err(ServiceError::BadRequest(
                            "quantity must be positive".to_string(),
                        ));
                    }
                    spec_changed |= item.quantity != Some(quantity);
                    item.quantity = Some(quantity);
                }
                if let Some(dimensions) = edit.dimensions {
                    editability.ensure(ItemField::Dimensions)?;
                    spec_changed |= item.dimensions != dimensions;
                    item.dimensions = dimensions;
                }

                if spec_changed && record.snapshot.rfq.has_rfq {
                    if let Some(revision) = record.snapshot.rfq.record_spec_edit(&record.snapshot.bids) {
                        info!("Item {} moved to RFQ revision {}", item_id, revision);
                    }
                }
                Ok(record.to_snapshot())
            })
            .await
    }

    pub async fn submit_bid(&self, item_id: i64, request: SubmitBidRequest) -> ServiceResult<Bid> {
        self.store
            .update(item_id, |record, tables| {
                let snapshot = &mut record.snapshot;
                if !snapshot.rfq.has_rfq {
                    return Err(ServiceError::Conflict(format!(
                        "Item {} has no open RFQ",
                        item_id
                    )));
                }
                if let Some(awarded) = snapshot.awarded_bid() {
                    return Err(RuleViolation::AwardExists(awarded.bid_id).into());
                }
                let bid = Bid {
                    bid_id: tables.allocate_bid_id(),
                    supplier_id: request.supplier_id,
                    status: BidStatus::Submitted,
                    submitted_at: Utc::now(),
                    unit_price: request.unit_price,
                    total_price: request.total_price,
                    quantity_basis: request.quantity_basis,
                    production_lead_time_days: request.production_lead_time_days,
                    delivery_cost: request.delivery_cost,
                    shipping_mode: request.shipping_mode,
                    prototype_offered: request.prototype_offered,
                    prototype_cost: request.prototype_cost,
                    prototype_lead_time_days: request.prototype_lead_time_days,
                    media: request.media,
                    smart_alternative: request.smart_alternative,
                    revision_at_submit: snapshot.rfq.revision_current,
                    is_awarded: false,
                    is_declined: false,
                    can_award: true,
                    awarded_at: None,
                };
                info!(
                    "Supplier {} submitted bid {} on item {}",
                    bid.supplier_id, bid.bid_id, item_id
                );
                snapshot.bids.push(bid.clone());
                Ok(bid)
            })
            .await
    }

    /// Withdrawing the last live bid takes the item back to pre-RFQ.
    pub async fn withdraw_bid(&self, item_id: i64, bid_id: i64) -> ServiceResult<ItemSnapshot> {
        self.store
            .update(item_id, |record, _| {
                let snapshot = &mut record.snapshot;
                let bid = snapshot
                    .bids
                    .iter_mut()
                    .find(|bid| bid.bid_id == bid_id)
                    .ok_or(RuleViolation::BidNotFound(bid_id))?;
                if bid.is_awarded {
                    return Err(ServiceError::Conflict(format!(
                        "Bid {} is awarded and cannot be withdrawn",
                        bid_id
                    )));
                }
                bid.status = BidStatus::Withdrawn;
                bid.can_award = false;

                if !snapshot.has_bids() {
                    snapshot.rfq.reset();
                    info!("Item {} has no bids left, back to pre-RFQ", item_id);
                }
                Ok(record.to_snapshot())
            })
            .await
    }

    pub async fn upload_cad(&self, item_id: i64, request: CadUploadRequest) -> ServiceResult<CadState> {
        if request.files.is_empty() {
            return Err(ServiceError::BadRequest("no CAD files attached".to_string()));
        }
        self.store
            .update(item_id, |record, _| {
                ensure_work_authorized(record.snapshot.payment.as_ref())?;
                let now = Utc::now();
                let version = record.snapshot.cad.record_upload()?;
                record.cad_uploads.push(EvidenceRecord {
                    kind: EvidenceKind::CadUpload,
                    version: Some(version),
                    urls: request.files.iter().map(|file| file.url.clone()).collect(),
                    recorded_at: now,
                });
                info!("CAD version {} uploaded for item {}", version, item_id);
                Ok(record.snapshot.cad.clone())
            })
            .await
    }

    pub async fn submit_prototype(
        &self,
        item_id: i64,
        request: PrototypeSubmissionRequest,
    ) -> ServiceResult<PrototypeState> {
        if request.links.is_empty() {
            return Err(ServiceError::BadRequest("no prototype media attached".to_string()));
        }
        self.store
            .update(item_id, |record, _| {
                ensure_work_authorized(record.snapshot.payment.as_ref())?;
                let version = record
                    .snapshot
                    .prototype
                    .record_submission(request.links, Utc::now())?;
                info!("Prototype version {} submitted for item {}", version, item_id);
                Ok(record.snapshot.prototype.clone())
            })
            .await
    }

    /// Back-office confirmation that the CAD and prototype fee arrived.
    pub async fn mark_payment_received(&self, payment_id: Uuid) -> ServiceResult<PaymentRecord> {
        let mut tables = self.store.lock().await;
        let payment = tables
            .items
            .values_mut()
            .filter_map(|record| record.snapshot.payment.as_mut())
            .find(|payment| payment.id == payment_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {}", payment_id)))?;
        payment.mark_received(Utc::now());
        info!(
            "Payment {} for item {} marked received",
            payment.id, payment.item_id
        );
        Ok(payment.clone())
    }
}
