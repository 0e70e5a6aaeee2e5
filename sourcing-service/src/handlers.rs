use bigdecimal::BigDecimal;
use chrono::Utc;
use shared::*;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{FeedbackEntry, ItemRecord, ProcessedCommand};
use crate::store::ItemStore;

/// Applies requester intents. Each command is checked against the item's
/// current record and committed whole or not at all; replies are cached by
/// idempotency key.
pub struct CommandHandler {
    store: Arc<ItemStore>,
    cad_fee: BigDecimal,
}

impl CommandHandler {
    pub fn new(store: Arc<ItemStore>, cad_fee: BigDecimal) -> Self {
        Self { store, cad_fee }
    }

    pub async fn handle_command(&self, command: Command) -> CommandReply {
        let mut tables = self.store.lock().await;

        if let Some(existing) = tables.processed_commands.get(&command.idempotency_key) {
            info!(
                "Command {} already processed, returning cached result",
                existing.command_id
            );
            return existing.reply.clone();
        }

        let reply = match tables.item(command.item_id) {
            // Not cached: the item may be created later under the same key.
            Err(err) => return CommandReply::failed(&command, err.to_string()),
            Ok(record) => {
                let mut staged = record.clone();
                match self.apply_intent(&mut staged, &command) {
                    Ok(message) => {
                        tables.items.insert(command.item_id, staged);
                        info!(
                            "Applied {} to item {}",
                            command.intent.name(),
                            command.item_id
                        );
                        CommandReply::success(&command, message)
                    }
                    Err(err) => {
                        warn!(
                            "Rejected {} for item {}: {}",
                            command.intent.name(),
                            command.item_id,
                            err
                        );
                        CommandReply::failed(&command, err.to_string())
                    }
                }
            }
        };

        tables.record_processed(ProcessedCommand {
            idempotency_key: command.idempotency_key.clone(),
            command_id: command.id,
            reply: reply.clone(),
            processed_at: Utc::now(),
        });
        reply
    }

    fn apply_intent(&self, record: &mut ItemRecord, command: &Command) -> ServiceResult<Option<String>> {
        let now = Utc::now();
        match &command.intent {
            Intent::SubmitRfq(submission) => {
                submission.validate()?;
                self.handle_submit_rfq(record, submission, now)
            }
            Intent::AwardBid { bid_id } => {
                apply_award(&mut record.snapshot.bids, *bid_id, now)?;
                let declined = record.snapshot.bids.iter().filter(|bid| bid.is_declined).count();
                Ok(Some(format!("Bid {} awarded, {} declined", bid_id, declined)))
            }
            Intent::RequestCadAndPrototype { bid_id } => {
                self.handle_request_cad_and_prototype(record, *bid_id, now)
            }
            Intent::RequestCadRevision { payment_id, files } => {
                check_payment(&record.snapshot, *payment_id)?;
                record.snapshot.cad.request_revision(files)?;
                let cad = &record.snapshot.cad;
                Ok(Some(format!(
                    "Revision round {} of {} requested",
                    cad.revision_rounds_used, cad.revision_rounds_included
                )))
            }
            Intent::ApproveCad { payment_id } => {
                check_payment(&record.snapshot, *payment_id)?;
                record.snapshot.cad.approve(now)?;
                Ok(None)
            }
            Intent::ReleaseCad { payment_id } => {
                check_payment(&record.snapshot, *payment_id)?;
                record.snapshot.cad.release(now)?;
                Ok(None)
            }
            Intent::ApprovePrototype {
                payment_id,
                bid_id,
                version,
            } => {
                let payment = check_payment(&record.snapshot, *payment_id)?;
                check_bid(&payment, *bid_id)?;
                record.snapshot.prototype.approve(*version, now)?;
                Ok(None)
            }
            Intent::RequestPrototypeChanges {
                payment_id,
                bid_id,
                version,
                packet,
            } => {
                let payment = check_payment(&record.snapshot, *payment_id)?;
                check_bid(&payment, *bid_id)?;
                let keyword_ids = record.snapshot.item.keyword_ids();
                record
                    .snapshot
                    .prototype
                    .request_changes(*version, packet, &keyword_ids)?;
                record.feedback.push(FeedbackEntry {
                    version: *version,
                    bid_id: *bid_id,
                    packet: packet.clone(),
                    submitted_at: now,
                });
                Ok(Some(format!(
                    "Changes requested; awaiting version {}",
                    record.snapshot.prototype.next_version()
                )))
            }
        }
    }

    fn handle_submit_rfq(
        &self,
        record: &mut ItemRecord,
        submission: &RfqSubmission,
        now: chrono::DateTime<Utc>,
    ) -> ServiceResult<Option<String>> {
        let snapshot = &mut record.snapshot;
        if snapshot.macro_state() != MacroState::PreRfq {
            return Err(ServiceError::Conflict("RFQ already issued".to_string()));
        }
        snapshot.item.quantity = submission.quantity;
        snapshot.item.dimensions = submission.dimensions.clone();
        snapshot.item.delivery = submission.delivery.clone();
        snapshot.rfq.issue(now);
        snapshot.rfq.revision_current = Some(snapshot.rfq.revision_current.unwrap_or(1));
        snapshot.rfq.revision_changed = false;
        record.invited_supplier_ids = submission.invited_supplier_ids.clone();
        record.auto_invite = submission.auto_invite;
        Ok(Some(format!(
            "RFQ issued to {} supplier(s){}",
            submission.invited_supplier_ids.len(),
            if submission.auto_invite { " plus auto-invite" } else { "" }
        )))
    }

    fn handle_request_cad_and_prototype(
        &self,
        record: &mut ItemRecord,
        bid_id: i64,
        now: chrono::DateTime<Utc>,
    ) -> ServiceResult<Option<String>> {
        let snapshot = &mut record.snapshot;
        if snapshot.payment.is_some() {
            return Err(RuleViolation::PaymentAlreadyRequested.into());
        }
        let awarded = snapshot.awarded_bid().ok_or(RuleViolation::NoAwardedBid)?;
        if awarded.bid_id != bid_id {
            return Err(ServiceError::Conflict(format!(
                "Bid {} is not the awarded bid",
                bid_id
            )));
        }
        let payment = PaymentRecord::request(snapshot.item.id, awarded, &self.cad_fee, now);
        let message = format!("Payment {} requested, {} due", payment.id, payment.total_due);
        snapshot.payment = Some(payment);
        Ok(Some(message))
    }
}

fn check_payment(snapshot: &ItemSnapshot, payment_id: Uuid) -> ServiceResult<PaymentRecord> {
    let payment = ensure_work_authorized(snapshot.payment.as_ref())?;
    if payment.id != payment_id {
        return Err(ServiceError::Conflict(format!(
            "Payment {} does not belong to item {}",
            payment_id,
            snapshot.item_id()
        )));
    }
    Ok(payment.clone())
}

fn check_bid(payment: &PaymentRecord, bid_id: i64) -> ServiceResult<()> {
    if payment.bid_id != bid_id {
        return Err(ServiceError::Conflict(format!(
            "Bid {} is not covered by payment {}",
            bid_id, payment.id
        )));
    }
    Ok(())
}
