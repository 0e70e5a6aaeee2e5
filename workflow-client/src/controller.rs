use shared::{
    award_is_consistent, ensure_awardable, ensure_work_authorized, Attachment, FeedbackPacket,
    Intent, ItemSnapshot, PaymentRecord, RfqSubmission, RuleViolation, Timeline,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backend::{dispatch, Backend};
use crate::error::{ClientError, ClientResult};
use crate::state::{ItemWorkflow, WorkflowEvent};

/// Runs intents against a [`Backend`]: validate locally, send, then replace
/// the snapshot with a fresh fetch.
pub struct WorkflowController {
    backend: Arc<dyn Backend>,
    workflow: ItemWorkflow,
}

impl WorkflowController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            workflow: ItemWorkflow::new(),
        }
    }

    pub fn workflow(&self) -> &ItemWorkflow {
        &self.workflow
    }

    pub async fn open(&mut self, item_id: i64) -> ClientResult<&ItemSnapshot> {
        self.workflow.apply(WorkflowEvent::ItemOpened { item_id });
        self.refresh().await?;
        self.workflow.require_current()
    }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        let tag = self.workflow.begin_request()?;
        match self.backend.get_item_state(tag.item_id).await {
            Ok(snapshot) => {
                self.workflow.apply(WorkflowEvent::StateRefreshed { tag, snapshot });
                Ok(())
            }
            Err(err) => {
                self.workflow.apply(WorkflowEvent::RefreshFailed {
                    tag,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Fetches state and timeline concurrently.
    pub async fn refresh_all(&mut self) -> ClientResult<()> {
        let state_tag = self.workflow.begin_request()?;
        let timeline_tag = self.workflow.begin_request()?;
        let backend = Arc::clone(&self.backend);

        let (state, timeline) = futures::join!(
            backend.get_item_state(state_tag.item_id),
            backend.get_timeline(timeline_tag.item_id)
        );

        match timeline {
            Ok(timeline) => {
                self.workflow.apply(WorkflowEvent::TimelineRefreshed {
                    tag: timeline_tag,
                    timeline,
                });
            }
            Err(err) => warn!("Timeline refresh failed: {}", err),
        }
        match state {
            Ok(snapshot) => {
                self.workflow.apply(WorkflowEvent::StateRefreshed {
                    tag: state_tag,
                    snapshot,
                });
                Ok(())
            }
            Err(err) => {
                self.workflow.apply(WorkflowEvent::RefreshFailed {
                    tag: state_tag,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub async fn timeline(&mut self) -> ClientResult<&Timeline> {
        let tag = self.workflow.begin_request()?;
        let timeline = self.backend.get_timeline(tag.item_id).await?;
        self.workflow.apply(WorkflowEvent::TimelineRefreshed { tag, timeline });
        self.workflow
            .timeline()
            .ok_or_else(|| ClientError::Transport("timeline response was discarded".to_string()))
    }

    async fn run_intent(&mut self, intent: Intent, on_success: WorkflowEvent) -> ClientResult<()> {
        let item_id = self.workflow.require_item()?;
        let name = intent.name();
        info!("Issuing {} for item {}", name, item_id);

        match dispatch(self.backend.as_ref(), item_id, intent).await {
            Ok(_) => {
                self.workflow.apply(on_success);
                self.refresh().await
            }
            Err(err) => {
                self.workflow.apply(WorkflowEvent::IntentRejected {
                    intent: name,
                    message: err.to_string(),
                });
                if matches!(err, ClientError::Rejected(_)) {
                    if let Err(refresh_err) = self.refresh().await {
                        error!("Resync after rejected {} failed: {}", name, refresh_err);
                    }
                }
                Err(err)
            }
        }
    }

    fn reject_locally(&mut self, intent: &'static str, violation: RuleViolation) -> ClientError {
        warn!("{} blocked before sending: {}", intent, violation);
        self.workflow.apply(WorkflowEvent::IntentRejected {
            intent,
            message: violation.to_string(),
        });
        ClientError::Validation(violation)
    }

    fn authorized_payment(&self) -> ClientResult<PaymentRecord> {
        let snapshot = self.workflow.require_current()?;
        Ok(ensure_work_authorized(snapshot.payment.as_ref())?.clone())
    }

    pub async fn submit_rfq(&mut self, submission: RfqSubmission) -> ClientResult<()> {
        self.workflow.require_item()?;
        if let Err(violation) = submission.validate() {
            return Err(self.reject_locally("submit_rfq", violation));
        }
        self.run_intent(Intent::SubmitRfq(submission), WorkflowEvent::RfqSubmitted)
            .await
    }

    /// A partially applied award is reported as
    /// [`ClientError::InconsistentAward`] and left for the caller to retry.
    pub async fn award_bid(&mut self, bid_id: i64) -> ClientResult<()> {
        let check = ensure_awardable(&self.workflow.require_current()?.bids, bid_id);
        if let Err(violation) = check {
            return Err(self.reject_locally("award_bid", violation));
        }
        self.run_intent(Intent::AwardBid { bid_id }, WorkflowEvent::BidAwarded { bid_id })
            .await?;

        let snapshot = self.workflow.require_current()?;
        let winner_awarded = snapshot.bid(bid_id).is_some_and(|bid| bid.is_awarded);
        if !winner_awarded || !award_is_consistent(&snapshot.bids) {
            error!("Award of bid {} is inconsistent after refresh", bid_id);
            return Err(ClientError::InconsistentAward(bid_id));
        }
        Ok(())
    }

    pub async fn request_cad_and_prototype(&mut self) -> ClientResult<()> {
        let snapshot = self.workflow.require_current()?;
        let check = match (snapshot.awarded_bid(), &snapshot.payment) {
            (None, _) => Err(RuleViolation::NoAwardedBid),
            (Some(_), Some(_)) => Err(RuleViolation::PaymentAlreadyRequested),
            (Some(bid), None) => Ok(bid.bid_id),
        };
        let bid_id = match check {
            Ok(bid_id) => bid_id,
            Err(violation) => return Err(self.reject_locally("request_cad_and_prototype", violation)),
        };
        self.run_intent(
            Intent::RequestCadAndPrototype { bid_id },
            WorkflowEvent::CadAndPrototypeRequested { bid_id },
        )
        .await
    }

    pub async fn request_cad_revision(&mut self, files: Vec<Attachment>) -> ClientResult<()> {
        // Zero files never reaches the gate or the backend.
        if files.is_empty() {
            return Err(self.reject_locally("request_cad_revision", RuleViolation::NoRevisionFiles));
        }
        let check = self.authorized_payment().and_then(|payment| {
            self.workflow.require_current()?.cad.check_request_revision(&files)?;
            Ok(payment)
        });
        let payment = match check {
            Ok(payment) => payment,
            Err(ClientError::Validation(violation)) => {
                return Err(self.reject_locally("request_cad_revision", violation))
            }
            Err(err) => return Err(err),
        };
        self.run_intent(
            Intent::RequestCadRevision {
                payment_id: payment.id,
                files,
            },
            WorkflowEvent::CadRevisionRequested,
        )
        .await
    }

    pub async fn approve_cad(&mut self) -> ClientResult<()> {
        let check = self.authorized_payment().and_then(|payment| {
            self.workflow.require_current()?.cad.check_approve()?;
            Ok(payment)
        });
        let payment = match check {
            Ok(payment) => payment,
            Err(ClientError::Validation(violation)) => return Err(self.reject_locally("approve_cad", violation)),
            Err(err) => return Err(err),
        };
        self.run_intent(
            Intent::ApproveCad {
                payment_id: payment.id,
            },
            WorkflowEvent::CadApproved,
        )
        .await
    }

    pub async fn release_cad(&mut self) -> ClientResult<()> {
        let check = self.authorized_payment().and_then(|payment| {
            self.workflow.require_current()?.cad.check_release()?;
            Ok(payment)
        });
        let payment = match check {
            Ok(payment) => payment,
            Err(ClientError::Validation(violation)) => return Err(self.reject_locally("release_cad", violation)),
            Err(err) => return Err(err),
        };
        self.run_intent(
            Intent::ReleaseCad {
                payment_id: payment.id,
            },
            WorkflowEvent::CadReleased,
        )
        .await
    }

    pub async fn approve_prototype(&mut self) -> ClientResult<()> {
        let check = self.authorized_payment().and_then(|payment| {
            let version = self.workflow.require_current()?.prototype.current_version;
            self.workflow.require_current()?.prototype.check_approve(version)?;
            Ok((payment, version))
        });
        let (payment, version) = match check {
            Ok(ok) => ok,
            Err(ClientError::Validation(violation)) => {
                return Err(self.reject_locally("approve_prototype", violation))
            }
            Err(err) => return Err(err),
        };
        self.run_intent(
            Intent::ApprovePrototype {
                payment_id: payment.id,
                bid_id: payment.bid_id,
                version,
            },
            WorkflowEvent::PrototypeApproved { version },
        )
        .await
    }

    /// The packet must cover every keyword on the item.
    pub async fn request_prototype_changes(&mut self, packet: FeedbackPacket) -> ClientResult<()> {
        let check = self.authorized_payment().and_then(|payment| {
            let snapshot = self.workflow.require_current()?;
            let version = snapshot.prototype.current_version;
            snapshot
                .prototype
                .check_request_changes(version, &packet, &snapshot.item.keyword_ids())?;
            Ok((payment, version))
        });
        let (payment, version) = match check {
            Ok(ok) => ok,
            Err(ClientError::Validation(violation)) => {
                return Err(self.reject_locally("request_prototype_changes", violation))
            }
            Err(err) => return Err(err),
        };
        self.run_intent(
            Intent::RequestPrototypeChanges {
                payment_id: payment.id,
                bid_id: payment.bid_id,
                version,
                packet,
            },
            WorkflowEvent::PrototypeChangesRequested { version },
        )
        .await
    }
}
