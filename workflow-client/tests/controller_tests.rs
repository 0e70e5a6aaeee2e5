use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use shared::*;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use workflow_client::{Backend, ClientError, ClientResult, WorkflowController};

const ITEM_ID: i64 = 42;

#[derive(Default)]
struct Script {
    reject_next: Option<String>,
    ignore_rfq: bool,
    partial_award: bool,
}

struct FakeBackend {
    state: Mutex<ItemSnapshot>,
    commands: Mutex<Vec<Command>>,
    script: Mutex<Script>,
    unauthorized: AtomicBool,
}

impl FakeBackend {
    fn new(snapshot: ItemSnapshot) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(snapshot),
            commands: Mutex::new(Vec::new()),
            script: Mutex::new(Script::default()),
            unauthorized: AtomicBool::new(false),
        })
    }

    fn sent(&self) -> Vec<&'static str> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|command| command.intent.name())
            .collect()
    }

    fn reject_next(&self, message: &str) {
        self.script.lock().unwrap().reject_next = Some(message.to_string());
    }

    fn with_state(&self, f: impl FnOnce(&mut ItemSnapshot)) {
        f(&mut self.state.lock().unwrap());
    }

    fn apply(&self, state: &mut ItemSnapshot, intent: &Intent) -> RuleResult<()> {
        let now = Utc::now();
        let script = self.script.lock().unwrap();
        match intent {
            Intent::SubmitRfq(_) => {
                if !script.ignore_rfq {
                    state.rfq.issue(now);
                }
                Ok(())
            }
            Intent::AwardBid { bid_id } => {
                if script.partial_award {
                    ensure_awardable(&state.bids, *bid_id)?;
                    for bid in state.bids.iter_mut().filter(|bid| bid.bid_id == *bid_id) {
                        bid.is_awarded = true;
                    }
                    return Ok(());
                }
                apply_award(&mut state.bids, *bid_id, now)
            }
            Intent::RequestCadAndPrototype { bid_id } => {
                if state.payment.is_some() {
                    return Err(RuleViolation::PaymentAlreadyRequested);
                }
                let bid = state
                    .bid(*bid_id)
                    .cloned()
                    .ok_or(RuleViolation::BidNotFound(*bid_id))?;
                state.payment = Some(PaymentRecord::request(state.item.id, &bid, &default_cad_fee(), now));
                Ok(())
            }
            Intent::RequestCadRevision { files, .. } => state.cad.request_revision(files),
            Intent::ApproveCad { .. } => state.cad.approve(now),
            Intent::ReleaseCad { .. } => state.cad.release(now),
            Intent::ApprovePrototype { version, .. } => state.prototype.approve(*version, now),
            Intent::RequestPrototypeChanges { version, packet, .. } => {
                let keyword_ids = state.item.keyword_ids();
                state.prototype.request_changes(*version, packet, &keyword_ids)
            }
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn get_item_state(&self, item_id: i64) -> ClientResult<ItemSnapshot> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized("session expired".to_string()));
        }
        let state = self.state.lock().unwrap();
        if state.item_id() != item_id {
            return Err(ClientError::Rejected(format!("Item {} not found", item_id)));
        }
        Ok(state.clone())
    }

    async fn execute(&self, command: Command) -> ClientResult<CommandReply> {
        if self.unauthorized.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized("session expired".to_string()));
        }
        self.commands.lock().unwrap().push(command.clone());
        if let Some(message) = self.script.lock().unwrap().reject_next.take() {
            return Ok(CommandReply::failed(&command, message));
        }
        let mut state = self.state.lock().unwrap();
        let reply = match self.apply(&mut state, &command.intent) {
            Ok(()) => CommandReply::success(&command, None),
            Err(violation) => CommandReply::failed(&command, violation.to_string()),
        };
        Ok(reply)
    }

    async fn get_timeline(&self, item_id: i64) -> ClientResult<Timeline> {
        let snapshot = self.get_item_state(item_id).await?;
        Ok(Timeline::build(&snapshot, Vec::new()))
    }
}

fn item() -> Item {
    Item {
        id: ITEM_ID,
        category: "Indoor Furniture".to_string(),
        description: "Oak dining chair".to_string(),
        quantity: Some(5),
        dimensions: Dimensions::new(24.0, 18.0, 30.0, DimensionUnit::In),
        delivery: DeliveryInfo {
            country: "NL".to_string(),
            postal_code: Some("1012".to_string()),
        },
        keywords: vec![
            Keyword {
                id: 1,
                label: "walnut finish".to_string(),
            },
            Keyword {
                id: 2,
                label: "slim legs".to_string(),
            },
        ],
        inspirations: vec![],
        smart_alternatives: SmartAlternativesOptIn::default(),
        supplier_notes: None,
    }
}

fn bid(bid_id: i64, minutes_after: i64) -> Bid {
    Bid {
        bid_id,
        supplier_id: bid_id * 10,
        status: BidStatus::Submitted,
        submitted_at: Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap() + Duration::minutes(minutes_after),
        unit_price: BigDecimal::from(180),
        total_price: BigDecimal::from(900),
        quantity_basis: Some(5),
        production_lead_time_days: Some(40),
        delivery_cost: Some(BigDecimal::from(150)),
        shipping_mode: Some(ShippingMode::Sea),
        prototype_offered: true,
        prototype_cost: Some(BigDecimal::from_str("125.50").unwrap()),
        prototype_lead_time_days: Some(10),
        media: BidMedia::default(),
        smart_alternative: None,
        revision_at_submit: None,
        is_awarded: false,
        is_declined: false,
        can_award: true,
        awarded_at: None,
    }
}

fn pre_rfq() -> ItemSnapshot {
    ItemSnapshot::new(item())
}

fn with_bids() -> ItemSnapshot {
    let mut snapshot = pre_rfq();
    snapshot.rfq.issue(Utc::now());
    snapshot.bids = vec![bid(9, 5), bid(7, 0), bid(3, 5)];
    snapshot
}

/// Awarded, paid for, with one CAD drawing uploaded and one prototype submitted.
fn in_review() -> ItemSnapshot {
    let mut snapshot = with_bids();
    apply_award(&mut snapshot.bids, 7, Utc::now()).unwrap();
    let winner = snapshot.bid(7).cloned().unwrap();
    let mut payment = PaymentRecord::request(ITEM_ID, &winner, &default_cad_fee(), Utc::now());
    payment.mark_received(Utc::now());
    snapshot.payment = Some(payment);
    snapshot.cad.record_upload().unwrap();
    snapshot
        .prototype
        .record_submission(
            vec![MediaLink {
                provider: "vimeo".to_string(),
                url: "https://vimeo.com/1".to_string(),
            }],
            Utc::now(),
        )
        .unwrap();
    snapshot
}

fn markup() -> Vec<Attachment> {
    vec![Attachment {
        file_name: "redline.pdf".to_string(),
        url: "https://files.example.com/redline.pdf".to_string(),
    }]
}

fn submission() -> RfqSubmission {
    RfqSubmission {
        quantity: Some(5),
        dimensions: Dimensions::new(24.0, 18.0, 30.0, DimensionUnit::In),
        delivery: DeliveryInfo {
            country: "NL".to_string(),
            postal_code: None,
        },
        invited_supplier_ids: vec![],
        auto_invite: true,
    }
}

async fn controller_for(backend: &Arc<FakeBackend>) -> WorkflowController {
    let mut controller = WorkflowController::new(backend.clone());
    controller.open(ITEM_ID).await.unwrap();
    controller
}

#[tokio::test]
async fn open_derives_state_from_snapshot() {
    let backend = FakeBackend::new(with_bids());
    let controller = controller_for(&backend).await;
    let snapshot = controller.workflow().current().unwrap();

    assert_eq!(snapshot.macro_state(), MacroState::BidsReceived);
    assert_eq!(snapshot.editability(), Editability::SpecsOnly);
    let order: Vec<(String, i64)> = labeled_bids(&snapshot.bids)
        .into_iter()
        .map(|labeled| (labeled.label, labeled.bid.bid_id))
        .collect();
    assert_eq!(
        order,
        vec![("A".to_string(), 7), ("B".to_string(), 3), ("C".to_string(), 9)]
    );

    let metrics = snapshot.metrics();
    assert_eq!(metrics.cbm, Some(0.212));
    assert_eq!(metrics.total_cbm, Some(1.06));
    assert_eq!(metrics.timeline_type, TimelineType::Furniture6Step);
}

#[tokio::test]
async fn invalid_rfq_never_reaches_backend() {
    let backend = FakeBackend::new(pre_rfq());
    let mut controller = controller_for(&backend).await;

    let mut rfq = submission();
    rfq.auto_invite = false;
    let err = controller.submit_rfq(rfq).await.unwrap_err();
    assert_eq!(err, ClientError::Validation(RuleViolation::NoSuppliersInvited));
    assert!(backend.sent().is_empty());
    assert!(controller.workflow().last_error().is_some());
}

#[tokio::test]
async fn rfq_submission_is_confirmed_by_refetch() {
    let backend = FakeBackend::new(pre_rfq());
    let mut controller = controller_for(&backend).await;

    controller.submit_rfq(submission()).await.unwrap();
    let workflow = controller.workflow();
    assert!(!workflow.snapshot().is_provisional());
    assert_eq!(workflow.macro_state(), Some(MacroState::RfqIssued));
    assert_eq!(backend.sent(), vec!["submit_rfq"]);
}

#[tokio::test]
async fn authoritative_fetch_overrides_optimistic_guess() {
    let backend = FakeBackend::new(pre_rfq());
    backend.script.lock().unwrap().ignore_rfq = true;
    let mut controller = controller_for(&backend).await;

    controller.submit_rfq(submission()).await.unwrap();
    assert_eq!(controller.workflow().macro_state(), Some(MacroState::PreRfq));
}

#[tokio::test]
async fn award_declines_siblings_and_rejects_repeat() {
    let backend = FakeBackend::new(with_bids());
    let mut controller = controller_for(&backend).await;

    controller.award_bid(7).await.unwrap();
    let snapshot = controller.workflow().current().unwrap();
    assert_eq!(snapshot.awarded_bid().map(|bid| bid.bid_id), Some(7));
    assert!(snapshot.bids.iter().filter(|b| b.bid_id != 7).all(|b| b.is_declined));
    assert_eq!(snapshot.bids.iter().filter(|b| b.is_awarded).count(), 1);

    let err = controller.award_bid(7).await.unwrap_err();
    assert_eq!(err, ClientError::Validation(RuleViolation::AlreadyAwarded(7)));
    assert_eq!(backend.sent(), vec!["award_bid"]);
}

#[tokio::test]
async fn partial_award_is_a_failure() {
    let backend = FakeBackend::new(with_bids());
    backend.script.lock().unwrap().partial_award = true;
    let mut controller = controller_for(&backend).await;

    let err = controller.award_bid(3).await.unwrap_err();
    assert_eq!(err, ClientError::InconsistentAward(3));
}

#[tokio::test]
async fn backend_rejection_is_surfaced_verbatim() {
    let backend = FakeBackend::new(with_bids());
    let mut controller = controller_for(&backend).await;
    let before = controller.workflow().current().cloned();

    backend.reject_next("Supplier account is suspended");
    let err = controller.award_bid(9).await.unwrap_err();
    assert_eq!(err, ClientError::Rejected("Supplier account is suspended".to_string()));
    assert_eq!(controller.workflow().last_error(), Some("Supplier account is suspended"));
    assert_eq!(
        controller.workflow().current().map(|s| &s.bids),
        before.as_ref().map(|s| &s.bids)
    );
}

#[tokio::test]
async fn unauthorized_calls_surface_as_blocking() {
    let backend = FakeBackend::new(with_bids());
    let mut controller = controller_for(&backend).await;
    backend.unauthorized.store(true, Ordering::SeqCst);

    let err = controller.award_bid(9).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn payment_is_requested_once_with_prototype_cost() {
    let mut snapshot = with_bids();
    apply_award(&mut snapshot.bids, 7, Utc::now()).unwrap();
    let backend = FakeBackend::new(snapshot);
    let mut controller = controller_for(&backend).await;

    controller.request_cad_and_prototype().await.unwrap();
    let payment = controller.workflow().current().and_then(|s| s.payment.clone()).unwrap();
    assert_eq!(payment.bid_id, 7);
    assert_eq!(payment.total_due, BigDecimal::from_str("185.50").unwrap());
    assert_eq!(payment.status, PaymentStatus::Requested);
    assert_eq!(controller.workflow().editability(), Some(Editability::Locked));

    let err = controller.request_cad_and_prototype().await.unwrap_err();
    assert_eq!(err, ClientError::Validation(RuleViolation::PaymentAlreadyRequested));
    assert_eq!(backend.sent(), vec!["request_cad_and_prototype"]);
}

#[tokio::test]
async fn cad_work_waits_for_payment_receipt() {
    let mut snapshot = in_review();
    if let Some(payment) = snapshot.payment.as_mut() {
        payment.status = PaymentStatus::Requested;
    }
    let backend = FakeBackend::new(snapshot);
    let mut controller = controller_for(&backend).await;

    let err = controller.approve_cad().await.unwrap_err();
    assert_eq!(err, ClientError::Validation(RuleViolation::PaymentNotReceived));
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn cad_revision_without_files_is_not_sent() {
    let backend = FakeBackend::new(in_review());
    let mut controller = controller_for(&backend).await;

    let err = controller.request_cad_revision(vec![]).await.unwrap_err();
    assert_eq!(err, ClientError::Validation(RuleViolation::NoRevisionFiles));
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn revision_rounds_count_requests_only() {
    let backend = FakeBackend::new(in_review());
    backend.with_state(|state| state.cad.revision_rounds_used = 1);
    let mut controller = controller_for(&backend).await;

    controller.request_cad_revision(markup()).await.unwrap();
    backend.with_state(|state| {
        state.cad.record_upload().unwrap();
    });
    controller.refresh().await.unwrap();

    backend.reject_next("Drawing is still being reviewed");
    assert!(controller.approve_cad().await.is_err());

    controller.request_cad_revision(markup()).await.unwrap();
    let cad = &controller.workflow().current().unwrap().cad;
    assert_eq!(cad.revision_rounds_used, 3);
    assert_eq!(cad.status, CadStatus::RevisionRequested);
}

#[tokio::test]
async fn cad_approve_then_release() {
    let backend = FakeBackend::new(in_review());
    let mut controller = controller_for(&backend).await;

    let err = controller.release_cad().await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(RuleViolation::CadTransition { .. })));

    controller.approve_cad().await.unwrap();
    controller.release_cad().await.unwrap();
    let cad = &controller.workflow().current().unwrap().cad;
    assert_eq!(cad.status, CadStatus::Released);
    assert_eq!(cad.approved_version, Some(1));
    assert!(cad.released_to_supplier_at.is_some());

    let err = controller.request_cad_revision(markup()).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn oversized_feedback_packet_is_rejected_locally() {
    let mut snapshot = in_review();
    snapshot.item.keywords = (1..=7)
        .map(|id| Keyword {
            id,
            label: format!("keyword {}", id),
        })
        .collect();
    let backend = FakeBackend::new(snapshot);
    let mut controller = controller_for(&backend).await;

    let mut packet = FeedbackPacket::new();
    for keyword_id in 1..=7 {
        let phrases = (0..3).map(|n| keyword_id * 100 + n);
        packet.insert(keyword_id, KeywordFeedback::needs_adjustment(Severity::MustFix, phrases));
    }
    let err = controller.request_prototype_changes(packet).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Validation(RuleViolation::TooManyPhrases { count: 21, max: 18 })
    );
    assert!(backend.sent().is_empty());
}

#[tokio::test]
async fn changes_requested_then_new_submission_is_reviewable() {
    let backend = FakeBackend::new(in_review());
    let mut controller = controller_for(&backend).await;

    let mut packet = FeedbackPacket::new();
    packet.insert(
        1,
        KeywordFeedback::needs_adjustment(Severity::MustFix, [11, 12]).with_detail("Darker stain"),
    );
    packet.insert(2, KeywordFeedback::satisfied());
    controller.request_prototype_changes(packet).await.unwrap();
    assert_eq!(
        controller.workflow().current().unwrap().prototype.status,
        PrototypeStatus::ChangesRequested
    );

    let err = controller.approve_prototype().await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(RuleViolation::PrototypeTransition { .. })));

    backend.with_state(|state| {
        state.prototype.record_submission(vec![], Utc::now()).unwrap();
    });
    controller.refresh().await.unwrap();
    controller.approve_prototype().await.unwrap();

    let prototype = &controller.workflow().current().unwrap().prototype;
    assert_eq!(prototype.status, PrototypeStatus::Approved);
    assert_eq!(prototype.approved_version, Some(2));
    assert_eq!(
        backend.sent(),
        vec!["request_prototype_changes", "approve_prototype"]
    );
}

#[tokio::test]
async fn refresh_all_loads_state_and_timeline() {
    let backend = FakeBackend::new(in_review());
    let mut controller = controller_for(&backend).await;

    controller.refresh_all().await.unwrap();
    let timeline = controller.workflow().timeline().unwrap();
    assert_eq!(timeline.item_id, ITEM_ID);
    assert_eq!(timeline.steps.len(), 6);
    assert_eq!(
        timeline.step(StepKey::Award).map(|step| step.status),
        Some(StepStatus::Completed)
    );
    assert_eq!(
        timeline.step(StepKey::Cad).map(|step| step.status),
        Some(StepStatus::InProgress)
    );
}
