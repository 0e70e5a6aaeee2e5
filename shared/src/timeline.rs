use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cad::CadStatus;
use crate::classification::TimelineType;
use crate::item::MacroState;
use crate::payment::PaymentStatus;
use crate::prototype::PrototypeStatus;
use crate::snapshot::ItemSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKey {
    Rfq,
    Bidding,
    Quotation,
    Award,
    Cad,
    Prototype,
    Sample,
    Production,
}

impl StepKey {
    pub fn label(self) -> &'static str {
        match self {
            StepKey::Rfq => "Request for quotation",
            StepKey::Bidding => "Supplier bidding",
            StepKey::Quotation => "Quotation",
            StepKey::Award => "Award",
            StepKey::Cad => "CAD drawings",
            StepKey::Prototype => "Prototype review",
            StepKey::Sample => "Sample review",
            StepKey::Production => "Production",
        }
    }
}

pub fn steps_for(timeline_type: TimelineType) -> &'static [StepKey] {
    match timeline_type {
        TimelineType::Furniture6Step => &[
            StepKey::Rfq,
            StepKey::Bidding,
            StepKey::Award,
            StepKey::Cad,
            StepKey::Prototype,
            StepKey::Production,
        ],
        TimelineType::Sourcing4Step => &[
            StepKey::Quotation,
            StepKey::Award,
            StepKey::Sample,
            StepKey::Production,
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub key: StepKey,
    pub label: String,
    pub status: StepStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    CadUpload,
    PrototypeSubmission,
    PaymentReceived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub kind: EvidenceKind,
    pub version: Option<i64>,
    #[serde(default)]
    pub urls: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub item_id: i64,
    pub timeline_type: TimelineType,
    pub steps: Vec<TimelineStep>,
    pub evidence: Vec<EvidenceRecord>,
}

fn step_status(done: bool, active: bool) -> StepStatus {
    if done {
        StepStatus::Completed
    } else if active {
        StepStatus::InProgress
    } else {
        StepStatus::Pending
    }
}

impl Timeline {
    /// Derives the step list from a snapshot. `cad_evidence` carries upload
    /// records the snapshot itself does not keep.
    pub fn build(snapshot: &ItemSnapshot, cad_evidence: Vec<EvidenceRecord>) -> Self {
        let timeline_type = snapshot.metrics().timeline_type;
        let state = snapshot.macro_state();
        let awarded = snapshot.awarded_bid();
        let cad = &snapshot.cad;
        let prototype = &snapshot.prototype;

        let rfq_done = state != MacroState::PreRfq;
        let award_done = awarded.is_some();
        let cad_done = matches!(cad.status, CadStatus::Approved | CadStatus::Released);
        let prototype_done = prototype.status == PrototypeStatus::Approved;
        let work_open = snapshot.work_authorized();
        let production_active = prototype_done
            && (cad.status == CadStatus::Released || timeline_type == TimelineType::Sourcing4Step);

        let steps = steps_for(timeline_type)
            .iter()
            .map(|key| {
                let (status, completed_at) = match key {
                    StepKey::Rfq => (step_status(rfq_done, true), snapshot.rfq.issued_at),
                    StepKey::Bidding => (step_status(award_done, rfq_done), None),
                    StepKey::Quotation => (step_status(award_done, true), None),
                    StepKey::Award => (
                        step_status(award_done, state == MacroState::BidsReceived),
                        awarded.and_then(|bid| bid.awarded_at),
                    ),
                    StepKey::Cad => (
                        step_status(cad_done, award_done && (work_open || cad.status != CadStatus::None)),
                        cad.approved_at,
                    ),
                    StepKey::Prototype | StepKey::Sample => (
                        step_status(
                            prototype_done,
                            prototype.status != PrototypeStatus::NotSubmitted,
                        ),
                        prototype.approved_at,
                    ),
                    StepKey::Production => (step_status(false, production_active), None),
                };
                TimelineStep {
                    key: *key,
                    label: key.label().to_string(),
                    status,
                    completed_at,
                }
            })
            .collect();

        let mut evidence = cad_evidence;
        evidence.extend(prototype.history.iter().map(|submission| EvidenceRecord {
            kind: EvidenceKind::PrototypeSubmission,
            version: Some(submission.version),
            urls: submission.links.iter().map(|link| link.url.clone()).collect(),
            recorded_at: submission.submitted_at,
        }));
        if let Some(payment) = &snapshot.payment {
            if let (PaymentStatus::MarkedReceived, Some(at)) = (payment.status, payment.received_at) {
                evidence.push(EvidenceRecord {
                    kind: EvidenceKind::PaymentReceived,
                    version: None,
                    urls: Vec::new(),
                    recorded_at: at,
                });
            }
        }
        evidence.sort_by_key(|record| record.recorded_at);

        Self {
            item_id: snapshot.item_id(),
            timeline_type,
            steps,
            evidence,
        }
    }

    pub fn step(&self, key: StepKey) -> Option<&TimelineStep> {
        self.steps.iter().find(|step| step.key == key)
    }
}
