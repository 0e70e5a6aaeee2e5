use chrono::Utc;
use shared::{Editability, ItemSnapshot, MacroState, Timeline};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

/// Identifies one fetch. Responses tagged for another item are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub item_id: i64,
    pub seq: u64,
}

/// Local view of the backend snapshot. `Provisional` is an optimistic guess
/// that the next confirmed fetch always replaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Empty,
    Provisional {
        snapshot: ItemSnapshot,
        assumed: MacroState,
    },
    Confirmed(ItemSnapshot),
}

impl Snapshot {
    pub fn current(&self) -> Option<&ItemSnapshot> {
        match self {
            Snapshot::Empty => None,
            Snapshot::Provisional { snapshot, .. } => Some(snapshot),
            Snapshot::Confirmed(snapshot) => Some(snapshot),
        }
    }

    pub fn confirmed(&self) -> Option<&ItemSnapshot> {
        match self {
            Snapshot::Confirmed(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Snapshot::Provisional { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    ItemOpened { item_id: i64 },
    StateRefreshed { tag: RequestTag, snapshot: ItemSnapshot },
    RefreshFailed { tag: RequestTag, message: String },
    TimelineRefreshed { tag: RequestTag, timeline: Timeline },
    RfqSubmitted,
    BidAwarded { bid_id: i64 },
    CadAndPrototypeRequested { bid_id: i64 },
    CadRevisionRequested,
    CadApproved,
    CadReleased,
    PrototypeApproved { version: i64 },
    PrototypeChangesRequested { version: i64 },
    IntentRejected { intent: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Discarded,
}

/// Reducer over [`WorkflowEvent`]s for the item currently open.
#[derive(Debug, Clone)]
pub struct ItemWorkflow {
    item_id: Option<i64>,
    snapshot: Snapshot,
    timeline: Option<Timeline>,
    next_seq: u64,
    needs_refresh: bool,
    last_error: Option<String>,
}

impl Default for ItemWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemWorkflow {
    pub fn new() -> Self {
        Self {
            item_id: None,
            snapshot: Snapshot::Empty,
            timeline: None,
            next_seq: 0,
            needs_refresh: false,
            last_error: None,
        }
    }

    pub fn item_id(&self) -> Option<i64> {
        self.item_id
    }

    pub fn require_item(&self) -> ClientResult<i64> {
        self.item_id.ok_or(ClientError::NoItemOpen)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn current(&self) -> Option<&ItemSnapshot> {
        self.snapshot.current()
    }

    pub fn require_current(&self) -> ClientResult<&ItemSnapshot> {
        self.current().ok_or(ClientError::NoItemOpen)
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn macro_state(&self) -> Option<MacroState> {
        match &self.snapshot {
            Snapshot::Empty => None,
            Snapshot::Provisional { assumed, .. } => Some(*assumed),
            Snapshot::Confirmed(snapshot) => Some(snapshot.macro_state()),
        }
    }

    pub fn editability(&self) -> Option<Editability> {
        let snapshot = self.current()?;
        let state = self.macro_state()?;
        Some(Editability::derive(state, snapshot.payment.is_some()))
    }

    /// Allocates a tag for a fetch of the open item.
    pub fn begin_request(&mut self) -> ClientResult<RequestTag> {
        let item_id = self.require_item()?;
        self.next_seq += 1;
        Ok(RequestTag {
            item_id,
            seq: self.next_seq,
        })
    }

    fn is_current(&self, tag: RequestTag) -> bool {
        self.item_id == Some(tag.item_id)
    }

    pub fn apply(&mut self, event: WorkflowEvent) -> Applied {
        match event {
            WorkflowEvent::ItemOpened { item_id } => {
                if self.item_id != Some(item_id) {
                    self.item_id = Some(item_id);
                    self.snapshot = Snapshot::Empty;
                    self.timeline = None;
                    self.last_error = None;
                }
                self.needs_refresh = true;
            }
            WorkflowEvent::StateRefreshed { tag, snapshot } => {
                if !self.is_current(tag) || snapshot.item_id() != tag.item_id {
                    debug!(
                        "Discarding snapshot for item {} (request {}), item {:?} is open",
                        tag.item_id, tag.seq, self.item_id
                    );
                    return Applied::Discarded;
                }
                debug!("Applying snapshot for item {} (request {})", tag.item_id, tag.seq);
                self.snapshot = Snapshot::Confirmed(snapshot);
                self.needs_refresh = false;
            }
            WorkflowEvent::RefreshFailed { tag, message } => {
                if !self.is_current(tag) {
                    return Applied::Discarded;
                }
                warn!("Refresh of item {} failed: {}", tag.item_id, message);
                self.last_error = Some(message);
            }
            WorkflowEvent::TimelineRefreshed { tag, timeline } => {
                if !self.is_current(tag) || timeline.item_id != tag.item_id {
                    return Applied::Discarded;
                }
                self.timeline = Some(timeline);
            }
            WorkflowEvent::RfqSubmitted => {
                self.last_error = None;
                self.needs_refresh = true;
                if let Some(current) = self.snapshot.current() {
                    let mut snapshot = current.clone();
                    snapshot.rfq.issue(Utc::now());
                    let assumed = snapshot.macro_state();
                    info!(
                        "Item {} provisionally in state {}",
                        snapshot.item_id(),
                        assumed.letter()
                    );
                    self.snapshot = Snapshot::Provisional { snapshot, assumed };
                }
            }
            WorkflowEvent::BidAwarded { .. }
            | WorkflowEvent::CadAndPrototypeRequested { .. }
            | WorkflowEvent::CadRevisionRequested
            | WorkflowEvent::CadApproved
            | WorkflowEvent::CadReleased
            | WorkflowEvent::PrototypeApproved { .. }
            | WorkflowEvent::PrototypeChangesRequested { .. } => {
                // Confirmed intents change nothing locally until the refetch lands.
                self.last_error = None;
                self.needs_refresh = true;
            }
            WorkflowEvent::IntentRejected { intent, message } => {
                warn!("{} rejected: {}", intent, message);
                self.last_error = Some(message);
                self.needs_refresh = true;
            }
        }
        Applied::Applied
    }
}
