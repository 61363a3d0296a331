use std::fmt;
use std::sync::Arc;

use crate::model::{HealthSnapshot, Panel, Workflow};

/// Notification emitted by the [`StateStore`](super::StateStore).
///
/// Keyed sub-collections (runs per workflow, task instances per run) emit
/// nothing; whoever fetched them reads them back.
#[derive(Debug, Clone, PartialEq, strum::EnumDiscriminants)]
#[strum_discriminants(name(EventKind), derive(Hash, strum::Display))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum StoreEvent {
    WorkflowsUpdated(Arc<Vec<Workflow>>),
    HealthUpdated(Arc<HealthSnapshot>),
    WorkflowSelected(String),
    RunSelected(String),
    TaskSelected(String),
    PanelChanged(Panel),
}

impl StoreEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }
}

/// Handle returned by `subscribe`, accepted by `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub(crate) type Handler = Arc<dyn Fn(&StoreEvent) + Send + Sync>;
