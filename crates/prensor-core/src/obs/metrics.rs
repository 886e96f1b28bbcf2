use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory evaluation counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub nodes: BTreeMap<String, NodeCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Driver entrypoints
    pub evaluations: u64,
    pub expressions_requested: u64,

    // Graph work
    pub nodes_calculated: u64,
    pub identity_elided: u64,
    pub subexpressions_merged: u64,

    // Output
    pub prensors_assembled: u64,
}

///
/// NodeCounters
/// Per node-kind counters, keyed by `ExprNode::name`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeCounters {
    pub calculated: u64,
    pub merged: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct EventReport {
    pub counters: EventState,
    pub node_summaries: Vec<NodeSummary>,
}

///
/// NodeSummary
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub calculated: u64,
    pub merged: u64,
    pub merge_ratio: f64,
}

/// Build a report from the in-memory counters, busiest node kinds first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut node_summaries: Vec<NodeSummary> = snap
        .nodes
        .iter()
        .map(|(name, counters)| {
            let total = counters.calculated.saturating_add(counters.merged);
            let merge_ratio = if total > 0 {
                counters.merged as f64 / total as f64
            } else {
                0.0
            };

            NodeSummary {
                name: name.clone(),
                calculated: counters.calculated,
                merged: counters.merged,
                merge_ratio,
            }
        })
        .collect();

    node_summaries.sort_by(|a, b| {
        b.calculated
            .cmp(&a.calculated)
            .then_with(|| a.name.cmp(&b.name))
    });

    EventReport {
        counters: snap,
        node_summaries,
    }
}
