//! Metrics sink boundary.
//!
//! Evaluation code never touches `obs::metrics` directly; every event flows
//! through [`MetricsEvent`] and [`MetricsSink`].
use crate::obs::metrics;
use std::{cell::RefCell, sync::Arc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Arc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum MetricsEvent {
    EvaluationFinish {
        nodes_calculated: u64,
        prensors: u64,
    },
    EvaluationStart {
        expressions: u64,
    },
    IdentityElided,
    NodeCalculated {
        name: &'static str,
    },
    SubexpressionMerged {
        name: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::EvaluationStart { expressions } => {
                metrics::with_state_mut(|m| {
                    m.ops.evaluations = m.ops.evaluations.saturating_add(1);
                    m.ops.expressions_requested =
                        m.ops.expressions_requested.saturating_add(expressions);
                });
            }

            MetricsEvent::EvaluationFinish { prensors, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.prensors_assembled = m.ops.prensors_assembled.saturating_add(prensors);
                });
            }

            MetricsEvent::IdentityElided => {
                metrics::with_state_mut(|m| {
                    m.ops.identity_elided = m.ops.identity_elided.saturating_add(1);
                });
            }

            MetricsEvent::NodeCalculated { name } => {
                metrics::with_state_mut(|m| {
                    m.ops.nodes_calculated = m.ops.nodes_calculated.saturating_add(1);
                    let entry = m.nodes.entry(name.to_string()).or_default();
                    entry.calculated = entry.calculated.saturating_add(1);
                });
            }

            MetricsEvent::SubexpressionMerged { name } => {
                metrics::with_state_mut(|m| {
                    m.ops.subexpressions_merged = m.ops.subexpressions_merged.saturating_add(1);
                    let entry = m.nodes.entry(name.to_string()).or_default();
                    entry.merged = entry.merged.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the metrics of the current thread.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the metrics of the current thread.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with every event of this thread routed to `sink`.
///
/// Overrides nest; the previous sink is restored on exit, unwinding
/// included.
pub fn with_metrics_sink<T>(sink: Arc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Arc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// EvaluationSpan
/// RAII guard emitting start/finish events for one driver call. Finish
/// accounting happens even on early return.
///

pub(crate) struct EvaluationSpan {
    nodes_calculated: u64,
    prensors: u64,
    finished: bool,
}

impl EvaluationSpan {
    #[must_use]
    pub(crate) fn new(expressions: usize) -> Self {
        record(MetricsEvent::EvaluationStart {
            expressions: expressions as u64,
        });

        Self {
            nodes_calculated: 0,
            prensors: 0,
            finished: false,
        }
    }

    pub(crate) fn node_calculated(&mut self, name: &'static str) {
        self.nodes_calculated = self.nodes_calculated.saturating_add(1);
        record(MetricsEvent::NodeCalculated { name });
    }

    pub(crate) const fn set_prensors(&mut self, prensors: usize) {
        self.prensors = prensors as u64;
    }

    fn finish_inner(&self) {
        record(MetricsEvent::EvaluationFinish {
            nodes_calculated: self.nodes_calculated,
            prensors: self.prensors,
        });
    }
}

impl Drop for EvaluationSpan {
    fn drop(&mut self) {
        if !self.finished {
            self.finish_inner();
            self.finished = true;
        }
    }
}
