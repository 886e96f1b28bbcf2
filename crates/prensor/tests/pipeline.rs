use prensor::{
    Error,
    core::{
        calculate::CalculateError,
        expr::ExpressionError,
        obs::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink},
    },
    prelude::*,
    schema::types::LifecycleStage,
};
use std::sync::{Arc, Mutex};

fn path(text: &str) -> Path {
    Path::parse(text).expect("test path should parse")
}

fn step(name: &str) -> Step {
    Step::name(name).expect("test step should be valid")
}

///
/// sessions
///
/// root(2)
///   event*: rows [0, 0, 1]
///     val*: int64 [1, 2, 3, 4]
///   user_id?: string [u1, u2]
///

fn sessions() -> Prensor {
    Prensor::new(NodeTensor::root(2))
        .with_child(
            step("event"),
            Prensor::new(NodeTensor::child(vec![0, 0, 1], true)).with_child(
                step("val"),
                Prensor::new(NodeTensor::leaf(vec![0, 0, 1, 2], vec![1_i64, 2, 3, 4], true)),
            ),
        )
        .with_child(
            step("user_id"),
            Prensor::new(NodeTensor::leaf(vec![0, 1], vec!["u1", "u2"], false)),
        )
}

fn features() -> ExprRef {
    let root = create_expression_from_prensor(&sessions());

    root.create_size_field(&path("event.val"), step("n_val"))
        .and_then(|e| e.broadcast(&path("user_id"), &step("event"), step("user")))
        .and_then(|e| e.promote(&path("event.val"), step("all_vals")))
        .map(|e| e.project(&[path("event.n_val"), path("event.user"), path("all_vals")]))
        .expect("feature pipeline builds")
}

#[test]
fn version_is_exported() {
    assert!(!prensor::VERSION.is_empty());
}

#[test]
fn transform_chain_calculates_one_prensor() {
    let out = calculate_prensor(&features(), &CalculateOptions::default()).expect("calculates");

    assert_eq!(
        out.leaf_paths(),
        vec![path("all_vals"), path("event.n_val"), path("event.user")]
    );
    assert_eq!(
        out.get_descendant(&path("event.n_val"))
            .and_then(|p| p.node().values().cloned()),
        Some(Values::Int64(vec![2, 1, 1]))
    );

    let options = CalculateOptions::default();
    let all_vals = out
        .get_ragged_tensor(&path("all_vals"), &options)
        .expect("ragged view");
    assert_eq!(all_vals.row_splits(), &[vec![0, 3, 4]]);
    assert_eq!(all_vals.values(), &Values::Int64(vec![1, 2, 3, 4]));

    let users = out
        .get_sparse_tensor(&path("event.user"), &options)
        .expect("sparse view");
    assert_eq!(users.indices, vec![vec![0, 0], vec![0, 1], vec![1, 0]]);
    assert_eq!(users.values, Values::from(vec!["u1", "u1", "u2"]));
    assert_eq!(users.dense_shape, vec![2, 2]);
}

#[test]
fn schema_loaded_from_json_is_attached() {
    let schema: Schema = serde_json::from_str(
        r#"{
            "features": [{
                "name": "event",
                "type": "STRUCT",
                "lifecycle_stage": "PRODUCTION",
                "domain_info": {"struct_domain": {"features": [
                    {"name": "val", "type": "INT", "lifecycle_stage": "BETA"}
                ]}}
            }]
        }"#,
    )
    .expect("schema json parses");

    let root = create_expression_from_prensor(&sessions())
        .apply_schema(&schema)
        .expect("schema applies");
    let val = root.get_descendant(&path("event.val")).expect("event.val");

    assert_eq!(
        val.schema_feature().and_then(|f| f.lifecycle_stage),
        Some(LifecycleStage::Beta)
    );

    let promoted = root
        .promote(&path("event.val"), step("all_vals"))
        .expect("promote");
    let all_vals = promoted.get_descendant(&path("all_vals")).expect("all_vals");
    assert_eq!(
        all_vals.schema_feature().and_then(|f| f.lifecycle_stage),
        Some(LifecycleStage::Beta)
    );
}

#[test]
fn errors_convert_into_the_facade_error() {
    fn promote_struct() -> Result<ExprRef, Error> {
        let root = create_expression_from_prensor(&sessions());
        let event = Path::parse("event")?;

        Ok(root.promote(&event, Step::name("out")?)?)
    }

    assert!(matches!(
        promote_struct(),
        Err(Error::Expression(ExpressionError::InvalidPromotion { .. }))
    ));
    assert!(matches!(
        Path::parse("a..b").map_err(Error::from),
        Err(Error::Path(_))
    ));

    let mistyped = create_expression_from_prensor(&sessions())
        .map_field_values(
            &path("event.val"),
            Arc::new(|values: &Values| values.clone()),
            PrimitiveType::Bool,
            step("flag"),
        )
        .expect("map builds");
    assert!(matches!(
        calculate_prensor(&mistyped, &CalculateOptions::default()).map_err(Error::from),
        Err(Error::Calculate(CalculateError::TypeMismatch { .. }))
    ));
}

///
/// RecordingSink
///

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<MetricsEvent>>,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[test]
fn metrics_flow_through_an_installed_sink() {
    metrics_reset_all();
    let sink = Arc::new(RecordingSink::default());
    let installed: Arc<dyn MetricsSink> = Arc::clone(&sink) as Arc<dyn MetricsSink>;

    let out = with_metrics_sink(installed, || {
        calculate_prensors(&[features()], &CalculateOptions::default())
    })
    .expect("calculates");
    assert_eq!(out.len(), 1);

    let events = sink.events.lock().expect("sink lock").clone();
    assert_eq!(events.first(), Some(&MetricsEvent::EvaluationStart { expressions: 1 }));
    assert!(events.contains(&MetricsEvent::NodeCalculated { name: "size" }));
    assert!(matches!(
        events.last(),
        Some(MetricsEvent::EvaluationFinish { prensors: 1, .. })
    ));

    assert_eq!(metrics_report().counters.ops.evaluations, 0);
}

#[test]
fn global_counters_accumulate_without_a_sink() {
    metrics_reset_all();
    calculate_prensor(&features(), &CalculateOptions::default()).expect("calculates");

    let report = metrics_report();
    assert_eq!(report.counters.ops.evaluations, 1);
    assert_eq!(report.counters.ops.prensors_assembled, 1);
    assert!(report.counters.ops.identity_elided > 0);
    assert!(
        report
            .node_summaries
            .iter()
            .any(|summary| summary.name == "promote" && summary.calculated == 1)
    );
}
