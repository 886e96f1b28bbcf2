use super::*;
use crate::{
    calculate::{CalculateError, CalculateOptions, calculate_prensor},
    expr::{ExprRef, ExpressionError},
    node::NodeTensor,
    path::{AnonymousIdAllocator, Path},
    prensor::{Prensor, RaggedArray, SparseArray},
    test_support::{fixtures, mock::mock_leaf, path, step},
    value::{PrimitiveType, Values},
};
use prensor_schema::{
    Error as SchemaError,
    node::{DomainInfo, Feature, FeaturePresence, Schema, ValueCount},
    types::{FeatureType, LifecycleStage},
};
use std::{collections::BTreeMap, sync::Arc};

fn calc(root: &ExprRef) -> Prensor {
    calculate_prensor(root, &CalculateOptions::default()).expect("expression calculates")
}

fn node_at(prensor: &Prensor, at: &str) -> NodeTensor {
    prensor
        .get_descendant(&path(at))
        .map(|found| found.node().clone())
        .unwrap_or_else(|| panic!("'{at}' should be present"))
}

///
/// event_prensor
///
/// root(2)
///   event*: rows [0, 1, 1]
///     val?: int64 [10, 20, 30]
///   label?: int64 [1, 2]
///

fn event_prensor() -> Prensor {
    Prensor::new(NodeTensor::root(2))
        .with_child(
            step("event"),
            Prensor::new(NodeTensor::child(vec![0, 1, 1], true)).with_child(
                step("val"),
                Prensor::new(NodeTensor::leaf(vec![0, 1, 2], vec![10_i64, 20, 30], false)),
            ),
        )
        .with_child(
            step("label"),
            Prensor::new(NodeTensor::leaf(vec![0, 1], vec![1_i64, 2], false)),
        )
}

fn masked_prensor() -> Prensor {
    Prensor::new(NodeTensor::root(3))
        .with_child(
            step("foo"),
            Prensor::new(NodeTensor::leaf(vec![0, 1, 2], vec![9_i32, 8, 7], false)),
        )
        .with_child(
            step("keep"),
            Prensor::new(NodeTensor::leaf(vec![0, 1, 2], vec![true, false, true], false)),
        )
        .with_child(
            step("foorepeated"),
            Prensor::new(NodeTensor::leaf(vec![0, 1, 1, 2], vec![9_i32, 8, 7, 6], true)),
        )
}

// promote

#[test]
fn promote_moves_values_to_the_grandparent() {
    let root = create_expression_from_prensor(&event_prensor());
    let promoted = promote(&root, &path("event.val"), step("nval")).expect("promote");

    let out = calc(&promoted);
    assert_eq!(
        node_at(&out, "nval"),
        NodeTensor::leaf(vec![0, 1, 1], vec![10_i64, 20, 30], true)
    );
    assert_eq!(node_at(&out, "event.val"), node_at(&event_prensor(), "event.val"));
}

#[test]
fn promote_anonymous_reports_the_new_path() {
    let ids = AnonymousIdAllocator::default();
    let root = create_expression_from_prensor(&event_prensor());

    let (promoted, new_path) = promote_anonymous(&root, &path("event.val"), &ids).expect("promote");
    assert_eq!(new_path.len(), 1);
    assert!(promoted.get_descendant(&new_path).is_some());
}

#[test]
fn promote_rejects_bad_paths() {
    let root = fixtures::big_expr();

    assert!(matches!(
        promote(&root, &path("doc"), step("x")),
        Err(ExpressionError::InvalidPromotion { .. })
    ));
    assert!(matches!(
        promote(&root, &path("doc.nope"), step("x")),
        Err(ExpressionError::MissingPath { .. })
    ));
    assert!(matches!(
        promote(&root, &path("doc.bar"), step("user")),
        Err(ExpressionError::PathAlreadyExists { .. })
    ));
}

#[test]
fn promote_rejects_internal_fields() {
    let nested = Prensor::new(NodeTensor::root(1)).with_child(
        step("a"),
        Prensor::new(NodeTensor::child(vec![0], false)).with_child(
            step("b"),
            Prensor::new(NodeTensor::child(vec![0], false)),
        ),
    );
    let root = create_expression_from_prensor(&nested);

    assert!(matches!(
        promote(&root, &path("a.b"), step("c")),
        Err(ExpressionError::InvalidPromotion { .. })
    ));
}

#[test]
fn promoted_feature_scales_counts_under_a_dense_parent() {
    let original = Feature {
        feature_type: Some(FeatureType::Int),
        lifecycle_stage: Some(LifecycleStage::Production),
        value_count: Some(ValueCount {
            min: Some(1),
            max: Some(3),
        }),
        presence: Some(FeaturePresence {
            min_fraction: Some(0.5),
            min_count: Some(4),
        }),
        ..Feature::default()
    };
    let parent = Feature {
        lifecycle_stage: Some(LifecycleStage::Alpha),
        value_count: Some(ValueCount {
            min: Some(2),
            max: Some(2),
        }),
        presence: Some(FeaturePresence {
            min_fraction: Some(1.0),
            min_count: None,
        }),
        ..Feature::default()
    };

    let promoted = promote_schema_feature(Some(&original), Some(&parent)).expect("fused");
    assert_eq!(promoted.feature_type, Some(FeatureType::Int));
    assert_eq!(promoted.lifecycle_stage, Some(LifecycleStage::Alpha));
    assert_eq!(
        promoted.value_count,
        Some(ValueCount {
            min: Some(2),
            max: Some(6),
        })
    );
    assert_eq!(
        promoted.presence,
        Some(FeaturePresence {
            min_fraction: Some(0.25),
            min_count: Some(2),
        })
    );
}

#[test]
fn promoted_feature_drops_bounds_under_a_sparse_parent() {
    let original = Feature {
        value_count: Some(ValueCount {
            min: Some(1),
            max: Some(1),
        }),
        ..Feature::default()
    };
    let parent = Feature {
        lifecycle_stage: Some(LifecycleStage::Deprecated),
        ..Feature::default()
    };

    let promoted = promote_schema_feature(Some(&original), Some(&parent)).expect("fused");
    assert_eq!(promoted.value_count, None);
    assert_eq!(promoted.presence, None);
    assert_eq!(promoted.lifecycle_stage, Some(LifecycleStage::Deprecated));

    assert_eq!(promote_schema_feature(None, Some(&parent)), None);
    assert_eq!(promote_schema_feature(Some(&original), None), None);
}

// broadcast

#[test]
fn broadcast_copies_values_to_each_sibling_element() {
    let root = create_expression_from_prensor(&event_prensor());
    let broadcasted =
        broadcast(&root, &path("label"), &step("event"), step("nlabel")).expect("broadcast");

    let out = calc(&broadcasted);

    assert_eq!(
        node_at(&out, "event.nlabel"),
        NodeTensor::leaf(vec![0, 1, 2], vec![1_i64, 2, 2], false)
    );
}

#[test]
fn broadcast_requires_a_leaf_onto_a_struct() {
    let root = create_expression_from_prensor(&event_prensor());

    assert!(matches!(
        broadcast(&root, &path("event"), &step("label"), step("x")),
        Err(ExpressionError::InvalidBroadcast { .. })
    ));
    assert!(matches!(
        broadcast(&root, &path("label"), &step("label"), step("x")),
        Err(ExpressionError::InvalidBroadcast { .. })
    ));
}

// size / has

#[test]
fn size_and_has_count_values_per_parent() {
    let root = fixtures::big_expr();
    let with_size = size(&root, &path("doc.keep_me"), step("n")).expect("size");
    let with_has = has(&with_size, &path("doc.keep_me"), step("present")).expect("has");

    let out = calc(&with_has);
    assert_eq!(
        node_at(&out, "doc.n"),
        NodeTensor::leaf(vec![0, 1, 2], vec![1_i64, 1, 0], false)
    );
    assert_eq!(
        node_at(&out, "doc.present"),
        NodeTensor::leaf(vec![0, 1, 2], vec![true, true, false], false)
    );
}

#[test]
fn size_of_a_missing_field_fails_at_construction() {
    assert!(matches!(
        size(&fixtures::big_expr(), &path("doc.nope"), step("n")),
        Err(ExpressionError::MissingPath { .. })
    ));
}

// index

#[test]
fn positional_indices_within_parents() {
    let root = fixtures::big_expr();
    let indexed = get_positional_index(&root, &path("user.friends"), step("pos")).expect("index");
    let indexed = get_index_from_end(&indexed, &path("user.friends"), step("rpos")).expect("index");

    let out = calc(&indexed);
    assert_eq!(
        out.get_descendant(&path("user.pos")).and_then(|p| p.node().values().cloned()),
        Some(Values::Int64(vec![0, 0, 1, 0, 0]))
    );
    assert_eq!(
        out.get_descendant(&path("user.rpos")).and_then(|p| p.node().values().cloned()),
        Some(Values::Int64(vec![-1, -2, -1, -1, -1]))
    );
    assert_eq!(
        node_at(&out, "user.pos").parent_index(),
        Some(&[0_i64, 1, 1, 2, 3][..])
    );
}

// slice

#[test]
fn slice_keeps_a_window_of_each_parent() {
    let root = fixtures::big_expr();
    let friends = path("user.friends");

    let tail = slice_expression(&root, &friends, step("tail"), Some(1), None).expect("slice");
    let last = slice_expression(&root, &friends, step("last"), Some(-1), None).expect("slice");
    let head = truncate(&root, &friends, 1, step("head")).expect("truncate");

    assert_eq!(
        node_at(&calc(&tail), "user.tail"),
        NodeTensor::leaf(vec![1], vec!["c"], true)
    );
    assert_eq!(
        node_at(&calc(&last), "user.last"),
        NodeTensor::leaf(vec![0, 1, 2, 3], vec!["a", "c", "d", "e"], true)
    );
    assert_eq!(
        node_at(&calc(&head), "user.head"),
        NodeTensor::leaf(vec![0, 1, 2, 3], vec!["a", "b", "d", "e"], true)
    );
}

#[test]
fn slicing_a_struct_filters_its_subtree() {
    let root = fixtures::big_expr();
    let sliced = truncate(&root, &path("user"), 1, step("first_user")).expect("truncate");

    let out = calc(&sliced);
    assert_eq!(
        node_at(&out, "first_user"),
        NodeTensor::child(vec![0, 1, 2], true)
    );
    assert_eq!(
        node_at(&out, "first_user.friends"),
        NodeTensor::leaf(vec![0, 1, 1, 2], vec!["a", "b", "c", "e"], true)
    );
}

#[test]
fn truncate_to_zero_keeps_nothing() {
    let root = fixtures::simple_expr();
    let out = calc(&truncate(&root, &path("foorepeated"), 0, step("none")).expect("truncate"));

    assert_eq!(
        node_at(&out, "none"),
        NodeTensor::leaf(Vec::new(), Vec::<i32>::new(), true)
    );
}

// map_values

fn doubled() -> ValuesOp {
    Arc::new(|values: &Values| match values {
        Values::Int32(values) => Values::Int64(values.iter().map(|&v| i64::from(v) * 2).collect()),
        other => other.clone(),
    })
}

#[test]
fn map_values_applies_the_function() {
    let root = fixtures::simple_expr();
    let mapped = map_values(&root, &path("foo"), doubled(), PrimitiveType::Int64, step("twice"))
        .expect("map");

    assert_eq!(
        node_at(&calc(&mapped), "twice"),
        NodeTensor::leaf(vec![0, 1, 2], vec![18_i64, 16, 14], false)
    );
}

#[test]
fn map_values_checks_type_and_length() {
    let root = fixtures::simple_expr();
    let options = CalculateOptions::default();

    let mistyped = map_values(&root, &path("foo"), doubled(), PrimitiveType::Bool, step("m"))
        .expect("map");
    assert!(matches!(
        calculate_prensor(&mistyped, &options),
        Err(CalculateError::TypeMismatch { .. })
    ));

    let short: ValuesOp = Arc::new(|_: &Values| Values::Int32(vec![1]));
    let shortened =
        map_values(&root, &path("foo"), short, PrimitiveType::Int32, step("s")).expect("map");
    assert!(matches!(
        calculate_prensor(&shortened, &options),
        Err(CalculateError::ShapeInvariant { .. })
    ));
}

#[test]
fn map_values_requires_a_leaf() {
    assert!(matches!(
        map_values(
            &fixtures::big_expr(),
            &path("doc"),
            doubled(),
            PrimitiveType::Int64,
            step("m")
        ),
        Err(ExpressionError::NotALeaf { .. })
    ));
}

// map_ragged / map_sparse

#[test]
fn map_ragged_tensor_builds_a_leaf_from_row_lengths() {
    let root = fixtures::simple_expr();
    let op: RaggedOp = Arc::new(|inputs: &[RaggedArray]| {
        let lengths = inputs[0].row_lengths(0).unwrap_or_default();
        let rowids: Vec<i64> = (0..lengths.len() as i64).collect();
        RaggedArray::from_value_rowids(&rowids, lengths.len(), Values::Int64(lengths))
    });
    let spec = LeafSpec {
        is_repeated: false,
        value_type: PrimitiveType::Int64,
    };

    let mapped = map_ragged_tensor(
        &root,
        &Path::root(),
        &[path("foorepeated")],
        op,
        spec,
        step("lengths"),
    )
    .expect("map ragged");

    assert_eq!(
        node_at(&calc(&mapped), "lengths"),
        NodeTensor::leaf(vec![0, 1, 2], vec![1_i64, 2, 1], false)
    );
}

#[test]
fn map_ragged_tensor_rejects_wrong_row_count() {
    let root = fixtures::simple_expr();
    let op: RaggedOp =
        Arc::new(|_: &[RaggedArray]| RaggedArray::from_value_rowids(&[0], 1, Values::Int64(vec![1])));
    let spec = LeafSpec {
        is_repeated: false,
        value_type: PrimitiveType::Int64,
    };

    let mapped = map_ragged_tensor(&root, &Path::root(), &[path("foo")], op, spec, step("bad"))
        .expect("map ragged");
    assert!(matches!(
        calculate_prensor(&mapped, &CalculateOptions::default()),
        Err(CalculateError::ShapeInvariant { .. })
    ));
}

#[test]
fn map_sparse_tensor_within_a_subtree() {
    let root = fixtures::big_expr();
    let op: SparseOp = Arc::new(|inputs: &[SparseArray]| {
        let input = &inputs[0];
        let negated = input.values.as_bool().unwrap_or_default().iter().map(|v| !v).collect();
        SparseArray::new(input.indices.clone(), Values::Bool(negated), input.dense_shape.clone())
    });
    let spec = LeafSpec {
        is_repeated: false,
        value_type: PrimitiveType::Bool,
    };

    let mapped = map_sparse_tensor(&root, &path("doc"), &[path("keep_me")], op, spec, step("drop_me"))
        .expect("map sparse");

    assert_eq!(
        node_at(&calc(&mapped), "doc.drop_me"),
        NodeTensor::leaf(vec![0, 1], vec![true, false], false)
    );
}

#[test]
fn map_prensor_requires_leaf_paths() {
    let root = fixtures::big_expr();
    let op: SparseOp = Arc::new(|inputs: &[SparseArray]| inputs[0].clone());
    let spec = LeafSpec {
        is_repeated: true,
        value_type: PrimitiveType::String,
    };

    assert!(matches!(
        map_sparse_tensor(&root, &Path::root(), &[path("doc")], Arc::clone(&op), spec, step("x")),
        Err(ExpressionError::NotALeaf { .. })
    ));
    assert!(matches!(
        map_sparse_tensor(&root, &Path::root(), &[path("doc.nope")], op, spec, step("x")),
        Err(ExpressionError::MissingPath { .. })
    ));
}

// filter

#[test]
fn filter_by_sibling_keeps_masked_elements() {
    let root = create_expression_from_prensor(&masked_prensor());
    let filtered = filter_by_sibling(&root, &path("foo"), &step("keep"), step("kept")).expect("filter");

    assert_eq!(
        node_at(&calc(&filtered), "kept"),
        NodeTensor::leaf(vec![0, 2], vec![9_i32, 7], false)
    );
}

#[test]
fn filter_by_sibling_checks_the_mask() {
    let root = create_expression_from_prensor(&masked_prensor());

    let misaligned =
        filter_by_sibling(&root, &path("foorepeated"), &step("keep"), step("k")).expect("filter");
    assert!(matches!(
        calculate_prensor(&misaligned, &CalculateOptions::default()),
        Err(CalculateError::ShapeInvariant { .. })
    ));

    assert!(matches!(
        filter_by_sibling(&fixtures::big_expr(), &path("doc"), &step("user"), step("k")),
        Err(ExpressionError::NotALeaf { .. })
    ));
}

// reroot

#[test]
fn reroot_makes_elements_into_rows() {
    let root = fixtures::big_expr();
    let rerooted = reroot(&root, &path("user")).expect("reroot");
    let indexed = create_proto_index(&rerooted, step("row")).expect("proto index");

    let out = calc(&indexed);
    assert_eq!(out.size(), 4);
    assert_eq!(
        node_at(&out, "row"),
        NodeTensor::leaf(vec![0, 1, 2, 3], vec![0_i64, 1, 1, 2], false)
    );
    assert_eq!(
        node_at(&out, "friends"),
        node_at(&fixtures::big_prensor(), "user.friends")
    );
}

#[test]
fn reroot_edge_cases() {
    let root = fixtures::big_expr();

    assert!(Arc::ptr_eq(&reroot(&root, &Path::root()).expect("identity"), &root));
    assert!(matches!(
        reroot(&root, &path("nope")),
        Err(ExpressionError::MissingPath { .. })
    ));
}

#[test]
fn proto_index_of_an_original_root_is_the_row_number() {
    let indexed = create_proto_index(&fixtures::simple_expr(), step("row")).expect("proto index");

    assert_eq!(
        node_at(&calc(&indexed), "row"),
        NodeTensor::leaf(vec![0, 1, 2], vec![0_i64, 1, 2], false)
    );
}

// project / limit_depth

#[test]
fn project_keeps_requested_paths_and_ancestors() {
    let projected = project(&fixtures::big_expr(), &[path("doc.keep_me"), path("nope")]);

    let out = calc(&projected);
    assert_eq!(out.leaf_paths(), vec![path("doc.keep_me")]);
    assert_eq!(
        node_at(&out, "doc.keep_me"),
        node_at(&fixtures::big_prensor(), "doc.keep_me")
    );
}

#[test]
fn limit_depth_hides_deeper_fields() {
    let root = fixtures::big_expr();

    let none = limit_depth(&root, 0);
    assert!(none.known_field_names().is_empty());
    assert!(none.get_child(&step("doc")).is_none());

    let shallow = limit_depth(&root, 1);
    let doc = shallow.get_child(&step("doc")).expect("doc");
    assert!(doc.get_child(&step("bar")).is_none());
    assert_eq!(calc(&shallow).get_descendants().len(), 3);
}

// apply_schema

#[test]
fn apply_schema_attaches_features_by_name() {
    let mut doc = Feature::named("doc");
    doc.set_struct_features(vec![Feature {
        lifecycle_stage: Some(LifecycleStage::Beta),
        ..Feature::named("keep_me")
    }]);
    let schema = Schema::new(vec![doc]);

    let applied = apply_schema(&fixtures::big_expr(), &schema).expect("schema applies");

    let keep_me = applied.get_descendant(&path("doc.keep_me")).expect("keep_me");
    let feature = keep_me.schema_feature().expect("feature attached");
    assert_eq!(feature.lifecycle_stage, Some(LifecycleStage::Beta));
    assert_eq!(feature.name, None);

    let bar = applied.get_descendant(&path("doc.bar")).expect("bar");
    assert!(bar.schema_feature().is_none());

    assert_eq!(calc(&applied), fixtures::big_prensor());
}

#[test]
fn apply_schema_rejects_unknown_domains() {
    let schema = Schema::new(vec![Feature {
        domain_info: Some(DomainInfo::Named("missing".to_string())),
        ..Feature::named("doc")
    }]);

    assert_eq!(
        apply_schema(&fixtures::big_expr(), &schema).map(|_| ()),
        Err(ExpressionError::Schema(SchemaError::UnknownDomain {
            domain: "missing".to_string(),
        }))
    );
}

// add_paths / promote_and_broadcast

#[test]
fn add_paths_requires_parents_and_new_paths() {
    let root = fixtures::big_expr();
    let leaf = mock_leaf(vec![0], vec![1_i64], false);

    assert!(matches!(
        add_paths(&root, BTreeMap::from([(path("doc.bar"), Arc::clone(&leaf))])),
        Err(ExpressionError::PathAlreadyExists { .. })
    ));
    assert!(matches!(
        add_paths(&root, BTreeMap::from([(path("nope.x"), leaf)])),
        Err(ExpressionError::MissingPath { .. })
    ));
}

#[test]
fn promote_and_broadcast_moves_a_leaf_across_subtrees() {
    let root = fixtures::big_expr();
    let moved = promote_and_broadcast(
        &root,
        &BTreeMap::from([(step("bars"), path("doc.bar"))]),
        &path("user"),
    )
    .expect("promote and broadcast");

    assert_eq!(
        node_at(&calc(&moved), "user.bars"),
        NodeTensor::leaf(
            vec![0, 1, 1, 2, 2, 3],
            vec!["a", "b", "c", "b", "c", "d"],
            true
        )
    );
}
