//! Shared prensors for tests.
//!
//! ```text
//! simple   foo: optional int32         [9, 8, 7]
//!          foorepeated: repeated int32 [9, 8, 7, 6]
//!
//! nested   doc*: rows [0, 1, 1]
//!            bar*: string [a, b, c, d]
//!
//! big      doc*: rows [0, 1, 2]
//!            bar*: string [a, b, c, d]
//!            keep_me?: bool [false, true]
//!          user*: rows [0, 1, 1, 2]
//!            friends*: string [a, b, c, d, e]
//! ```

use crate::{
    expr::ExprRef,
    node::NodeTensor,
    prensor::Prensor,
    test_support::step,
    transform::create_expression_from_prensor,
    value::Values,
};

fn leaf(parent_index: Vec<i64>, values: impl Into<Values>, is_repeated: bool) -> Prensor {
    Prensor::new(NodeTensor::leaf(parent_index, values, is_repeated))
}

fn child(parent_index: Vec<i64>, is_repeated: bool) -> Prensor {
    Prensor::new(NodeTensor::child(parent_index, is_repeated))
}

pub fn simple_prensor() -> Prensor {
    Prensor::new(NodeTensor::root(3))
        .with_child(step("foo"), leaf(vec![0, 1, 2], vec![9_i32, 8, 7], false))
        .with_child(
            step("foorepeated"),
            leaf(vec![0, 1, 1, 2], vec![9_i32, 8, 7, 6], true),
        )
}

pub fn nested_prensor() -> Prensor {
    Prensor::new(NodeTensor::root(3)).with_child(
        step("doc"),
        child(vec![0, 1, 1], true).with_child(
            step("bar"),
            leaf(vec![0, 1, 1, 2], vec!["a", "b", "c", "d"], true),
        ),
    )
}

pub fn big_prensor() -> Prensor {
    Prensor::new(NodeTensor::root(3))
        .with_child(
            step("doc"),
            child(vec![0, 1, 2], true)
                .with_child(
                    step("bar"),
                    leaf(vec![0, 1, 1, 2], vec!["a", "b", "c", "d"], true),
                )
                .with_child(step("keep_me"), leaf(vec![0, 1], vec![false, true], false)),
        )
        .with_child(
            step("user"),
            child(vec![0, 1, 1, 2], true).with_child(
                step("friends"),
                leaf(vec![0, 1, 1, 2, 3], vec!["a", "b", "c", "d", "e"], true),
            ),
        )
}

/// Parent indices out of range and out of order.
pub fn broken_prensor() -> Prensor {
    Prensor::new(NodeTensor::root(3)).with_child(
        step("doc"),
        child(vec![2, 0, 5], true).with_child(
            step("bar"),
            leaf(vec![0, 4, -1, 1], vec!["a", "b", "c", "d"], false),
        ),
    )
}

pub fn simple_expr() -> ExprRef {
    create_expression_from_prensor(&simple_prensor())
}

pub fn nested_expr() -> ExprRef {
    create_expression_from_prensor(&nested_prensor())
}

pub fn big_expr() -> ExprRef {
    create_expression_from_prensor(&big_prensor())
}

pub fn broken_expr() -> ExprRef {
    create_expression_from_prensor(&broken_prensor())
}
