//! Move a leaf onto an arbitrary destination parent.
//!
//! The leaf is promoted up to the least common ancestor of its parent and
//! the destination, then broadcast down one level at a time.

use crate::{
    expr::{ExprRef, ExpressionError, SCHEMA_STRING_LIMIT},
    path::{AnonymousIdAllocator, Path, Step},
    transform::{add_paths, broadcast_anonymous, promote_anonymous},
};
use std::{collections::BTreeMap, sync::Arc};

/// Place the leaf at `origin` under `new_parent` at a generated path.
pub fn promote_and_broadcast_anonymous(
    root: &ExprRef,
    origin: &Path,
    new_parent: &Path,
    ids: &AnonymousIdAllocator,
) -> Result<(ExprRef, Path), ExpressionError> {
    let ancestor = origin.parent()?.least_common_ancestor(new_parent);

    let mut expr = Arc::clone(root);
    let mut path = origin.clone();

    while path.parent()? != ancestor {
        (expr, path) = promote_anonymous(&expr, &path, ids)?;
    }

    loop {
        let at = path.parent()?;
        if at == *new_parent {
            break;
        }
        let Some(sibling) = new_parent.steps().get(at.len()) else {
            return Err(ExpressionError::MissingPath {
                path: new_parent.clone(),
                schema: expr.schema_string(Some(SCHEMA_STRING_LIMIT)),
            });
        };
        (expr, path) = broadcast_anonymous(&expr, &path, sibling, ids)?;
    }

    Ok((expr, path))
}

///
/// promote_and_broadcast
///
/// For each `name -> origin`, place the leaf at `origin` under
/// `dest_parent` as `dest_parent.child(name)`.
///
pub fn promote_and_broadcast(
    root: &ExprRef,
    path_dictionary: &BTreeMap<Step, Path>,
    dest_parent: &Path,
) -> Result<ExprRef, ExpressionError> {
    let ids = AnonymousIdAllocator::global();
    let mut expr = Arc::clone(root);

    for (name, origin) in path_dictionary {
        let (moved, moved_path) = promote_and_broadcast_anonymous(&expr, origin, dest_parent, ids)?;
        let field = moved.get_descendant_or_error(&moved_path)?;
        expr = add_paths(
            &moved,
            BTreeMap::from([(dest_parent.child(name.clone()), field)]),
        )?;
    }

    Ok(expr)
}
