//! The transform library.
//!
//! Every transform takes a root expression and returns a new root; the
//! original is never modified. Transforms that add a field graft it with
//! [`add_paths`], so the new root shares every untouched subtree with the
//! original.

mod add_paths;
mod apply_schema;
mod broadcast;
mod depth_limit;
mod filter;
mod index;
mod map_prensor;
mod map_values;
mod project;
mod promote;
mod promote_and_broadcast;
mod reroot;
mod size;
mod slice;
mod source;

#[cfg(test)]
mod tests;

pub use add_paths::add_paths;
pub use apply_schema::apply_schema;
pub use broadcast::{broadcast, broadcast_anonymous};
pub use depth_limit::limit_depth;
pub use filter::filter_by_sibling;
pub use index::{
    get_index_from_end, get_index_from_end_anonymous, get_positional_index,
    get_positional_index_anonymous,
};
pub use map_prensor::{LeafSpec, RaggedOp, SparseOp, map_ragged_tensor, map_sparse_tensor};
pub use map_values::{ValuesOp, map_values, map_values_anonymous};
pub use project::project;
pub use promote::{promote, promote_anonymous, promote_schema_feature};
pub use promote_and_broadcast::{promote_and_broadcast, promote_and_broadcast_anonymous};
pub use reroot::{create_proto_index, reroot};
pub use size::{has, has_anonymous, size, size_anonymous};
pub use slice::{slice_expression, truncate};
pub use source::create_expression_from_prensor;
