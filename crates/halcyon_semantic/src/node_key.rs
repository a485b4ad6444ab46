//! Compact, hashable identity for an AST node.
//!
//! Grounded on `red_knot_python_semantic::node_key::NodeKey`: the core needs
//! to key maps (the evaluator registry's pending set, the "replaced by stub"
//! set) by AST node identity, but AST nodes are not `Copy` and two distinct
//! nodes can otherwise compare equal (e.g. two empty-range name nodes
//! produced by recovering from invalid syntax). Using the node's address as
//! the key sidesteps both problems without requiring the AST crate to hand
//! out its own opaque ids.

use ruff_python_ast::AnyNodeRef;

/// Stable-for-the-lifetime-of-the-tree identity of an AST node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn from_node<'a, N>(node: N) -> Self
    where
        N: Into<AnyNodeRef<'a>>,
    {
        let node = node.into();
        NodeKey(node.as_ptr().as_ptr() as usize)
    }
}
