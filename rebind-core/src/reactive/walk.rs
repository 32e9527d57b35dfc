//! Tree walker.
//!
//! Pre-order, depth-first. Each node's child list is captured before the node
//! itself is visited, so a visitor that moves or removes nodes (an `each`
//! binding pulling its template out of the tree, `data-text` replacing
//! children) cannot disturb the traversal of siblings already captured.

use crate::dom::Node;
use crate::error::Result;

/// What the walker should do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Descend into the node's children.
    Continue,
    /// Leave the node's subtree alone.
    Skip,
}

/// Visit `node` and its descendants. Visitor errors stop the walk.
pub fn walk<F>(node: &Node, visit: &mut F) -> Result<()>
where
    F: FnMut(&Node) -> Result<Walk>,
{
    let children = node.children();
    if visit(node)? == Walk::Skip {
        return Ok(());
    }
    for child in &children {
        walk(child, visit)?;
    }
    Ok(())
}
