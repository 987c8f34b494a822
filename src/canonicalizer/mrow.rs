use serde::{Deserialize, Serialize};

use crate::canonicalizer::CanonicalizerModule;
use crate::error::Result;
use crate::tree::{MathTree, Node, NodeId};

const ROW_ELEMENT: &str = "mrow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MrowNormalizerConfig {
    /// replace an attribute-less `mrow` holding a single element by that element
    pub collapse_single_child: bool,
    /// group the content of a `math` root with several children into one `mrow`
    pub wrap_math_content: bool,
}

impl Default for MrowNormalizerConfig {
    fn default() -> Self {
        Self {
            collapse_single_child: true,
            wrap_math_content: true,
        }
    }
}

/// Row normalizer
/// Removes grouping rows that add nothing and gives every formula root a
/// single expression child.
#[derive(Debug, Clone)]
pub struct MrowNormalizer {
    config: MrowNormalizerConfig,
}

impl MrowNormalizer {
    pub fn new(config: MrowNormalizerConfig) -> Self {
        Self { config }
    }

    fn is_blank_text(tree: &MathTree, id: NodeId) -> bool {
        matches!(tree.node(id), Some(Node::Text(t)) if t.trim().is_empty())
    }

    /// bottom-up rebuild of every child list
    fn collapse(&self, tree: &mut MathTree, id: NodeId) {
        let children = tree.children(id).to_vec();
        if children.is_empty() {
            return;
        }
        let mut rebuilt = Vec::with_capacity(children.len());
        for child in children {
            self.collapse(tree, child);
            rebuilt.push(Self::unwrap_row(tree, child));
        }
        tree.set_children(id, rebuilt);
    }

    /// The node replacing `id` in its parent
    fn unwrap_row(tree: &mut MathTree, id: NodeId) -> NodeId {
        if tree.name(id) != Some(ROW_ELEMENT) {
            return id;
        }
        if tree.attributes(id).map_or(false, |attrs| !attrs.is_empty()) {
            return id;
        }
        let children = tree.children(id).to_vec();
        let content: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&c| !Self::is_blank_text(tree, c))
            .collect();
        match content.as_slice() {
            [only] if tree.is_element(*only) => {
                let only = *only;
                let rest = children.into_iter().filter(|&c| c != only).collect();
                tree.set_children(id, rest);
                tree.remove_subtree(id);
                tracing::trace!("single child row collapsed");
                only
            }
            _ => id,
        }
    }

    fn wrap_math_content(&self, tree: &mut MathTree) {
        for math in tree.math_roots() {
            let children = tree.children(math).to_vec();
            let elements = children.iter().filter(|&&c| tree.is_element(c)).count();
            if elements <= 1 {
                continue;
            }
            let row = tree.element(ROW_ELEMENT);
            tree.set_children(row, children);
            tree.set_children(math, vec![row]);
        }
    }
}

impl CanonicalizerModule for MrowNormalizer {
    fn name(&self) -> &'static str {
        "mrow_normalizer"
    }

    fn execute(&self, tree: &mut MathTree) -> Result<()> {
        let Some(root) = tree.root() else {
            return Ok(());
        };
        if self.config.collapse_single_child {
            self.collapse(tree, root);
        }
        if self.config.wrap_math_content {
            self.wrap_math_content(tree);
        }
        Ok(())
    }
}
