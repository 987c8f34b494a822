use crate::tree::{MathTree, NodeId};

/// Base weight strategy for the formulae of one `math` root.
///
/// The extraction engine takes the valuator as a type parameter and calls
/// it once per root; alternative weighting heuristics plug in here without
/// touching the extraction itself.
pub trait FormulaValuator {
    /// Size-like measure of the subtree at `node`, strictly positive
    fn value(tree: &MathTree, node: NodeId) -> f32;
}

/// Default valuator
/// Number of elements in the subtree, at least 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountNodesValuator;

impl FormulaValuator for CountNodesValuator {
    fn value(tree: &MathTree, node: NodeId) -> f32 {
        tree.count_elements(node).max(1) as f32
    }
}
