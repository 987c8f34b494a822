pub mod valuation;
pub mod term;
pub mod extract;
pub mod order;
pub mod generalize;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tables::ClassificationTables;
use crate::tree::{MathTree, NodeId};

pub use valuation::{CountNodesValuator, FormulaValuator};

/// Markup vocabulary the extraction accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Content,
    Presentation,
    #[default]
    Both,
}

impl Dialect {
    /// Whether an element of this name is stored as a formula
    pub fn accepts(self, tables: &ClassificationTables, name: &str) -> bool {
        match self {
            Dialect::Content => tables.is_content_element(name),
            Dialect::Presentation => tables.is_presentation_element(name),
            Dialect::Both => tables.is_indexable(name),
        }
    }

    #[inline]
    pub(crate) fn orders_presentation(self) -> bool {
        matches!(self, Dialect::Presentation | Dialect::Both)
    }

    #[inline]
    pub(crate) fn orders_content(self) -> bool {
        matches!(self, Dialect::Content | Dialect::Both)
    }
}

/// Dialect a stored formula root belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupKind {
    Content,
    Presentation,
}

impl MarkupKind {
    /// presentation wins for names listed in both vocabularies
    pub fn of(tables: &ClassificationTables, name: &str) -> Self {
        if tables.is_presentation_element(name) {
            MarkupKind::Presentation
        } else {
            MarkupKind::Content
        }
    }
}

/// Formula
/// One weighted expression subtree. The tree is owned exclusively: a
/// formula is always built from a compact copy and derived variants copy
/// again, so no two formulae share nodes.
#[derive(Debug, Clone)]
pub struct Formula {
    tree: MathTree,
    weight: f32,
    kind: MarkupKind,
}

impl Formula {
    /// Copy the subtree at `node` out of `source`
    pub fn from_subtree(source: &MathTree, node: NodeId, weight: f32, kind: MarkupKind) -> Self {
        Self {
            tree: source.subtree(node),
            weight,
            kind,
        }
    }

    /// Wrap a tree the caller already owns
    pub(crate) fn from_tree(tree: MathTree, weight: f32, kind: MarkupKind) -> Self {
        Self { tree, weight, kind }
    }

    #[inline]
    pub fn tree(&self) -> &MathTree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut MathTree {
        &mut self.tree
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    #[inline]
    pub fn kind(&self) -> MarkupKind {
        self.kind
    }

    /// Variant on a fresh copy of the tree, weight scaled by `factor`
    pub fn derive(&self, factor: f32) -> Self {
        Self {
            tree: self.tree.deep_copy(),
            weight: self.weight * factor,
            kind: self.kind,
        }
    }
}

/// Document Formula Set
/// Formulae grouped by the document position of the `math` root they
/// come from. Positions are opened in order, so keys are always `0..N`.
#[derive(Debug, Clone, Default)]
pub struct FormulaSet {
    positions: IndexMap<usize, Vec<Formula>>,
}

impl FormulaSet {
    pub fn new() -> Self {
        Self {
            positions: IndexMap::new(),
        }
    }

    /// Open the next position and return its key
    pub fn open_position(&mut self) -> usize {
        let position = self.positions.len();
        self.positions.insert(position, Vec::new());
        position
    }

    /// Append to an opened position, ignored for unknown positions
    pub fn push(&mut self, position: usize, formula: Formula) {
        if let Some(formulae) = self.positions.get_mut(&position) {
            formulae.push(formula);
        }
    }

    pub fn get(&self, position: usize) -> Option<&[Formula]> {
        self.positions.get(&position).map(Vec::as_slice)
    }

    /// Positions in document order with their formulae
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Formula])> {
        self.positions.iter().map(|(&p, f)| (p, f.as_slice()))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Vec<Formula>)> {
        self.positions.iter_mut().map(|(&p, f)| (p, f))
    }

    /// number of positions, empty ones included
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// number of formulae over all positions
    pub fn formula_count(&self) -> usize {
        self.positions.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
