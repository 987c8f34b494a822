use std::cmp::Ordering;

use crate::formula::term::node_to_string;
use crate::formula::{Dialect, Formula};
use crate::tables::{ClassificationTables, OPERATOR_ELEMENT};
use crate::tree::{MathTree, NodeId};

/// Canonical Ordering Engine
/// Returns a reordered copy of `formula`; the input is left untouched.
pub fn canonicalize(formula: &Formula, tables: &ClassificationTables, dialect: Dialect) -> Formula {
    let mut tree = formula.tree().deep_copy();
    if let Some(root) = tree.root() {
        order_node(&mut tree, root, tables, dialect);
    }
    Formula::from_tree(tree, formula.weight(), formula.kind())
}

/// Order the subtree at `node` bottom-up
pub fn order_node(tree: &mut MathTree, node: NodeId, tables: &ClassificationTables, dialect: Dialect) {
    let mut children = tree.children(node).to_vec();
    if children.len() < 2 {
        return;
    }
    for &child in &children {
        order_node(tree, child, tables, dialect);
    }
    if dialect.orders_presentation() {
        order_infix(tree, &mut children, tables);
    }
    if dialect.orders_content() {
        order_commutative_apply(tree, &mut children, tables);
    }
    tree.set_children(node, children);
}

/// Total order on sibling subtrees: element name, then structure, then text
pub fn compare_nodes(tree: &MathTree, a: NodeId, b: NodeId, tables: &ClassificationTables) -> Ordering {
    tree.name(a)
        .cmp(&tree.name(b))
        .then_with(|| node_to_string(tree, a, tables, false).cmp(&node_to_string(tree, b, tables, false)))
        .then_with(|| node_to_string(tree, a, tables, true).cmp(&node_to_string(tree, b, tables, true)))
}

/// trimmed text of an operator element, `None` for anything else
fn operator_text(tree: &MathTree, node: NodeId) -> Option<String> {
    if tree.name(node) != Some(OPERATOR_ELEMENT) {
        return None;
    }
    Some(tree.text_content(node).trim().to_string())
}

/// The operands around `children[i]` may swap unless an operator of higher
/// priority sits right outside them.
fn can_swap(tree: &MathTree, children: &[NodeId], i: usize, op: &str, tables: &ClassificationTables) -> bool {
    let Some(higher) = tables.operator_priority(op) else {
        return false;
    };
    let outer = [i.checked_sub(2), Some(i + 2)];
    !outer
        .into_iter()
        .flatten()
        .filter_map(|j| children.get(j))
        .filter_map(|&n| operator_text(tree, n))
        .any(|text| higher.contains(&text))
}

/// Bubble passes over `operand op operand` triples of a presentation row.
/// Operands are single children, so in a flat row such as `b * c + a` the
/// product is not one operand and `b*c + a` stays apart from `a + b*c`.
fn order_infix(tree: &MathTree, children: &mut [NodeId], tables: &ClassificationTables) {
    let len = children.len();
    if len < 3 {
        return;
    }
    for _ in 0..len {
        let mut swapped = false;
        for i in 1..len - 1 {
            let Some(op) = operator_text(tree, children[i]) else {
                continue;
            };
            if tables.operator_priority(&op).is_none() {
                continue;
            }
            let (left, right) = (children[i - 1], children[i + 1]);
            if compare_nodes(tree, left, right, tables) == Ordering::Greater
                && can_swap(tree, children, i, &op, tables)
            {
                children.swap(i - 1, i + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

/// Bubble passes over the arguments of `plus` / `times` applications
fn order_commutative_apply(tree: &MathTree, children: &mut [NodeId], tables: &ClassificationTables) {
    let is_commutative = tree
        .name(children[0])
        .map_or(false, |name| tables.is_commutative_function(name));
    if !is_commutative {
        return;
    }
    let len = children.len();
    for _ in 0..len {
        let mut swapped = false;
        for j in 1..len - 1 {
            if compare_nodes(tree, children[j], children[j + 1], tables) == Ordering::Greater {
                children.swap(j, j + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}
