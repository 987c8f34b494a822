use indexmap::IndexMap;

use crate::formula::Formula;
use crate::tables::{ClassificationTables, IDENTIFIER_ELEMENTS, NUMBER_ELEMENTS};
use crate::tree::{MathTree, NodeId};

/// Text every numeric literal is replaced with
pub const CONSTANT_MARKER: &str = "\u{00B6}";

/// Weight factors of the generalized variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralizeFactors {
    pub variable: f32,
    pub constant: f32,
    pub attribute: f32,
}

/// Run the three generalization passes in order over one position.
/// Each pass sees the variants of the passes before it.
pub fn generalize(formulae: &mut Vec<Formula>, tables: &ClassificationTables, factors: GeneralizeFactors) {
    unify_variables(formulae, factors.variable);
    unify_constants(formulae, factors.constant);
    process_attributes(formulae, tables, factors.attribute);
}

/// Leaves and formulae whose only child is text are not generalized
fn has_element_child(tree: &MathTree, root: NodeId) -> bool {
    match tree.children(root) {
        [] => false,
        [only] => tree.is_element(*only),
        _ => true,
    }
}

/// Rewrite the text of every `names` element under the root of `tree`.
/// Returns whether any text changed.
fn rewrite_leaves(tree: &mut MathTree, names: &[&str], mut replace: impl FnMut(&str) -> String) -> bool {
    let Some(root) = tree.root() else {
        return false;
    };
    let mut changed = false;
    for node in tree.descendants(root) {
        if !tree.name(node).map_or(false, |name| names.contains(&name)) {
            continue;
        }
        let text = tree.text_content(node);
        let replacement = replace(text.trim());
        if replacement != text {
            tree.set_text_content(node, &replacement);
            changed = true;
        }
    }
    changed
}

/// Append a copy of `formulae[i]` rewritten by `rewrite` when it changed
fn derive_each(
    formulae: &mut Vec<Formula>,
    factor: f32,
    mut rewrite: impl FnMut(&mut MathTree) -> bool,
) {
    let count = formulae.len();
    for i in 0..count {
        let source = &formulae[i];
        let Some(root) = source.root() else {
            continue;
        };
        if !has_element_child(source.tree(), root) {
            continue;
        }
        let mut variant = source.derive(factor);
        if rewrite(variant.tree_mut()) {
            formulae.push(variant);
        }
    }
}

/// Identifier unification.
/// Identifiers are numbered from 1 in order of first appearance, with a
/// fresh numbering for every formula.
pub fn unify_variables(formulae: &mut Vec<Formula>, factor: f32) {
    derive_each(formulae, factor, |tree| {
        let mut placeholders: IndexMap<String, String> = IndexMap::new();
        rewrite_leaves(tree, IDENTIFIER_ELEMENTS, |text| {
            let next = (placeholders.len() + 1).to_string();
            placeholders.entry(text.to_string()).or_insert(next).clone()
        })
    });
}

/// Constant unification, every numeric literal becomes `CONSTANT_MARKER`
pub fn unify_constants(formulae: &mut Vec<Formula>, factor: f32) {
    derive_each(formulae, factor, |tree| {
        rewrite_leaves(tree, NUMBER_ELEMENTS, |_| CONSTANT_MARKER.to_string())
    });
}

/// Attribute pruning.
/// Every formula loses all of its attributes; a variant keeping only the
/// dictionary attributes is added when there was at least one.
pub fn process_attributes(formulae: &mut Vec<Formula>, tables: &ClassificationTables, factor: f32) {
    let count = formulae.len();
    for i in 0..count {
        let Some(root) = formulae[i].root() else {
            continue;
        };
        let mut variant = formulae[i].derive(factor);
        let kept = keep_allowed_attributes(variant.tree_mut(), tables);
        formulae[i].tree_mut().strip_attributes(root);
        if kept > 0 {
            formulae.push(variant);
        }
    }
}

/// Drop attributes missing from the dictionary, returns how many remain
fn keep_allowed_attributes(tree: &mut MathTree, tables: &ClassificationTables) -> usize {
    let Some(root) = tree.root() else {
        return 0;
    };
    let mut kept = 0;
    for node in tree.descendants(root) {
        if let Some(attrs) = tree.attributes_mut(node) {
            attrs.retain(|key, _| tables.allowed_attribute(key));
            kept += attrs.len();
        }
    }
    kept
}
