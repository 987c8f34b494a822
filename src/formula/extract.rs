use std::marker::PhantomData;

use crate::formula::{CountNodesValuator, Dialect, Formula, FormulaSet, FormulaValuator, MarkupKind};
use crate::tables::ClassificationTables;
use crate::tree::{MathTree, NodeId};

/// Extraction Engine
/// Walks every `math` root of a tree and stores the formulae it finds,
/// one position per root.
///
/// `V` decides the base weight of a root.
#[derive(Debug, Clone)]
pub struct Extractor<'a, V = CountNodesValuator>
where
    V: FormulaValuator,
{
    tables: &'a ClassificationTables,
    dialect: Dialect,
    sub_expressions: bool,
    depth_decay: f32,
    _marker: PhantomData<V>,
}

impl<'a, V> Extractor<'a, V>
where
    V: FormulaValuator,
{
    pub fn new(
        tables: &'a ClassificationTables,
        dialect: Dialect,
        sub_expressions: bool,
        depth_decay: f32,
    ) -> Self {
        Self {
            tables,
            dialect,
            sub_expressions,
            depth_decay,
            _marker: PhantomData,
        }
    }

    /// Extract the formulae of every `math` root.
    /// Blank text is removed from the tree on the way.
    pub fn extract(&self, tree: &mut MathTree) -> FormulaSet {
        let mut set = FormulaSet::new();
        for root in tree.math_roots() {
            let position = set.open_position();
            tree.remove_whitespace_text(root);
            let value = V::value(tree, root);
            let weight = if self.sub_expressions { 1.0 / value } else { value };
            self.load_node(tree, root, weight, position, &mut set);
        }
        set
    }

    fn load_node(&self, tree: &MathTree, node: NodeId, weight: f32, position: usize, set: &mut FormulaSet) {
        let Some(name) = tree.name(node) else {
            return;
        };
        if self.tables.skip_subtree(name) {
            return;
        }
        let store = self.dialect.accepts(self.tables, name);

        // whole-expression mode keeps the first branch of parallel markup
        if !self.sub_expressions && set.get(position).map_or(false, |stored| !stored.is_empty()) {
            return;
        }
        if self.sub_expressions || !store {
            let child_weight = if store { weight * self.depth_decay } else { weight };
            for &child in tree.children(node) {
                self.load_node(tree, child, child_weight, position, set);
            }
        }

        if store && !self.tables.skip_node(name) {
            let kind = MarkupKind::of(self.tables, name);
            set.push(position, Formula::from_subtree(tree, node, weight, kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::term::formula_term;

    fn extract(markup: &str, dialect: Dialect, sub_expressions: bool) -> (FormulaSet, ClassificationTables) {
        let tables = ClassificationTables::load_default().unwrap();
        let mut tree = MathTree::parse(markup).unwrap();
        let set = Extractor::<CountNodesValuator>::new(&tables, dialect, sub_expressions, 0.7)
            .extract(&mut tree);
        (set, tables)
    }

    fn terms(set: &FormulaSet, tables: &ClassificationTables, position: usize) -> Vec<String> {
        set.get(position)
            .unwrap()
            .iter()
            .map(|f| formula_term(f.tree(), tables))
            .collect()
    }

    #[test]
    fn sub_expressions_children_first() {
        let (set, tables) = extract(
            "<math><mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow></math>",
            Dialect::Presentation,
            true,
        );
        assert_eq!(
            terms(&set, &tables, 0),
            vec!["i(a)", "o(+)", "i(b)", "r(i(a)o(+)i(b))"]
        );
    }

    #[test]
    fn weights_decay_with_depth() {
        let (set, _) = extract(
            "<math><mrow><msqrt><mrow><mi>x</mi><mo>+</mo><mn>1</mn></mrow></msqrt></mrow></math>",
            Dialect::Presentation,
            true,
        );
        let formulae = set.get(0).unwrap();
        // math, mrow, msqrt, mrow, mi, mo, mn
        let base = 1.0 / 7.0;
        let by_name = |name: &str| -> Vec<f32> {
            formulae
                .iter()
                .filter(|f| f.tree().name(f.root().unwrap()) == Some(name))
                .map(Formula::weight)
                .collect()
        };
        let outer = by_name("mrow").into_iter().fold(0.0f32, f32::max);
        let sqrt = by_name("msqrt")[0];
        let leaf = by_name("mi")[0];
        assert!((outer - base).abs() < 1e-6);
        assert!((sqrt - base * 0.7).abs() < 1e-6);
        assert!((leaf - base * 0.7 * 0.7 * 0.7).abs() < 1e-6);
        assert!(outer > sqrt && sqrt > leaf);
    }

    #[test]
    fn whole_expression_mode_stores_roots_only() {
        let (set, tables) = extract(
            "<body><math><mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow></math><math><mi>c</mi></math></body>",
            Dialect::Presentation,
            false,
        );
        assert_eq!(set.len(), 2);
        assert_eq!(terms(&set, &tables, 0), vec!["r(i(a)o(+)i(b))"]);
        assert_eq!(terms(&set, &tables, 1), vec!["i(c)"]);
        assert_eq!(set.get(0).unwrap()[0].weight(), 5.0);
    }

    #[test]
    fn whole_expression_mode_keeps_first_parallel_branch() {
        let markup = "<math><semantics><mrow><mi>a</mi><mo>+</mo><mi>b</mi></mrow>\
                      <annotation-xml><apply><plus/><ci>a</ci><ci>b</ci></apply></annotation-xml>\
                      </semantics></math>";
        let (set, tables) = extract(markup, Dialect::Both, false);
        assert_eq!(terms(&set, &tables, 0), vec!["r(i(a)o(+)i(b))"]);

        let (set, tables) = extract(markup, Dialect::Content, false);
        assert_eq!(terms(&set, &tables, 0), vec!["a(plus()ci(a)ci(b))"]);
    }

    #[test]
    fn skip_subtree_yields_nothing_and_skip_node_is_transparent() {
        let (set, tables) = extract(
            "<math><semantics><mi>x</mi><annotation><mi>y</mi></annotation></semantics></math>",
            Dialect::Both,
            true,
        );
        assert_eq!(terms(&set, &tables, 0), vec!["i(x)"]);
    }

    #[test]
    fn dialect_filters_stored_nodes() {
        let markup = "<math><semantics><mrow><mi>x</mi></mrow>\
                      <annotation-xml><apply><plus/><ci>x</ci><cn>1</cn></apply></annotation-xml>\
                      </semantics></math>";
        let (set, tables) = extract(markup, Dialect::Content, true);
        assert_eq!(terms(&set, &tables, 0), vec!["plus()", "ci(x)", "cn(1)", "a(plus()ci(x)cn(1))"]);
        assert!(set.get(0).unwrap().iter().all(|f| f.kind() == MarkupKind::Content));

        let (set, tables) = extract(markup, Dialect::Presentation, true);
        assert_eq!(terms(&set, &tables, 0), vec!["i(x)", "r(i(x))"]);
    }

    #[test]
    fn empty_roots_keep_their_position() {
        let (set, _) = extract(
            "<body><math><annotation>x</annotation></math><math><mi>c</mi></math></body>",
            Dialect::Presentation,
            true,
        );
        assert_eq!(set.len(), 2);
        assert!(set.get(0).unwrap().is_empty());
        assert_eq!(set.get(1).unwrap().len(), 1);
    }
}
