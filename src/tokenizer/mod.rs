pub mod options;
pub mod token;
pub mod batch;

use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::canonicalizer::{Canonicalizer, CanonicalizerConfig};
use crate::error::{Error, Result};
use crate::formula::extract::Extractor;
use crate::formula::generalize::generalize;
use crate::formula::term::formula_term;
use crate::formula::{order, CountNodesValuator, FormulaSet, FormulaValuator};
use crate::tables::ClassificationTables;
use crate::tree::{MathTree, MAX_NESTING_DEPTH};

pub use options::{Coefficients, TokenizerOptions};
pub use token::{decode_tokens, encode_tokens, Token};

/// Formula counts of the last processed document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerStats {
    /// `math` roots found
    pub input_formulae: usize,
    /// formulae stored, variants included
    pub produced_formulae: usize,
}

/// Tokenizer Facade
/// Runs the whole pipeline on one document: structural canonicalization,
/// extraction, operand ordering, generalization and serialization.
///
/// Tables and canonicalizer are shared read-only; the formulae of the last
/// document are kept until the next `tokenize` or `reset`, so one instance
/// serves one document at a time.
#[derive(Debug)]
pub struct MathTokenizer<V = CountNodesValuator>
where
    V: FormulaValuator,
{
    tables: Arc<ClassificationTables>,
    canonicalizer: Arc<Canonicalizer>,
    options: TokenizerOptions,
    /// increment carried by the first token
    formula_position: u32,
    formulae: FormulaSet,
    stats: TokenizerStats,
    _marker: PhantomData<V>,
}

impl<V> MathTokenizer<V>
where
    V: FormulaValuator,
{
    /// Create a tokenizer over shared tables and canonicalizer
    pub fn new(
        tables: Arc<ClassificationTables>,
        canonicalizer: Arc<Canonicalizer>,
        options: TokenizerOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            tables,
            canonicalizer,
            options,
            formula_position: 1,
            formulae: FormulaSet::new(),
            stats: TokenizerStats::default(),
            _marker: PhantomData,
        })
    }

    /// Create a tokenizer with the bundled tables and the default chain
    pub fn with_defaults(options: TokenizerOptions) -> Result<Self> {
        let tables = Arc::new(ClassificationTables::load_default()?);
        let canonicalizer = Arc::new(Canonicalizer::new(&CanonicalizerConfig::default())?);
        Self::new(tables, canonicalizer, options)
    }

    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    pub fn tables(&self) -> &Arc<ClassificationTables> {
        &self.tables
    }

    /// Position increment of the first token of the next stream
    pub fn set_formula_position(&mut self, position: u32) {
        self.formula_position = position;
    }

    /// Parse `markup` and tokenize it
    pub fn tokenize_str(&mut self, markup: &str) -> Result<Vec<Token>> {
        let tree = MathTree::parse(markup)?;
        self.tokenize(tree)
    }

    /// Tokenize one document.
    /// Trees nested deeper than `MAX_NESTING_DEPTH` are rejected.
    pub fn tokenize(&mut self, tree: MathTree) -> Result<Vec<Token>> {
        self.process(tree)?;
        Ok(self.tokens())
    }

    fn process(&mut self, mut tree: MathTree) -> Result<()> {
        self.formulae.clear();
        if let Some(root) = tree.root() {
            if tree.depth(root) > MAX_NESTING_DEPTH {
                return Err(Error::parse(format!(
                    "elements nested deeper than {} levels",
                    MAX_NESTING_DEPTH
                )));
            }
        }
        self.canonicalizer.canonicalize(&mut tree)?;

        let sub_expressions = self.options.sub_expressions;
        let dialect = self.options.dialect;
        let coefficients = self.options.coefficients.effective(sub_expressions);

        let mut formulae = Extractor::<V>::new(&self.tables, dialect, sub_expressions, coefficients.depth_decay)
            .extract(&mut tree);
        let input_formulae = formulae.len();

        for (_, list) in formulae.iter_mut() {
            let ordered: Vec<_> = list
                .iter()
                .map(|formula| order::canonicalize(formula, &self.tables, dialect))
                .collect();
            *list = ordered;
            if sub_expressions {
                generalize(list, &self.tables, coefficients.generalize_factors());
            }
        }

        self.stats = TokenizerStats {
            input_formulae,
            produced_formulae: formulae.formula_count(),
        };
        self.formulae = formulae;
        tracing::debug!(
            input_formulae = self.stats.input_formulae,
            produced_formulae = self.stats.produced_formulae,
            "document tokenized"
        );
        Ok(())
    }

    /// Token stream of the last document.
    /// Formulae serializing to an empty term are dropped.
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.formulae.formula_count());
        let mut increment = self.formula_position;
        for (i, (position, list)) in self.formulae.iter().enumerate() {
            if i > 0 {
                increment += 1;
            }
            for formula in list {
                let term = formula_term(formula.tree(), &self.tables);
                if term.is_empty() {
                    continue;
                }
                tokens.push(Token {
                    term,
                    weight: formula.weight(),
                    position,
                    position_increment: increment,
                });
                increment = 0;
            }
        }
        tokens
    }

    /// Formulae of the last document by position
    pub fn formulae(&self) -> &FormulaSet {
        &self.formulae
    }

    /// Term to weight map of the last document, for query building.
    /// A term produced twice keeps the weight seen last.
    pub fn query_formulae(&self) -> IndexMap<String, f32> {
        self.formulae
            .iter()
            .flat_map(|(_, list)| list.iter())
            .map(|formula| (formula_term(formula.tree(), &self.tables), formula.weight()))
            .filter(|(term, _)| !term.is_empty())
            .collect()
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Forget the last document and restore the default formula position
    pub fn reset(&mut self) {
        self.formulae.clear();
        self.stats = TokenizerStats::default();
        self.formula_position = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Dialect;

    fn tokenizer(options: TokenizerOptions) -> MathTokenizer {
        MathTokenizer::with_defaults(options).unwrap()
    }

    fn terms(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.term.as_str()).collect()
    }

    #[test]
    fn whole_expression_mode_one_term_per_root() {
        let mut tokenizer = tokenizer(TokenizerOptions::query());
        let tokens = tokenizer
            .tokenize_str("<math><mi>b</mi><mo>+</mo><mi>a</mi></math>")
            .unwrap();
        assert_eq!(terms(&tokens), vec!["r(i(a)o(+)i(b))"]);
        // math, mrow, mi, mo, mi
        assert_eq!(tokens[0].weight, 5.0);
        assert_eq!(tokenizer.stats().input_formulae, 1);
    }

    #[test]
    fn commuted_queries_share_a_term() {
        let mut tokenizer = tokenizer(TokenizerOptions::query());
        let left = tokenizer.tokenize_str("<math><mi>x</mi><mo>+</mo><mn>1</mn></math>").unwrap();
        let right = tokenizer.tokenize_str("<math><mn>1</mn><mo>+</mo><mi>x</mi></math>").unwrap();
        assert_eq!(terms(&left), terms(&right));
    }

    #[test]
    fn invisible_operators_are_normalized() {
        let mut tokenizer = tokenizer(TokenizerOptions::query());
        let tokens = tokenizer
            .tokenize_str("<math><mi>f</mi><mo>&ApplyFunction;</mo><mi>x</mi></math>")
            .unwrap();
        assert_eq!(terms(&tokens), vec!["r(i(f)i(x))"]);
    }

    #[test]
    fn sub_expression_stream_with_variants() {
        let options = TokenizerOptions::default().with_dialect(Dialect::Presentation);
        let mut tokenizer = tokenizer(options);
        let tokens = tokenizer
            .tokenize_str("<math><mi>y</mi><mo>+</mo><mn>2</mn></math>")
            .unwrap();
        assert_eq!(
            terms(&tokens),
            vec![
                "i(y)",
                "o(+)",
                "n(2)",
                "r(i(y)o(+)n(2))",
                "r(i(1)o(+)n(2))",
                "r(i(y)o(+)n(\u{00B6}))",
                "r(i(1)o(+)n(\u{00B6}))",
            ]
        );
        let base = 1.0 / 5.0;
        assert!((tokens[0].weight - base * 0.7).abs() < 1e-6);
        assert!((tokens[3].weight - base).abs() < 1e-6);
        assert!((tokens[6].weight - base * 0.8 * 0.5).abs() < 1e-6);
        assert_eq!(tokenizer.stats().produced_formulae, 7);
    }

    #[test]
    fn positions_group_per_root() {
        let mut tokenizer = tokenizer(TokenizerOptions::default());
        let tokens = tokenizer
            .tokenize_str(
                "<html><p><math><mi>a</mi><mo>+</mo><mi>b</mi></math></p>\
                 <p><math><msqrt><mi>c</mi></msqrt></math></p></html>",
            )
            .unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        let split = positions.iter().position(|&p| p == 1).unwrap();
        assert!(split > 0);
        assert!(positions[..split].iter().all(|&p| p == 0));
        assert!(positions[split..].iter().all(|&p| p == 1));

        let increments: Vec<u32> = tokens.iter().map(|t| t.position_increment).collect();
        assert_eq!(increments[0], 1);
        assert_eq!(increments[split], 1);
        assert_eq!(increments.iter().sum::<u32>(), 2);
    }

    #[test]
    fn empty_root_still_advances_position() {
        let mut tokenizer = tokenizer(TokenizerOptions::default());
        tokenizer.set_formula_position(3);
        let tokens = tokenizer
            .tokenize_str("<body><math><annotation>a</annotation></math><math><mi>c</mi></math></body>")
            .unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].position, 1);
        assert_eq!(tokens[0].position_increment, 4);
        assert_eq!(tokenizer.formulae().len(), 2);
    }

    #[test]
    fn skip_semantics_in_stream() {
        let mut tokenizer = tokenizer(TokenizerOptions::default());
        let tokens = tokenizer
            .tokenize_str(
                "<math><semantics><mi>x</mi><annotation encoding=\"TeX\">y+z</annotation></semantics></math>",
            )
            .unwrap();
        assert_eq!(terms(&tokens), vec!["i(x)"]);
    }

    #[test]
    fn query_formulae_and_reset() {
        let mut tokenizer = tokenizer(TokenizerOptions::query());
        tokenizer.set_formula_position(9);
        tokenizer
            .tokenize_str(r#"<math><mi mathvariant="bold">x</mi></math>"#)
            .unwrap();
        let query = tokenizer.query_formulae();
        // math, mi
        assert_eq!(query.get("i[v=bold](x)"), Some(&2.0));

        tokenizer.reset();
        assert!(tokenizer.formulae().is_empty());
        assert!(tokenizer.query_formulae().is_empty());
        assert_eq!(tokenizer.stats(), TokenizerStats::default());
        let tokens = tokenizer.tokenize_str("<math><mi>x</mi></math>").unwrap();
        assert_eq!(tokens[0].position_increment, 1);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = TokenizerOptions {
            coefficients: Coefficients {
                depth_decay: 0.0,
                ..Coefficients::default()
            },
            ..TokenizerOptions::default()
        };
        assert!(MathTokenizer::<CountNodesValuator>::with_defaults(options)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn parallel_markup_yields_one_query_term() {
        let mut tokenizer = tokenizer(TokenizerOptions::query());
        let tokens = tokenizer
            .tokenize_str(
                "<math><semantics><mrow><mi>b</mi><mo>+</mo><mi>a</mi></mrow>\
                 <annotation-xml><apply><plus/><ci>a</ci><ci>b</ci></apply></annotation-xml>\
                 </semantics></math>",
            )
            .unwrap();
        assert_eq!(terms(&tokens), vec!["r(i(a)o(+)i(b))"]);
        assert_eq!(tokens[0].position_increment, 1);
    }

    fn nested_roots(levels: usize) -> String {
        format!(
            "<math>{}<mi>x</mi>{}</math>",
            "<msqrt><mi>x</mi>".repeat(levels),
            "</msqrt>".repeat(levels)
        )
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let mut tokenizer = tokenizer(TokenizerOptions::default());
        assert!(!tokenizer.tokenize_str(&nested_roots(200)).unwrap().is_empty());
        assert!(matches!(
            tokenizer.tokenize_str(&nested_roots(3_000)),
            Err(crate::error::Error::Parse(_))
        ));

        let mut tree = MathTree::new();
        let mut parent = tree.element("math");
        tree.set_root(parent);
        for _ in 0..3_000 {
            let child = tree.element("msqrt");
            tree.append_child(parent, child);
            parent = child;
        }
        assert!(matches!(tokenizer.tokenize(tree), Err(crate::error::Error::Parse(_))));
    }

    #[test]
    fn parse_errors_surface() {
        let mut tokenizer = tokenizer(TokenizerOptions::default());
        assert!(matches!(
            tokenizer.tokenize_str("<math><mi>x</math>"),
            Err(crate::error::Error::Parse(_))
        ));
    }

    struct UnitValuator;

    impl FormulaValuator for UnitValuator {
        fn value(_: &MathTree, _: crate::tree::NodeId) -> f32 {
            1.0
        }
    }

    #[test]
    fn valuator_is_pluggable() {
        let mut tokenizer = MathTokenizer::<UnitValuator>::with_defaults(TokenizerOptions::query()).unwrap();
        let tokens = tokenizer
            .tokenize_str("<math><mi>a</mi><mo>+</mo><mi>b</mi></math>")
            .unwrap();
        assert_eq!(tokens[0].weight, 1.0);
    }
}
