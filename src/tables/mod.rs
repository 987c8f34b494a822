pub mod source;
pub mod serde;

use indexmap::{IndexMap, IndexSet};

use crate::error::Result;

pub use source::TableSources;

/// Presentation markup vocabulary
pub const PRESENTATION_ELEMENTS: &[&str] = &[
    "mi", "mn", "mo", "mtext", "mspace", "ms", "mglyph", "mrow", "mfrac", "msqrt", "mroot",
    "mstyle", "merror", "mpadded", "mphantom", "mfenced", "menclose", "msub", "msup", "msubsup",
    "munder", "mover", "munderover", "mmultiscripts", "mtable", "mlabeledtr", "mtr", "mtd",
];

/// Content markup vocabulary
pub const CONTENT_ELEMENTS: &[&str] = &[
    "ci", "cn", "csymbol", "apply", "cs", "bind", "bvar", "share", "cerror", "cbytes", "set",
    "domainofapplication", "interval", "condition", "lowlimit", "uplimit", "degree", "momentabout",
    "logbase", "union", "piecewise", "piece", "otherwise", "reln", "fn", "declare", "ident",
    "domain", "codomain", "image", "ln", "log", "moment", "lambda", "compose", "quotient",
    "divide", "minus", "power", "rem", "root", "factorial", "abs", "conjugate", "arg", "real",
    "imaginary", "floor", "ceiling", "exp", "max", "min", "plus", "times", "gcd", "lcm", "and",
    "or", "xor", "not", "implies", "equivalent", "forall", "exists", "eq", "gt", "lt", "geq",
    "leq", "neq", "approx", "factorof", "tendsto", "int", "diff", "partialdiff", "divergence",
    "grad", "curl", "laplacian", "list", "intersect", "cartesianproduct", "in", "notin",
    "notsubset", "notprsubset", "setdiff", "subset", "prsubset", "card", "sum", "product",
    "limit", "sin", "cos", "tan", "sec", "csc", "cot", "sinh", "cosh", "tanh", "sech", "csch",
    "coth", "arcsin", "arccos", "arctan", "arccosh", "arccot", "arccoth", "arccsc", "arccsch",
    "arcsec", "arcsech", "arcsinh", "arctanh", "mean", "sdev", "variance", "median", "mode",
    "vector", "matrix", "matrixrow", "determinant", "transpose", "selector", "vectorproduct",
    "scalarproduct", "outerproduct", "integers", "reals", "rationals", "naturalnumbers",
    "complexes", "primes", "emptyset", "exponentiale", "imaginaryi", "notanumber", "true",
    "false", "pi", "eulergamma", "infinity",
];

/// Wrappers left out of the results while their children are still visited
pub const SKIP_NODE_ELEMENTS: &[&str] = &["semantics", "annotation-xml"];

/// Elements dropped together with everything below them
pub const SKIP_SUBTREE_ELEMENTS: &[&str] = &["annotation"];

/// Content function symbols whose operands may be reordered
pub const COMMUTATIVE_FUNCTIONS: &[&str] = &["plus", "times"];

/// Identifier leaves renamed by variable unification
pub const IDENTIFIER_ELEMENTS: &[&str] = &["mi", "ci"];

/// Numeric literal leaves replaced by constant unification
pub const NUMBER_ELEMENTS: &[&str] = &["mn", "cn"];

pub const IDENTIFIER_ELEMENT: &str = "mi";
pub const OPERATOR_ELEMENT: &str = "mo";

/// Classification Tables
/// Static vocabulary the whole pipeline consults: which elements are
/// indexable in each dialect, which are skipped, how names are rendered
/// in terms, which attributes survive, and which operators commute.
///
/// Immutable once built. Share one instance between tokenizers with
/// `Arc<ClassificationTables>`; no locking is needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTables {
    pub(crate) presentation: IndexSet<String>,
    pub(crate) content: IndexSet<String>,
    pub(crate) skip_node: IndexSet<String>,
    pub(crate) skip_subtree: IndexSet<String>,
    pub(crate) commutative_functions: IndexSet<String>,
    pub(crate) element_dictionary: IndexMap<String, String>,
    pub(crate) attribute_dictionary: IndexMap<String, String>,
    pub(crate) operators: IndexMap<String, IndexSet<String>>,
}

pub(crate) fn to_set(items: &[&str]) -> IndexSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ClassificationTables {
    /// Load the tables from the bundled dictionaries
    pub fn load_default() -> Result<Self> {
        Self::from_sources(&TableSources::default())
    }

    /// Load the tables from caller supplied dictionaries.
    /// Element vocabularies and skip sets keep their built-in values.
    pub fn from_sources(sources: &TableSources<'_>) -> Result<Self> {
        let element_dictionary =
            source::parse_dictionary("element-dictionary", sources.element_dictionary)?;
        let attribute_dictionary =
            source::parse_dictionary("attr-dictionary", sources.attribute_dictionary)?;
        let operators = source::parse_operators("operators", sources.operators)?;
        tracing::debug!(
            elements = element_dictionary.len(),
            attributes = attribute_dictionary.len(),
            operators = operators.len(),
            "classification tables loaded"
        );
        Ok(Self {
            presentation: to_set(PRESENTATION_ELEMENTS),
            content: to_set(CONTENT_ELEMENTS),
            skip_node: to_set(SKIP_NODE_ELEMENTS),
            skip_subtree: to_set(SKIP_SUBTREE_ELEMENTS),
            commutative_functions: to_set(COMMUTATIVE_FUNCTIONS),
            element_dictionary,
            attribute_dictionary,
            operators,
        })
    }

    #[inline]
    pub fn is_presentation_element(&self, name: &str) -> bool {
        self.presentation.contains(name)
    }

    #[inline]
    pub fn is_content_element(&self, name: &str) -> bool {
        self.content.contains(name)
    }

    /// presentation or content
    #[inline]
    pub fn is_indexable(&self, name: &str) -> bool {
        self.is_presentation_element(name) || self.is_content_element(name)
    }

    /// Left out of the results, children still visited
    #[inline]
    pub fn skip_node(&self, name: &str) -> bool {
        self.skip_node.contains(name)
    }

    /// Left out of the results together with all descendants
    #[inline]
    pub fn skip_subtree(&self, name: &str) -> bool {
        self.skip_subtree.contains(name)
    }

    /// Term name of an element, `None` when the dictionary has no entry
    #[inline]
    pub fn rename_element(&self, name: &str) -> Option<&str> {
        self.element_dictionary.get(name).map(String::as_str)
    }

    #[inline]
    pub fn allowed_attribute(&self, name: &str) -> bool {
        self.attribute_dictionary.contains_key(name)
    }

    /// Term name of an allowed attribute
    #[inline]
    pub fn rename_attribute(&self, name: &str) -> Option<&str> {
        self.attribute_dictionary.get(name).map(String::as_str)
    }

    /// Operators of higher priority than `op`.
    /// `None` when `op` is not a commutative operator.
    #[inline]
    pub fn operator_priority(&self, op: &str) -> Option<&IndexSet<String>> {
        self.operators.get(op)
    }

    #[inline]
    pub fn is_commutative_function(&self, name: &str) -> bool {
        self.commutative_functions.contains(name)
    }
}
