/// This crate turns MathML formulae into canonical weighted terms for a search index.
pub mod error;
pub mod tree;
pub mod tables;
pub mod canonicalizer;
pub mod formula;
pub mod tokenizer;
pub mod utils;

/// Math Tokenizer
/// The top-level struct of this crate. It runs the whole pipeline on one
/// document and produces the token stream handed to the search engine.
///
/// Steps, in order:
/// - Structural canonicalization of the raw markup
/// - Extraction of every formula (and, in sub-expression mode, every
///   stored sub-expression) grouped by `math` root
/// - Canonical ordering of commutative operands
/// - Generalized variants: unified identifiers, unified constants and
///   attribute-preserving copies
/// - Serialization into canonical term strings
///
/// `MathTokenizer<V>` has one generic parameter:
/// - `V`: valuation strategy giving the base weight of a root (e.g., CountNodesValuator)
///
/// When creating an instance, you pass `Arc<ClassificationTables>` and
/// `Arc<Canonicalizer>`. Both are immutable and can be shared among any
/// number of tokenizers and threads.
///
/// # State
/// The formulae of the last document are kept for inspection until the
/// next document or `reset`. Use one instance per document at a time.
pub use tokenizer::MathTokenizer;

/// Tokenizer options and weight coefficients
/// `TokenizerOptions::default()` is the indexing setup (both dialects,
/// sub-expressions on); `TokenizerOptions::query()` yields one literal term
/// per formula for query building.
///
/// # Serialization
/// Supported.
pub use tokenizer::{Coefficients, TokenizerOptions, TokenizerStats};

/// Token
/// One `(term, weight, position)` entry of the output stream, with the
/// position increment the search engine applies before it.
///
/// `encode_tokens` / `decode_tokens` produce and read the CBOR payload of
/// a whole stream.
pub use tokenizer::{decode_tokens, encode_tokens, Token};

/// Batch tokenization
/// Runs one tokenizer per document on the rayon pool. Each document keeps
/// its own `Result`.
pub use tokenizer::batch::tokenize_batch;

/// Classification Tables
/// Vocabulary of the pipeline: indexable elements per dialect, skipped
/// elements, element and attribute renames, operator priorities.
///
/// Loaded once, never mutated. Malformed sources fail with a configuration
/// error.
///
/// # Serialization
/// Supported, including a CBOR snapshot through `to_cbor` / `from_cbor`.
pub use tables::{ClassificationTables, TableSources};

/// Structural Canonicalizer
/// Ordered chain of `CanonicalizerModule`s applied to the raw markup tree.
/// The default chain normalizes operators, then rows.
///
/// By implementing `CanonicalizerModule`, you can plug additional cleanups
/// into the chain.
pub use canonicalizer::{Canonicalizer, CanonicalizerConfig, CanonicalizerModule, ModuleConfig};

/// Canonicalizer modules and their configurations
pub use canonicalizer::{
    MrowNormalizer, MrowNormalizerConfig, NormalizationForm, OperatorNormalizer,
    OperatorNormalizerConfig,
};

/// Formula model
/// - `Formula`: an owned weighted subtree
/// - `FormulaSet`: formulae grouped by document position
/// - `Dialect`: which markup vocabulary is extracted and ordered
pub use formula::{Dialect, Formula, FormulaSet, MarkupKind};

/// Formula Valuation Trait
/// Gives the base weight of a `math` root.
///
/// By implementing this trait, you can plug different weighting heuristics
/// into `MathTokenizer<V>`.
/// The default, `CountNodesValuator`, counts the elements of the subtree.
pub use formula::{CountNodesValuator, FormulaValuator};

/// Markup tree
/// Index-based expression tree over a generational arena, with a quick-xml
/// based parser (`MathTree::parse`).
pub use tree::{MathTree, Node, NodeId};

/// Crate error and result types
pub use error::{Error, Result};
