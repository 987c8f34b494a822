use std::sync::Arc;

use rayon::prelude::*;

use crate::canonicalizer::Canonicalizer;
use crate::error::Result;
use crate::formula::FormulaValuator;
use crate::tables::ClassificationTables;
use crate::tokenizer::{MathTokenizer, Token, TokenizerOptions};

/// Tokenize many markup documents on the rayon pool.
///
/// Every document gets its own tokenizer over the shared tables and
/// canonicalizer. A failing document yields its own `Err` and is logged;
/// the others are unaffected. Only invalid `options` fail the whole call.
pub fn tokenize_batch<V, D>(
    documents: &[D],
    tables: Arc<ClassificationTables>,
    canonicalizer: Arc<Canonicalizer>,
    options: TokenizerOptions,
) -> Result<Vec<Result<Vec<Token>>>>
where
    V: FormulaValuator,
    D: AsRef<str> + Sync,
{
    options.validate()?;
    let results: Vec<_> = documents
        .par_iter()
        .enumerate()
        .map(|(index, document)| {
            let mut tokenizer =
                MathTokenizer::<V>::new(Arc::clone(&tables), Arc::clone(&canonicalizer), options)?;
            tokenizer.tokenize_str(document.as_ref()).map_err(|err| {
                tracing::warn!(document = index, error = %err, "document skipped");
                err
            })
        })
        .collect();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalizer::CanonicalizerConfig;
    use crate::formula::CountNodesValuator;

    fn shared() -> (Arc<ClassificationTables>, Arc<Canonicalizer>) {
        (
            Arc::new(ClassificationTables::load_default().unwrap()),
            Arc::new(Canonicalizer::new(&CanonicalizerConfig::default()).unwrap()),
        )
    }

    #[test]
    fn failing_document_is_isolated() {
        let (tables, canonicalizer) = shared();
        let documents = vec![
            "<math><mi>a</mi><mo>+</mo><mi>b</mi></math>",
            "<math><mi>broken</math>",
            "<math><mi>b</mi><mo>+</mo><mi>a</mi></math>",
        ];
        let results = tokenize_batch::<CountNodesValuator, _>(
            &documents,
            tables,
            canonicalizer,
            TokenizerOptions::query(),
        )
        .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[1].is_err());
        let first = results[0].as_ref().unwrap();
        let last = results[2].as_ref().unwrap();
        assert_eq!(first, last);
    }

    #[test]
    fn invalid_options_fail_up_front() {
        let (tables, canonicalizer) = shared();
        let mut options = TokenizerOptions::default();
        options.coefficients.attribute = f32::NAN;
        let documents: Vec<String> = Vec::new();
        assert!(tokenize_batch::<CountNodesValuator, _>(&documents, tables, canonicalizer, options)
            .unwrap_err()
            .is_configuration());
    }
}
