pub mod operator;
pub mod mrow;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::MathTree;

pub use mrow::{MrowNormalizer, MrowNormalizerConfig};
pub use operator::{NormalizationForm, OperatorNormalizer, OperatorNormalizerConfig};

/// One structural rewrite applied to a raw tree before extraction.
///
/// By implementing this trait, additional cleanups can be plugged into a
/// `Canonicalizer` chain. Modules run in chain order and may depend on the
/// output of the modules before them.
pub trait CanonicalizerModule: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, tree: &mut MathTree) -> Result<()>;
}

/// Configuration of one chain entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum ModuleConfig {
    OperatorNormalizer(OperatorNormalizerConfig),
    MrowNormalizer(MrowNormalizerConfig),
}

impl ModuleConfig {
    fn build(&self) -> Result<Box<dyn CanonicalizerModule>> {
        Ok(match self {
            ModuleConfig::OperatorNormalizer(config) => Box::new(OperatorNormalizer::new(config)?),
            ModuleConfig::MrowNormalizer(config) => Box::new(MrowNormalizer::new(config.clone())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalizerConfig {
    pub modules: Vec<ModuleConfig>,
}

impl Default for CanonicalizerConfig {
    /// operator normalization first: it expects rows not yet minimized
    fn default() -> Self {
        Self {
            modules: vec![
                ModuleConfig::OperatorNormalizer(OperatorNormalizerConfig::default()),
                ModuleConfig::MrowNormalizer(MrowNormalizerConfig::default()),
            ],
        }
    }
}

/// Structural Canonicalizer
/// Ordered chain of `CanonicalizerModule`s. Stateless after construction,
/// so one instance can serve any number of documents and threads.
pub struct Canonicalizer {
    modules: Vec<Box<dyn CanonicalizerModule>>,
}

impl Canonicalizer {
    /// Build the chain, validating every module configuration
    pub fn new(config: &CanonicalizerConfig) -> Result<Self> {
        let modules = config
            .modules
            .iter()
            .map(ModuleConfig::build)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { modules })
    }

    /// Chain that leaves trees untouched
    pub fn empty() -> Self {
        Self { modules: Vec::new() }
    }

    /// Append a module at the end of the chain
    pub fn with_module(mut self, module: Box<dyn CanonicalizerModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn canonicalize(&self, tree: &mut MathTree) -> Result<()> {
        for module in &self.modules {
            tracing::trace!(module = module.name(), "running canonicalizer module");
            module.execute(tree)?;
        }
        Ok(())
    }
}

impl Debug for Canonicalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("modules", &self.module_names())
            .finish()
    }
}
