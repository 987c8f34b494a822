use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use unicode_normalization::{is_nfc, is_nfd, is_nfkc, is_nfkd, UnicodeNormalization};

use crate::canonicalizer::CanonicalizerModule;
use crate::error::{Error, Result};
use crate::tables::{IDENTIFIER_ELEMENT, OPERATOR_ELEMENT};
use crate::tree::{MathTree, Node, NodeId};

// property keys
const NORMALIZATION_FORM: &str = "normalizationform";
const REMOVE_EMPTY_OPERATORS: &str = "removeempty";
const OPERATORS_TO_REMOVE: &str = "removeoperators";
const OPERATOR_REPLACEMENTS: &str = "replaceoperators";
const COLON_REPLACEMENT: &str = "colonreplacement";
const OPERATORS: &str = "operators";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl FromStr for NormalizationForm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NFC" => Ok(NormalizationForm::Nfc),
            "NFD" => Ok(NormalizationForm::Nfd),
            "NFKC" => Ok(NormalizationForm::Nfkc),
            "NFKD" => Ok(NormalizationForm::Nfkd),
            _ => Err(Error::configuration(format!(
                "invalid value for {}: `{}`",
                NORMALIZATION_FORM, s
            ))),
        }
    }
}

impl NormalizationForm {
    pub fn is_normalized(&self, text: &str) -> bool {
        match self {
            NormalizationForm::Nfc => is_nfc(text),
            NormalizationForm::Nfd => is_nfd(text),
            NormalizationForm::Nfkc => is_nfkc(text),
            NormalizationForm::Nfkd => is_nfkd(text),
        }
    }

    pub fn normalize(&self, text: &str) -> String {
        match self {
            NormalizationForm::Nfc => text.nfc().collect(),
            NormalizationForm::Nfd => text.nfd().collect(),
            NormalizationForm::Nfkc => text.nfkc().collect(),
            NormalizationForm::Nfkd => text.nfkd().collect(),
        }
    }
}

/// Options of the operator normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorNormalizerConfig {
    /// `NFC`, `NFD`, `NFKC` or `NFKD`; `None` or empty switches normalization off
    pub normalization_form: Option<String>,
    /// drop operators whose trimmed text is empty
    pub remove_empty_operators: bool,
    pub operators_to_remove: IndexSet<String>,
    pub operator_replacements: IndexMap<String, String>,
    /// replacement for `:`, empty keeps the colon
    pub colon_replacement: String,
    /// identifiers spelled like one of these become operators
    pub operator_name_set: IndexSet<String>,
}

impl Default for OperatorNormalizerConfig {
    fn default() -> Self {
        let set = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<IndexSet<_>>();
        Self {
            normalization_form: Some("NFKC".to_string()),
            remove_empty_operators: true,
            // function application, invisible separator
            operators_to_remove: set(&["\u{2061}", "\u{2063}"]),
            operator_replacements: [
                ("\u{2062}", "\u{22C5}"),
                ("\u{00B7}", "\u{22C5}"),
                ("\u{2217}", "*"),
                ("\u{2212}", "-"),
            ]
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect(),
            colon_replacement: String::new(),
            operator_name_set: set(&[
                "+", "-", "*", "/", "=", "<", ">", "\u{00B1}", "\u{00D7}", "\u{00F7}", "\u{22C5}",
            ]),
        }
    }
}

impl OperatorNormalizerConfig {
    /// Read options from a key/value property map.
    ///
    /// Keys: `normalizationform`, `removeempty` (`true`/`false`),
    /// `removeoperators` and `operators` (space separated),
    /// `replaceoperators` (space separated `from:to`), `colonreplacement`.
    /// Keys left out keep their default.
    pub fn from_properties(properties: &IndexMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in properties {
            match key.as_str() {
                NORMALIZATION_FORM => {
                    let value = value.trim();
                    config.normalization_form = (!value.is_empty()).then(|| value.to_string());
                }
                REMOVE_EMPTY_OPERATORS => {
                    config.remove_empty_operators = value.trim().parse().map_err(|_| {
                        Error::configuration(format!(
                            "invalid value for {}: `{}`",
                            REMOVE_EMPTY_OPERATORS, value
                        ))
                    })?;
                }
                OPERATORS_TO_REMOVE => config.operators_to_remove = split_set(value),
                OPERATOR_REPLACEMENTS => config.operator_replacements = split_map(value)?,
                COLON_REPLACEMENT => config.colon_replacement = value.trim().to_string(),
                OPERATORS => config.operator_name_set = split_set(value),
                other => {
                    return Err(Error::configuration(format!(
                        "unknown operator normalizer option `{}`",
                        other
                    )))
                }
            }
        }
        Ok(config)
    }
}

fn split_set(value: &str) -> IndexSet<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn split_map(value: &str) -> Result<IndexMap<String, String>> {
    value
        .split_whitespace()
        .map(|mapping| {
            mapping
                .split_once(':')
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .ok_or_else(|| {
                    Error::configuration(format!(
                        "{} entry `{}` has no `:` delimiter",
                        OPERATOR_REPLACEMENTS, mapping
                    ))
                })
        })
        .collect()
}

/// Operator normalizer
/// Unicode-normalizes text, turns identifiers spelled like operators into
/// operators, drops redundant operators and unifies operator spelling.
#[derive(Debug, Clone)]
pub struct OperatorNormalizer {
    form: Option<NormalizationForm>,
    remove_empty: bool,
    to_remove: IndexSet<String>,
    replacements: IndexMap<String, String>,
    /// configured names plus every operator named by removal or replacement
    operators: IndexSet<String>,
}

impl OperatorNormalizer {
    pub fn new(config: &OperatorNormalizerConfig) -> Result<Self> {
        let form = match config.normalization_form.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(name.parse::<NormalizationForm>()?),
        };
        let mut replacements = config.operator_replacements.clone();
        if !config.colon_replacement.is_empty() {
            replacements.insert(":".to_string(), config.colon_replacement.clone());
        }
        let mut operators = config.operator_name_set.clone();
        operators.extend(config.operators_to_remove.iter().cloned());
        operators.extend(replacements.keys().cloned());
        operators.extend(replacements.values().cloned());
        Ok(Self {
            form,
            remove_empty: config.remove_empty_operators,
            to_remove: config.operators_to_remove.clone(),
            replacements,
            operators,
        })
    }

    fn normalize_unicode(&self, tree: &mut MathTree, root: NodeId, form: NormalizationForm) {
        for id in tree.descendants(root) {
            let text = match tree.node(id) {
                Some(Node::Text(text)) => text,
                _ => continue,
            };
            if form.is_normalized(text) {
                continue;
            }
            let normalized = form.normalize(text);
            tracing::debug!(from = %text, to = %normalized, "text normalized");
            tree.set_text_content(id, &normalized);
        }
    }

    fn replace_identifiers(&self, tree: &mut MathTree, root: NodeId) {
        for id in tree.descendants(root) {
            if tree.name(id) != Some(IDENTIFIER_ELEMENT) {
                continue;
            }
            let text = tree.text_content(id);
            if self.operators.contains(text.trim()) {
                tracing::debug!(identifier = %text, "identifier turned into operator");
                tree.rename(id, OPERATOR_ELEMENT);
            }
        }
    }

    fn is_spare(&self, tree: &MathTree, operator: NodeId) -> bool {
        let text = tree.text_content(operator);
        let text = text.trim();
        (self.remove_empty && text.is_empty()) || self.to_remove.contains(text)
    }

    /// Rebuild every child list without the spare operators.
    /// Operators themselves are not descended into.
    fn remove_spare_operators(&self, tree: &mut MathTree, id: NodeId) {
        let children = tree.children(id).to_vec();
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            let is_operator = tree.name(child) == Some(OPERATOR_ELEMENT);
            if is_operator {
                if self.is_spare(tree, child) {
                    tracing::debug!(operator = %tree.text_content(child), "operator removed");
                    tree.remove_subtree(child);
                    continue;
                }
            } else if tree.is_element(child) {
                self.remove_spare_operators(tree, child);
            }
            kept.push(child);
        }
        tree.set_children(id, kept);
    }

    fn replace_operators(&self, tree: &mut MathTree, root: NodeId) {
        for id in tree.descendants(root) {
            if tree.name(id) != Some(OPERATOR_ELEMENT) {
                continue;
            }
            let old = tree.text_content(id);
            if let Some(new) = self.replacements.get(old.trim()) {
                tracing::debug!(from = %old.trim(), to = %new, "operator replaced");
                tree.set_text_content(id, new);
            }
        }
    }
}

impl CanonicalizerModule for OperatorNormalizer {
    fn name(&self) -> &'static str {
        "operator_normalizer"
    }

    fn execute(&self, tree: &mut MathTree) -> Result<()> {
        let Some(root) = tree.root() else {
            return Ok(());
        };
        match self.form {
            Some(form) => self.normalize_unicode(tree, root, form),
            None => tracing::trace!("unicode text normalization is switched off"),
        }
        self.replace_identifiers(tree, root);
        if self.remove_empty || !self.to_remove.is_empty() {
            self.remove_spare_operators(tree, root);
        }
        if !self.replacements.is_empty() {
            self.replace_operators(tree, root);
        }
        Ok(())
    }
}
