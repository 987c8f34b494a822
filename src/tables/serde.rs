use ::serde::{Deserialize, Deserializer, Serialize, Serializer};
use indexmap::{IndexMap, IndexSet};

use crate::error::Result;
use crate::tables::{
    to_set, ClassificationTables, COMMUTATIVE_FUNCTIONS, CONTENT_ELEMENTS, PRESENTATION_ELEMENTS,
    SKIP_NODE_ELEMENTS, SKIP_SUBTREE_ELEMENTS,
};

/// Borrowed field view used for serialization
#[derive(Serialize)]
struct TablesRef<'a> {
    presentation: &'a IndexSet<String>,
    content: &'a IndexSet<String>,
    skip_node: &'a IndexSet<String>,
    skip_subtree: &'a IndexSet<String>,
    commutative_functions: &'a IndexSet<String>,
    element_dictionary: &'a IndexMap<String, String>,
    attribute_dictionary: &'a IndexMap<String, String>,
    operators: &'a IndexMap<String, IndexSet<String>>,
}

impl Serialize for ClassificationTables {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        TablesRef {
            presentation: &self.presentation,
            content: &self.content,
            skip_node: &self.skip_node,
            skip_subtree: &self.skip_subtree,
            commutative_functions: &self.commutative_functions,
            element_dictionary: &self.element_dictionary,
            attribute_dictionary: &self.attribute_dictionary,
            operators: &self.operators,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClassificationTables {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // vocabularies left out of the source fall back to the built-in ones,
        // dictionaries and the operator table must be given
        #[derive(Deserialize)]
        struct TablesHelper {
            #[serde(default)]
            presentation: Option<IndexSet<String>>,
            #[serde(default)]
            content: Option<IndexSet<String>>,
            #[serde(default)]
            skip_node: Option<IndexSet<String>>,
            #[serde(default)]
            skip_subtree: Option<IndexSet<String>>,
            #[serde(default)]
            commutative_functions: Option<IndexSet<String>>,
            element_dictionary: IndexMap<String, String>,
            attribute_dictionary: IndexMap<String, String>,
            operators: IndexMap<String, IndexSet<String>>,
        }

        let helper = TablesHelper::deserialize(deserializer)?;
        Ok(ClassificationTables {
            presentation: helper.presentation.unwrap_or_else(|| to_set(PRESENTATION_ELEMENTS)),
            content: helper.content.unwrap_or_else(|| to_set(CONTENT_ELEMENTS)),
            skip_node: helper.skip_node.unwrap_or_else(|| to_set(SKIP_NODE_ELEMENTS)),
            skip_subtree: helper.skip_subtree.unwrap_or_else(|| to_set(SKIP_SUBTREE_ELEMENTS)),
            commutative_functions: helper
                .commutative_functions
                .unwrap_or_else(|| to_set(COMMUTATIVE_FUNCTIONS)),
            element_dictionary: helper.element_dictionary,
            attribute_dictionary: helper.attribute_dictionary,
            operators: helper.operators,
        })
    }
}

impl ClassificationTables {
    /// Binary snapshot of the tables
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Restore tables from a `to_cbor` snapshot.
    /// A malformed snapshot is a configuration problem for the caller.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}
