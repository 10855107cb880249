//! Job-configured metadata rewriting rules

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One prefix rewrite, applied to names that start with `from`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRemap {
    pub from: String,
    pub to: String,
}

/// Extra aspects and properties plus the renaming tables of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRules {
    /// Aspect names appended to every document
    #[serde(default)]
    pub custom_aspects: Vec<String>,

    /// Extra property name → literal value, or `prefix:name` to copy an
    /// existing property
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,

    /// Exact renames of type, aspect and property names
    #[serde(default)]
    pub rename: BTreeMap<String, String>,

    /// Prefix rewrites, applied in order
    #[serde(default)]
    pub prefix_remap: Vec<PrefixRemap>,
}

impl MetadataRules {
    pub fn is_empty(&self) -> bool {
        self.custom_aspects.is_empty()
            && self.custom_properties.is_empty()
            && self.rename.is_empty()
            && self.prefix_remap.is_empty()
    }

    /// Renames `name` if the rename table has it
    pub fn renamed(&self, name: &str) -> String {
        self.rename
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Applies every prefix rewrite in order, each one seeing the result of
    /// the previous
    pub fn remapped(&self, name: &str) -> String {
        let mut name = name.to_string();
        for remap in &self.prefix_remap {
            if !remap.from.is_empty() && name.starts_with(&remap.from) {
                name = name.replacen(&remap.from, &remap.to, 1);
            }
        }
        name
    }
}

/// Splits `"a, b ,c"` into trimmed, non-empty items
pub fn parse_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Splits `"k=v, k2 = v2"` into ordered pairs
///
/// Only the first `=` of an item separates key and value.
pub fn parse_pairs(input: &str) -> Result<Vec<(String, String)>, String> {
    parse_list(input)
        .into_iter()
        .map(|item| {
            let (key, value) = item
                .split_once('=')
                .ok_or_else(|| format!("Expected key=value, got '{item}'"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("Empty key in '{item}'"));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
