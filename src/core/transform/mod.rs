//! Metadata transformation
//!
//! Turns a node's raw type, aspects and properties into the sidecar metadata
//! document. Stages run in a fixed order:
//!
//! 1. ignore filtering of properties and aspects
//! 2. value formatting
//! 3. empty-value suppression for properties whose data type rejects ""
//! 4. custom aspects and properties
//! 5. exact renames
//! 6. prefix rewrites
//! 7. serialization, escaping and stripping of illegal characters

pub mod document;
pub mod format;
pub mod rules;

pub use document::{escape_value, strip_invalid_xml_chars};
pub use format::format_value;
pub use rules::{parse_list, parse_pairs, MetadataRules, PrefixRemap};

use crate::adapters::repository::ContentRepository;
use crate::core::traversal::IgnoreRules;
use crate::domain::{NodeRecord, PropertyValue, Result};
use std::collections::{BTreeMap, HashSet};

/// Untransformed metadata of one node
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetadata {
    pub node_type: String,
    pub aspects: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl From<&NodeRecord> for RawMetadata {
    fn from(node: &NodeRecord) -> Self {
        Self {
            node_type: node.node_type.clone(),
            aspects: node.aspects.clone(),
            properties: node.properties.clone(),
        }
    }
}

/// Rendered metadata document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    pub text: String,
    /// Illegal characters were removed while rendering
    pub stripped: bool,
}

/// Property names whose data type rejects an empty value
///
/// Each type or aspect is looked up in the repository dictionary at most once
/// per job; the rejecting names of all classes seen so far form one set.
#[derive(Debug, Clone, Default)]
pub struct EmptyValuePolicy {
    processed: HashSet<String>,
    rejecting: HashSet<String>,
}

impl EmptyValuePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with a fixed rejecting set and no dictionary lookups
    pub fn with_rejecting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            processed: HashSet::new(),
            rejecting: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads definitions of any class not seen before
    pub async fn load_classes<'a, I>(&mut self, repository: &dyn ContentRepository, classes: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for class in classes {
            if self.processed.contains(class) {
                continue;
            }
            let definitions = repository.property_definitions(class).await?;
            self.processed.insert(class.to_string());

            let Some(definitions) = definitions else {
                tracing::debug!(class = %class, "Class not in dictionary");
                continue;
            };
            self.rejecting.extend(
                definitions
                    .into_iter()
                    .filter(|d| d.data_type.rejects_empty())
                    .map(|d| d.name),
            );
        }
        Ok(())
    }

    pub fn rejects_empty(&self, property: &str) -> bool {
        self.rejecting.contains(property)
    }

    pub fn processed_classes(&self) -> usize {
        self.processed.len()
    }
}

/// Metadata pipeline configured for one job
#[derive(Debug, Clone)]
pub struct MetadataTransformer {
    ignore: IgnoreRules,
    rules: MetadataRules,
}

impl MetadataTransformer {
    pub fn new(ignore: IgnoreRules, rules: MetadataRules) -> Self {
        Self { ignore, rules }
    }

    /// Type and non-ignored aspects, the classes whose definitions the
    /// empty-value policy needs
    pub fn classes_of<'a>(&self, raw: &'a RawMetadata) -> Vec<&'a str> {
        std::iter::once(raw.node_type.as_str())
            .chain(
                raw.aspects
                    .iter()
                    .map(String::as_str)
                    .filter(|a| !self.ignore.is_aspect_ignored(a)),
            )
            .collect()
    }

    pub fn transform(&self, raw: &RawMetadata, policy: &EmptyValuePolicy) -> MetadataDocument {
        let mut node_type = raw.node_type.clone();

        // 1. ignore filtering
        let mut aspects: Vec<String> = raw
            .aspects
            .iter()
            .filter(|a| !self.ignore.is_aspect_ignored(a))
            .cloned()
            .collect();

        // 2. formatting, 3. empty suppression
        let mut properties: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &raw.properties {
            if self.ignore.is_property_ignored(name) {
                continue;
            }
            let formatted = format_value(value);
            if formatted.is_empty() && policy.rejects_empty(name) {
                continue;
            }
            properties.insert(name.clone(), formatted);
        }

        // 4. augmentation
        aspects.extend(self.rules.custom_aspects.iter().cloned());
        for (name, source) in &self.rules.custom_properties {
            let value = if source.contains(':') {
                properties.get(source).cloned()
            } else {
                Some(source.clone())
            };
            if let Some(value) = value {
                properties.insert(name.clone(), value);
            }
        }

        // 5. renames
        if !self.rules.rename.is_empty() {
            node_type = self.rules.renamed(&node_type);
            aspects = aspects.iter().map(|a| self.rules.renamed(a)).collect();
            properties = properties
                .into_iter()
                .map(|(k, v)| (self.rules.renamed(&k), v))
                .collect();
        }

        // 6. prefix rewrites
        if !self.rules.prefix_remap.is_empty() {
            node_type = self.rules.remapped(&node_type);
            aspects = aspects.iter().map(|a| self.rules.remapped(a)).collect();
            properties = properties
                .into_iter()
                .map(|(k, v)| (self.rules.remapped(&k), v))
                .collect();
        }

        let mut seen = HashSet::new();
        aspects.retain(|a| seen.insert(a.clone()));

        // 7. serialization
        let (text, stripped) = document::render(&node_type, &aspects, &properties);
        MetadataDocument { text, stripped }
    }
}
