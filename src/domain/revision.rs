//! Revision model and numeric version-label ordering

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ids::NodeId;

/// One entry of a node's version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Label in `major.minor` form
    pub label: String,
    pub comment: String,
    /// Node holding the frozen content and properties of this revision
    pub content_node: NodeId,
}

impl Revision {
    pub fn new(label: impl Into<String>, comment: impl Into<String>, content_node: NodeId) -> Self {
        Self {
            label: label.into(),
            comment: comment.into(),
            content_node,
        }
    }
}

/// Version label compared by its numeric components
///
/// `"1.10"` sorts after `"1.2"`. Missing components count as zero, so `"1"`
/// and `"1.0"` compare equal. A component that does not start with digits
/// counts as zero.
///
/// ```
/// use bulk_export::domain::RevisionLabel;
///
/// assert!(RevisionLabel::parse("1.10") > RevisionLabel::parse("1.2"));
/// ```
#[derive(Debug, Clone)]
pub struct RevisionLabel {
    text: String,
    components: Vec<u64>,
}

impl RevisionLabel {
    pub fn parse(label: &str) -> Self {
        let components = label
            .split('.')
            .map(|part| {
                let digits: String = part.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u64>().unwrap_or(0)
            })
            .collect();
        Self {
            text: label.to_string(),
            components,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl Ord for RevisionLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for RevisionLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RevisionLabel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RevisionLabel {}

impl fmt::Display for RevisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.2", "1.10", Ordering::Less)]
    #[test_case("2.0", "1.10", Ordering::Greater)]
    #[test_case("1", "1.0", Ordering::Equal)]
    #[test_case("1.0.1", "1.0", Ordering::Greater)]
    #[test_case("1.x", "1.0", Ordering::Equal)]
    fn test_label_ordering(a: &str, b: &str, expected: Ordering) {
        assert_eq!(RevisionLabel::parse(a).cmp(&RevisionLabel::parse(b)), expected);
    }

    #[test]
    fn test_sort_is_numeric_not_lexical() {
        let mut labels: Vec<RevisionLabel> = ["1.2", "1.10", "2.0", "1.1"]
            .iter()
            .map(|l| RevisionLabel::parse(l))
            .collect();
        labels.sort();
        let ordered: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
        assert_eq!(ordered, vec!["1.1", "1.2", "1.10", "2.0"]);
    }

    #[test]
    fn test_leading_digits_are_used() {
        assert_eq!(RevisionLabel::parse("3rc.1").components(), &[3, 1]);
    }
}
