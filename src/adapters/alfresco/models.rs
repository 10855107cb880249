//! Alfresco REST API models
//!
//! Request and response bodies of the public REST API v1. These models are
//! separate from the domain models; `to_domain` methods do the conversion.

use crate::domain::{
    DataType, NodeId, NodeRecord, PropertyDefinition, PropertyValue, RepositoryError, Revision,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Timestamp format of property values, e.g. `2024-03-01T09:30:00.000+0000`
pub const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// `{"entry": {...}}` wrapper around single results
#[derive(Debug, Clone, Deserialize)]
pub struct Entry<T> {
    pub entry: T,
}

/// `{"list": {"pagination": {...}, "entries": [...]}}` wrapper around paged results
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    pub list: PagedList<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagedList<T> {
    pub pagination: Pagination,
    pub entries: Vec<Entry<T>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub has_more_items: bool,
    #[serde(default)]
    pub skip_count: usize,
    #[serde(default)]
    pub max_items: usize,
}

/// Node entry as returned by `GET /nodes/{id}?include=aspectNames,properties,path`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    pub id: String,
    pub name: String,
    pub node_type: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub aspect_names: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub path: Option<PathInfo>,
    #[serde(flatten)]
    pub audit: AuditInfo,
}

/// Top-level audit fields; the API leaves them out of `properties`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by_user: Option<UserInfo>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub modified_by_user: Option<UserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: String,
}

impl AuditInfo {
    /// `cm:created`, `cm:creator`, `cm:modified` and `cm:modifier`, where present
    fn properties(&self) -> Vec<(&'static str, PropertyValue)> {
        let date = |raw: &String| match parse_api_date(raw) {
            Some(dt) => PropertyValue::Date(dt),
            None => PropertyValue::Text(raw.clone()),
        };
        let user = |u: &UserInfo| PropertyValue::Text(u.id.clone());

        [
            ("cm:created", self.created_at.as_ref().map(date)),
            ("cm:creator", self.created_by_user.as_ref().map(user)),
            ("cm:modified", self.modified_at.as_ref().map(date)),
            ("cm:modifier", self.modified_by_user.as_ref().map(user)),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Property map merged with `cm:name` and the audit fields
///
/// Entries of the REST `properties` map win over top-level fields.
fn merged_properties(
    raw: &BTreeMap<String, serde_json::Value>,
    name: Option<&str>,
    audit: &AuditInfo,
) -> BTreeMap<String, PropertyValue> {
    let mut properties: BTreeMap<String, PropertyValue> = raw
        .iter()
        .map(|(name, value)| (name.clone(), property_value(value)))
        .collect();
    if let Some(name) = name {
        properties
            .entry("cm:name".to_string())
            .or_insert_with(|| PropertyValue::Text(name.to_string()));
    }
    for (key, value) in audit.properties() {
        properties.entry(key.to_string()).or_insert(value);
    }
    properties
}

/// Parses an API timestamp, with RFC 3339 as fallback
pub fn parse_api_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, API_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Path of a node's parent
#[derive(Debug, Clone, Deserialize)]
pub struct PathInfo {
    pub name: String,
}

impl NodeEntry {
    /// Display path including the node's own name
    pub fn display_path(&self) -> String {
        match self.path.as_ref().map(|p| p.name.trim_end_matches('/')) {
            Some(parent) if !parent.is_empty() => format!("{parent}/{}", self.name),
            _ => format!("/{}", self.name),
        }
    }

    /// Whether tag names have to be looked up separately
    pub fn is_taggable(&self) -> bool {
        self.aspect_names.iter().any(|a| a == "cm:taggable")
    }

    /// Whether the node carries version history
    pub fn is_versionable(&self) -> bool {
        self.aspect_names.iter().any(|a| a == "cm:versionable")
    }

    /// Converts to a domain record under `id`
    pub fn to_domain(&self, id: NodeId) -> NodeRecord {
        NodeRecord {
            id,
            is_folder: self.is_folder,
            node_type: self.node_type.clone(),
            aspects: self.aspect_names.clone(),
            properties: merged_properties(&self.properties, Some(&self.name), &self.audit),
            path: self.display_path(),
        }
    }
}

/// Converts a JSON property value
///
/// Strings in the API timestamp format become dates; arrays become lists of
/// their string forms.
pub fn property_value(value: &serde_json::Value) -> PropertyValue {
    use serde_json::Value;

    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => PropertyValue::Integer(i),
            None => PropertyValue::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => match DateTime::parse_from_str(s, API_DATE_FORMAT) {
            Ok(dt) => PropertyValue::Date(dt.with_timezone(&Utc)),
            Err(_) => PropertyValue::Text(s.clone()),
        },
        Value::Array(items) => PropertyValue::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::Object(_) => PropertyValue::Text(value.to_string()),
    }
}

/// Entry of `GET /nodes/{id}/versions`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Version label, e.g. `1.2`
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version_comment: Option<String>,
    pub node_type: String,
    #[serde(default)]
    pub is_folder: bool,
    #[serde(default)]
    pub aspect_names: Vec<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(flatten)]
    pub audit: AuditInfo,
}

impl VersionEntry {
    /// Revision whose content node is the composite id `<node>;<label>`
    pub fn to_revision(&self, node: &NodeId) -> Result<Revision, RepositoryError> {
        let snapshot = version_node_id(node, &self.id)?;
        Ok(Revision::new(
            self.id.clone(),
            self.version_comment.clone().unwrap_or_default(),
            snapshot,
        ))
    }

    /// Snapshot record; `path` is the live node's path
    pub fn to_domain(&self, id: NodeId, path: String) -> NodeRecord {
        NodeRecord {
            id,
            is_folder: self.is_folder,
            node_type: self.node_type.clone(),
            aspects: self.aspect_names.clone(),
            properties: merged_properties(&self.properties, self.name.as_deref(), &self.audit),
            path,
        }
    }
}

/// Separator between node id and version label in snapshot ids
pub const VERSION_SEPARATOR: char = ';';

/// Id of a frozen revision of `node`
pub fn version_node_id(node: &NodeId, label: &str) -> Result<NodeId, RepositoryError> {
    NodeId::new(format!("{node}{VERSION_SEPARATOR}{label}"))
        .map_err(RepositoryError::InvalidResponse)
}

/// Splits a snapshot id into live node id and version label
pub fn split_version_id(id: &NodeId) -> Option<(&str, &str)> {
    id.as_str()
        .split_once(VERSION_SEPARATOR)
        .filter(|(node, label)| !node.is_empty() && !label.is_empty())
}

/// Entry of `GET /nodes/{id}/tags`
#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub tag: String,
}

/// Entry of a child listing or search result; only the id is used
#[derive(Debug, Clone, Deserialize)]
pub struct IdEntry {
    pub id: String,
}

/// Body of `POST /search`
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub paging: SearchPaging,
    pub sort: Vec<SearchSort>,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPaging {
    pub max_items: usize,
    pub skip_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchSort {
    #[serde(rename = "type")]
    pub sort_type: String,
    pub field: String,
    pub ascending: bool,
}

impl SearchRequest {
    /// AFTS query for one page, sorted by creation date so pages are stable
    pub fn afts(query: String, skip: usize, max: usize) -> Self {
        Self {
            query: SearchQuery {
                query,
                language: "afts".to_string(),
            },
            paging: SearchPaging {
                max_items: max,
                skip_count: skip,
            },
            sort: vec![SearchSort {
                sort_type: "FIELD".to_string(),
                field: "cm:created".to_string(),
                ascending: true,
            }],
            fields: vec!["id".to_string()],
        }
    }
}

/// Entry of `GET /types/{id}` and `GET /aspects/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ClassEntry {
    #[serde(default)]
    pub properties: Vec<ClassProperty>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassProperty {
    pub id: String,
    pub data_type: String,
}

impl ClassEntry {
    /// Property definitions with a known data type
    pub fn to_domain(&self) -> Vec<PropertyDefinition> {
        self.properties
            .iter()
            .filter_map(|p| match p.data_type.parse::<DataType>() {
                Ok(data_type) => Some(PropertyDefinition::new(p.id.clone(), data_type)),
                Err(e) => {
                    tracing::debug!(property = %p.id, error = %e, "Skipping property definition");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_entry_to_domain() {
        let body = json!({
            "entry": {
                "id": "a1",
                "name": "report.pdf",
                "nodeType": "cm:content",
                "isFolder": false,
                "aspectNames": ["cm:titled", "cm:versionable"],
                "properties": {
                    "cm:title": "Report",
                    "cm:created": "2024-03-01T09:30:00.000+0000",
                    "cm:versionLabel": "1.1"
                },
                "path": { "name": "/Company Home/Sites" }
            }
        });

        let entry: Entry<NodeEntry> = serde_json::from_value(body).unwrap();
        assert!(entry.entry.is_versionable());
        assert!(!entry.entry.is_taggable());

        let record = entry.entry.to_domain(NodeId::new("a1").unwrap());
        assert_eq!(record.path, "/Company Home/Sites/report.pdf");
        assert_eq!(record.node_type, "cm:content");
        assert!(matches!(
            record.properties.get("cm:created"),
            Some(PropertyValue::Date(_))
        ));
        assert_eq!(
            record.properties.get("cm:versionLabel"),
            Some(&PropertyValue::Text("1.1".to_string()))
        );
    }

    #[test]
    fn test_top_level_name_and_audit_fields_become_properties() {
        let entry: NodeEntry = serde_json::from_value(json!({
            "id": "a1",
            "name": "report.pdf",
            "nodeType": "cm:content",
            "createdAt": "2024-03-01T09:30:00.000+0000",
            "createdByUser": { "id": "alice", "displayName": "Alice" },
            "modifiedAt": "2024-04-02T10:00:00.000+0000",
            "modifiedByUser": { "id": "bob", "displayName": "Bob" },
            "properties": { "cm:title": "Q" }
        }))
        .unwrap();

        let record = entry.to_domain(NodeId::new("a1").unwrap());
        let text = |s: &str| Some(PropertyValue::Text(s.to_string()));
        assert_eq!(record.properties.get("cm:name").cloned(), text("report.pdf"));
        assert_eq!(record.properties.get("cm:creator").cloned(), text("alice"));
        assert_eq!(record.properties.get("cm:modifier").cloned(), text("bob"));
        assert_eq!(
            record.properties.get("cm:created"),
            Some(&PropertyValue::Date(
                parse_api_date("2024-03-01T09:30:00.000+0000").unwrap()
            ))
        );
        assert!(matches!(
            record.properties.get("cm:modified"),
            Some(PropertyValue::Date(_))
        ));
        assert_eq!(record.properties.get("cm:title").cloned(), text("Q"));
    }

    #[test]
    fn test_version_entry_carries_audit_fields() {
        let entry: VersionEntry = serde_json::from_value(json!({
            "id": "1.0",
            "name": "report.pdf",
            "nodeType": "cm:content",
            "modifiedAt": "2024-01-05T08:00:00Z",
            "modifiedByUser": { "id": "carol" }
        }))
        .unwrap();

        let record = entry.to_domain(NodeId::new("a1;1.0").unwrap(), "/Home/report.pdf".into());
        assert_eq!(
            record.properties.get("cm:name"),
            Some(&PropertyValue::Text("report.pdf".to_string()))
        );
        assert_eq!(
            record.properties.get("cm:modifier"),
            Some(&PropertyValue::Text("carol".to_string()))
        );
        assert!(matches!(
            record.properties.get("cm:modified"),
            Some(PropertyValue::Date(_))
        ));
        assert!(!record.properties.contains_key("cm:created"));
    }

    #[test]
    fn test_display_path_without_parent() {
        let entry: NodeEntry = serde_json::from_value(json!({
            "id": "root",
            "name": "Company Home",
            "nodeType": "cm:folder",
            "isFolder": true
        }))
        .unwrap();
        assert_eq!(entry.display_path(), "/Company Home");
    }

    #[test]
    fn test_property_value_kinds() {
        assert_eq!(property_value(&json!(null)), PropertyValue::Null);
        assert_eq!(property_value(&json!(42)), PropertyValue::Integer(42));
        assert_eq!(property_value(&json!(1.5)), PropertyValue::Float(1.5));
        assert_eq!(property_value(&json!(true)), PropertyValue::Boolean(true));
        assert_eq!(
            property_value(&json!(["a", 1])),
            PropertyValue::List(vec!["a".to_string(), "1".to_string()])
        );
        assert_eq!(
            property_value(&json!("2024-13-45")),
            PropertyValue::Text("2024-13-45".to_string())
        );
    }

    #[test]
    fn test_version_ids() {
        let node = NodeId::new("a1").unwrap();
        let snapshot = version_node_id(&node, "1.2").unwrap();
        assert_eq!(snapshot.as_str(), "a1;1.2");
        assert_eq!(split_version_id(&snapshot), Some(("a1", "1.2")));
        assert_eq!(split_version_id(&node), None);
    }

    #[test]
    fn test_search_request_body() {
        let request = SearchRequest::afts("TYPE:\"cm:content\"".to_string(), 500, 500);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["query"]["language"], "afts");
        assert_eq!(body["paging"]["skipCount"], 500);
        assert_eq!(body["paging"]["maxItems"], 500);
        assert_eq!(body["sort"][0]["type"], "FIELD");
    }

    #[test]
    fn test_class_entry_skips_unknown_types() {
        let entry: ClassEntry = serde_json::from_value(json!({
            "properties": [
                { "id": "cm:title", "dataType": "d:mltext" },
                { "id": "acme:size", "dataType": "d:int" },
                { "id": "acme:blob", "dataType": "d:custom" }
            ]
        }))
        .unwrap();
        let defs = entry.to_domain();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1], PropertyDefinition::new("acme:size", DataType::Int));
    }
}
