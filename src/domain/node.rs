//! Repository node model
//!
//! A [`NodeRecord`] is read from the repository on demand while that node is
//! being exported and is never cached beyond that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::ids::NodeId;

/// Raw property value as the repository reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// List-valued property, already resolved to display names
    List(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Snapshot of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub is_folder: bool,
    pub node_type: String,
    pub aspects: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    /// Display path including the node's own name
    pub path: String,
}

/// Declared data type of a dictionary property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    MlText,
    Content,
    Int,
    Long,
    Float,
    Double,
    Date,
    DateTime,
    Boolean,
    QName,
    NodeRef,
    Category,
    Locale,
    Any,
}

impl DataType {
    /// Whether a value of this type cannot be built from an empty string
    pub fn rejects_empty(&self) -> bool {
        matches!(
            self,
            DataType::Int
                | DataType::Long
                | DataType::Float
                | DataType::Double
                | DataType::Date
                | DataType::DateTime
                | DataType::QName
                | DataType::NodeRef
                | DataType::Category
        )
    }
}

impl FromStr for DataType {
    type Err = String;

    /// Accepts dictionary names with or without prefix, e.g. `d:int` or `int`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let local = s.rsplit(':').next().unwrap_or(s).to_ascii_lowercase();
        match local.as_str() {
            "text" => Ok(DataType::Text),
            "mltext" => Ok(DataType::MlText),
            "content" => Ok(DataType::Content),
            "int" => Ok(DataType::Int),
            "long" => Ok(DataType::Long),
            "float" => Ok(DataType::Float),
            "double" => Ok(DataType::Double),
            "date" => Ok(DataType::Date),
            "datetime" => Ok(DataType::DateTime),
            "boolean" => Ok(DataType::Boolean),
            "qname" => Ok(DataType::QName),
            "noderef" => Ok(DataType::NodeRef),
            "category" => Ok(DataType::Category),
            "locale" => Ok(DataType::Locale),
            "any" => Ok(DataType::Any),
            _ => Err(format!("Unknown data type: {s}")),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Text => "d:text",
            DataType::MlText => "d:mltext",
            DataType::Content => "d:content",
            DataType::Int => "d:int",
            DataType::Long => "d:long",
            DataType::Float => "d:float",
            DataType::Double => "d:double",
            DataType::Date => "d:date",
            DataType::DateTime => "d:datetime",
            DataType::Boolean => "d:boolean",
            DataType::QName => "d:qname",
            DataType::NodeRef => "d:noderef",
            DataType::Category => "d:category",
            DataType::Locale => "d:locale",
            DataType::Any => "d:any",
        };
        f.write_str(name)
    }
}

/// Property declared by a type or aspect in the repository dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub data_type: DataType,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}
