pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod registry;
pub mod result;
pub mod tags;
pub mod util;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag carrying the host a metric belongs to.
pub const HOST_TAG: &str = "host";

/// A single metric as delivered by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Metric {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            tags: HashMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn field(mut self, key: impl ToString, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Value of the `host` tag, or an empty string when the tag is missing.
    pub fn host(&self) -> &str {
        self.tags.get(HOST_TAG).map(String::as_str).unwrap_or_default()
    }
}

/// Identity of a monitoring service (format: "host!name").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    pub host: String,
    pub name: String,
}

impl ServiceIdentity {
    pub fn new(host: impl ToString, name: impl ToString) -> Self {
        Self {
            host: host.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.host, self.name)
    }
}

/// Value of a metric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    /// Counters above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Unsigned(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Boolean(value) => write!(f, "{value}"),
            FieldValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(FieldValue::Unsigned(value), FieldValue::Integer)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}
