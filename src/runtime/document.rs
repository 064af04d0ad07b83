//! Normalization of Vault read responses into a flat key/value document

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// Field under which KV version 2 nests the secret payload
const VERSIONED_DATA_FIELD: &str = "data";

/// Key/value pairs of one secret, as strings
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretDocument {
    values: BTreeMap<String, String>,
}

impl SecretDocument {
    /// Build a document from the `data` of a read response
    ///
    /// A nested `data` object (KV v2) wins over the flat map (KV v1).
    pub fn from_response(data: &Map<String, Value>) -> Self {
        let payload = match data.get(VERSIONED_DATA_FIELD) {
            Some(Value::Object(nested)) => nested,
            _ => data,
        };

        let values = payload
            .iter()
            .map(|(key, value)| (key.clone(), render(value)))
            .collect();

        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for SecretDocument {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
