//! Firestore REST request and response types.
//!
//! These types map directly to the Firestore v1 `Document` and `commit`
//! JSON formats.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::ports::{Document, FieldValue, StoreError};

/// Typed field value as Firestore encodes it, e.g. `{"stringValue": "BTC"}`.
///
/// Integers travel as decimal strings. Decimal text is written as a string
/// value so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    /// `stringValue`.
    StringValue(String),
    /// `integerValue`.
    IntegerValue(String),
}

impl From<&FieldValue> for FirestoreValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::String(s) => Self::StringValue(s.clone()),
            FieldValue::Integer(i) => Self::IntegerValue(i.to_string()),
            FieldValue::Decimal(d) => Self::StringValue(d.as_str().to_string()),
        }
    }
}

/// Firestore document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestoreDocument {
    /// Full resource name; required inside commit writes, omitted on PATCH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document fields.
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

impl FirestoreDocument {
    /// Encode a port document.
    #[must_use]
    pub fn encode(name: Option<String>, document: &Document) -> Self {
        Self {
            name,
            fields: document
                .fields()
                .map(|(key, value)| (key.to_string(), FirestoreValue::from(value)))
                .collect(),
        }
    }

    /// Decode into a port document.
    ///
    /// Decimal fields come back as plain strings; the text is unchanged.
    pub fn decode(self) -> Result<Document, StoreError> {
        self.fields
            .into_iter()
            .try_fold(Document::new(), |doc, (key, value)| {
                let value = match value {
                    FirestoreValue::StringValue(s) => FieldValue::String(s),
                    FirestoreValue::IntegerValue(s) => {
                        FieldValue::Integer(s.parse().map_err(|_| {
                            StoreError::Transport(format!("invalid integerValue for {key}: {s}"))
                        })?)
                    }
                };
                Ok(doc.with(key, value))
            })
    }
}

/// Body of `documents:commit`.
#[derive(Debug, Clone, Serialize)]
pub struct CommitRequest {
    /// Writes applied atomically.
    pub writes: Vec<CommitWrite>,
}

/// One write in a commit.
#[derive(Debug, Clone, Serialize)]
pub struct CommitWrite {
    /// Full document replacement.
    pub update: FirestoreDocument,
}
