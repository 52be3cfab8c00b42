//! Queue message and topic key types
//!
//! A [`Message`] is what gets stored in a topic's history and fanned out to
//! streaming subscribers. Topics are addressed by [`TopicKey`], which is the
//! hashed form of the plaintext topic name, so a publisher holding only the
//! hash can push to a topic without being able to read it.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::error::Result;

/// Form fields of a message: field name to values in submission order
pub type FormValues = BTreeMap<String, Vec<String>>;

/// Storage key for a topic
///
/// History and subscriptions are partitioned by this key. It is the lowercase
/// hex SHA-256 of the plaintext topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicKey(String);

impl TopicKey {
    /// Hash a plaintext topic name into its storage key
    pub fn hashed(name: &str) -> Self {
        let key = Self(format!("{:x}", Sha256::digest(name.as_bytes())));
        tracing::debug!(topic = name, hash = %key, "Hashed topic name");
        key
    }

    /// Use an already-hashed key verbatim (push-only publication)
    pub fn prehashed(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single queued message
///
/// Immutable once created. Shared between the history and every subscriber
/// behind an `Arc`, so fan-out never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Plaintext topic name (or the hash, for push-only publication)
    pub name: String,
    /// Submitted form fields
    pub values: FormValues,
    /// Creation time
    pub created: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(name: impl Into<String>, values: FormValues) -> Self {
        Self {
            name: name.into(),
            values,
            created: Utc::now(),
        }
    }

    /// Serialize to the streaming wire form: one JSON object plus `\n`
    pub fn to_json_line(&self) -> Result<Bytes> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(Bytes::from(line))
    }
}

/// Collect url-encoded form sources into a multi-valued map
///
/// Sources are read in order, so for a repeated field the values from earlier
/// sources come first. Malformed input never fails; undecodable pairs are
/// taken as-is and an empty source adds nothing.
pub fn parse_form<'a>(sources: impl IntoIterator<Item = &'a [u8]>) -> FormValues {
    let mut values = FormValues::new();
    for source in sources {
        for (field, value) in form_urlencoded::parse(source) {
            values
                .entry(field.into_owned())
                .or_default()
                .push(value.into_owned());
        }
    }
    values
}
