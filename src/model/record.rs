//! The normalized dataset record.

use serde::{Deserialize, Serialize};

use super::address::{extract_domain, normalize_message_id};

/// One normalized message entry of the dataset.
///
/// Every field has a defined empty value so a record never carries nulls:
/// strings default to `""` and `has_body` to `false`. Records are never
/// mutated after extraction; filters and queries clone the survivors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Header message-id, always angle-bracket delimited (empty if unavailable).
    #[serde(default)]
    pub message_id: String,

    /// `YYYY-MM-DD HH:MM:SS` timestamp, or empty. Not guaranteed parseable.
    #[serde(default)]
    pub date: String,

    /// Raw author header.
    #[serde(default)]
    pub from: String,

    /// Lower-cased sender domain, `"unknown"` or `"malformed"`.
    #[serde(default)]
    pub from_domain: String,

    /// Raw recipients header.
    #[serde(default)]
    pub to: String,

    #[serde(default)]
    pub subject: String,

    /// Originating folder path.
    #[serde(default)]
    pub folder: String,

    /// Indexed body text.
    #[serde(default)]
    pub body: String,

    /// `true` iff `body` is non-empty.
    #[serde(default)]
    pub has_body: bool,
}

/// Raw column values for one message, before normalization.
///
/// `None` stands for a SQL `NULL` or a missing left-join partner.
#[derive(Debug, Clone, Default)]
pub struct RawMessage {
    pub message_id: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub folder: Option<String>,
}

impl EmailRecord {
    /// Normalize raw column values into a record.
    ///
    /// `from_domain` is derived from `from` and `has_body` from `body`;
    /// neither is ever taken from the source.
    pub fn from_raw(raw: RawMessage) -> Self {
        let from = raw.from.unwrap_or_default();
        let body = raw.body.unwrap_or_default();
        Self {
            message_id: normalize_message_id(raw.message_id.as_deref().unwrap_or_default()),
            date: raw.date.unwrap_or_default(),
            from_domain: extract_domain(&from),
            from,
            to: raw.to.unwrap_or_default(),
            subject: raw.subject.unwrap_or_default(),
            folder: raw.folder.unwrap_or_default(),
            has_body: !body.is_empty(),
            body,
        }
    }

    /// Whether `has_body` agrees with the emptiness of `body`.
    pub fn is_consistent(&self) -> bool {
        self.has_body == !self.body.is_empty()
    }
}
