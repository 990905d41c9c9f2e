//! Field mapping and per-column coercion into a [`NormalizedRecord`].
//!
//! A [`Submission`] is the shape-independent result of selecting and
//! coercing the tracked form fields. It can render itself as a record in
//! either [`MultiValueShape`]: multi-valued columns as string lists (the
//! first attempt) or joined into one string (the retry).

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::notification::{FieldValue, Notification};

pub const SUBMITTED_AT_COLUMN: &str = "Submission Date";
pub const STATUS_COLUMN: &str = "Status";
pub const DEFAULT_STATUS: &str = "New";

const JOIN_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    MultiValued,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub source: &'static str,
    pub column: &'static str,
    pub kind: ColumnKind,
}

pub const FIELD_MAP: &[FieldMapping] = &[
    FieldMapping {
        source: "email",
        column: "Email",
        kind: ColumnKind::Text,
    },
    FieldMapping {
        source: "city",
        column: "City & Time Zone",
        kind: ColumnKind::Text,
    },
    FieldMapping {
        source: "gender",
        column: "Gender",
        kind: ColumnKind::Text,
    },
    FieldMapping {
        source: "seeking",
        column: "Seeking",
        kind: ColumnKind::MultiValued,
    },
    FieldMapping {
        source: "bio",
        column: "Bio",
        kind: ColumnKind::Text,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiValueShape {
    #[default]
    List,
    Joined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<&str>> for ColumnValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(String::from).collect())
    }
}

/// Column name to value, serialized as a plain JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedRecord(BTreeMap<String, ColumnValue>);

impl NormalizedRecord {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.0.get(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Split a delimited value on commas, trimming and dropping empty segments.
#[must_use]
pub fn split_delimited(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn coerce(kind: ColumnKind, value: FieldValue) -> Option<ColumnValue> {
    if value.is_blank() {
        return None;
    }
    match (kind, value) {
        (ColumnKind::Text, FieldValue::Text(s)) => Some(ColumnValue::Text(s)),
        (ColumnKind::Text, FieldValue::List(items)) => {
            let joined = items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(JOIN_SEPARATOR);
            Some(ColumnValue::Text(joined))
        }
        (ColumnKind::MultiValued, FieldValue::List(items)) => Some(ColumnValue::List(items)),
        (ColumnKind::MultiValued, FieldValue::Text(s)) => {
            let items = split_delimited(&s);
            (!items.is_empty()).then_some(ColumnValue::List(items))
        }
    }
}

#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MappedColumn {
    column: &'static str,
    kind: ColumnKind,
    value: ColumnValue,
}

/// Tracked fields of one notification after coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    columns: Vec<MappedColumn>,
    submitted_at: String,
}

impl Submission {
    /// `now` stamps the record only when the notification has no `created_at`.
    #[must_use]
    pub fn from_notification(notification: &Notification, now: DateTime<Utc>) -> Self {
        let columns = FIELD_MAP
            .iter()
            .filter_map(|mapping| {
                let value = coerce(mapping.kind, notification.field(mapping.source)?)?;
                Some(MappedColumn {
                    column: mapping.column,
                    kind: mapping.kind,
                    value,
                })
            })
            .collect();

        let submitted_at = notification
            .created_at()
            .map_or_else(|| format_timestamp(now), String::from);

        Self {
            columns,
            submitted_at,
        }
    }

    #[must_use]
    pub fn submitted_at(&self) -> &str {
        &self.submitted_at
    }

    /// Whether rendering in [`MultiValueShape::Joined`] changes anything.
    #[must_use]
    pub fn has_alternate_shape(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.kind == ColumnKind::MultiValued && matches!(c.value, ColumnValue::List(_)))
    }

    #[must_use]
    pub fn record(&self, shape: MultiValueShape) -> NormalizedRecord {
        let mut fields = BTreeMap::new();
        for mapped in &self.columns {
            let value = match (&mapped.value, mapped.kind, shape) {
                (ColumnValue::List(items), ColumnKind::MultiValued, MultiValueShape::Joined) => {
                    ColumnValue::Text(items.join(JOIN_SEPARATOR))
                }
                (value, _, _) => value.clone(),
            };
            fields.insert(mapped.column.to_string(), value);
        }

        fields.insert(
            SUBMITTED_AT_COLUMN.to_string(),
            ColumnValue::Text(self.submitted_at.clone()),
        );
        fields
            .entry(STATUS_COLUMN.to_string())
            .or_insert_with(|| ColumnValue::from(DEFAULT_STATUS));

        NormalizedRecord(fields)
    }
}
