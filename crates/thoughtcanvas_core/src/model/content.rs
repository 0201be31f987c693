//! Rich-content variants attached to note lines.
//!
//! # Responsibility
//! - Define the closed set of content kinds and their payload shapes.
//! - Map the tagged Rust representation to the flat persisted JSON shape
//!   (`{id, type, value, createdAt, checklistItems?, tableData?}`).
//!
//! # Invariants
//! - Every `ContentBody` variant maps to exactly one `ContentKind`.
//! - Table payloads are normalized to rectangular shape when loaded.

use crate::model::checklist::ChecklistItem;
use crate::model::notebook::{new_id, Timestamp};
use crate::model::table::TableData;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifier of a content item.
pub type ContentId = String;

/// Display label stored as the primary value of checklist content.
pub const CHECKLIST_LABEL: &str = "Checklist";
/// Display label stored as the primary value of table content.
pub const TABLE_LABEL: &str = "Table";

/// Content kind tag. Serialized as the JSON `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Image,
    Drawing,
    File,
    Link,
    Checklist,
    Markdown,
    Table,
}

impl ContentKind {
    /// Every kind, in menu order.
    pub const ALL: [ContentKind; 7] = [
        ContentKind::Image,
        ContentKind::Drawing,
        ContentKind::File,
        ContentKind::Link,
        ContentKind::Checklist,
        ContentKind::Markdown,
        ContentKind::Table,
    ];

    /// Returns the stable tag string also used as a line tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Drawing => "drawing",
            Self::File => "file",
            Self::Link => "link",
            Self::Checklist => "checklist",
            Self::Markdown => "markdown",
            Self::Table => "table",
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown content kind tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentKind(pub String);

impl Display for UnknownContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown content kind: `{}`", self.0)
    }
}

impl Error for UnknownContentKind {}

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownContentKind(value.to_string()))
    }
}

/// Kind-specific payload of a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBody {
    /// Data URL of an uploaded image.
    Image { data_url: String },
    /// PNG data URL exported from the drawing surface.
    Drawing { data_url: String },
    /// Original filename of a non-image upload.
    File { filename: String },
    Link { url: String },
    Checklist {
        label: String,
        items: Vec<ChecklistItem>,
    },
    /// Raw markdown source.
    Markdown { source: String },
    Table { label: String, data: TableData },
}

impl ContentBody {
    /// Returns the kind tag of this payload.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Image { .. } => ContentKind::Image,
            Self::Drawing { .. } => ContentKind::Drawing,
            Self::File { .. } => ContentKind::File,
            Self::Link { .. } => ContentKind::Link,
            Self::Checklist { .. } => ContentKind::Checklist,
            Self::Markdown { .. } => ContentKind::Markdown,
            Self::Table { .. } => ContentKind::Table,
        }
    }

    /// Returns the primary string value (URL, filename, markdown or label).
    pub fn value(&self) -> &str {
        match self {
            Self::Image { data_url } | Self::Drawing { data_url } => data_url,
            Self::File { filename } => filename,
            Self::Link { url } => url,
            Self::Checklist { label, .. } | Self::Table { label, .. } => label,
            Self::Markdown { source } => source,
        }
    }
}

/// A tagged rich-content attachment on a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ContentItemRecord", into = "ContentItemRecord")]
pub struct ContentItem {
    pub id: ContentId,
    pub created_at: Timestamp,
    pub body: ContentBody,
}

impl ContentItem {
    /// Wraps `body` with a fresh id and creation timestamp.
    pub fn new(body: ContentBody) -> Self {
        Self {
            id: new_id("content"),
            created_at: Utc::now(),
            body,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.body.kind()
    }

    pub fn value(&self) -> &str {
        self.body.value()
    }

    /// Returns checklist items when this is checklist content.
    pub fn checklist_items(&self) -> Option<&[ChecklistItem]> {
        match &self.body {
            ContentBody::Checklist { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Returns table data when this is table content.
    pub fn table_data(&self) -> Option<&TableData> {
        match &self.body {
            ContentBody::Table { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Flat persisted shape of a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentItemRecord {
    id: ContentId,
    #[serde(rename = "type")]
    kind: ContentKind,
    value: String,
    created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checklist_items: Option<Vec<ChecklistItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table_data: Option<TableData>,
}

impl From<ContentItemRecord> for ContentItem {
    fn from(record: ContentItemRecord) -> Self {
        let value = record.value;
        let body = match record.kind {
            ContentKind::Image => ContentBody::Image { data_url: value },
            ContentKind::Drawing => ContentBody::Drawing { data_url: value },
            ContentKind::File => ContentBody::File { filename: value },
            ContentKind::Link => ContentBody::Link { url: value },
            ContentKind::Checklist => ContentBody::Checklist {
                label: value,
                items: record.checklist_items.unwrap_or_default(),
            },
            ContentKind::Markdown => ContentBody::Markdown { source: value },
            ContentKind::Table => ContentBody::Table {
                label: value,
                data: TableData::normalized(record.table_data.unwrap_or_default()),
            },
        };
        Self {
            id: record.id,
            created_at: record.created_at,
            body,
        }
    }
}

impl From<ContentItem> for ContentItemRecord {
    fn from(item: ContentItem) -> Self {
        let kind = item.body.kind();
        let (value, checklist_items, table_data) = match item.body {
            ContentBody::Image { data_url } | ContentBody::Drawing { data_url } => {
                (data_url, None, None)
            }
            ContentBody::File { filename } => (filename, None, None),
            ContentBody::Link { url } => (url, None, None),
            ContentBody::Checklist { label, items } => (label, Some(items), None),
            ContentBody::Markdown { source } => (source, None, None),
            ContentBody::Table { label, data } => (label, None, Some(data)),
        };
        Self {
            id: item.id,
            kind,
            value,
            created_at: item.created_at,
            checklist_items,
            table_data,
        }
    }
}
