//! Content creation forms.
//!
//! # Responsibility
//! - Validate user input for each content kind before it reaches the store.
//! - Build `ContentItem`s from form fields, uploads and JSON imports.
//!
//! # Invariants
//! - A failed validation never produces a content item, so the store is not
//!   touched.
//! - Saved checklists contain no blank items at either nesting level.
//! - Saved tables are rectangular and carry at least one non-blank header or
//!   cell.

use crate::model::checklist::ChecklistItem;
use crate::model::content::{ContentBody, ContentItem, CHECKLIST_LABEL, TABLE_LABEL};
use crate::model::notebook::new_id;
use crate::model::table::TableData;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-visible validation failure of a content form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFormError {
    EmptyUrl,
    EmptyMarkdown,
    /// No checklist item has non-blank text.
    EmptyChecklist,
    /// No header and no cell has non-blank text.
    EmptyTable,
    /// Drawing surface has no pending export.
    EmptyDrawing,
    EmptyFilename,
    /// Checklist JSON does not match `[{text, checked?, children?}]`.
    InvalidChecklistJson(String),
    /// Table JSON does not match `{headers, rows}`.
    InvalidTableJson(String),
}

impl Display for ContentFormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "Please enter a URL"),
            Self::EmptyMarkdown => write!(f, "Please enter some markdown"),
            Self::EmptyChecklist => write!(f, "Add at least one checklist item"),
            Self::EmptyTable => write!(f, "Add at least one header or cell"),
            Self::EmptyDrawing => write!(f, "Draw something before saving"),
            Self::EmptyFilename => write!(f, "Uploaded file has no name"),
            Self::InvalidChecklistJson(details) => {
                write!(f, "Invalid checklist JSON: {details}")
            }
            Self::InvalidTableJson(details) => write!(f, "Invalid table JSON: {details}"),
        }
    }
}

impl Error for ContentFormError {}

/// Checklist form row; `children` are one level deep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChecklistDraftItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub children: Vec<ChecklistDraftLeaf>,
}

impl ChecklistDraftItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Nested checklist form row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChecklistDraftLeaf {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Deserialize)]
struct TableDraft {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Builds link content; the URL is trimmed.
pub fn link(url: &str) -> Result<ContentItem, ContentFormError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ContentFormError::EmptyUrl);
    }
    Ok(ContentItem::new(ContentBody::Link {
        url: trimmed.to_string(),
    }))
}

/// Builds markdown content, keeping the source verbatim.
pub fn markdown(source: &str) -> Result<ContentItem, ContentFormError> {
    if source.trim().is_empty() {
        return Err(ContentFormError::EmptyMarkdown);
    }
    Ok(ContentItem::new(ContentBody::Markdown {
        source: source.to_string(),
    }))
}

/// Builds drawing content from an exported data URL.
pub fn drawing(data_url: &str) -> Result<ContentItem, ContentFormError> {
    if data_url.is_empty() {
        return Err(ContentFormError::EmptyDrawing);
    }
    Ok(ContentItem::new(ContentBody::Drawing {
        data_url: data_url.to_string(),
    }))
}

/// Builds content from an uploaded file.
///
/// `image/*` uploads become image content holding a base64 data URL; any
/// other upload becomes file content holding only the filename.
pub fn upload(filename: &str, mime_type: &str, bytes: &[u8]) -> Result<ContentItem, ContentFormError> {
    let mime_type = mime_type.trim();
    if mime_type.starts_with("image/") {
        let data_url = format!("data:{mime_type};base64,{}", STANDARD.encode(bytes));
        return Ok(ContentItem::new(ContentBody::Image { data_url }));
    }

    let filename = filename.trim();
    if filename.is_empty() {
        return Err(ContentFormError::EmptyFilename);
    }
    Ok(ContentItem::new(ContentBody::File {
        filename: filename.to_string(),
    }))
}

/// Builds checklist content, dropping blank items and blank nested items.
pub fn checklist(drafts: Vec<ChecklistDraftItem>) -> Result<ContentItem, ContentFormError> {
    let items: Vec<ChecklistItem> = drafts
        .into_iter()
        .filter(|draft| !draft.text.trim().is_empty())
        .map(|draft| {
            let children: Vec<ChecklistItem> = draft
                .children
                .into_iter()
                .filter(|leaf| !leaf.text.trim().is_empty())
                .map(|leaf| ChecklistItem {
                    id: new_id("item"),
                    text: leaf.text,
                    checked: leaf.checked,
                    children: None,
                })
                .collect();
            ChecklistItem {
                id: new_id("item"),
                text: draft.text,
                checked: draft.checked,
                children: (!children.is_empty()).then_some(children),
            }
        })
        .collect();

    if items.is_empty() {
        return Err(ContentFormError::EmptyChecklist);
    }
    Ok(ContentItem::new(ContentBody::Checklist {
        label: CHECKLIST_LABEL.to_string(),
        items,
    }))
}

/// Parses `[{text, checked?, children?}]` and builds checklist content.
pub fn checklist_from_json(json: &str) -> Result<ContentItem, ContentFormError> {
    let drafts: Vec<ChecklistDraftItem> = serde_json::from_str(json)
        .map_err(|err| ContentFormError::InvalidChecklistJson(err.to_string()))?;
    checklist(drafts)
}

/// Builds table content from raw headers and rows (normalized to rectangle).
pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<ContentItem, ContentFormError> {
    let data = TableData::new(headers, rows);
    if !data.has_content() {
        return Err(ContentFormError::EmptyTable);
    }
    Ok(ContentItem::new(ContentBody::Table {
        label: TABLE_LABEL.to_string(),
        data,
    }))
}

/// Parses `{headers: string[], rows: string[][]}` and builds table content.
pub fn table_from_json(json: &str) -> Result<ContentItem, ContentFormError> {
    let draft: TableDraft = serde_json::from_str(json)
        .map_err(|err| ContentFormError::InvalidTableJson(err.to_string()))?;
    table(draft.headers, draft.rows)
}
