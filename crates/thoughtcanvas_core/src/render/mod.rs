//! Read-only content renderers.
//!
//! # Responsibility
//! - Map each content kind to its label, inline view and detail (overlay)
//!   view via one exhaustive match per consumer.
//! - Render whole notes as plain text for terminal front ends.
//!
//! # Invariants
//! - Rendering never mutates content; checklist toggles go through the store.

pub mod drawing;
pub mod markdown;

use crate::model::checklist::{progress, ChecklistItem};
use crate::model::content::{ContentBody, ContentItem, ContentKind};
use crate::model::notebook::{Note, Timestamp};
use crate::model::table::TableData;
use chrono::Utc;
use self::markdown::{derive_markdown_preview, markdown_to_text};

const DATA_URL_PREFIX: &str = "data:";

/// Where content is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Collapsed-to-expanded preview under the line.
    Inline,
    /// Floating overlay window with full content.
    Detail,
}

/// Returns the toggle label for a content item, e.g. `Link: https://…`.
pub fn content_label(kind: ContentKind, value: &str) -> String {
    match kind {
        ContentKind::Image => "Image".to_string(),
        ContentKind::Drawing => "Drawing".to_string(),
        ContentKind::File if value.is_empty() => "File".to_string(),
        ContentKind::File => format!("File: {value}"),
        ContentKind::Link if value.is_empty() => "Link".to_string(),
        ContentKind::Link => format!("Link: {value}"),
        ContentKind::Checklist => "Checklist".to_string(),
        ContentKind::Markdown => "Markdown".to_string(),
        ContentKind::Table => "Table".to_string(),
    }
}

/// Renders one content item as text for the given view.
pub fn render_content(item: &ContentItem, mode: ViewMode) -> String {
    match &item.body {
        ContentBody::Image { data_url } => render_image("Image", data_url, mode),
        ContentBody::Drawing { data_url } => render_image("Drawing", data_url, mode),
        ContentBody::File { filename } => format!("[file] {filename}"),
        ContentBody::Link { url } => format!("<{url}>"),
        ContentBody::Checklist { items, .. } => match mode {
            ViewMode::Inline => {
                let (checked, total) = progress(items);
                let mut out = render_checklist(items);
                out.push_str(&format!("\n({checked}/{total} done)"));
                out
            }
            ViewMode::Detail => render_checklist(items),
        },
        ContentBody::Markdown { source } => match mode {
            ViewMode::Inline => {
                let preview = derive_markdown_preview(source);
                let mut out = preview.text.unwrap_or_default();
                if let Some(image) = preview.image {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(&format!("[image] {image}"));
                }
                out
            }
            ViewMode::Detail => markdown_to_text(source),
        },
        ContentBody::Table { data, .. } => render_table(data),
    }
}

/// Renders a note with title, update time, lines, content and tags.
pub fn render_note(note: &Note, mode: ViewMode) -> String {
    let mut out = format!(
        "# {}\nUpdated {}\n",
        note.title,
        relative_time(note.updated_at, Utc::now())
    );
    for line in &note.lines {
        out.push_str(&format!("\n- {}", line.text));
        if !line.tags.is_empty() {
            out.push_str(&format!("  [{}]", line.tags.join(", ")));
        }
        if let Some(content) = &line.content {
            out.push_str(&format!("\n  {}", content_label(content.kind(), content.value())));
            for rendered in render_content(content, mode).lines() {
                out.push_str(&format!("\n    {rendered}"));
            }
        }
    }
    out.push('\n');
    out
}

/// Human-readable distance from `then` to `now`, e.g. `5 minutes ago`.
pub fn relative_time(then: Timestamp, now: Timestamp) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 0 {
        return "just now".to_string();
    }
    match seconds {
        0..=9 => "less than 10 seconds ago".to_string(),
        10..=59 => "less than a minute ago".to_string(),
        60..=119 => "1 minute ago".to_string(),
        120..=3_599 => format!("{} minutes ago", seconds / 60),
        3_600..=7_199 => "about 1 hour ago".to_string(),
        7_200..=86_399 => format!("about {} hours ago", seconds / 3_600),
        86_400..=172_799 => "1 day ago".to_string(),
        _ => format!("{} days ago", seconds / 86_400),
    }
}

fn render_image(label: &str, data_url: &str, mode: ViewMode) -> String {
    match mode {
        ViewMode::Inline => {
            let media_type = data_url
                .strip_prefix(DATA_URL_PREFIX)
                .and_then(|rest| rest.split([';', ',']).next())
                .filter(|value| !value.is_empty())
                .unwrap_or("unknown");
            format!("[{label}] {media_type}, {} bytes encoded", data_url.len())
        }
        ViewMode::Detail => data_url.to_string(),
    }
}

fn render_checklist(items: &[ChecklistItem]) -> String {
    let mut lines = Vec::new();
    for item in items {
        lines.push(checklist_line(item, 0));
        for child in item.children() {
            lines.push(checklist_line(child, 1));
        }
    }
    lines.join("\n")
}

fn checklist_line(item: &ChecklistItem, depth: usize) -> String {
    let mark = if item.checked { 'x' } else { ' ' };
    format!("{}[{mark}] {}", "  ".repeat(depth), item.text)
}

fn render_table(data: &TableData) -> String {
    let widths: Vec<usize> = (0..data.column_count())
        .map(|column| {
            std::iter::once(&data.headers[column])
                .chain(data.rows.iter().filter_map(|row| row.get(column)))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| -> String {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(column, &width)| {
                let cell = cells.get(column).map(String::as_str).unwrap_or_default();
                format!("{cell:<width$}")
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let separator = format!(
        "|{}|",
        widths
            .iter()
            .map(|width| "-".repeat(width + 2))
            .collect::<Vec<_>>()
            .join("|")
    );

    let mut lines = vec![format_row(data.headers.as_slice()), separator];
    lines.extend(data.rows.iter().map(|row| format_row(row.as_slice())));
    lines.join("\n")
}
