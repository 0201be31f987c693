//! Markdown rendering for content views.
//!
//! # Responsibility
//! - Derive the short inline preview (text plus first image path).
//! - Render full markdown through `pulldown-cmark`, as HTML for the Flutter
//!   overlay and as structured plain text for terminals.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Parser, Tag, TagEnd};
use regex::Regex;

const PREVIEW_MAX_CHARS: usize = 100;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!|]+"#).expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Markdown-derived preview projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownPreview {
    /// Sanitized summary text.
    pub text: Option<String>,
    /// First markdown image path.
    pub image: Option<String>,
}

/// Derives preview fields from markdown source.
///
/// Rules:
/// - `image`: first markdown image path matched by regex.
/// - `text`: markdown symbols removed, whitespace normalized, first 100
///   chars retained.
pub fn derive_markdown_preview(source: &str) -> MarkdownPreview {
    let image = MARKDOWN_IMAGE_RE
        .captures(source)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|value| !value.is_empty());

    let without_images = MARKDOWN_IMAGE_RE.replace_all(source, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = normalized.trim();
    let text = if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    };

    MarkdownPreview { text, image }
}

/// Renders markdown to an HTML fragment.
pub fn markdown_to_html(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, Parser::new(source));
    out
}

/// Renders markdown as plain text that keeps its block structure.
///
/// Headings keep their `#` markers, list items get `-` or their number, code
/// blocks are indented by four spaces and link targets follow their text.
pub fn markdown_to_text(source: &str) -> String {
    let mut out = String::new();
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut targets: Vec<String> = Vec::new();
    let mut in_code_block = false;

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                start_block(&mut out);
                out.push_str(&"#".repeat(level as usize));
                out.push(' ');
            }
            Event::Start(Tag::Paragraph) if lists.is_empty() => start_block(&mut out),
            Event::Start(Tag::BlockQuote(_)) => {
                start_block(&mut out);
                out.push_str("> ");
            }
            Event::Start(Tag::List(first)) => {
                if lists.is_empty() {
                    start_block(&mut out);
                }
                lists.push(first);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
            }
            Event::Start(Tag::Item) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&"  ".repeat(lists.len().saturating_sub(1)));
                match lists.last_mut() {
                    Some(Some(number)) => {
                        out.push_str(&format!("{number}. "));
                        *number += 1;
                    }
                    _ => out.push_str("- "),
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                start_block(&mut out);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Start(Tag::Link { dest_url, .. }) => targets.push(dest_url.to_string()),
            Event::End(TagEnd::Link) => {
                if let Some(url) = targets.pop() {
                    out.push_str(&format!(" <{url}>"));
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                targets.push(dest_url.to_string());
                out.push_str("[image: ");
            }
            Event::End(TagEnd::Image) => {
                let url = targets.pop().unwrap_or_default();
                out.push_str(&format!("] <{url}>"));
            }
            Event::Text(text) if in_code_block => {
                for line in text.lines() {
                    out.push_str("    ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => {
                start_block(&mut out);
                out.push_str("---");
            }
            _ => {}
        }
    }

    out.trim_end().to_string()
}

/// Separates the next block from previous output by one blank line.
fn start_block(out: &mut String) {
    let kept = out.trim_end_matches('\n').len();
    out.truncate(kept);
    if !out.is_empty() {
        out.push_str("\n\n");
    }
}
