//! Checklist items and path-based addressing.
//!
//! # Invariants
//! - One nesting level is supported: top-level items may carry children,
//!   children are leaves.
//! - Items are addressed by a path of ids from the checklist root, for both
//!   top-level and nested entries.

use serde::{Deserialize, Serialize};

/// Identifier of a checklist item.
pub type ChecklistItemId = String;

/// A single checkable entry, optionally with one level of children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ChecklistItem>>,
}

impl ChecklistItem {
    /// Returns whether the item text is empty after trim.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Returns child items, or an empty slice for leaves.
    pub fn children(&self) -> &[ChecklistItem] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Returns whether the item has no children.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// Path of ids from the checklist root to one item.
///
/// `[item_id]` addresses a top-level item and `[parent_id, child_id]` a
/// nested one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChecklistPath(Vec<ChecklistItemId>);

impl ChecklistPath {
    pub fn top_level(item_id: impl Into<ChecklistItemId>) -> Self {
        Self(vec![item_id.into()])
    }

    pub fn nested(parent_id: impl Into<ChecklistItemId>, child_id: impl Into<ChecklistItemId>) -> Self {
        Self(vec![parent_id.into(), child_id.into()])
    }

    /// Builds a path from raw ids; `None` when `ids` is empty.
    pub fn from_ids(ids: Vec<ChecklistItemId>) -> Option<Self> {
        if ids.is_empty() {
            None
        } else {
            Some(Self(ids))
        }
    }

    pub fn ids(&self) -> &[ChecklistItemId] {
        &self.0
    }

    /// Id of the addressed item (last path segment).
    pub fn target_id(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

/// Finds the item addressed by `path`.
pub fn find_at_path<'a>(items: &'a [ChecklistItem], path: &ChecklistPath) -> Option<&'a ChecklistItem> {
    let (first, rest) = path.ids().split_first()?;
    let mut current = items.iter().find(|item| &item.id == first)?;
    for id in rest {
        current = current.children().iter().find(|item| &item.id == id)?;
    }
    Some(current)
}

/// Returns whether no child carries children of its own.
pub fn within_nesting_limit(items: &[ChecklistItem]) -> bool {
    items
        .iter()
        .all(|item| item.children().iter().all(ChecklistItem::is_leaf))
}

/// Replaces the item addressed by `path` with `updated`.
///
/// Returns `false` and leaves `items` untouched when any path segment misses
/// or when `updated` would add a second nesting level.
pub fn replace_at_path(
    items: &mut [ChecklistItem],
    path: &ChecklistPath,
    updated: ChecklistItem,
) -> bool {
    let fits = match path.ids().len() {
        1 => within_nesting_limit(std::slice::from_ref(&updated)),
        _ => updated.is_leaf(),
    };
    if !fits {
        return false;
    }
    match slot_at_path(items, path.ids()) {
        Some(slot) => {
            *slot = updated;
            true
        }
        None => false,
    }
}

fn slot_at_path<'a>(
    items: &'a mut [ChecklistItem],
    ids: &[ChecklistItemId],
) -> Option<&'a mut ChecklistItem> {
    let (first, rest) = ids.split_first()?;
    let item = items.iter_mut().find(|item| &item.id == first)?;
    if rest.is_empty() {
        return Some(item);
    }
    let children = item.children.as_mut()?;
    slot_at_path(children, rest)
}

/// Counts `(checked, total)` over top-level and nested items.
pub fn progress(items: &[ChecklistItem]) -> (usize, usize) {
    items.iter().fold((0, 0), |(checked, total), item| {
        let (child_checked, child_total) = progress(item.children());
        (
            checked + usize::from(item.checked) + child_checked,
            total + 1 + child_total,
        )
    })
}
