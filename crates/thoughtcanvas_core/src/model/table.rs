//! Rectangular table payload.
//!
//! # Invariants
//! - After `normalize`, every row has exactly `headers.len()` cells.
//! - Every mutation helper re-normalizes before returning.

use serde::{Deserialize, Serialize};

/// A simple rectangular grid of header labels and string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// One structural edit applied to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEdit {
    AddColumn { header: String },
    RemoveColumn { index: usize },
    AddRow,
    RemoveRow { index: usize },
    SetHeader { index: usize, value: String },
    SetCell { row: usize, column: usize, value: String },
}

impl TableData {
    /// Builds a normalized table from raw headers and rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::normalized(Self { headers, rows })
    }

    /// Returns `table` after `normalize`.
    pub fn normalized(mut table: Self) -> Self {
        table.normalize();
        table
    }

    /// Pads or truncates rows to the header count.
    ///
    /// A table without headers takes its width from the widest row and gets
    /// blank headers, so header-less imports keep their cells.
    pub fn normalize(&mut self) {
        if self.headers.is_empty() {
            let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
            self.headers = vec![String::new(); width];
        }
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether every row matches the header count.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.headers.len())
    }

    /// Returns whether any header or cell is non-empty after trim.
    pub fn has_content(&self) -> bool {
        self.headers.iter().any(|header| !header.trim().is_empty())
            || self
                .rows
                .iter()
                .flatten()
                .any(|cell| !cell.trim().is_empty())
    }

    /// Applies one edit. Returns `false` for out-of-range indices, leaving the
    /// table unchanged.
    pub fn apply(&mut self, edit: TableEdit) -> bool {
        let applied = match edit {
            TableEdit::AddColumn { header } => {
                self.headers.push(header);
                true
            }
            TableEdit::RemoveColumn { index } => {
                if index >= self.headers.len() {
                    false
                } else {
                    self.headers.remove(index);
                    for row in &mut self.rows {
                        if index < row.len() {
                            row.remove(index);
                        }
                    }
                    true
                }
            }
            TableEdit::AddRow => {
                self.rows.push(vec![String::new(); self.headers.len()]);
                true
            }
            TableEdit::RemoveRow { index } => {
                if index >= self.rows.len() {
                    false
                } else {
                    self.rows.remove(index);
                    true
                }
            }
            TableEdit::SetHeader { index, value } => match self.headers.get_mut(index) {
                Some(header) => {
                    *header = value;
                    true
                }
                None => false,
            },
            TableEdit::SetCell { row, column, value } => {
                if column >= self.headers.len() {
                    false
                } else {
                    match self.rows.get_mut(row) {
                        Some(cells) => {
                            cells.resize(self.headers.len(), String::new());
                            cells[column] = value;
                            true
                        }
                        None => false,
                    }
                }
            }
        };
        self.normalize();
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::{TableData, TableEdit};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn normalize_pads_short_rows_and_truncates_long_ones() {
        let table = TableData::new(
            strings(&["A", "B"]),
            vec![strings(&["1"]), strings(&["1", "2", "3"])],
        );
        assert!(table.is_rectangular());
        assert_eq!(table.rows[0], strings(&["1", ""]));
        assert_eq!(table.rows[1], strings(&["1", "2"]));
    }

    #[test]
    fn headerless_table_keeps_cells() {
        let table = TableData::new(Vec::new(), vec![strings(&["x", "y"]), strings(&["z"])]);
        assert_eq!(table.headers, strings(&["", ""]));
        assert_eq!(table.rows[1], strings(&["z", ""]));
        assert!(table.has_content());
    }

    #[test]
    fn add_and_remove_column_keep_rows_in_sync() {
        let mut table = TableData::new(strings(&["A"]), vec![strings(&["1"])]);
        assert!(table.apply(TableEdit::AddColumn {
            header: "B".to_string()
        }));
        assert_eq!(table.rows[0], strings(&["1", ""]));

        assert!(table.apply(TableEdit::RemoveColumn { index: 0 }));
        assert_eq!(table.headers, strings(&["B"]));
        assert_eq!(table.rows[0], strings(&[""]));
    }

    #[test]
    fn out_of_range_edits_are_rejected() {
        let mut table = TableData::new(strings(&["A"]), vec![strings(&["1"])]);
        let before = table.clone();
        assert!(!table.apply(TableEdit::RemoveColumn { index: 3 }));
        assert!(!table.apply(TableEdit::RemoveRow { index: 1 }));
        assert!(!table.apply(TableEdit::SetCell {
            row: 0,
            column: 1,
            value: "x".to_string()
        }));
        assert_eq!(table, before);
    }

    #[test]
    fn add_row_and_set_cell() {
        let mut table = TableData::new(strings(&["A", "B"]), Vec::new());
        assert!(table.apply(TableEdit::AddRow));
        assert!(table.apply(TableEdit::SetCell {
            row: 0,
            column: 1,
            value: "v".to_string()
        }));
        assert_eq!(table.rows, vec![strings(&["", "v"])]);
    }

    #[test]
    fn blank_table_has_no_content() {
        let table = TableData::new(strings(&[" ", ""]), vec![strings(&["", "  "])]);
        assert!(!table.has_content());
    }
}
