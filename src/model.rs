use std::collections::HashMap;

/// Metadata for one sheet/tab, resolved from the remote spreadsheet.
///
/// Handles are re-resolved before every operation that targets a sheet, so
/// no stale metadata survives remote structural changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    /// Stable remote identifier, unchanged by tab reordering.
    pub sheet_id: i32,
    pub title: String,
    /// 0-based position among the spreadsheet's tabs.
    pub index: usize,
    /// Grid extent in rows. This is the sheet's full grid, not the extent
    /// of entered data.
    pub row_count: usize,
    /// Grid extent in columns.
    pub column_count: usize,
}

/// One buffered local mutation, pending until the owning sheet is synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    UpdateCell {
        row: usize,
        column: usize,
        value: String,
    },
    /// Removes exactly the row range `[row, row + 1)`.
    DeleteRow { row: usize },
}

/// Convert a grid of cell values (first row as headers) to keyed row-mappings.
///
/// Each cell value of row 0 becomes a mapping key, in column order; every
/// later row yields one mapping, returned in original top-to-bottom order.
/// Duplicate header values collide silently, last column wins. Rows shorter
/// than the header omit the absent keys; cells beyond the header width are
/// dropped.
pub fn rows_to_mappings(rows: &[Vec<String>]) -> Vec<HashMap<String, String>> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    data.iter()
        .map(|row| {
            header
                .iter()
                .zip(row)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_helpers {
    pub(crate) fn mock_rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    pub(crate) fn mock_mapping(pairs: &[(&str, &str)]) -> super::HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::{mock_mapping, mock_rows};
    use super::*;

    #[test]
    fn test_rows_to_mappings_with_data() {
        let rows = mock_rows(&[&["id", "name"], &["1", "Alice"], &["2", "Bob"]]);

        let mappings = rows_to_mappings(&rows);
        let expected = vec![
            mock_mapping(&[("id", "1"), ("name", "Alice")]),
            mock_mapping(&[("id", "2"), ("name", "Bob")]),
        ];
        assert_eq!(mappings, expected);
    }

    #[test]
    fn test_rows_to_mappings_header_only() {
        let rows = mock_rows(&[&["id", "name"]]);
        assert_eq!(rows_to_mappings(&rows), vec![]);
    }

    #[test]
    fn test_rows_to_mappings_empty_grid() {
        assert_eq!(rows_to_mappings(&[]), vec![]);
    }

    #[test]
    fn test_rows_to_mappings_short_row_omits_keys() {
        let rows = mock_rows(&[&["id", "name", "email"], &["1", "Alice"]]);

        let mappings = rows_to_mappings(&rows);
        let expected = vec![mock_mapping(&[("id", "1"), ("name", "Alice")])];
        assert_eq!(
            mappings, expected,
            "columns without a cell should be absent from the mapping"
        );
    }

    #[test]
    fn test_rows_to_mappings_long_row_drops_extra_cells() {
        let rows = mock_rows(&[&["id", "name"], &["1", "Alice", "spill"]]);

        let mappings = rows_to_mappings(&rows);
        let expected = vec![mock_mapping(&[("id", "1"), ("name", "Alice")])];
        assert_eq!(mappings, expected);
    }

    #[test]
    fn test_rows_to_mappings_duplicate_header_last_wins() {
        let rows = mock_rows(&[&["id", "id"], &["first", "second"]]);

        let mappings = rows_to_mappings(&rows);
        let expected = vec![mock_mapping(&[("id", "second")])];
        assert_eq!(mappings, expected);
    }

    #[test]
    fn test_rows_to_mappings_preserves_row_order() {
        let rows = mock_rows(&[&["n"], &["3"], &["1"], &["2"]]);

        let order: Vec<String> = rows_to_mappings(&rows)
            .into_iter()
            .map(|mut mapping| mapping.remove("n").unwrap())
            .collect();
        assert_eq!(order, vec!["3", "1", "2"]);
    }
}
