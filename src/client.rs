use crate::error::{Result, SheetError};
use crate::model::{Change, SheetInfo, rows_to_mappings};
use crate::remote::{RemoteSheets, SheetsHub};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Client for one remote spreadsheet.
///
/// Sheets are addressed by 0-based index (or resolved from a title via
/// [`sheet_by_name`](Self::sheet_by_name)) and re-resolved from fresh
/// metadata on every call, so no stale handle survives remote structural
/// changes. Cell updates and row deletions are buffered locally per sheet
/// and reach the remote store only through [`sync`](Self::sync); a client
/// dropped with unsynced changes loses them.
pub struct SheetClient<R> {
    remote: R,
    /// Buffered mutations keyed by stable sheet id, not index, so a tab
    /// reordering between buffering and flushing cannot mis-target a flush.
    changes: HashMap<i32, Vec<Change>>,
}

impl SheetClient<SheetsHub> {
    /// Authenticate with a service-account key file and open the
    /// spreadsheet identified by `spreadsheet_id`.
    ///
    /// Construction is all-or-nothing: an unreadable or malformed key, a
    /// rejected token exchange, or an unreachable spreadsheet each yield a
    /// typed error and no client.
    #[instrument(name = "Opening spreadsheet", skip_all, fields(spreadsheet_id))]
    pub async fn connect(
        credentials_path: impl AsRef<Path>,
        spreadsheet_id: &str,
    ) -> Result<Self> {
        if spreadsheet_id.is_empty() {
            return Err(SheetError::Fetch(
                "Spreadsheet id must not be empty".to_string(),
            ));
        }

        let hub = SheetsHub::new(credentials_path.as_ref(), spreadsheet_id).await?;
        let client = Self::with_remote(hub);

        // Fetch the sheet list once so a missing or unauthorized
        // spreadsheet fails construction instead of the first operation.
        client.remote.fetch_sheets().await?;

        Ok(client)
    }
}

impl<R: RemoteSheets> SheetClient<R> {
    /// Build a client over an already constructed remote capability.
    pub fn with_remote(remote: R) -> Self {
        Self {
            remote,
            changes: HashMap::new(),
        }
    }

    /// Load every data row of the sheet at `sheet_index` as mappings keyed
    /// by the header row's cell values.
    ///
    /// Row 0 is the header; duplicate header values collide last column
    /// wins, so callers must keep headers unique. A header-only or entirely
    /// empty sheet loads as an empty sequence. Reads the remote state;
    /// buffered unsynced changes are not overlaid.
    pub async fn load_sheet(&self, sheet_index: usize) -> Result<Vec<HashMap<String, String>>> {
        let sheet = self.sheet_at(sheet_index).await?;
        let rows = self.remote.fetch_values(&sheet).await?;

        Ok(rows_to_mappings(&rows))
    }

    /// Positional index of the sheet titled `name`. Exact, case-sensitive
    /// match.
    pub async fn sheet_by_name(&self, name: &str) -> Result<usize> {
        let sheets = self.remote.fetch_sheets().await?;

        sheets
            .iter()
            .find(|sheet| sheet.title == name)
            .map(|sheet| sheet.index)
            .ok_or_else(|| SheetError::SheetNotFound(format!("no sheet titled '{}'", name)))
    }

    /// Create a new empty sheet titled `name` and return its index.
    ///
    /// Creation and index resolution are two remote-observable steps: if
    /// the sheet is created but the follow-up lookup misses (metadata not
    /// yet refreshed), this returns [`SheetError::SheetNotFound`] despite
    /// successful creation. Treat that as transient and retry
    /// [`sheet_by_name`](Self::sheet_by_name), not the creation, which
    /// would now fail with [`SheetError::DuplicateName`].
    #[instrument(name = "Creating sheet", skip(self))]
    pub async fn create_sheet(&self, name: &str) -> Result<usize> {
        let sheets = self.remote.fetch_sheets().await?;
        if sheets.iter().any(|sheet| sheet.title == name) {
            return Err(SheetError::DuplicateName(name.to_string()));
        }

        self.remote.add_sheet(name).await?;
        self.sheet_by_name(name).await
    }

    /// Buffer an update of the cell at 0-based `(row, column)` to
    /// `new_value`. Local only until [`sync`](Self::sync).
    ///
    /// Coordinates must lie within the sheet's current grid extent; the
    /// grid is never auto-expanded.
    pub async fn update_value(
        &mut self,
        sheet_index: usize,
        column: usize,
        row: usize,
        new_value: &str,
    ) -> Result<()> {
        let sheet = self.sheet_at(sheet_index).await?;
        if row >= sheet.row_count || column >= sheet.column_count {
            return Err(SheetError::IndexOutOfRange(format!(
                "cell ({}, {}) is outside the {}x{} grid of '{}'",
                row, column, sheet.row_count, sheet.column_count, sheet.title
            )));
        }

        self.buffer(
            sheet.sheet_id,
            Change::UpdateCell {
                row,
                column,
                value: new_value.to_string(),
            },
        );
        Ok(())
    }

    /// Buffer removal of exactly the row at `row_index`. Local only until
    /// [`sync`](Self::sync).
    pub async fn delete_row(&mut self, sheet_index: usize, row_index: usize) -> Result<()> {
        let sheet = self.sheet_at(sheet_index).await?;
        if row_index >= sheet.row_count {
            return Err(SheetError::IndexOutOfRange(format!(
                "row {} is outside the {} rows of '{}'",
                row_index, sheet.row_count, sheet.title
            )));
        }

        self.buffer(sheet.sheet_id, Change::DeleteRow { row: row_index });
        Ok(())
    }

    /// Flush the buffered changes of the sheet at `sheet_index` to the
    /// remote store as a single batch, in the order they were recorded.
    ///
    /// On failure the buffer is left intact, so retrying `sync` re-sends
    /// the same change set and reaches the same remote end state provided
    /// no other writer touched the sheet in between. With nothing buffered
    /// this succeeds without a remote write.
    #[instrument(name = "Syncing sheet", skip(self))]
    pub async fn sync(&mut self, sheet_index: usize) -> Result<()> {
        let sheet = self.sheet_at(sheet_index).await?;

        let Some(pending) = self.changes.remove(&sheet.sheet_id) else {
            debug!(sheet = %sheet.title, "No buffered changes");
            return Ok(());
        };

        // A failed flush stays buffered so the caller can retry.
        if let Err(e) = self.remote.apply_changes(&sheet, &pending).await {
            self.changes.insert(sheet.sheet_id, pending);
            return Err(e);
        }

        Ok(())
    }

    fn buffer(&mut self, sheet_id: i32, change: Change) {
        self.changes.entry(sheet_id).or_default().push(change);
    }

    async fn sheet_at(&self, sheet_index: usize) -> Result<SheetInfo> {
        let sheets = self.remote.fetch_sheets().await?;

        sheets
            .into_iter()
            .find(|sheet| sheet.index == sheet_index)
            .ok_or_else(|| SheetError::SheetNotFound(format!("no sheet at index {}", sheet_index)))
    }
}
