use super::RemoteSheets;
use crate::error::{Result, SheetError};
use crate::model::{Change, SheetInfo};
use crate::remote::auth::create_and_verify_authenticator;
use async_trait::async_trait;
use google_sheets4::FieldMask;
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, CellData, DeleteDimensionRequest,
    DimensionRange, ExtendedValue, GridCoordinate, Request, RowData, Scope, SheetProperties,
    Sheets, UpdateCellsRequest,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use std::path::Path;
use tracing::{debug, instrument};

// Read/write access to the spreadsheet addressed by id
pub(crate) const AUTH_SCOPE: Scope = Scope::Spreadsheet;

/// Authenticated Google Sheets hub bound to one spreadsheet.
pub struct SheetsHub {
    hub: Sheets<HttpsConnector<HttpConnector>>,
    spreadsheet_id: String,
}

impl SheetsHub {
    /// Authenticate with a service-account key and bind to `spreadsheet_id`.
    #[instrument(name = "Connecting to Google Sheets", skip_all)]
    pub async fn new(credentials_path: &Path, spreadsheet_id: &str) -> Result<Self> {
        let auth = create_and_verify_authenticator(credentials_path).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| SheetError::Auth(format!("Failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);
        let hub = Sheets::new(client, auth);

        Ok(Self {
            hub,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }
}

#[async_trait]
impl RemoteSheets for SheetsHub {
    #[instrument(name = "Fetching sheet list", skip_all)]
    async fn fetch_sheets(&self) -> Result<Vec<SheetInfo>> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .include_grid_data(false)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| SheetError::Fetch(format!("Failed to get spreadsheet: {}", e)))?;

        let mut sheets = Vec::new();
        for (position, sheet) in spreadsheet.sheets.unwrap_or_default().into_iter().enumerate() {
            let properties = sheet.properties.ok_or_else(|| {
                SheetError::Fetch("Sheet metadata is missing properties".to_string())
            })?;
            sheets.push(sheet_info(properties, position)?);
        }

        Ok(sheets)
    }

    #[instrument(name = "Fetching sheet values", skip_all, fields(sheet = %sheet.title))]
    async fn fetch_values(&self, sheet: &SheetInfo) -> Result<Vec<Vec<String>>> {
        // The bare sheet title addresses the whole sheet, whatever its width.
        let (_, response) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, &sheet.title)
            .major_dimension("ROWS")
            .value_render_option("FORMATTED_VALUE")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| {
                SheetError::Remote(format!("Failed to read sheet '{}': {}", sheet.title, e))
            })?;

        // Values are Option<Vec<Vec<serde_json::Value>>>
        let values = response.values.unwrap_or_default();
        Ok(values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    #[instrument(name = "Adding sheet", skip(self))]
    async fn add_sheet(&self, title: &str) -> Result<()> {
        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(title.to_string()),
                    sheet_type: Some("GRID".to_string()),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![request]),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .batch_update(batch_update, &self.spreadsheet_id)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| SheetError::Remote(format!("Failed to create sheet '{}': {}", title, e)))?;

        Ok(())
    }

    #[instrument(name = "Flushing changes", skip_all, fields(sheet = %sheet.title))]
    async fn apply_changes(&self, sheet: &SheetInfo, changes: &[Change]) -> Result<()> {
        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(change_requests(sheet.sheet_id, changes)),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .batch_update(batch_update, &self.spreadsheet_id)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| {
                SheetError::Remote(format!(
                    "Failed to flush changes to sheet '{}': {}",
                    sheet.title, e
                ))
            })?;

        debug!(count = changes.len(), "Applied buffered changes");
        Ok(())
    }
}

fn sheet_info(properties: SheetProperties, position: usize) -> Result<SheetInfo> {
    let sheet_id = properties
        .sheet_id
        .ok_or_else(|| SheetError::Fetch("Sheet metadata is missing an id".to_string()))?;
    let grid = properties.grid_properties.unwrap_or_default();

    Ok(SheetInfo {
        sheet_id,
        title: properties.title.unwrap_or_default(),
        index: properties.index.map(|i| i as usize).unwrap_or(position),
        row_count: grid.row_count.unwrap_or(0) as usize,
        column_count: grid.column_count.unwrap_or(0) as usize,
    })
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Translate buffered changes into batch requests, preserving recorded
/// order. Coordinates in each change refer to the sheet state after all
/// earlier changes, so in-order application reproduces the caller's local
/// sequence exactly.
fn change_requests(sheet_id: i32, changes: &[Change]) -> Vec<Request> {
    changes
        .iter()
        .map(|change| match change {
            Change::UpdateCell { row, column, value } => Request {
                update_cells: Some(UpdateCellsRequest {
                    start: Some(GridCoordinate {
                        sheet_id: Some(sheet_id),
                        row_index: Some(*row as i32),
                        column_index: Some(*column as i32),
                    }),
                    rows: Some(vec![RowData {
                        values: Some(vec![CellData {
                            user_entered_value: Some(ExtendedValue {
                                string_value: Some(value.clone()),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }]),
                    }]),
                    fields: Some(FieldMask::new(&["userEnteredValue"])),
                    ..Default::default()
                }),
                ..Default::default()
            },
            Change::DeleteRow { row } => Request {
                delete_dimension: Some(DeleteDimensionRequest {
                    range: Some(DimensionRange {
                        sheet_id: Some(sheet_id),
                        dimension: Some("ROWS".to_string()),
                        start_index: Some(*row as i32),
                        end_index: Some(*row as i32 + 1),
                    }),
                }),
                ..Default::default()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_cell_request() {
        let changes = vec![Change::UpdateCell {
            row: 4,
            column: 2,
            value: "updated".to_string(),
        }];

        let requests = change_requests(123, &changes);
        assert_eq!(requests.len(), 1);

        let update = requests[0].update_cells.as_ref().unwrap();
        let start = update.start.as_ref().unwrap();
        assert_eq!(start.sheet_id, Some(123));
        assert_eq!(start.row_index, Some(4));
        assert_eq!(start.column_index, Some(2));
        assert!(update.fields.is_some());

        let cell = &update.rows.as_ref().unwrap()[0].values.as_ref().unwrap()[0];
        assert_eq!(
            cell.user_entered_value.as_ref().unwrap().string_value,
            Some("updated".to_string())
        );
    }

    #[test]
    fn test_delete_row_request_covers_single_row() {
        let changes = vec![Change::DeleteRow { row: 7 }];

        let requests = change_requests(123, &changes);
        assert_eq!(requests.len(), 1);

        let range = requests[0]
            .delete_dimension
            .as_ref()
            .unwrap()
            .range
            .as_ref()
            .unwrap();
        assert_eq!(range.sheet_id, Some(123));
        assert_eq!(range.dimension.as_deref(), Some("ROWS"));
        assert_eq!(range.start_index, Some(7));
        assert_eq!(range.end_index, Some(8));
    }

    #[test]
    fn test_change_requests_preserve_recorded_order() {
        let changes = vec![
            Change::UpdateCell {
                row: 5,
                column: 0,
                value: "first".to_string(),
            },
            Change::DeleteRow { row: 2 },
            Change::UpdateCell {
                row: 1,
                column: 1,
                value: "last".to_string(),
            },
        ];

        let requests = change_requests(9, &changes);
        assert_eq!(requests.len(), 3);
        assert!(requests[0].update_cells.is_some());
        assert!(requests[1].delete_dimension.is_some());
        assert!(requests[2].update_cells.is_some());
    }

    #[test]
    fn test_cell_to_string() {
        use serde_json::json;

        assert_eq!(cell_to_string(json!("plain")), "plain");
        assert_eq!(cell_to_string(json!(42)), "42");
        assert_eq!(cell_to_string(json!(true)), "true");
    }
}
