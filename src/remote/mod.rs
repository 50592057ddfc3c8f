mod auth;
mod hub;

pub use hub::SheetsHub;

use crate::error::Result;
use crate::model::{Change, SheetInfo};
use async_trait::async_trait;

/// Capability interface over the remote spreadsheet service.
///
/// The wire protocol lives entirely behind this trait; [`SheetsHub`] is the
/// Google Sheets implementation and tests substitute an in-memory one.
#[async_trait]
pub trait RemoteSheets {
    /// Current sheet list of the spreadsheet, in positional order.
    async fn fetch_sheets(&self) -> Result<Vec<SheetInfo>>;

    /// All entered cell values of one sheet, as rows of strings.
    async fn fetch_values(&self, sheet: &SheetInfo) -> Result<Vec<Vec<String>>>;

    /// Create a new empty sheet/tab with the given title.
    async fn add_sheet(&self, title: &str) -> Result<()>;

    /// Push buffered changes to one sheet as a single batch operation,
    /// applied in slice order.
    async fn apply_changes(&self, sheet: &SheetInfo, changes: &[Change]) -> Result<()>;
}
