//! Keyed-row access to a single Google Sheets spreadsheet.
//!
//! [`SheetClient`] authenticates with a service-account key, resolves
//! sheets/tabs by index or title, and reads data rows as mappings keyed by
//! the header row. Cell updates and row deletions are buffered locally per
//! sheet and pushed to the remote store in one batch by
//! [`SheetClient::sync`].
//!
//! The remote service sits behind the [`remote::RemoteSheets`] capability
//! trait; [`remote::SheetsHub`] is the production implementation.

mod client;
pub mod error;
mod model;
pub mod remote;

pub use client::SheetClient;
pub use error::{Result, SheetError};
pub use model::{Change, SheetInfo};
