//! Ledgerbox - a per-owner folder and file index.
//!
//! Owners file records under path-like folder addresses, page through the
//! ids filed under a path, and look records up by id. State lives in SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod store;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{LedgerboxError, Result};
pub use store::{
    DataPage, Drive, FileRecord, FileType, Folder, FolderPath, NewFile, NewFolder, Owner,
};
