//! Folder and file index for Ledgerbox.
//!
//! This module provides:
//! - Owner identities and canonical folder paths
//! - A per-owner folder index with toggled visibility
//! - A global file index keyed by file id
//! - Append-only per-path listings served in fixed-size pages
//! - [`Drive`], the operation surface composing all of the above

mod file;
mod folder;
mod listing;
mod path;
mod service;

pub use file::{FileRecord, FileRepository, FileType, NewFile};
pub use folder::{Folder, FolderRepository, NewFolder};
pub use listing::{page_bounds, page_count, DataPage, ListingRepository};
pub use path::{validate_segment, FolderPath, Owner, PATH_SEPARATOR};
pub use service::Drive;

/// Default number of entries per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Maximum length for file names (in characters).
pub const MAX_FILENAME_LENGTH: usize = 100;

/// Maximum length for folder and file ids (in characters).
pub const MAX_ID_LENGTH: usize = 512;

/// Maximum number of records accepted in one `add_files` batch.
pub const MAX_BATCH_SIZE: usize = 256;
