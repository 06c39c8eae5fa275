//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use crate::store::{FileRecord, FileType, FolderPath, NewFolder, Owner};
use crate::Result;

/// Folder fields of an add/remove request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FolderInput {
    /// Folder name, a single path segment.
    #[validate(length(min = 1, max = 100, message = "Folder name must be 1-100 characters"))]
    pub name: String,
    /// Explicit folder id.
    #[serde(default)]
    #[validate(length(min = 1, max = 512, message = "Folder id must be 1-512 characters"))]
    pub id: Option<String>,
    /// Creating owner address.
    pub created_by: String,
    /// Creation time as Unix seconds.
    #[validate(range(min = 0, message = "createdOn must not be negative"))]
    pub created_on: i64,
}

impl FolderInput {
    /// Convert into a validated [`NewFolder`].
    pub fn into_new_folder(self) -> Result<NewFolder> {
        let created_by = Owner::parse(&self.created_by)?;
        let folder = NewFolder::new(self.name, created_by, self.created_on)?;
        match self.id {
            Some(id) => folder.with_id(id),
            None => Ok(folder),
        }
    }
}

/// Add or toggle a folder.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddRemoveFolderRequest {
    /// Canonical path of the parent folder.
    pub parent: String,
    /// The folder to create or toggle.
    #[validate(nested)]
    pub folder: FolderInput,
    /// Visibility to set.
    pub make_visible: bool,
}

/// One file record in an add-files request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
    /// Display name, including extension.
    #[validate(length(min = 1, max = 100, message = "File name must be 1-100 characters"))]
    pub name: String,
    /// Content kind code.
    #[validate(range(max = 4, message = "fileType must be 0-4"))]
    pub file_type: u8,
    /// Upload time as Unix seconds.
    #[validate(range(min = 0, message = "uploadedOn must not be negative"))]
    pub uploaded_on: i64,
    /// Uploading owner address.
    #[serde(alias = "uploadedBY")]
    pub uploaded_by: String,
    /// Extension without the leading dot.
    #[serde(default)]
    #[validate(length(max = 32, message = "fileExtension must be at most 32 characters"))]
    pub file_extension: String,
    /// Opaque content hash.
    #[validate(length(min = 1, max = 256, message = "dataHash must be 1-256 characters"))]
    pub data_hash: String,
    /// Path the file is filed under.
    pub path: String,
    /// Whether the content may be served without the owner.
    #[serde(default)]
    pub can_public_access: bool,
    /// Globally unique id.
    #[validate(length(min = 1, max = 512, message = "id must be 1-512 characters"))]
    pub id: String,
    /// Content size in megabytes.
    #[validate(range(min = 0.0, message = "fileSize must not be negative"))]
    pub file_size: f64,
}

impl FileInput {
    /// Convert into a [`FileRecord`], parsing its owner and path.
    pub fn into_record(self) -> Result<FileRecord> {
        Ok(FileRecord {
            file_type: FileType::try_from(self.file_type)?,
            uploaded_by: Owner::parse(&self.uploaded_by)?,
            path: FolderPath::parse(&self.path)?,
            name: self.name,
            uploaded_on: self.uploaded_on,
            file_extension: self.file_extension,
            data_hash: self.data_hash,
            can_public_access: self.can_public_access,
            id: self.id,
            file_size: self.file_size,
        })
    }
}

/// File a batch of records under one path.
#[derive(Debug, Deserialize, Validate)]
pub struct AddFilesRequest {
    /// Canonical path the batch is filed under.
    pub path: String,
    /// Records in listing order. The batch size bound is enforced by the store.
    #[validate(nested)]
    pub files: Vec<FileInput>,
}

/// Query for one page of a path's listing.
#[derive(Debug, Deserialize)]
pub struct DataQuery {
    /// 1-indexed page number.
    pub page: u64,
    /// Canonical path.
    pub path: String,
}

/// Query for folder visibility.
#[derive(Debug, Deserialize)]
pub struct FolderExistsQuery {
    /// Owner address.
    pub owner: String,
    /// Canonical folder path.
    pub path: String,
}
