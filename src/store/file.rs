//! File records and repository for the file index.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::folder::validate_id;
use super::path::{validate_segment, FolderPath, Owner};
use super::MAX_FILENAME_LENGTH;
use crate::{LedgerboxError, Result};

/// Kind of content a file record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FileType {
    #[default]
    Image = 0,
    Video = 1,
    Audio = 2,
    Document = 3,
    Other = 4,
}

impl TryFrom<u8> for FileType {
    type Error = LedgerboxError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FileType::Image),
            1 => Ok(FileType::Video),
            2 => Ok(FileType::Audio),
            3 => Ok(FileType::Document),
            4 => Ok(FileType::Other),
            other => Err(LedgerboxError::Validation(format!("unknown file type: {other}"))),
        }
    }
}

impl From<FileType> for u8 {
    fn from(file_type: FileType) -> Self {
        file_type as u8
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Document => "document",
            FileType::Other => "other",
        };
        f.write_str(name)
    }
}

/// A file record. Records are write-once and keyed globally by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Display name, including extension.
    pub name: String,
    /// Content kind.
    pub file_type: FileType,
    /// Upload time as Unix seconds.
    pub uploaded_on: i64,
    /// Uploading owner.
    #[serde(alias = "uploadedBY")]
    pub uploaded_by: Owner,
    /// Extension without the leading dot.
    pub file_extension: String,
    /// Opaque hash of the referenced content.
    pub data_hash: String,
    /// Folder path the file is filed under, or that path plus the file name.
    pub path: FolderPath,
    /// Whether the content may be served without the owner.
    pub can_public_access: bool,
    /// Globally unique id.
    pub id: String,
    /// Content size in megabytes.
    pub file_size: f64,
}

impl FileRecord {
    /// The conventional id: `fl_<path owner>_<name stem>_<data hash>`.
    pub fn conventional_id(owner: &Owner, name: &str, data_hash: &str) -> String {
        format!("fl_{}_{}_{}", owner, file_stem(name), data_hash)
    }

    /// Validate this record for insertion under `target`.
    pub fn validate(&self, target: &FolderPath) -> Result<()> {
        validate_segment(&self.name)?;
        if self.name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(LedgerboxError::Validation(format!(
                "file name must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }
        validate_id(&self.id)?;
        if self.data_hash.is_empty() {
            return Err(LedgerboxError::Validation(format!(
                "file {} has an empty data hash",
                self.id
            )));
        }
        if !self.file_size.is_finite() || self.file_size < 0.0 {
            return Err(LedgerboxError::Validation(format!(
                "file {} has an invalid size: {}",
                self.id, self.file_size
            )));
        }
        if self.uploaded_on < 0 {
            return Err(LedgerboxError::Validation(format!(
                "file {} has a negative upload time",
                self.id
            )));
        }

        let filed_under_target = self.path == *target
            || (self.path.name() == Some(self.name.as_str())
                && self.path.parent().as_ref() == Some(target));
        if !filed_under_target {
            return Err(LedgerboxError::InvalidPath(format!(
                "file {} has path {} outside {}",
                self.id, self.path, target
            )));
        }

        Ok(())
    }
}

/// Name without its final extension; dotfiles keep their full name.
fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Extension after the final dot, empty when there is none.
fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => "",
    }
}

/// Builder for file records following the id and extension conventions.
#[derive(Debug, Clone)]
pub struct NewFile {
    name: String,
    uploaded_by: Owner,
    data_hash: String,
    path: FolderPath,
    file_type: FileType,
    uploaded_on: i64,
    file_extension: Option<String>,
    can_public_access: bool,
    id: Option<String>,
    file_size: f64,
}

impl NewFile {
    /// Start a record for `name` filed at `path`.
    pub fn new(
        name: impl Into<String>,
        uploaded_by: Owner,
        data_hash: impl Into<String>,
        path: FolderPath,
    ) -> Self {
        Self {
            name: name.into(),
            uploaded_by,
            data_hash: data_hash.into(),
            path,
            file_type: FileType::default(),
            uploaded_on: Utc::now().timestamp(),
            file_extension: None,
            can_public_access: false,
            id: None,
            file_size: 0.0,
        }
    }

    /// Set the content kind.
    pub fn with_file_type(mut self, file_type: FileType) -> Self {
        self.file_type = file_type;
        self
    }

    /// Set the upload time.
    pub fn with_uploaded_on(mut self, uploaded_on: i64) -> Self {
        self.uploaded_on = uploaded_on;
        self
    }

    /// Override the extension derived from the name.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = Some(extension.into());
        self
    }

    /// Set public access.
    pub fn with_public_access(mut self, can_public_access: bool) -> Self {
        self.can_public_access = can_public_access;
        self
    }

    /// Override the conventional id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the size in megabytes.
    pub fn with_size_mb(mut self, file_size: f64) -> Self {
        self.file_size = file_size;
        self
    }

    /// Build the record, validating it against its own path's folder.
    pub fn build(self) -> Result<FileRecord> {
        let id = self.id.unwrap_or_else(|| {
            FileRecord::conventional_id(self.path.owner(), &self.name, &self.data_hash)
        });
        let file_extension = self
            .file_extension
            .unwrap_or_else(|| file_extension(&self.name).to_string());

        let record = FileRecord {
            name: self.name,
            file_type: self.file_type,
            uploaded_on: self.uploaded_on,
            uploaded_by: self.uploaded_by,
            file_extension,
            data_hash: self.data_hash,
            path: self.path,
            can_public_access: self.can_public_access,
            id,
            file_size: self.file_size,
        };
        record.validate(&record.path)?;

        Ok(record)
    }
}

/// Raw file row.
#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: String,
    name: String,
    file_type: i64,
    uploaded_on: i64,
    uploaded_by: String,
    file_extension: String,
    data_hash: String,
    path: String,
    can_public_access: bool,
    file_size: f64,
}

impl FileRow {
    fn into_record(self) -> Result<FileRecord> {
        let file_type = u8::try_from(self.file_type)
            .map_err(|_| corrupt_row(format!("file type {}", self.file_type)))
            .and_then(|v| FileType::try_from(v).map_err(|e| corrupt_row(e.to_string())))?;

        Ok(FileRecord {
            file_type,
            uploaded_by: Owner::parse(&self.uploaded_by).map_err(|e| corrupt_row(e.to_string()))?,
            path: FolderPath::parse(&self.path).map_err(|e| corrupt_row(e.to_string()))?,
            id: self.id,
            name: self.name,
            uploaded_on: self.uploaded_on,
            file_extension: self.file_extension,
            data_hash: self.data_hash,
            can_public_access: self.can_public_access,
            file_size: self.file_size,
        })
    }
}

fn corrupt_row(detail: String) -> LedgerboxError {
    LedgerboxError::Database(format!("corrupt file row: {detail}"))
}

/// Repository for file record operations.
pub struct FileRepository;

impl FileRepository {
    /// Insert a record. Fails with `DuplicateFileId` if the id is taken.
    pub async fn insert(conn: &mut SqliteConnection, file: &FileRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO files (id, name, file_type, uploaded_on, uploaded_by, file_extension,
                                data_hash, path, can_public_access, file_size)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&file.id)
        .bind(&file.name)
        .bind(u8::from(file.file_type) as i64)
        .bind(file.uploaded_on)
        .bind(file.uploaded_by.as_str())
        .bind(&file.file_extension)
        .bind(&file.data_hash)
        .bind(file.path.as_str())
        .bind(file.can_public_access)
        .bind(file.file_size)
        .execute(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                LedgerboxError::DuplicateFileId(file.id.clone())
            }
            e => LedgerboxError::Database(e.to_string()),
        })?;

        Ok(())
    }

    /// Whether a record with `id` exists.
    pub async fn exists(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM files WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// Get a record by id.
    pub async fn get_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<FileRecord>> {
        let row: Option<FileRow> = sqlx::query_as(
            "SELECT id, name, file_type, uploaded_on, uploaded_by, file_extension,
                    data_hash, path, can_public_access, file_size
             FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(FileRow::into_record).transpose()
    }
}
