//! Folder types and repository for the folder index.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::path::{validate_segment, FolderPath, Owner, PATH_SEPARATOR};
use super::MAX_ID_LENGTH;
use crate::{LedgerboxError, Result};

/// A folder in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Folder name (last segment of its path).
    pub name: String,
    /// Globally unique folder id.
    pub id: String,
    /// Canonical path of the folder.
    pub path: FolderPath,
    /// Owner that created the folder.
    pub created_by: Owner,
    /// Creation time as Unix seconds.
    pub created_on: i64,
    /// Visibility flag toggled by add/remove.
    pub exists: bool,
}

impl Folder {
    /// The conventional id for a folder at `path`: `fd_` followed by the
    /// path with separators replaced by `_`.
    pub fn conventional_id(path: &FolderPath) -> String {
        format!("fd_{}", path.id_fragment())
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFolder {
    /// Folder name, a single path segment.
    pub name: String,
    /// Explicit id; the conventional id is used when unset.
    pub id: Option<String>,
    /// Creating owner.
    pub created_by: Owner,
    /// Creation time as Unix seconds.
    pub created_on: i64,
}

impl NewFolder {
    /// Create a new NewFolder, validating the name as a path segment.
    pub fn new(name: impl Into<String>, created_by: Owner, created_on: i64) -> Result<Self> {
        let name = name.into();
        validate_segment(&name)?;
        if created_on < 0 {
            return Err(LedgerboxError::Validation(format!(
                "folder {name} has a negative creation time"
            )));
        }

        Ok(Self {
            name,
            id: None,
            created_by,
            created_on,
        })
    }

    /// Set an explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_id(&id)?;
        self.id = Some(id);
        Ok(self)
    }

    /// The id this folder is stored under when created at `path`.
    pub fn resolve_id(&self, path: &FolderPath) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| Folder::conventional_id(path))
    }
}

/// Check a record id: non-empty, bounded, no whitespace or separators.
pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LedgerboxError::Validation("id must not be empty".to_string()));
    }
    if id.chars().count() > MAX_ID_LENGTH {
        return Err(LedgerboxError::Validation(format!(
            "id must be at most {MAX_ID_LENGTH} characters"
        )));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(LedgerboxError::Validation(format!(
            "id must not contain whitespace: {id}"
        )));
    }
    if id.contains(PATH_SEPARATOR) {
        return Err(LedgerboxError::Validation(format!(
            "id must not contain '{PATH_SEPARATOR}': {id}"
        )));
    }
    Ok(())
}

/// Raw folder row.
#[derive(Debug, sqlx::FromRow)]
struct FolderRow {
    path: String,
    id: String,
    name: String,
    created_by: String,
    created_on: i64,
    is_visible: bool,
}

impl FolderRow {
    fn into_folder(self) -> Result<Folder> {
        Ok(Folder {
            path: FolderPath::parse(&self.path).map_err(corrupt_row)?,
            created_by: Owner::parse(&self.created_by).map_err(corrupt_row)?,
            name: self.name,
            id: self.id,
            created_on: self.created_on,
            exists: self.is_visible,
        })
    }
}

fn corrupt_row(e: LedgerboxError) -> LedgerboxError {
    LedgerboxError::Database(format!("corrupt folder row: {e}"))
}

/// Repository for folder operations.
///
/// Every function runs on a caller-supplied connection so it can take part
/// in a transaction.
pub struct FolderRepository;

impl FolderRepository {
    /// Insert a folder unless one already exists at its `(owner, path)`.
    ///
    /// Returns `true` when a row was created.
    pub async fn insert_if_absent(
        conn: &mut SqliteConnection,
        path: &FolderPath,
        folder: &NewFolder,
        id: &str,
        visible: bool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO folders (owner, path, id, name, created_by, created_on, is_visible)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (owner, path) DO NOTHING",
        )
        .bind(path.owner().as_str())
        .bind(path.as_str())
        .bind(id)
        .bind(&folder.name)
        .bind(folder.created_by.as_str())
        .bind(folder.created_on)
        .bind(visible)
        .execute(&mut *conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                LedgerboxError::DuplicateFolderId(id.to_string())
            }
            e => LedgerboxError::Database(e.to_string()),
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the visibility flag of an existing folder.
    ///
    /// Returns `false` when no folder exists at `(owner, path)`.
    pub async fn set_visibility(
        conn: &mut SqliteConnection,
        path: &FolderPath,
        visible: bool,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE folders SET is_visible = ? WHERE owner = ? AND path = ?")
            .bind(visible)
            .bind(path.owner().as_str())
            .bind(path.as_str())
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the folder at `(owner, path)`.
    pub async fn get(
        conn: &mut SqliteConnection,
        owner: &Owner,
        path: &FolderPath,
    ) -> Result<Option<Folder>> {
        let row: Option<FolderRow> = sqlx::query_as(
            "SELECT path, id, name, created_by, created_on, is_visible
             FROM folders WHERE owner = ? AND path = ?",
        )
        .bind(owner.as_str())
        .bind(path.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(FolderRow::into_folder).transpose()
    }

    /// Whether a visible folder exists at `(owner, path)`.
    pub async fn exists(
        conn: &mut SqliteConnection,
        owner: &Owner,
        path: &FolderPath,
    ) -> Result<bool> {
        let visible: Option<bool> =
            sqlx::query_scalar("SELECT is_visible FROM folders WHERE owner = ? AND path = ?")
                .bind(owner.as_str())
                .bind(path.as_str())
                .fetch_optional(&mut *conn)
                .await?;

        Ok(visible.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    const OWNER: &str = "0xee3ff2c59989597D3a823771Fe5f8F7BfF3Ee79b";

    fn owner() -> Owner {
        Owner::parse(OWNER).unwrap()
    }

    fn test_path() -> FolderPath {
        FolderPath::new(owner(), ["test"]).unwrap()
    }

    #[test]
    fn test_new_folder_validates_name() {
        assert!(NewFolder::new("test", owner(), 0).is_ok());
        assert!(matches!(
            NewFolder::new("", owner(), 0),
            Err(LedgerboxError::InvalidPath(_))
        ));
        assert!(matches!(
            NewFolder::new("a/b", owner(), 0),
            Err(LedgerboxError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_id_conventional_and_explicit() {
        let folder = NewFolder::new("test", owner(), 0).unwrap();
        assert_eq!(folder.resolve_id(&test_path()), format!("fd_{OWNER}_test"));

        let folder = folder.with_id("custom").unwrap();
        assert_eq!(folder.resolve_id(&test_path()), "custom");
    }

    #[test]
    fn test_with_id_rejects_bad_ids() {
        let folder = NewFolder::new("test", owner(), 0).unwrap();
        assert!(folder.clone().with_id("").is_err());
        assert!(folder.clone().with_id("has space").is_err());
        assert!(matches!(
            folder.with_id("fd/nested"),
            Err(LedgerboxError::Validation(_))
        ));
    }

    #[test]
    fn test_new_folder_rejects_negative_created_on() {
        assert!(NewFolder::new("test", owner(), 0).is_ok());
        assert!(matches!(
            NewFolder::new("test", owner(), -1),
            Err(LedgerboxError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let new_folder = NewFolder::new("test", owner(), 1651643762).unwrap();
        let id = new_folder.resolve_id(&test_path());

        let created = FolderRepository::insert_if_absent(&mut conn, &test_path(), &new_folder, &id, true)
            .await
            .unwrap();
        assert!(created);

        let folder = FolderRepository::get(&mut conn, &owner(), &test_path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(folder.id, id);
        assert_eq!(folder.name, "test");
        assert_eq!(folder.created_by, owner());
        assert!(folder.exists);
    }

    #[tokio::test]
    async fn test_insert_existing_is_ignored() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let first = NewFolder::new("test", owner(), 1).unwrap();
        let second = NewFolder::new("test", owner(), 2).unwrap();
        let id = first.resolve_id(&test_path());

        assert!(FolderRepository::insert_if_absent(&mut conn, &test_path(), &first, &id, true)
            .await
            .unwrap());
        assert!(!FolderRepository::insert_if_absent(&mut conn, &test_path(), &second, &id, false)
            .await
            .unwrap());

        let folder = FolderRepository::get(&mut conn, &owner(), &test_path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(folder.created_on, 1);
        assert!(folder.exists);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_at_other_path() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let folder = NewFolder::new("test", owner(), 1).unwrap();
        let other_path = FolderPath::new(owner(), ["other"]).unwrap();

        FolderRepository::insert_if_absent(&mut conn, &test_path(), &folder, "fd_same", true)
            .await
            .unwrap();
        let result =
            FolderRepository::insert_if_absent(&mut conn, &other_path, &folder, "fd_same", true).await;

        assert!(matches!(result, Err(LedgerboxError::DuplicateFolderId(_))));
    }

    #[tokio::test]
    async fn test_set_visibility_and_exists() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let folder = NewFolder::new("test", owner(), 1).unwrap();
        let id = folder.resolve_id(&test_path());

        assert!(!FolderRepository::set_visibility(&mut conn, &test_path(), false)
            .await
            .unwrap());

        FolderRepository::insert_if_absent(&mut conn, &test_path(), &folder, &id, true)
            .await
            .unwrap();
        assert!(FolderRepository::exists(&mut conn, &owner(), &test_path())
            .await
            .unwrap());

        assert!(FolderRepository::set_visibility(&mut conn, &test_path(), false)
            .await
            .unwrap());
        assert!(!FolderRepository::exists(&mut conn, &owner(), &test_path())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_exists_unknown_path() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(!FolderRepository::exists(&mut conn, &owner(), &test_path())
            .await
            .unwrap());
    }
}
