//! Drive: the operation surface of the store.
//!
//! Every mutation runs in one database transaction and either commits
//! entirely or leaves the store untouched. Reads see committed state only.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::file::{FileRecord, FileRepository};
use super::folder::{Folder, FolderRepository, NewFolder};
use super::listing::{DataPage, ListingRepository};
use super::path::{FolderPath, Owner};
use super::{DEFAULT_PAGE_SIZE, MAX_BATCH_SIZE};
use crate::db::Database;
use crate::{LedgerboxError, Result};

/// Handle to a folder and file store.
#[derive(Debug, Clone)]
pub struct Drive {
    db: Arc<Database>,
    page_size: u64,
}

impl Drive {
    /// Create a Drive with the default page size.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            page_size: DEFAULT_PAGE_SIZE as u64,
        }
    }

    /// Set the number of ids per page. Must be positive.
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(LedgerboxError::Validation(
                "page size must be positive".to_string(),
            ));
        }
        self.page_size = page_size as u64;
        Ok(self)
    }

    /// Number of ids per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Create the folder `parent/<name>` or toggle its visibility.
    ///
    /// On first creation the folder id is appended to `parent`'s listing.
    /// Later calls only overwrite the visibility flag; the stored name,
    /// id and creation fields are kept.
    pub async fn add_remove_folder(
        &self,
        parent: &FolderPath,
        folder: &NewFolder,
        make_visible: bool,
    ) -> Result<Folder> {
        let path = parent.join(&folder.name)?;
        let id = folder.resolve_id(&path);

        let mut tx = self.db.begin().await?;

        let created =
            FolderRepository::insert_if_absent(&mut *tx, &path, folder, &id, make_visible).await?;
        if created {
            ListingRepository::append(&mut *tx, parent, std::slice::from_ref(&id)).await?;
        } else {
            FolderRepository::set_visibility(&mut *tx, &path, make_visible).await?;
        }

        let stored = FolderRepository::get(&mut *tx, path.owner(), &path)
            .await?
            .ok_or_else(|| LedgerboxError::NotFound(format!("folder {path}")))?;

        tx.commit().await?;

        if created {
            info!(path = %path, id = %stored.id, visible = make_visible, "Created folder");
        } else {
            debug!(path = %path, visible = make_visible, "Toggled folder visibility");
        }

        Ok(stored)
    }

    /// Whether a visible folder exists at `path` for `owner`.
    ///
    /// Paths rooted at a different owner never match.
    pub async fn folder_exists(&self, owner: &Owner, path: &FolderPath) -> Result<bool> {
        if path.owner() != owner {
            return Ok(false);
        }
        let mut conn = self.db.pool().acquire().await?;
        FolderRepository::exists(&mut conn, owner, path).await
    }

    /// Get the folder record at `path`, visible or not.
    pub async fn get_folder(&self, path: &FolderPath) -> Result<Folder> {
        let mut conn = self.db.pool().acquire().await?;
        FolderRepository::get(&mut conn, path.owner(), path)
            .await?
            .ok_or_else(|| LedgerboxError::NotFound(format!("folder {path}")))
    }

    /// File a batch of records under `path`, preserving input order.
    ///
    /// The batch is rejected as a whole if any record is malformed, filed
    /// outside `path`, or reuses an id (within the batch or already stored).
    pub async fn add_files(&self, path: &FolderPath, files: &[FileRecord]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        if files.len() > MAX_BATCH_SIZE {
            return Err(LedgerboxError::Validation(format!(
                "at most {MAX_BATCH_SIZE} files per batch"
            )));
        }

        if let Err(e) = Self::check_batch(path, files) {
            warn!(path = %path, error = %e, "Rejected file batch");
            return Err(e);
        }

        let ids: Vec<String> = files.iter().map(|f| f.id.clone()).collect();

        let mut tx = self.db.begin().await?;

        // Counter bump first so the write lock is held before any reads.
        ListingRepository::append(&mut *tx, path, &ids).await?;

        for file in files {
            if FileRepository::exists(&mut *tx, &file.id).await? {
                warn!(path = %path, id = %file.id, "Rejected file batch: id already stored");
                return Err(LedgerboxError::DuplicateFileId(file.id.clone()));
            }
            FileRepository::insert(&mut *tx, file).await?;
        }

        tx.commit().await?;

        info!(path = %path, count = files.len(), "Added files");
        Ok(())
    }

    fn check_batch(path: &FolderPath, files: &[FileRecord]) -> Result<()> {
        let mut seen = HashSet::with_capacity(files.len());
        for file in files {
            file.validate(path)?;
            if !seen.insert(file.id.as_str()) {
                return Err(LedgerboxError::DuplicateFileId(file.id.clone()));
            }
        }
        Ok(())
    }

    /// Read one 1-indexed page of ids filed under `path`.
    ///
    /// Page 0, pages past the end and unknown paths give an empty id list.
    pub async fn get_data(&self, page_number: u64, path: &FolderPath) -> Result<DataPage> {
        let mut conn = self.db.pool().acquire().await?;
        ListingRepository::page(&mut conn, path, page_number, self.page_size).await
    }

    /// Get a file record by id.
    pub async fn get_single_file(&self, id: &str) -> Result<FileRecord> {
        let mut conn = self.db.pool().acquire().await?;
        FileRepository::get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| LedgerboxError::NotFound(format!("file {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileType, NewFile};

    const OWNER: &str = "0xee3ff2c59989597D3a823771Fe5f8F7BfF3Ee79b";
    const UPLOADER: &str = "0x627306090abaB3A6e1400e9345bC60c78a8BEf57";

    fn owner() -> Owner {
        Owner::parse(OWNER).unwrap()
    }

    fn uploader() -> Owner {
        Owner::parse(UPLOADER).unwrap()
    }

    fn root() -> FolderPath {
        FolderPath::root(owner())
    }

    async fn setup_drive() -> Drive {
        let db = Database::open_in_memory().await.unwrap();
        Drive::new(Arc::new(db))
    }

    fn file_at(dir: &FolderPath, name: &str, hash: &str) -> FileRecord {
        NewFile::new(name, uploader(), hash, dir.join(name).unwrap())
            .with_file_type(FileType::Image)
            .with_uploaded_on(1651643792)
            .with_size_mb(1.0)
            .build()
            .unwrap()
    }

    fn test_folder(created_on: i64) -> NewFolder {
        NewFolder::new("test", uploader(), created_on).unwrap()
    }

    #[tokio::test]
    async fn test_with_page_size_rejects_zero() {
        let drive = setup_drive().await;
        assert!(matches!(
            drive.clone().with_page_size(0),
            Err(LedgerboxError::Validation(_))
        ));
        assert_eq!(drive.with_page_size(3).unwrap().page_size(), 3);
    }

    #[tokio::test]
    async fn test_add_folder_lists_id_under_parent() {
        let drive = setup_drive().await;

        let folder = drive
            .add_remove_folder(&root(), &test_folder(1651643762), true)
            .await
            .unwrap();

        assert_eq!(folder.id, format!("fd_{OWNER}_test"));
        assert_eq!(folder.path, root().join("test").unwrap());
        assert!(folder.exists);

        let page = drive.get_data(1, &root()).await.unwrap();
        assert_eq!(page, DataPage(1, vec![folder.id]));
    }

    #[tokio::test]
    async fn test_toggle_is_idempotent_and_keeps_metadata() {
        let drive = setup_drive().await;
        let path = root().join("test").unwrap();

        drive
            .add_remove_folder(&root(), &test_folder(1), true)
            .await
            .unwrap();
        drive
            .add_remove_folder(&root(), &test_folder(2), true)
            .await
            .unwrap();
        assert!(drive.folder_exists(&owner(), &path).await.unwrap());

        let hidden = drive
            .add_remove_folder(&root(), &test_folder(3), false)
            .await
            .unwrap();
        assert!(!hidden.exists);
        assert_eq!(hidden.created_on, 1);
        assert!(!drive.folder_exists(&owner(), &path).await.unwrap());

        drive
            .add_remove_folder(&root(), &test_folder(4), true)
            .await
            .unwrap();
        assert!(drive.folder_exists(&owner(), &path).await.unwrap());

        // Only the first call appends to the parent's listing.
        assert_eq!(drive.get_data(1, &root()).await.unwrap().ids().len(), 1);
    }

    #[tokio::test]
    async fn test_add_hidden_folder() {
        let drive = setup_drive().await;
        let path = root().join("test").unwrap();

        drive
            .add_remove_folder(&root(), &test_folder(1), false)
            .await
            .unwrap();

        assert!(!drive.folder_exists(&owner(), &path).await.unwrap());
        assert!(!drive.get_folder(&path).await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_folder_exists_unknown_and_foreign_owner() {
        let drive = setup_drive().await;
        let path = root().join("test").unwrap();

        assert!(!drive.folder_exists(&owner(), &path).await.unwrap());

        drive
            .add_remove_folder(&root(), &test_folder(1), true)
            .await
            .unwrap();
        assert!(!drive.folder_exists(&uploader(), &path).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_folder_not_found() {
        let drive = setup_drive().await;
        let result = drive.get_folder(&root().join("missing").unwrap()).await;
        assert!(matches!(result, Err(LedgerboxError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_folder_id_reused_at_other_path() {
        let drive = setup_drive().await;
        let first = test_folder(1).with_id("fd_shared").unwrap();
        let second = NewFolder::new("other", owner(), 1)
            .unwrap()
            .with_id("fd_shared")
            .unwrap();

        drive.add_remove_folder(&root(), &first, true).await.unwrap();
        let result = drive.add_remove_folder(&root(), &second, true).await;

        assert!(matches!(result, Err(LedgerboxError::DuplicateFolderId(_))));
        assert_eq!(drive.get_data(1, &root()).await.unwrap().ids(), ["fd_shared"]);
    }

    #[tokio::test]
    async fn test_add_files_append_order_across_batches() {
        let drive = setup_drive().await;
        let a = file_at(&root(), "a.png", "ha");
        let b = file_at(&root(), "b.png", "hb");
        let c = file_at(&root(), "c.png", "hc");

        drive.add_files(&root(), &[a.clone(), b.clone()]).await.unwrap();
        drive.add_files(&root(), &[c.clone()]).await.unwrap();

        let page = drive.get_data(1, &root()).await.unwrap();
        assert_eq!(page, DataPage(1, vec![a.id, b.id, c.id]));
    }

    #[tokio::test]
    async fn test_add_files_empty_batch() {
        let drive = setup_drive().await;
        drive.add_files(&root(), &[]).await.unwrap();
        assert_eq!(drive.get_data(1, &root()).await.unwrap(), DataPage(0, vec![]));
    }

    #[tokio::test]
    async fn test_add_files_duplicate_within_batch() {
        let drive = setup_drive().await;
        let a = file_at(&root(), "a.png", "ha");
        let mut copy = file_at(&root(), "b.png", "hb");
        copy.id = a.id.clone();

        let result = drive.add_files(&root(), &[a.clone(), copy]).await;

        assert!(matches!(result, Err(LedgerboxError::DuplicateFileId(id)) if id == a.id));
        assert!(matches!(
            drive.get_single_file(&a.id).await,
            Err(LedgerboxError::NotFound(_))
        ));
        assert_eq!(drive.get_data(1, &root()).await.unwrap(), DataPage(0, vec![]));
    }

    #[tokio::test]
    async fn test_add_files_duplicate_of_stored_rolls_back() {
        let drive = setup_drive().await;
        let a = file_at(&root(), "a.png", "ha");
        let b = file_at(&root(), "b.png", "hb");

        drive.add_files(&root(), &[a.clone()]).await.unwrap();
        let result = drive.add_files(&root(), &[b.clone(), a.clone()]).await;

        assert!(matches!(result, Err(LedgerboxError::DuplicateFileId(_))));
        assert!(matches!(
            drive.get_single_file(&b.id).await,
            Err(LedgerboxError::NotFound(_))
        ));
        assert_eq!(drive.get_data(1, &root()).await.unwrap(), DataPage(1, vec![a.id]));
    }

    #[tokio::test]
    async fn test_add_files_rejects_foreign_path() {
        let drive = setup_drive().await;
        let elsewhere = root().join("elsewhere").unwrap();
        let good = file_at(&root(), "a.png", "ha");
        let misfiled = file_at(&elsewhere, "b.png", "hb");

        let result = drive.add_files(&root(), &[good.clone(), misfiled]).await;

        assert!(matches!(result, Err(LedgerboxError::InvalidPath(_))));
        assert!(drive.get_single_file(&good.id).await.is_err());
    }

    #[tokio::test]
    async fn test_files_under_unregistered_folder() {
        let drive = setup_drive().await;
        let dir = root().join("never-created").unwrap();
        let file = file_at(&dir, "a.png", "ha");

        drive.add_files(&dir, &[file.clone()]).await.unwrap();

        assert!(!drive.folder_exists(&owner(), &dir).await.unwrap());
        assert_eq!(drive.get_data(1, &dir).await.unwrap().ids(), [file.id]);
    }

    #[tokio::test]
    async fn test_hidden_folder_contents_still_listed() {
        let drive = setup_drive().await;
        let dir = root().join("test").unwrap();
        let file = file_at(&dir, "a.png", "ha");

        drive
            .add_remove_folder(&root(), &test_folder(1), true)
            .await
            .unwrap();
        drive.add_files(&dir, &[file.clone()]).await.unwrap();
        drive
            .add_remove_folder(&root(), &test_folder(1), false)
            .await
            .unwrap();

        assert_eq!(drive.get_data(1, &dir).await.unwrap().ids(), [file.id.clone()]);
        assert_eq!(drive.get_single_file(&file.id).await.unwrap(), file);
    }

    #[tokio::test]
    async fn test_pagination_bounds() {
        let drive = setup_drive().await.with_page_size(2).unwrap();
        let files: Vec<FileRecord> = (0..5)
            .map(|i| file_at(&root(), &format!("f{i}.png"), &format!("h{i}")))
            .collect();
        drive.add_files(&root(), &files).await.unwrap();

        let first = drive.get_data(1, &root()).await.unwrap();
        assert_eq!(first.page_count(), 3);
        assert_eq!(first.ids(), [files[0].id.clone(), files[1].id.clone()]);

        let last = drive.get_data(3, &root()).await.unwrap();
        assert_eq!(last.ids(), [files[4].id.clone()]);

        assert_eq!(drive.get_data(4, &root()).await.unwrap(), DataPage(3, vec![]));
        assert_eq!(drive.get_data(0, &root()).await.unwrap(), DataPage(3, vec![]));
    }

    #[tokio::test]
    async fn test_get_single_file_round_trip() {
        let drive = setup_drive().await;
        let file = file_at(&root(), "a.png", "ha");

        drive.add_files(&root(), &[file.clone()]).await.unwrap();

        let stored = drive.get_single_file(&file.id).await.unwrap();
        assert_eq!(stored, file);
        assert_eq!(stored.uploaded_by, uploader());
    }

    #[tokio::test]
    async fn test_get_single_file_not_found() {
        let drive = setup_drive().await;
        let result = drive.get_single_file("fl_missing").await;
        assert!(matches!(result, Err(LedgerboxError::NotFound(_))));
    }
}
