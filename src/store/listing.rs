//! Append-only per-path listings and fixed-size paging.
//!
//! Every path owns a counter row and a dense run of positions
//! `0..entry_count`. Appends bump the counter first and write the new
//! positions after it, so a page is a range read over at most `page_size`
//! rows and the total is a single-row read.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::path::FolderPath;
use crate::Result;

/// One page of a listing: `(page_count, ids)`.
///
/// Serializes as the two-element array `[page_count, [ids...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataPage(pub u64, pub Vec<String>);

impl DataPage {
    /// Total number of pages for the path.
    pub fn page_count(&self) -> u64 {
        self.0
    }

    /// Ids on this page, in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.1
    }
}

/// Number of pages needed for `total` entries.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size)
}

/// Half-open position range of a 1-indexed page, or `None` when the page
/// is out of range.
pub fn page_bounds(page_number: u64, page_size: u64, total: u64) -> Option<(u64, u64)> {
    if page_number == 0 {
        return None;
    }
    let start = (page_number - 1).checked_mul(page_size)?;
    if start >= total {
        return None;
    }
    Some((start, total.min(start.saturating_add(page_size))))
}

/// Repository for listing operations.
pub struct ListingRepository;

impl ListingRepository {
    /// Append ids to the end of `path`'s listing.
    ///
    /// Returns the position of the first appended id.
    pub async fn append(conn: &mut SqliteConnection, path: &FolderPath, ids: &[String]) -> Result<u64> {
        let added = ids.len() as i64;

        let new_count: i64 = sqlx::query_scalar(
            "INSERT INTO listings (path, entry_count) VALUES (?, ?)
             ON CONFLICT (path) DO UPDATE SET entry_count = entry_count + excluded.entry_count
             RETURNING entry_count",
        )
        .bind(path.as_str())
        .bind(added)
        .fetch_one(&mut *conn)
        .await?;

        let start = new_count - added;
        for (offset, id) in ids.iter().enumerate() {
            sqlx::query("INSERT INTO listing_entries (path, position, item_id) VALUES (?, ?, ?)")
                .bind(path.as_str())
                .bind(start + offset as i64)
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(start as u64)
    }

    /// Number of entries under `path`.
    pub async fn count(conn: &mut SqliteConnection, path: &FolderPath) -> Result<u64> {
        let count: Option<i64> = sqlx::query_scalar("SELECT entry_count FROM listings WHERE path = ?")
            .bind(path.as_str())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(count.unwrap_or(0) as u64)
    }

    /// Ids at positions `start..end` under `path`.
    pub async fn range(
        conn: &mut SqliteConnection,
        path: &FolderPath,
        start: u64,
        end: u64,
    ) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT item_id FROM listing_entries
             WHERE path = ? AND position >= ? AND position < ?
             ORDER BY position",
        )
        .bind(path.as_str())
        .bind(start as i64)
        .bind(end as i64)
        .fetch_all(&mut *conn)
        .await?;

        Ok(ids)
    }

    /// Read one 1-indexed page of `path`'s listing.
    pub async fn page(
        conn: &mut SqliteConnection,
        path: &FolderPath,
        page_number: u64,
        page_size: u64,
    ) -> Result<DataPage> {
        let total = Self::count(conn, path).await?;
        let pages = page_count(total, page_size);

        let ids = match page_bounds(page_number, page_size, total) {
            Some((start, end)) => Self::range(conn, path, start, end).await?,
            None => Vec::new(),
        };

        Ok(DataPage(pages, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::path::Owner;
    use crate::Database;

    const OWNER: &str = "0xee3ff2c59989597D3a823771Fe5f8F7BfF3Ee79b";

    fn root() -> FolderPath {
        FolderPath::root(Owner::parse(OWNER).unwrap())
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(7, 1), 7);
    }

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(1, 10, 25), Some((0, 10)));
        assert_eq!(page_bounds(3, 10, 25), Some((20, 25)));
        assert_eq!(page_bounds(4, 10, 25), None);
        assert_eq!(page_bounds(0, 10, 25), None);
        assert_eq!(page_bounds(1, 10, 0), None);
        assert_eq!(page_bounds(u64::MAX, 10, 25), None);
    }

    #[test]
    fn test_data_page_serializes_as_pair() {
        let page = DataPage(2, ids(&["a", "b"]));
        assert_eq!(serde_json::to_string(&page).unwrap(), r#"[2,["a","b"]]"#);
        assert_eq!(page.page_count(), 2);
        assert_eq!(page.ids(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_append_keeps_order_across_batches() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let first = ListingRepository::append(&mut conn, &root(), &ids(&["a", "b"]))
            .await
            .unwrap();
        let second = ListingRepository::append(&mut conn, &root(), &ids(&["c"]))
            .await
            .unwrap();

        assert_eq!(first, 0);
        assert_eq!(second, 2);
        assert_eq!(ListingRepository::count(&mut conn, &root()).await.unwrap(), 3);
        assert_eq!(
            ListingRepository::range(&mut conn, &root(), 0, 3).await.unwrap(),
            ids(&["a", "b", "c"])
        );
    }

    #[tokio::test]
    async fn test_page_slices() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        ListingRepository::append(&mut conn, &root(), &ids(&["a", "b", "c", "d", "e"]))
            .await
            .unwrap();

        let page1 = ListingRepository::page(&mut conn, &root(), 1, 2).await.unwrap();
        assert_eq!(page1, DataPage(3, ids(&["a", "b"])));

        let page3 = ListingRepository::page(&mut conn, &root(), 3, 2).await.unwrap();
        assert_eq!(page3, DataPage(3, ids(&["e"])));

        let page4 = ListingRepository::page(&mut conn, &root(), 4, 2).await.unwrap();
        assert_eq!(page4, DataPage(3, vec![]));
    }

    #[tokio::test]
    async fn test_page_unknown_path() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let unknown = root().join("nothing").unwrap();

        let page = ListingRepository::page(&mut conn, &unknown, 1, 10).await.unwrap();
        assert_eq!(page, DataPage(0, vec![]));
    }

    #[tokio::test]
    async fn test_paths_are_independent() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let child = root().join("test").unwrap();

        ListingRepository::append(&mut conn, &root(), &ids(&["a"]))
            .await
            .unwrap();
        ListingRepository::append(&mut conn, &child, &ids(&["b", "c"]))
            .await
            .unwrap();

        assert_eq!(ListingRepository::count(&mut conn, &root()).await.unwrap(), 1);
        assert_eq!(ListingRepository::count(&mut conn, &child).await.unwrap(), 2);
    }
}
