//! Database schema and migrations for Ledgerbox.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script executed in order. The schema_version
/// table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Folder and file indexes
    r#"
-- Folders keyed by owner and canonical path; only is_visible changes after insert
CREATE TABLE folders (
    owner       TEXT NOT NULL,
    path        TEXT NOT NULL,
    id          TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    created_by  TEXT NOT NULL,
    created_on  INTEGER NOT NULL,
    is_visible  INTEGER NOT NULL,
    PRIMARY KEY (owner, path)
);

-- File records keyed by globally unique id; rows are write-once
CREATE TABLE files (
    id                  TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    file_type           INTEGER NOT NULL,
    uploaded_on         INTEGER NOT NULL,
    uploaded_by         TEXT NOT NULL,
    file_extension      TEXT NOT NULL,
    data_hash           TEXT NOT NULL,
    path                TEXT NOT NULL,
    can_public_access   INTEGER NOT NULL,
    file_size           REAL NOT NULL
);
"#,
    // v2: Append-only per-path listings
    r#"
-- One counter row per path; entry_count is the next free position
CREATE TABLE listings (
    path        TEXT PRIMARY KEY,
    entry_count INTEGER NOT NULL DEFAULT 0
);

-- Dense positions 0..entry_count per path
CREATE TABLE listing_entries (
    path        TEXT NOT NULL REFERENCES listings(path),
    position    INTEGER NOT NULL,
    item_id     TEXT NOT NULL,
    PRIMARY KEY (path, position)
);
"#,
];
