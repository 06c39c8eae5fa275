//! Owner identities and hierarchical folder paths.
//!
//! A [`FolderPath`] is an [`Owner`] followed by zero or more segments and is
//! always held in its canonical form `owner/seg1/seg2`. Two paths are equal
//! exactly when their canonical strings are equal; no case or whitespace
//! normalization is applied.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LedgerboxError, Result};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Number of hex digits in an owner address.
const OWNER_HEX_DIGITS: usize = 40;

/// A 20-byte owner address written as `0x` plus 40 hex digits.
///
/// The address is kept verbatim, so `0xAB..` and `0xab..` are different owners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner(String);

impl Owner {
    /// Parse an owner address.
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| LedgerboxError::InvalidPath(format!("owner must start with 0x: {s}")))?;

        if digits.len() != OWNER_HEX_DIGITS || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerboxError::InvalidPath(format!(
                "owner must be 0x followed by {OWNER_HEX_DIGITS} hex digits: {s}"
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// The address as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Owner {
    type Err = LedgerboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Owner {
    type Error = LedgerboxError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        owner.0
    }
}

/// Check that a single path segment is non-empty and separator-free.
pub fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(LedgerboxError::InvalidPath("empty path segment".to_string()));
    }
    if segment.contains(PATH_SEPARATOR) {
        return Err(LedgerboxError::InvalidPath(format!(
            "segment contains '{PATH_SEPARATOR}': {segment}"
        )));
    }
    Ok(())
}

/// A canonical folder address rooted at an owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderPath {
    owner: Owner,
    canonical: String,
}

impl FolderPath {
    /// Build a path from an owner and its segments.
    pub fn new<I, S>(owner: Owner, segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = owner.as_str().to_string();
        for segment in segments {
            let segment = segment.as_ref();
            validate_segment(segment)?;
            canonical.push(PATH_SEPARATOR);
            canonical.push_str(segment);
        }

        Ok(Self { owner, canonical })
    }

    /// The root path of an owner.
    pub fn root(owner: Owner) -> Self {
        let canonical = owner.as_str().to_string();
        Self { owner, canonical }
    }

    /// Parse a canonical path string.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(PATH_SEPARATOR);
        let owner = Owner::parse(parts.next().unwrap_or_default())?;
        Self::new(owner, parts)
    }

    /// Append a segment, returning the child path.
    pub fn join(&self, segment: &str) -> Result<Self> {
        validate_segment(segment)?;
        Ok(Self {
            owner: self.owner.clone(),
            canonical: format!("{}{PATH_SEPARATOR}{segment}", self.canonical),
        })
    }

    /// The parent path, or `None` for an owner root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let (parent, _) = self.canonical.rsplit_once(PATH_SEPARATOR)?;
        Some(Self {
            owner: self.owner.clone(),
            canonical: parent.to_string(),
        })
    }

    /// The last segment, or `None` for an owner root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.canonical.rsplit(PATH_SEPARATOR).next()
    }

    /// The owner this path is rooted at.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Segments below the owner.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.canonical.split(PATH_SEPARATOR).skip(1)
    }

    /// Number of segments below the owner (0 for a root).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether this is an owner root.
    pub fn is_root(&self) -> bool {
        self.canonical.len() == self.owner.as_str().len()
    }

    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The canonical string with separators replaced by `_`, used in ids.
    pub fn id_fragment(&self) -> String {
        self.canonical.replace(PATH_SEPARATOR, "_")
    }
}

impl PartialEq for FolderPath {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for FolderPath {}

impl Hash for FolderPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for FolderPath {
    type Err = LedgerboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FolderPath {
    type Error = LedgerboxError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<FolderPath> for String {
    fn from(path: FolderPath) -> Self {
        path.canonical
    }
}
