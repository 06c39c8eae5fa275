//! Response DTOs for Web API.

use serde::Serialize;

/// Folder visibility response.
#[derive(Debug, Serialize)]
pub struct FolderExistsResponse {
    /// Whether a visible folder exists at the path.
    pub exists: bool,
}
