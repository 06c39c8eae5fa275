//! Folder and file handlers for Web API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::store::{DataPage, FileRecord, FolderPath, Owner};
use crate::web::dto::{
    AddFilesRequest, AddRemoveFolderRequest, ApiQuery, DataQuery, FolderExistsQuery,
    FolderExistsResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /api/folders - Create a folder or toggle its visibility.
pub async fn add_remove_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AddRemoveFolderRequest>,
) -> Result<StatusCode, ApiError> {
    let parent = FolderPath::parse(&req.parent)?;
    let folder = req.folder.into_new_folder()?;

    state
        .drive
        .add_remove_folder(&parent, &folder, req.make_visible)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/files - File a batch of records under a path.
pub async fn add_files(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<AddFilesRequest>,
) -> Result<StatusCode, ApiError> {
    let path = FolderPath::parse(&req.path)?;
    let files = req
        .files
        .into_iter()
        .map(|f| f.into_record())
        .collect::<crate::Result<Vec<_>>>()?;

    state.drive.add_files(&path, &files).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/data - One page of ids filed under a path.
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DataQuery>,
) -> Result<Json<DataPage>, ApiError> {
    let path = FolderPath::parse(&query.path)?;
    let page = state.drive.get_data(query.page, &path).await?;
    Ok(Json(page))
}

/// GET /api/files/:id - Get a single file record.
pub async fn get_single_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FileRecord>, ApiError> {
    let file = state.drive.get_single_file(&id).await?;
    Ok(Json(file))
}

/// GET /api/folders/exists - Whether a visible folder exists.
pub async fn folder_exists(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<FolderExistsQuery>,
) -> Result<Json<FolderExistsResponse>, ApiError> {
    let owner = Owner::parse(&query.owner)?;
    let path = FolderPath::parse(&query.path)?;
    let exists = state.drive.folder_exists(&owner, &path).await?;
    Ok(Json(FolderExistsResponse { exists }))
}
