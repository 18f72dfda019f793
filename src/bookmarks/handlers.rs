use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    bookmarks::{
        dto::{BookmarkResponse, BookmarksResponse, CreateBookmarkRequest, UpdateBookmarkRequest},
        repo::Bookmark,
    },
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route(
            "/bookmarks/:id",
            get(get_bookmark)
                .patch(update_bookmark)
                .delete(delete_bookmark),
        )
}

/// Ownership guard shared by the by-id operations: a missing bookmark and a
/// foreign one are indistinguishable to the caller.
async fn find_owned_or_deny(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<Bookmark, ApiError> {
    Bookmark::find_owned(&state.db, user_id, id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, bookmark_id = %id, "access to bookmark denied");
            ApiError::access_denied()
        })
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_bookmarks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<BookmarksResponse>, ApiError> {
    let bookmarks = Bookmark::list_by_owner(&state.db, user.id).await?;
    Ok(Json(BookmarksResponse { bookmarks }))
}

#[instrument(skip_all, fields(user_id = %user.id, bookmark_id = %id))]
pub async fn get_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BookmarkResponse>, ApiError> {
    let bookmark = find_owned_or_deny(&state, user.id, id).await?;
    Ok(Json(BookmarkResponse { bookmark }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title must not be empty"));
    }
    if payload.url.trim().is_empty() {
        return Err(ApiError::bad_request("Url must not be empty"));
    }

    let bookmark = Bookmark::create(
        &state.db,
        user.id,
        &payload.title,
        payload.description.as_deref(),
        &payload.url,
    )
    .await?;

    info!(bookmark_id = %bookmark.id, "bookmark created");
    Ok((StatusCode::CREATED, Json(BookmarkResponse { bookmark })))
}

#[instrument(skip_all, fields(user_id = %user.id, bookmark_id = %id))]
pub async fn update_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookmarkRequest>,
) -> Result<Json<BookmarkResponse>, ApiError> {
    find_owned_or_deny(&state, user.id, id).await?;

    let bookmark = Bookmark::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.url.as_deref(),
    )
    .await?;

    info!("bookmark updated");
    Ok(Json(BookmarkResponse { bookmark }))
}

#[instrument(skip_all, fields(user_id = %user.id, bookmark_id = %id))]
pub async fn delete_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    find_owned_or_deny(&state, user.id, id).await?;

    Bookmark::delete(&state.db, id).await?;

    info!("bookmark deleted");
    Ok(StatusCode::NO_CONTENT)
}
