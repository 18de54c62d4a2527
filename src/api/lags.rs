//! Lag journal handlers: subjects, chapters, and body entries with
//! pagination, substring search, and category tags.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{authenticate, page_window, Ack, AppState};
use crate::error::ApiError;
use crate::store::lags::{self, LagBody, LagChapter};

#[derive(Deserialize)]
pub struct PageParams {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct IdQuery {
    #[serde(rename = "_id")]
    id: Option<String>,
}

#[derive(Deserialize)]
pub struct IdBody {
    #[serde(rename = "_id")]
    id: Option<String>,
}

#[derive(Serialize)]
struct DataResponse<T> {
    status: u16,
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            status: 200,
            success: true,
            data,
            message: None,
        }
    }
}

// ============================================================================
// Lag subjects
// ============================================================================

/// GET /api/v2/lags?page=&limit= - paginated lag subjects
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let (_, limit, skip) = page_window(params.page, params.limit, 20);

    let conn = state.db.connection();
    let data = lags::list_subjects(&conn, &user_id, skip, limit)?;

    Ok((
        StatusCode::OK,
        Json(DataResponse {
            message: Some("lags fetched successfully".to_string()),
            ..DataResponse::ok(data)
        }),
    ))
}

#[derive(Deserialize)]
pub struct AddLagBody {
    #[serde(rename = "subjectName")]
    subject_name: Option<String>,
}

/// POST /api/v2/lags - create a lag subject
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddLagBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let name = body
        .subject_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("subjectName not provided in body".to_string()))?;

    let conn = state.db.connection();
    lags::create_subject(&conn, &user_id, name)?;

    Ok((StatusCode::CREATED, Json(Ack::created())))
}

/// GET /api/v2/getLags - the full unpaginated list
pub async fn list_all(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let conn = state.db.connection();
    let data = lags::list_all_subjects(&conn, &user_id)?;

    Ok((
        StatusCode::OK,
        Json(DataResponse {
            message: Some("lags fetched successfully".to_string()),
            ..DataResponse::ok(data)
        }),
    ))
}

/// DELETE /api/v2/lags?_id= - delete a lag subject and everything under it
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("_id not provided".to_string()))?;

    let conn = state.db.connection();
    if !lags::delete_subject(&conn, &user_id, &id)? {
        return Err(ApiError::NotFound("lag subject not found".to_string()));
    }

    Ok((StatusCode::OK, Json(Ack::ok())))
}

// ============================================================================
// Chapters
// ============================================================================

#[derive(Deserialize)]
pub struct ChapterListParams {
    #[serde(rename = "subjectId")]
    subject_id: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// GET /api/v2/lagChapter?subjectId=&page=&limit= - chapters of a subject
pub async fn chapters(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ChapterListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let subject_id = params
        .subject_id
        .ok_or_else(|| ApiError::BadRequest("subjectId not provided".to_string()))?;
    let (_, limit, skip) = page_window(params.page, params.limit, 10);

    let conn = state.db.connection();
    if !lags::subject_owned(&conn, &user_id, &subject_id)? {
        return Err(ApiError::NotFound("lag subject not found".to_string()));
    }
    let data = lags::list_chapters(&conn, &subject_id, skip, limit)?;

    Ok((StatusCode::OK, Json(DataResponse::ok(data))))
}

#[derive(Deserialize)]
pub struct AddChapterBody {
    #[serde(rename = "subjectId")]
    subject_id: Option<String>,
    #[serde(rename = "chapterName")]
    chapter_name: Option<String>,
}

/// POST /api/v2/lagChapter - create a chapter under a lag subject
pub async fn create_chapter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddChapterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let (subject_id, chapter_name) = match (body.subject_id, body.chapter_name) {
        (Some(s), Some(c)) if !c.trim().is_empty() => (s, c),
        _ => {
            return Err(ApiError::BadRequest(
                "subjectId and chapterName not provided".to_string(),
            ))
        }
    };

    let conn = state.db.connection();
    if !lags::subject_owned(&conn, &user_id, &subject_id)? {
        return Err(ApiError::NotFound("lag subject not found".to_string()));
    }
    lags::create_chapter(&conn, &subject_id, chapter_name.trim())?;

    Ok((StatusCode::CREATED, Json(Ack::created())))
}

#[derive(Deserialize)]
pub struct RenameChapterBody {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "chapterName")]
    chapter_name: Option<String>,
}

#[derive(Serialize)]
struct ChapterResponse {
    status: u16,
    success: bool,
    data: LagChapter,
}

/// PATCH /api/v2/lagChapter - rename a chapter
pub async fn rename_chapter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RenameChapterBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let (id, chapter_name) = match (body.id, body.chapter_name) {
        (Some(i), Some(c)) if !c.trim().is_empty() => (i, c),
        _ => {
            return Err(ApiError::BadRequest(
                "_id and chapterName not provided".to_string(),
            ))
        }
    };

    let conn = state.db.connection();
    let data = lags::rename_chapter(&conn, &user_id, &id, chapter_name.trim())?
        .ok_or_else(|| ApiError::NotFound("chapter not found".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(ChapterResponse {
            status: 200,
            success: true,
            data,
        }),
    ))
}

/// DELETE /api/v2/lagChapter - delete a chapter and its bodies
pub async fn remove_chapter(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IdBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let id = body
        .id
        .ok_or_else(|| ApiError::BadRequest("_id not provided in body".to_string()))?;

    let conn = state.db.connection();
    if !lags::delete_chapter(&conn, &user_id, &id)? {
        return Err(ApiError::NotFound("chapter not found".to_string()));
    }

    Ok((StatusCode::OK, Json(Ack::ok())))
}

// ============================================================================
// Bodies
// ============================================================================

#[derive(Deserialize)]
pub struct BodyListParams {
    #[serde(rename = "lagChapterId")]
    lag_chapter_id: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
    q: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
struct BodyListResponse {
    status: u16,
    success: bool,
    data: Vec<LagBody>,
    page: i64,
    limit: i64,
    skip: i64,
}

/// GET /api/v2/lagBody - paginated body entries, newest first, with
/// optional substring search (`q`) and category filter
pub async fn bodies(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<BodyListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let chapter_id = params
        .lag_chapter_id
        .ok_or_else(|| ApiError::BadRequest("lagChapterId not provided".to_string()))?;

    let (page, limit, skip) = page_window(params.page, params.limit, 10);

    let conn = state.db.connection();
    if !lags::chapter_owned(&conn, &user_id, &chapter_id)? {
        return Err(ApiError::NotFound("chapter not found".to_string()));
    }

    let q = params.q.as_deref().filter(|s| !s.is_empty());
    let category = params.category.as_deref().filter(|s| !s.is_empty());
    let data = lags::list_bodies(&conn, &chapter_id, skip, limit, q, category)?;

    Ok((
        StatusCode::OK,
        Json(BodyListResponse {
            status: 200,
            success: true,
            data,
            page,
            limit,
            skip,
        }),
    ))
}

#[derive(Deserialize)]
pub struct AddBodyBody {
    // The chapter id travels as `_id` on this route
    #[serde(rename = "_id")]
    chapter_id: Option<String>,
    body: Option<String>,
    category: Option<String>,
}

#[derive(Serialize)]
struct BodyResponse {
    status: u16,
    success: bool,
    data: LagBody,
}

/// POST /api/v2/lagBody - create a body entry under a chapter
pub async fn create_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddBodyBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let (chapter_id, text) = match (body.chapter_id, body.body) {
        (Some(c), Some(t)) if !t.is_empty() => (c, t),
        _ => {
            return Err(ApiError::BadRequest(
                "lagChapterId and body not provided".to_string(),
            ))
        }
    };

    let conn = state.db.connection();
    if !lags::chapter_owned(&conn, &user_id, &chapter_id)? {
        return Err(ApiError::NotFound("chapter not found".to_string()));
    }
    let data = lags::create_body(&conn, &chapter_id, &text, body.category.as_deref())?;

    Ok((
        StatusCode::CREATED,
        Json(BodyResponse {
            status: 201,
            success: true,
            data,
        }),
    ))
}

#[derive(Deserialize)]
pub struct UpdateBodyBody {
    #[serde(rename = "_id")]
    id: Option<String>,
    body: Option<String>,
    category: Option<String>,
}

/// PATCH /api/v2/lagBody - update a body entry's text and tag
pub async fn update_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UpdateBodyBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let (id, text) = match (body.id, body.body) {
        (Some(i), Some(t)) if !t.is_empty() => (i, t),
        _ => return Err(ApiError::BadRequest("_id and body not provided".to_string())),
    };

    let conn = state.db.connection();
    let data = lags::update_body(&conn, &user_id, &id, &text, body.category.as_deref())?
        .ok_or_else(|| ApiError::NotFound("lag body not found".to_string()))?;

    Ok((
        StatusCode::OK,
        Json(BodyResponse {
            status: 200,
            success: true,
            data,
        }),
    ))
}

/// DELETE /api/v2/lagBody - delete a body entry
pub async fn remove_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<IdBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let id = body
        .id
        .ok_or_else(|| ApiError::BadRequest("_id not provided in body".to_string()))?;

    let conn = state.db.connection();
    if !lags::delete_body(&conn, &user_id, &id)? {
        return Err(ApiError::NotFound("lag body not found".to_string()));
    }

    Ok((StatusCode::OK, Json(Ack::ok())))
}
