//! Question bank handlers: subjects, chapters, and questions.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{authenticate, page_window, Ack, AppState};
use crate::error::ApiError;
use crate::store::question_bank as qb;

#[derive(Serialize)]
struct DataResponse<T> {
    status: u16,
    success: bool,
    data: T,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            status: 200,
            success: true,
            data,
        }
    }
}

/// GET /api/v2/questionBank - the caller's question bank subjects
pub async fn list_subjects(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let conn = state.db.connection();
    let data = qb::list_subjects(&conn, &user_id)?;
    Ok((StatusCode::OK, Json(DataResponse::ok(data))))
}

#[derive(Deserialize)]
pub struct AddSubjectBody {
    #[serde(rename = "subjectName")]
    subject_name: Option<String>,
}

/// POST /api/v2/questionBank - create a question bank subject
pub async fn create_subject(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddSubjectBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let name = body
        .subject_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("subjectName not provided in body".to_string()))?;

    let conn = state.db.connection();
    qb::create_subject(&conn, &user_id, name)?;

    Ok((StatusCode::CREATED, Json(Ack::created())))
}

#[derive(Deserialize)]
pub struct ChapterListParams {
    #[serde(rename = "subjectId")]
    subject_id: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// GET /api/v2/questionBank/chapter?subjectId=&page=&limit= - chapters
pub async fn list_chapters(
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
    if !qb::subject_owned(&conn, &user_id, &subject_id)? {
        return Err(ApiError::NotFound("subject not found".to_string()));
    }
    let data = qb::list_chapters(&conn, &subject_id, skip, limit)?;

    Ok((StatusCode::OK, Json(DataResponse::ok(data))))
}

#[derive(Deserialize)]
pub struct AddChapterBody {
    #[serde(rename = "subjectId")]
    subject_id: Option<String>,
    #[serde(rename = "chapterName")]
    chapter_name: Option<String>,
}

/// POST /api/v2/questionBank/chapter - create a chapter
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
    if !qb::subject_owned(&conn, &user_id, &subject_id)? {
        return Err(ApiError::NotFound("subject not found".to_string()));
    }
    qb::create_chapter(&conn, &subject_id, chapter_name.trim())?;

    Ok((StatusCode::CREATED, Json(Ack::created())))
}

#[derive(Deserialize)]
pub struct QuestionListParams {
    #[serde(rename = "chapterId")]
    chapter_id: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
}

/// GET /api/v2/questionBank/question?chapterId=&page=&limit= - questions
pub async fn list_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let chapter_id = params
        .chapter_id
        .ok_or_else(|| ApiError::BadRequest("chapterId not provided".to_string()))?;

    let (_, limit, skip) = page_window(params.page, params.limit, 10);

    let conn = state.db.connection();
    if !qb::chapter_owned(&conn, &user_id, &chapter_id)? {
        return Err(ApiError::NotFound("chapter not found".to_string()));
    }
    let data = qb::list_questions(&conn, &chapter_id, skip, limit)?;

    Ok((StatusCode::OK, Json(DataResponse::ok(data))))
}

#[derive(Deserialize)]
pub struct AddQuestionBody {
    #[serde(rename = "chapterId")]
    chapter_id: Option<String>,
    src: Option<String>,
    answer: Option<f64>,
}

/// POST /api/v2/questionBank/question - create a question
pub async fn create_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddQuestionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let (chapter_id, src, answer) = match (body.chapter_id, body.src, body.answer) {
        (Some(c), Some(s), Some(a)) if !s.is_empty() => (c, s, a),
        _ => {
            return Err(ApiError::BadRequest(
                "chapterId, src and answer not provided".to_string(),
            ))
        }
    };

    let conn = state.db.connection();
    if !qb::chapter_owned(&conn, &user_id, &chapter_id)? {
        return Err(ApiError::NotFound("chapter not found".to_string()));
    }
    qb::create_question(&conn, &chapter_id, &src, answer)?;

    Ok((StatusCode::CREATED, Json(Ack::created())))
}
