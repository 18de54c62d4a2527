//! Subject and counter handlers: CRUD, increments/decrements, and the
//! v1/v2 summary aggregations.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{authenticate, Ack, AppState};
use crate::error::ApiError;
use crate::store::subjects::{self, Counter, Subject, SubjectCount, SubjectTotals};

#[derive(Serialize)]
struct SubjectListResponse {
    status: u16,
    success: bool,
    subjects: Vec<Subject>,
}

#[derive(Deserialize)]
pub struct AddSubjectBody {
    #[serde(rename = "subjectName")]
    subject_name: String,
}

#[derive(Deserialize)]
pub struct IdQuery {
    #[serde(rename = "_id")]
    id: Option<String>,
}

#[derive(Deserialize)]
pub struct IncAndDcsParams {
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "type")]
    counter: Option<String>,
    action: Option<String>,
    count: Option<i64>,
}

#[derive(Deserialize)]
pub struct IncAndDcrEventBody {
    #[serde(rename = "type")]
    counter: Option<String>,
    count: Option<i64>,
}

#[derive(Serialize)]
struct SummaryResponse {
    status: u16,
    success: bool,
    subjects: Vec<SubjectCount>,
    #[serde(rename = "totalQuestion")]
    total_question: i64,
}

#[derive(Serialize)]
struct SummaryV2Response {
    status: u16,
    success: bool,
    subjects: Vec<SubjectTotals>,
    #[serde(rename = "overallCount")]
    overall_count: i64,
}

fn parse_counter(s: &str) -> Result<Counter, ApiError> {
    Counter::parse(s).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "invalid type, must be one of: {}",
            Counter::WIRE_NAMES.join(", ")
        ))
    })
}

/// GET /api/v1/subject - the caller's subjects with counters
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let conn = state.db.connection();
    let subjects = subjects::list(&conn, &user_id)?;
    Ok((
        StatusCode::OK,
        Json(SubjectListResponse {
            status: 200,
            success: true,
            subjects,
        }),
    ))
}

/// POST /api/v1/subject - create a subject with zeroed counters
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AddSubjectBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    if body.subject_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "subjectName not provided in body".to_string(),
        ));
    }

    let conn = state.db.connection();
    subjects::create(&conn, &user_id, body.subject_name.trim())?;

    Ok((StatusCode::OK, Json(Ack::ok())))
}

/// DELETE /api/v1/subject?_id= - delete one of the caller's subjects
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
    if !subjects::delete(&conn, &user_id, &id)? {
        return Err(ApiError::NotFound("subject not found".to_string()));
    }

    Ok((StatusCode::OK, Json(Ack::ok())))
}

/// PATCH /api/v1/incAndDcs?_id=&type=&action=&count= - bump one counter
pub async fn inc_and_dcs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<IncAndDcsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let id = params
        .id
        .ok_or_else(|| ApiError::BadRequest("_id not provided".to_string()))?;
    let counter = parse_counter(
        params
            .counter
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("type not provided".to_string()))?,
    )?;

    let count = params.count.unwrap_or(1);
    if count < 1 {
        return Err(ApiError::BadRequest("count must be at least 1".to_string()));
    }

    let action = params
        .action
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("action not provided".to_string()))?;
    let delta = match action {
        "increment" => count,
        "decrement" => -count,
        _ => {
            return Err(ApiError::BadRequest(
                "invalid action, must be 'increment' or 'decrement'".to_string(),
            ))
        }
    };

    let conn = state.db.connection();
    if !subjects::adjust_counter(&conn, &user_id, &id, counter, delta)? {
        return Err(ApiError::NotFound("subject not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        Json(Ack::ok().with_message(format!("{} {}ed successfully", counter.as_str(), action))),
    ))
}

/// GET /api/v1/questionCount - per-subject counter sums and the total
pub async fn question_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let conn = state.db.connection();
    let (subjects, total) = subjects::summary(&conn, &user_id)?;

    Ok((
        StatusCode::OK,
        Json(SummaryResponse {
            status: 200,
            success: true,
            subjects,
            total_question: total,
        }),
    ))
}

/// GET /api/v2/questionCount - the dashboard aggregation with full
/// counter breakdowns
pub async fn question_count_v2(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let conn = state.db.connection();
    let (subjects, overall) = subjects::summary_v2(&conn, &user_id)?;

    Ok((
        StatusCode::OK,
        Json(SummaryV2Response {
            status: 200,
            success: true,
            subjects,
            overall_count: overall,
        }),
    ))
}

/// POST /api/v2/incAndDcrEvent?_id= - signed counter adjustment: positive
/// counts increment, negative counts decrement
pub async fn inc_and_dcr_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
    Json(body): Json<IncAndDcrEventBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = authenticate(&state, &headers)?;

    let id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("_id not provided".to_string()))?;
    let counter = parse_counter(
        body.counter
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("type not provided".to_string()))?,
    )?;
    let count = body
        .count
        .ok_or_else(|| ApiError::BadRequest("count not provided".to_string()))?;
    if count == 0 {
        return Err(ApiError::BadRequest("count must be non-zero".to_string()));
    }

    let conn = state.db.connection();
    if !subjects::adjust_counter(&conn, &user_id, &id, counter, count)? {
        return Err(ApiError::NotFound("subject data not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        Json(Ack::ok().with_message("question count updated successfully")),
    ))
}
