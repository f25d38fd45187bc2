//! Route handlers. Each one is a thin translation onto `AttendanceApi`.

use super::caller::AuthenticatedCaller;
use super::error::ApiError;
use super::AppState;
use attendance_session::{
    AttendanceApi, AttendanceRecord, AttendanceReport, RedeemReceipt, RedeemRequest,
    SessionSnapshot, SessionStarted, SessionStatus,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use shared_types::{CourseId, SessionDate};

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub ended: bool,
}

pub async fn start_session(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(course_id): Path<CourseId>,
) -> Result<(StatusCode, Json<SessionStarted>), ApiError> {
    let started = state.service.start_session(&caller, &course_id).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

pub async fn end_session(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(course_id): Path<CourseId>,
) -> Result<Json<EndResponse>, ApiError> {
    let ended = state.service.end_session(&caller, &course_id).await?;
    Ok(Json(EndResponse { ended }))
}

pub async fn session_snapshot(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path(course_id): Path<CourseId>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(state.service.session_snapshot(&caller, &course_id).await?))
}

pub async fn attendance_report(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Path((course_id, date)): Path<(CourseId, String)>,
) -> Result<Json<AttendanceReport>, ApiError> {
    let session_date: SessionDate = date
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid date {date:?}, expected YYYY-MM-DD")))?;
    let report = state
        .service
        .attendance_report(&caller, &course_id, session_date)
        .await?;
    Ok(Json(report))
}

pub async fn mark_attendance(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<RedeemReceipt>, ApiError> {
    Ok(Json(state.service.redeem(&caller, request).await?))
}

pub async fn attendance_history(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    Ok(Json(state.service.attendance_history(&caller).await?))
}

pub async fn session_status(
    State(state): State<AppState>,
    Path(course_id): Path<CourseId>,
) -> Json<SessionStatus> {
    Json(state.service.session_status(&course_id))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
