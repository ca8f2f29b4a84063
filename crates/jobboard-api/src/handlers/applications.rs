//! Handlers for the caller's engagement with a job: apply, rate, save.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use jobboard_models::{ApplicationData, JobApplication, RatingSummary, UserApplicationsPage};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::document_id;
use crate::security::{sanitize_string, validate_document_url, MAX_MESSAGE_LENGTH};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RateJobRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveJobResponse {
    /// Whether the job is saved after the toggle.
    pub saved: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationsQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

fn clean_application(data: ApplicationData) -> ApiResult<ApplicationData> {
    let resume_url = data
        .resume_url
        .filter(|u| !u.trim().is_empty())
        .map(|u| validate_document_url(&u).map_err(ApiError::Validation))
        .transpose()?;
    let cover_letter = data
        .cover_letter
        .map(|c| sanitize_string(&c, MAX_MESSAGE_LENGTH))
        .filter(|c| !c.is_empty());

    Ok(ApplicationData {
        cover_letter,
        resume_url,
    })
}

/// Apply to a job. The body is optional.
pub async fn apply_to_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
    body: Option<Json<ApplicationData>>,
) -> ApiResult<(StatusCode, Json<JobApplication>)> {
    let job_id = document_id(&job_id)?;
    let data = clean_application(body.map(|Json(d)| d).unwrap_or_default())?;

    let application = state.jobs.apply_to_job(job_id, &user.uid, data).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn rate_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
    Json(request): Json<RateJobRequest>,
) -> ApiResult<Json<RatingSummary>> {
    let job_id = document_id(&job_id)?;
    let comment = request
        .comment
        .map(|c| sanitize_string(&c, MAX_MESSAGE_LENGTH));

    let summary = state
        .jobs
        .rate_job(job_id, &user.uid, request.rating, comment)
        .await?;
    Ok(Json(summary))
}

/// Toggle the caller's bookmark on a job.
pub async fn save_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<SaveJobResponse>> {
    let job_id = document_id(&job_id)?;
    let saved = state.jobs.save_job(job_id, &user.uid).await?;
    Ok(Json(SaveJobResponse { saved }))
}

/// The caller's applications joined with their jobs, newest first.
pub async fn my_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationsQuery>,
) -> ApiResult<Json<UserApplicationsPage>> {
    let page = state
        .jobs
        .get_user_applications(&user.uid, query.limit)
        .await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_application() {
        let cleaned = clean_application(ApplicationData {
            cover_letter: Some("  ".into()),
            resume_url: Some("https://files.example.com/cv.pdf".into()),
        })
        .unwrap();
        assert!(cleaned.cover_letter.is_none());
        assert_eq!(
            cleaned.resume_url.as_deref(),
            Some("https://files.example.com/cv.pdf")
        );

        let err = clean_application(ApplicationData {
            cover_letter: None,
            resume_url: Some("http://127.0.0.1/cv.pdf".into()),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
