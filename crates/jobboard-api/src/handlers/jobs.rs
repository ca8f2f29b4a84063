//! Job listing handlers: browse, search, view and post.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use jobboard_models::{
    ActiveJobsPage, ExperienceLevel, JobListing, JobType, NewJobListing, SearchFilters,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::document_id;
use crate::state::AppState;

/// Query parameters for the job list.
#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default)]
    pub limit: Option<u32>,
    /// `lastDoc` of the previous page.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Query parameters for job search. `skills` is comma separated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchJobsQuery {
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub min_salary: Option<f64>,
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchJobsQuery {
    pub fn into_filters(self) -> ApiResult<SearchFilters> {
        let job_type = self
            .job_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                JobType::from_str(s)
                    .ok_or_else(|| ApiError::bad_request(format!("Unknown jobType: {}", s)))
            })
            .transpose()?;
        let experience_level = self
            .experience_level
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                ExperienceLevel::from_str(s).ok_or_else(|| {
                    ApiError::bad_request(format!("Unknown experienceLevel: {}", s))
                })
            })
            .transpose()?;

        let skills = self
            .skills
            .map(|s| {
                s.split(',')
                    .map(|skill| skill.trim().to_string())
                    .filter(|skill| !skill.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(SearchFilters {
            skills,
            location: self.location,
            job_type,
            experience_level,
            min_salary: self.min_salary,
            remote: self.remote,
            limit_count: self.limit,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SearchJobsResponse {
    pub jobs: Vec<JobListing>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct JobCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// One page of active jobs, newest first.
pub async fn list_active_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<ActiveJobsPage>> {
    let cursor = query.cursor.as_deref().filter(|c| !c.is_empty());
    let page = state.jobs.get_active_jobs(query.limit, cursor).await?;
    Ok(Json(page))
}

pub async fn count_active_jobs(State(state): State<AppState>) -> ApiResult<Json<JobCountResponse>> {
    let count = state.jobs.get_active_jobs_count().await?;
    Ok(Json(JobCountResponse { count }))
}

pub async fn search_jobs(
    State(state): State<AppState>,
    Query(query): Query<SearchJobsQuery>,
) -> ApiResult<Json<SearchJobsResponse>> {
    let filters = query.into_filters()?;
    debug!(?filters, "Searching jobs");

    let jobs = state.jobs.search_jobs(&filters).await?;
    Ok(Json(SearchJobsResponse {
        count: jobs.len(),
        jobs,
    }))
}

/// Fetch one job and count the view in the background.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobListing>> {
    let job_id = document_id(&job_id)?;
    let job = state.jobs.get_job_by_id(job_id).await?;

    let jobs = state.jobs.clone();
    let id = job_id.to_string();
    tokio::spawn(async move {
        jobs.increment_job_views(&id).await;
    });

    Ok(Json(job))
}

/// Post a listing owned by the caller.
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut listing): Json<NewJobListing>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    listing.posted_by = user.uid.clone();
    listing
        .validate()
        .map_err(ApiError::Validation)?;

    let job_id = state.jobs.create_job_listing(listing).await?;
    info!(uid = %user.uid, job_id = %job_id.as_str(), "Job posted");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: job_id.as_str().to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_into_filters() {
        let query = SearchJobsQuery {
            skills: Some("rust, go,,".into()),
            job_type: Some("part-time".into()),
            experience_level: Some("".into()),
            min_salary: Some(50000.0),
            ..Default::default()
        };
        let filters = query.into_filters().unwrap();
        assert_eq!(filters.skills, vec!["rust".to_string(), "go".to_string()]);
        assert_eq!(filters.job_type, Some(JobType::PartTime));
        assert_eq!(filters.experience_level, None);
        assert_eq!(filters.min_salary, Some(50000.0));
    }

    #[test]
    fn test_search_query_rejects_unknown_enum() {
        let query = SearchJobsQuery {
            job_type: Some("gig".into()),
            ..Default::default()
        };
        assert!(matches!(query.into_filters(), Err(ApiError::BadRequest(_))));
    }
}
