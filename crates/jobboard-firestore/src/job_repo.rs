//! Repository for job listings and their applications.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use tracing::{info, warn};

use jobboard_models::rating::{summarize, upsert_rating, validate_rating};
use jobboard_models::{
    ActiveJobsPage, ApplicationData, ApplicationStatus, JobApplication, JobId, JobListing,
    JobRating, NewJobListing, RatingSummary, SearchFilters, UserApplication, UserApplicationsPage,
};

use crate::aggregation::paginate_applications;
use crate::codec::{
    application_to_fields, document_to_application, document_to_job, fields, job_to_fields,
    ratings_from, ratings_to_value,
};
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_engagement, record_view_failure};
use crate::pagination::{active_jobs_query, normalize_page_size, split_page, PageCursor};
use crate::retry::{retry_on_conflict, MAX_CONFLICT_ATTEMPTS};
use crate::search::{apply_residual_filters, build_search_query};
use crate::store::DocumentStore;
use crate::types::{
    Document, FieldTransform, Filter, FromFirestoreValue, Precondition, StructuredQuery,
    ToFirestoreValue, Write,
};

pub const JOBS_COLLECTION: &str = "jobs";
pub const APPLICATIONS_COLLECTION: &str = "applications";

const JOB_NOT_FOUND: &str = "Job not found";
const ALREADY_APPLIED: &str = "You have already applied to this job";

/// Repository for job listing documents.
#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn DocumentStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn job_name(&self, job_id: &str) -> String {
        self.store.document_name(JOBS_COLLECTION, job_id)
    }

    fn applications_collection(job_id: &str) -> String {
        format!("{}/{}/{}", JOBS_COLLECTION, job_id, APPLICATIONS_COLLECTION)
    }

    /// Parse job documents, skipping (and logging) any that are malformed.
    fn parse_jobs(docs: &[Document]) -> Vec<JobListing> {
        docs.iter()
            .filter_map(|doc| match document_to_job(doc) {
                Ok(job) => Some(job),
                Err(e) => {
                    warn!(doc = ?doc.name, "Skipping malformed job document: {}", e);
                    None
                }
            })
            .collect()
    }

    async fn load_job_document(&self, job_id: &str) -> FirestoreResult<Document> {
        self.store
            .get_document(JOBS_COLLECTION, job_id)
            .await?
            .ok_or_else(|| FirestoreError::not_found(JOB_NOT_FOUND))
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Create a listing with fresh counters. Returns the generated ID.
    pub async fn create_job_listing(&self, new_job: NewJobListing) -> FirestoreResult<JobId> {
        new_job.validate().map_err(FirestoreError::InvalidArgument)?;

        let listing = new_job.into_listing(JobId::from_string(""), Utc::now());
        let doc = self
            .store
            .create_document(JOBS_COLLECTION, None, job_to_fields(&listing))
            .await?;

        let job_id = doc
            .id()
            .map(JobId::from_string)
            .ok_or_else(|| FirestoreError::InvalidResponse("Created job has no name".to_string()))?;

        info!(job_id = %job_id, posted_by = %listing.posted_by, "Created job listing");
        Ok(job_id)
    }

    /// One page of active jobs, newest first.
    ///
    /// `cursor` is the `lastDoc` of the previous page.
    pub async fn get_active_jobs(
        &self,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> FirestoreResult<ActiveJobsPage> {
        let page_size = normalize_page_size(limit);
        let cursor = cursor
            .map(|c| {
                PageCursor::decode(c)
                    .ok_or_else(|| FirestoreError::invalid_argument("Invalid pagination cursor"))
            })
            .transpose()?;

        let docs = self
            .store
            .run_query("", active_jobs_query(JOBS_COLLECTION, page_size, cursor.as_ref()))
            .await?;
        let (docs, has_more) = split_page(docs, page_size);

        let first_doc = docs.first().and_then(cursor_for).map(|c| c.encode());
        let last_doc = if has_more {
            docs.last().and_then(cursor_for).map(|c| c.encode())
        } else {
            None
        };

        Ok(ActiveJobsPage {
            jobs: Self::parse_jobs(&docs),
            has_more,
            last_doc,
            first_doc,
        })
    }

    pub async fn get_active_jobs_count(&self) -> FirestoreResult<u64> {
        let query = StructuredQuery::collection(JOBS_COLLECTION)
            .filter(Filter::equal(fields::STATUS, "active".to_firestore_value()));
        self.store.count("", query).await
    }

    pub async fn get_job_by_id(&self, job_id: &str) -> FirestoreResult<JobListing> {
        let doc = self.load_job_document(job_id).await?;
        document_to_job(&doc)
    }

    /// Active jobs matching `filters`. See [`crate::search`] for the limit semantics.
    pub async fn search_jobs(&self, filters: &SearchFilters) -> FirestoreResult<Vec<JobListing>> {
        let docs = self
            .store
            .run_query("", build_search_query(JOBS_COLLECTION, filters))
            .await?;
        Ok(apply_residual_filters(Self::parse_jobs(&docs), filters))
    }

    // =========================================================================
    // Applications
    // =========================================================================

    /// Record an application in one atomic commit.
    ///
    /// The application document is keyed by the applicant's user ID and must not
    /// exist yet, so a concurrent duplicate fails the whole commit and the
    /// applicant count is never incremented twice.
    pub async fn apply_to_job(
        &self,
        job_id: &str,
        user_id: &str,
        data: ApplicationData,
    ) -> FirestoreResult<JobApplication> {
        let job = self.get_job_by_id(job_id).await?;
        if job.has_applicant(user_id) {
            return Err(FirestoreError::AlreadyApplied(ALREADY_APPLIED.to_string()));
        }

        let application = JobApplication {
            id: user_id.to_string(),
            user_id: user_id.to_string(),
            applied_at: Utc::now(),
            status: ApplicationStatus::Pending,
            cover_letter: data.cover_letter,
            resume_url: data.resume_url,
        };

        let job_write = Write::transform(
            self.job_name(job_id),
            vec![
                FieldTransform::append_missing(fields::APPLICANTS, vec![user_id.to_firestore_value()]),
                FieldTransform::increment(fields::APPLICANT_COUNT, 1),
                FieldTransform::request_time(fields::UPDATED_AT),
            ],
        );
        let application_write = Write::update(
            self.store
                .document_name(&Self::applications_collection(job_id), user_id),
            application_to_fields(&application),
            None,
        )
        .with_precondition(Precondition::exists(false));

        match self.store.commit(vec![job_write, application_write]).await {
            Ok(()) => {}
            Err(FirestoreError::AlreadyExists(_)) => {
                return Err(FirestoreError::AlreadyApplied(ALREADY_APPLIED.to_string()))
            }
            Err(FirestoreError::NotFound(_)) => return Err(FirestoreError::not_found(JOB_NOT_FOUND)),
            Err(e) => {
                warn!(job_id = %job_id, user_id = %user_id, "Failed to record application: {}", e);
                return Err(e);
            }
        }

        record_engagement("application");
        info!(job_id = %job_id, user_id = %user_id, "Recorded job application");
        Ok(application)
    }

    /// All of a user's applications joined with their jobs, newest first.
    ///
    /// Issues one query per job the user applied to.
    pub async fn get_user_applications(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> FirestoreResult<UserApplicationsPage> {
        let limit = normalize_page_size(limit) as usize;

        let job_query = StructuredQuery::collection(JOBS_COLLECTION)
            .filter(Filter::array_contains(fields::APPLICANTS, user_id.to_firestore_value()));
        let jobs = Self::parse_jobs(&self.store.run_query("", job_query).await?);

        let lookups = jobs.iter().map(|job| {
            let parent = format!("{}/{}", JOBS_COLLECTION, job.id);
            let query = StructuredQuery::collection(APPLICATIONS_COLLECTION)
                .filter(Filter::equal(fields::USER_ID, user_id.to_firestore_value()));
            async move { self.store.run_query(&parent, query).await }
        });
        let per_job = try_join_all(lookups).await?;

        let mut applications = Vec::new();
        for (job, docs) in jobs.iter().zip(per_job) {
            for doc in &docs {
                match document_to_application(doc) {
                    Ok(application) => applications.push(UserApplication {
                        id: application.id.clone(),
                        job_id: job.id.to_string(),
                        job: job.clone(),
                        application,
                    }),
                    Err(e) => warn!(job_id = %job.id, "Skipping malformed application: {}", e),
                }
            }
        }

        Ok(paginate_applications(applications, limit))
    }

    // =========================================================================
    // Engagement
    // =========================================================================

    /// Add or replace the caller's rating and recompute the aggregate.
    ///
    /// The ratings array is rewritten under an `updateTime` precondition and
    /// retried when another writer got there first.
    pub async fn rate_job(
        &self,
        job_id: &str,
        user_id: &str,
        rating: i64,
        comment: Option<String>,
    ) -> FirestoreResult<RatingSummary> {
        let stars = validate_rating(rating).map_err(FirestoreError::InvalidArgument)?;
        let name = self.job_name(job_id);

        let summary = retry_on_conflict("rate_job", MAX_CONFLICT_ATTEMPTS, || async {
            let doc = self.load_job_document(job_id).await?;
            let update_time = current_update_time(&doc)?;

            let mut ratings = ratings_from(doc.field(fields::RATINGS));
            upsert_rating(&mut ratings, JobRating::new(user_id, stars, comment.clone()));
            let summary = summarize(&ratings);

            let mut updates = HashMap::new();
            updates.insert(fields::RATINGS.to_string(), ratings_to_value(&ratings));
            updates.insert(
                fields::AVERAGE_RATING.to_string(),
                summary.average_rating.to_firestore_value(),
            );
            updates.insert(
                fields::RATING_COUNT.to_string(),
                summary.rating_count.to_firestore_value(),
            );

            let write = Write::update(
                name.clone(),
                updates,
                Some(vec![
                    fields::RATINGS.to_string(),
                    fields::AVERAGE_RATING.to_string(),
                    fields::RATING_COUNT.to_string(),
                ]),
            )
            .with_transforms(vec![FieldTransform::request_time(fields::UPDATED_AT)])
            .with_precondition(Precondition::update_time(update_time));

            self.store.commit(vec![write]).await?;
            Ok(summary)
        })
        .await?;

        record_engagement("rating");
        info!(
            job_id = %job_id,
            user_id = %user_id,
            average = summary.average_rating,
            count = summary.rating_count,
            "Rated job"
        );
        Ok(summary)
    }

    /// Toggle the caller's bookmark. Returns whether the job is now saved.
    pub async fn save_job(&self, job_id: &str, user_id: &str) -> FirestoreResult<bool> {
        let name = self.job_name(job_id);

        let saved = retry_on_conflict("save_job", MAX_CONFLICT_ATTEMPTS, || async {
            let doc = self.load_job_document(job_id).await?;
            let update_time = current_update_time(&doc)?;

            let saved_by: Vec<String> = doc
                .field(fields::SAVES_USER_IDS)
                .and_then(Vec::<String>::from_firestore_value)
                .unwrap_or_default();
            let member = vec![user_id.to_firestore_value()];

            let (transforms, saved) = if saved_by.iter().any(|u| u == user_id) {
                (
                    vec![
                        FieldTransform::remove_all(fields::SAVES_USER_IDS, member),
                        FieldTransform::increment(fields::SAVES, -1),
                    ],
                    false,
                )
            } else {
                (
                    vec![
                        FieldTransform::append_missing(fields::SAVES_USER_IDS, member),
                        FieldTransform::increment(fields::SAVES, 1),
                    ],
                    true,
                )
            };

            let mut transforms = transforms;
            transforms.push(FieldTransform::request_time(fields::UPDATED_AT));

            let write = Write::transform(name.clone(), transforms)
                .with_precondition(Precondition::update_time(update_time));
            self.store.commit(vec![write]).await?;
            Ok(saved)
        })
        .await?;

        record_engagement(if saved { "save" } else { "unsave" });
        info!(job_id = %job_id, user_id = %user_id, saved, "Toggled saved job");
        Ok(saved)
    }

    /// Best-effort view increment. Failures are logged, never returned.
    pub async fn increment_job_views(&self, job_id: &str) {
        let write = Write::transform(
            self.job_name(job_id),
            vec![FieldTransform::increment(fields::VIEWS, 1)],
        );

        match self.store.commit(vec![write]).await {
            Ok(()) => record_engagement("view"),
            Err(e) => {
                record_view_failure();
                warn!(job_id = %job_id, "Failed to increment job views: {}", e);
            }
        }
    }
}

/// Cursor at a job document's position in the active-jobs order.
fn cursor_for(doc: &Document) -> Option<PageCursor> {
    let posted_at = doc
        .field(fields::POSTED_AT)
        .and_then(chrono::DateTime::<Utc>::from_firestore_value)?;
    Some(PageCursor::new(&posted_at, doc.name.clone()?))
}

fn current_update_time(doc: &Document) -> FirestoreResult<String> {
    doc.update_time
        .clone()
        .ok_or_else(|| FirestoreError::InvalidResponse("Document has no updateTime".to_string()))
}
