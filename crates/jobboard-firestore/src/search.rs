//! Job search: store-side equality filters plus in-memory residual filters.
//!
//! Equality predicates (`jobType`, `experienceLevel`, `location.remote`) run in
//! the store. Skills, location and salary are applied afterwards to the
//! fetched documents, so `limit_count` bounds the fetch rather than the final
//! result and a narrow search can return fewer than `limit_count` jobs.

use jobboard_models::{JobListing, SearchFilters};

use crate::codec::fields;
use crate::types::{Filter, StructuredQuery, ToFirestoreValue, DESCENDING};

/// Store query for the equality part of a search.
pub fn build_search_query(collection_id: &str, filters: &SearchFilters) -> StructuredQuery {
    let mut query = StructuredQuery::collection(collection_id)
        .filter(Filter::equal(fields::STATUS, "active".to_firestore_value()));

    if let Some(job_type) = filters.job_type {
        query = query.filter(Filter::equal(
            fields::JOB_TYPE,
            job_type.as_str().to_firestore_value(),
        ));
    }
    if let Some(level) = filters.experience_level {
        query = query.filter(Filter::equal(
            fields::EXPERIENCE_LEVEL,
            level.as_str().to_firestore_value(),
        ));
    }
    if let Some(remote) = filters.remote {
        query = query.filter(Filter::equal(
            fields::LOCATION_REMOTE,
            remote.to_firestore_value(),
        ));
    }

    query = query.order_by(fields::POSTED_AT, DESCENDING);

    if let Some(limit) = filters.fetch_limit() {
        query = query.limit(limit.min(i32::MAX as u32) as i32);
    }

    query
}

/// Narrow fetched jobs by skills, then location, then salary.
pub fn apply_residual_filters(jobs: Vec<JobListing>, filters: &SearchFilters) -> Vec<JobListing> {
    let mut jobs = jobs;

    if !filters.skills.is_empty() {
        jobs.retain(|job| job.requires_any_skill(&filters.skills));
    }

    if let Some(needle) = filters.location_needle() {
        jobs.retain(|job| job.location.matches(needle));
    }

    if let Some(min_salary) = filters.salary_threshold() {
        jobs.retain(|job| {
            job.salary
                .as_ref()
                .map(|s| s.max >= min_salary)
                .unwrap_or(false)
        });
    }

    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobboard_models::{JobId, JobType, NewJobListing, SalaryRange};

    fn job(id: &str, city: &str, country: &str, skills: &[&str], max_salary: Option<f64>) -> JobListing {
        let new: NewJobListing = serde_json::from_value(serde_json::json!({
            "title": id,
            "description": "d",
            "companyName": "c",
            "location": {"city": city, "country": country},
            "jobType": "full-time",
            "experienceLevel": "mid",
            "requiredSkills": skills,
            "postedBy": "owner"
        }))
        .unwrap();
        let mut job = new.into_listing(JobId::from(id), Utc::now());
        job.salary = max_salary.map(|max| SalaryRange {
            min: 0.0,
            max,
            currency: "USD".to_string(),
            period: Default::default(),
        });
        job
    }

    fn ids(jobs: &[JobListing]) -> Vec<&str> {
        jobs.iter().map(|j| j.id.as_str()).collect()
    }

    #[test]
    fn test_query_pushes_equality_filters() {
        let filters = SearchFilters {
            job_type: Some(JobType::Contract),
            remote: Some(true),
            limit_count: Some(5),
            ..Default::default()
        };
        let query = build_search_query("jobs", &filters);

        let composite = query.r#where.as_ref().unwrap().composite_filter.as_ref().unwrap();
        let paths: Vec<&str> = composite
            .filters
            .iter()
            .map(|f| f.field_filter.as_ref().unwrap().field.field_path.as_str())
            .collect();
        assert_eq!(paths, vec!["status", "jobType", "location.remote"]);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.order_by.as_ref().unwrap()[0].direction, "DESCENDING");
    }

    #[test]
    fn test_zero_limit_leaves_fetch_unbounded() {
        let query = build_search_query("jobs", &SearchFilters::default().with_limit(0));
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_skills_match_any() {
        let jobs = vec![
            job("a", "Sydney", "Australia", &["Cooking", "Driving"], None),
            job("b", "Sydney", "Australia", &["Painting"], None),
        ];
        let filters = SearchFilters::default().with_skills(["Driving", "Welding"]);
        assert_eq!(ids(&apply_residual_filters(jobs, &filters)), vec!["a"]);
    }

    #[test]
    fn test_location_matches_city_or_country_case_insensitive() {
        let jobs = vec![
            job("a", "Sydney", "Australia", &[], None),
            job("b", "Auckland", "New Zealand", &[], None),
        ];
        let by_country = SearchFilters::default().with_location("australia");
        assert_eq!(ids(&apply_residual_filters(jobs.clone(), &by_country)), vec!["a"]);

        let by_city = SearchFilters::default().with_location("AUCK");
        assert_eq!(ids(&apply_residual_filters(jobs.clone(), &by_city)), vec!["b"]);

        let empty = SearchFilters::default().with_location("");
        assert_eq!(apply_residual_filters(jobs.clone(), &empty).len(), 2);

        // Needles are matched verbatim
        let padded = SearchFilters::default().with_location(" Sydney");
        assert!(apply_residual_filters(jobs, &padded).is_empty());
    }

    #[test]
    fn test_min_salary_requires_salary() {
        let jobs = vec![
            job("a", "x", "y", &[], Some(80_000.0)),
            job("b", "x", "y", &[], Some(40_000.0)),
            job("c", "x", "y", &[], None),
        ];
        let filters = SearchFilters::default().with_min_salary(50_000.0);
        assert_eq!(ids(&apply_residual_filters(jobs.clone(), &filters)), vec!["a"]);

        let zero = SearchFilters::default().with_min_salary(0.0);
        assert_eq!(apply_residual_filters(jobs, &zero).len(), 3);
    }
}
