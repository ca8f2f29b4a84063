//! Assembly of a user's applications across jobs.

use jobboard_models::{UserApplication, UserApplicationsPage};

/// Newest first, truncated to `limit`; `total` keeps the full count.
pub fn paginate_applications(
    mut applications: Vec<UserApplication>,
    limit: usize,
) -> UserApplicationsPage {
    applications.sort_by(|a, b| b.application.applied_at.cmp(&a.application.applied_at));

    let total = applications.len();
    applications.truncate(limit);

    UserApplicationsPage {
        applications,
        total,
        has_more: total > limit,
        limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use jobboard_models::{ApplicationStatus, JobApplication, JobId, NewJobListing};

    fn entry(job_id: &str, applied_at: DateTime<Utc>) -> UserApplication {
        let new: NewJobListing = serde_json::from_value(serde_json::json!({
            "title": job_id,
            "description": "d",
            "companyName": "c",
            "location": {"city": "a", "country": "b"},
            "jobType": "contract",
            "experienceLevel": "entry",
            "postedBy": "owner"
        }))
        .unwrap();
        UserApplication {
            id: format!("{}-u1", job_id),
            job_id: job_id.to_string(),
            job: new.into_listing(JobId::from(job_id), Utc::now()),
            application: JobApplication {
                id: "u1".to_string(),
                user_id: "u1".to_string(),
                applied_at,
                status: ApplicationStatus::Pending,
                cover_letter: None,
                resume_url: None,
            },
        }
    }

    #[test]
    fn test_sorted_newest_first_and_truncated() {
        let now = Utc::now();
        let apps = vec![
            entry("old", now - Duration::days(2)),
            entry("new", now),
            entry("missing", DateTime::UNIX_EPOCH),
            entry("mid", now - Duration::days(1)),
        ];

        let page = paginate_applications(apps, 2);
        let order: Vec<&str> = page.applications.iter().map(|a| a.job_id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid"]);
        assert_eq!(page.total, 4);
        assert!(page.has_more);
        assert_eq!(page.limit, 2);
    }

    #[test]
    fn test_exact_fit_has_no_more() {
        let page = paginate_applications(vec![entry("a", Utc::now())], 1);
        assert_eq!(page.total, 1);
        assert!(!page.has_more);
    }
}
