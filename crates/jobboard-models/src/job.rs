//! Job listing models.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rating::JobRating;

/// Identifier of a job listing document (store-generated).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Draft,
    #[default]
    Active,
    Closed,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
            JobStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(JobStatus::Draft),
            "active" => Some(JobStatus::Active),
            "closed" => Some(JobStatus::Closed),
            "expired" => Some(JobStatus::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Employment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Freelance => "freelance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "full-time" => Some(JobType::FullTime),
            "part-time" => Some(JobType::PartTime),
            "contract" => Some(JobType::Contract),
            "internship" => Some(JobType::Internship),
            "freelance" => Some(JobType::Freelance),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Seniority expected for the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    #[default]
    Entry,
    Junior,
    Mid,
    Senior,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Executive => "executive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(ExperienceLevel::Entry),
            "junior" => Some(ExperienceLevel::Junior),
            "mid" => Some(ExperienceLevel::Mid),
            "senior" => Some(ExperienceLevel::Senior),
            "executive" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

impl CompanySize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Startup => "startup",
            CompanySize::Small => "small",
            CompanySize::Medium => "medium",
            CompanySize::Large => "large",
            CompanySize::Enterprise => "enterprise",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "startup" => Some(CompanySize::Startup),
            "small" => Some(CompanySize::Small),
            "medium" => Some(CompanySize::Medium),
            "large" => Some(CompanySize::Large),
            "enterprise" => Some(CompanySize::Enterprise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Hourly,
    Monthly,
    #[default]
    Yearly,
}

impl SalaryPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryPeriod::Hourly => "hourly",
            SalaryPeriod::Monthly => "monthly",
            SalaryPeriod::Yearly => "yearly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hourly" => Some(SalaryPeriod::Hourly),
            "monthly" => Some(SalaryPeriod::Monthly),
            "yearly" => Some(SalaryPeriod::Yearly),
            _ => None,
        }
    }
}

/// Compensation band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SalaryRange {
    pub min: f64,
    pub max: f64,
    /// ISO currency code, e.g. "USD" or "AUD".
    pub currency: String,
    #[serde(default)]
    pub period: SalaryPeriod,
}

/// Where the job is performed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    #[serde(default)]
    pub remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hybrid: Option<bool>,
}

impl Location {
    /// Case-insensitive substring match against city or country.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.city.to_lowercase().contains(&needle) || self.country.to_lowercase().contains(&needle)
    }
}

/// A job listing as stored in the `jobs` collection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub id: JobId,

    pub title: String,
    pub description: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<CompanySize>,

    pub location: Location,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub benefits: Vec<String>,

    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<DateTime<Utc>>,

    /// User IDs that have applied. Always the same size as `applicant_count`.
    #[serde(default)]
    pub applicants: Vec<String>,
    #[serde(default)]
    pub applicant_count: u32,

    #[serde(default)]
    pub ratings: Vec<JobRating>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: u32,

    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub saves: u32,
    #[serde(default)]
    pub saves_user_ids: Vec<String>,

    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub priority: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    pub posted_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub posted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl JobListing {
    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }

    pub fn has_applicant(&self, user_id: &str) -> bool {
        self.applicants.iter().any(|a| a == user_id)
    }

    pub fn is_saved_by(&self, user_id: &str) -> bool {
        self.saves_user_ids.iter().any(|u| u == user_id)
    }

    /// True if any of `skills` is one of the required skills.
    pub fn requires_any_skill(&self, skills: &[String]) -> bool {
        skills.iter().any(|s| self.required_skills.contains(s))
    }
}

/// Fields supplied when posting a job. Counters, engagement and timestamps
/// are initialized by the repository.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewJobListing {
    pub title: String,
    pub description: String,
    pub company_name: String,
    #[serde(default)]
    pub company_logo: Option<String>,
    #[serde(default)]
    pub company_website: Option<String>,
    #[serde(default)]
    pub company_size: Option<CompanySize>,
    pub location: Location,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub salary: Option<SalaryRange>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub application_instructions: Option<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Owner user ID. Overwritten with the caller's ID by the HTTP layer.
    #[serde(default)]
    pub posted_by: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewJobListing {
    /// Check required fields before the listing is written.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("companyName", &self.company_name),
            ("location.city", &self.location.city),
            ("location.country", &self.location.country),
            ("postedBy", &self.posted_by),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(format!("Missing required field: {}", name));
            }
        }

        if let Some(salary) = &self.salary {
            if salary.min < 0.0 || salary.max < salary.min {
                return Err(format!(
                    "Invalid salary range: min {} must be between 0 and max {}",
                    salary.min, salary.max
                ));
            }
        }

        Ok(())
    }

    /// Materialize a full listing with fresh counters, all timestamps set to `now`.
    pub fn into_listing(self, id: JobId, now: DateTime<Utc>) -> JobListing {
        JobListing {
            id,
            title: self.title,
            description: self.description,
            company_name: self.company_name,
            company_logo: self.company_logo,
            company_website: self.company_website,
            company_size: self.company_size,
            location: self.location,
            job_type: self.job_type,
            experience_level: self.experience_level,
            salary: self.salary,
            benefits: self.benefits,
            required_skills: self.required_skills,
            preferred_skills: self.preferred_skills,
            attributes: self.attributes,
            requirements: self.requirements,
            responsibilities: self.responsibilities,
            application_instructions: self.application_instructions,
            application_url: self.application_url,
            application_deadline: self.application_deadline,
            applicants: Vec::new(),
            applicant_count: 0,
            ratings: Vec::new(),
            average_rating: 0.0,
            rating_count: 0,
            views: 0,
            saves: 0,
            saves_user_ids: Vec::new(),
            status: self.status,
            featured: self.featured,
            priority: self.priority,
            industry: self.industry,
            category: self.category,
            posted_by: self.posted_by,
            contact_email: self.contact_email,
            created_at: now,
            updated_at: now,
            posted_at: now,
            expires_at: self.expires_at,
        }
    }
}

/// One page of active listings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJobsPage {
    pub jobs: Vec<JobListing>,
    pub has_more: bool,
    /// Cursor to resume after the last job; `None` when there is no next page.
    pub last_doc: Option<String>,
    /// Cursor at the first job of this page; `None` when the page is empty.
    pub first_doc: Option<String>,
}
