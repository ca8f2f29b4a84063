//! Mapping between models and document fields.
//!
//! Field names match the camelCase names the web client has always written,
//! so documents created by either side stay readable. Missing or mistyped
//! optional fields fall back to defaults; missing required fields are errors.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use jobboard_models::{
    ApplicationStatus, CompanySize, ExperienceLevel, JobApplication, JobId, JobListing, JobRating,
    JobStatus, JobType, Location, SalaryPeriod, SalaryRange, UserProfile,
};

use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

/// Field names shared by queries and transforms.
pub mod fields {
    pub const STATUS: &str = "status";
    pub const POSTED_AT: &str = "postedAt";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const JOB_TYPE: &str = "jobType";
    pub const EXPERIENCE_LEVEL: &str = "experienceLevel";
    pub const LOCATION_REMOTE: &str = "location.remote";
    pub const APPLICANTS: &str = "applicants";
    pub const APPLICANT_COUNT: &str = "applicantCount";
    pub const RATINGS: &str = "ratings";
    pub const AVERAGE_RATING: &str = "averageRating";
    pub const RATING_COUNT: &str = "ratingCount";
    pub const VIEWS: &str = "views";
    pub const SAVES: &str = "saves";
    pub const SAVES_USER_IDS: &str = "savesUserIds";
    pub const USER_ID: &str = "userId";
    pub const APPLIED_AT: &str = "appliedAt";
    pub const RESUME_URL: &str = "resumeUrl";
    pub const COVER_LETTER_URL: &str = "coverLetterUrl";
}

// =============================================================================
// Field Access
// =============================================================================

/// Typed, lenient reads over a document's field map.
struct FieldReader<'a> {
    fields: &'a HashMap<String, Value>,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a HashMap<String, Value>) -> Self {
        Self { fields }
    }

    fn get<T: FromFirestoreValue>(&self, key: &str) -> Option<T> {
        self.fields.get(key).and_then(T::from_firestore_value)
    }

    fn string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    fn required_string(&self, key: &str, doc_id: &str) -> FirestoreResult<String> {
        self.get(key).ok_or_else(|| {
            FirestoreError::SerializationError(format!("Document {} is missing {}", doc_id, key))
        })
    }

    fn strings(&self, key: &str) -> Vec<String> {
        self.get(key).unwrap_or_default()
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)
    }

    fn map(&self, key: &str) -> Option<FieldReader<'a>> {
        self.fields
            .get(key)
            .and_then(Value::as_map)
            .map(FieldReader::new)
    }
}

/// Insert only when the optional value is present.
fn put_opt<T: ToFirestoreValue>(fields: &mut HashMap<String, Value>, key: &str, value: &Option<T>) {
    if let Some(v) = value {
        fields.insert(key.to_string(), v.to_firestore_value());
    }
}

fn put<T: ToFirestoreValue>(fields: &mut HashMap<String, Value>, key: &str, value: T) {
    fields.insert(key.to_string(), value.to_firestore_value());
}

fn doc_fields<'a>(doc: &'a Document, what: &str) -> FirestoreResult<(&'a HashMap<String, Value>, &'a str)> {
    let id = doc.id().unwrap_or_default();
    let fields = doc.fields.as_ref().ok_or_else(|| {
        FirestoreError::InvalidResponse(format!("{} {} has no fields", what, id))
    })?;
    Ok((fields, id))
}

// =============================================================================
// Job Listings
// =============================================================================

fn location_to_value(location: &Location) -> Value {
    let mut map = HashMap::new();
    put(&mut map, "city", location.city.as_str());
    put_opt(&mut map, "state", &location.state);
    put(&mut map, "country", location.country.as_str());
    put(&mut map, "remote", location.remote);
    put_opt(&mut map, "hybrid", &location.hybrid);
    Value::map(map)
}

fn location_from(reader: Option<FieldReader<'_>>) -> Location {
    match reader {
        Some(r) => Location {
            city: r.string("city"),
            state: r.get("state"),
            country: r.string("country"),
            remote: r.get("remote").unwrap_or(false),
            hybrid: r.get("hybrid"),
        },
        None => Location::default(),
    }
}

fn salary_to_value(salary: &SalaryRange) -> Value {
    let mut map = HashMap::new();
    put(&mut map, "min", salary.min);
    put(&mut map, "max", salary.max);
    put(&mut map, "currency", salary.currency.as_str());
    put(&mut map, "period", salary.period.as_str());
    Value::map(map)
}

fn salary_from(reader: FieldReader<'_>) -> SalaryRange {
    SalaryRange {
        min: reader.get("min").unwrap_or(0.0),
        max: reader.get("max").unwrap_or(0.0),
        currency: reader.string("currency"),
        period: reader
            .get::<String>("period")
            .and_then(|p| SalaryPeriod::from_str(&p))
            .unwrap_or_default(),
    }
}

pub fn rating_to_value(rating: &JobRating) -> Value {
    let mut map = HashMap::new();
    put(&mut map, "userId", rating.user_id.as_str());
    put(&mut map, "rating", rating.rating);
    put_opt(&mut map, "comment", &rating.comment);
    put(&mut map, "createdAt", rating.created_at);
    Value::map(map)
}

fn rating_from(value: &Value) -> Option<JobRating> {
    let reader = FieldReader::new(value.as_map()?);
    Some(JobRating {
        user_id: reader.get("userId")?,
        rating: reader.get("rating")?,
        comment: reader.get("comment"),
        created_at: reader
            .timestamp("createdAt")
            .unwrap_or(DateTime::UNIX_EPOCH),
    })
}

/// Ratings array as stored; entries that do not parse are skipped.
pub fn ratings_from(value: Option<&Value>) -> Vec<JobRating> {
    value
        .map(|v| v.as_array().iter().filter_map(rating_from).collect())
        .unwrap_or_default()
}

pub fn ratings_to_value(ratings: &[JobRating]) -> Value {
    Value::array(ratings.iter().map(rating_to_value).collect())
}

/// Every field of a listing except its ID (which is the document key).
pub fn job_to_fields(job: &JobListing) -> HashMap<String, Value> {
    let mut f = HashMap::new();

    put(&mut f, "title", job.title.as_str());
    put(&mut f, "description", job.description.as_str());
    put(&mut f, "companyName", job.company_name.as_str());
    put_opt(&mut f, "companyLogo", &job.company_logo);
    put_opt(&mut f, "companyWebsite", &job.company_website);
    if let Some(size) = job.company_size {
        put(&mut f, "companySize", size.as_str());
    }

    f.insert("location".to_string(), location_to_value(&job.location));
    put(&mut f, fields::JOB_TYPE, job.job_type.as_str());
    put(&mut f, fields::EXPERIENCE_LEVEL, job.experience_level.as_str());

    if let Some(salary) = &job.salary {
        f.insert("salary".to_string(), salary_to_value(salary));
    }
    put(&mut f, "benefits", job.benefits.clone());
    put(&mut f, "requiredSkills", job.required_skills.clone());
    put(&mut f, "preferredSkills", job.preferred_skills.clone());
    put(&mut f, "attributes", job.attributes.clone());
    put(&mut f, "requirements", job.requirements.clone());
    put(&mut f, "responsibilities", job.responsibilities.clone());

    put_opt(&mut f, "applicationInstructions", &job.application_instructions);
    put_opt(&mut f, "applicationUrl", &job.application_url);
    put_opt(&mut f, "applicationDeadline", &job.application_deadline);

    put(&mut f, fields::APPLICANTS, job.applicants.clone());
    put(&mut f, fields::APPLICANT_COUNT, job.applicant_count);
    f.insert(fields::RATINGS.to_string(), ratings_to_value(&job.ratings));
    put(&mut f, fields::AVERAGE_RATING, job.average_rating);
    put(&mut f, fields::RATING_COUNT, job.rating_count);
    put(&mut f, fields::VIEWS, job.views);
    put(&mut f, fields::SAVES, job.saves);
    put(&mut f, fields::SAVES_USER_IDS, job.saves_user_ids.clone());

    put(&mut f, fields::STATUS, job.status.as_str());
    put(&mut f, "featured", job.featured);
    put(&mut f, "priority", job.priority);
    put_opt(&mut f, "industry", &job.industry);
    put_opt(&mut f, "category", &job.category);

    put(&mut f, "postedBy", job.posted_by.as_str());
    put_opt(&mut f, "contactEmail", &job.contact_email);

    put(&mut f, fields::CREATED_AT, job.created_at);
    put(&mut f, fields::UPDATED_AT, job.updated_at);
    put(&mut f, fields::POSTED_AT, job.posted_at);
    put_opt(&mut f, "expiresAt", &job.expires_at);

    f
}

pub fn document_to_job(doc: &Document) -> FirestoreResult<JobListing> {
    let (fields, id) = doc_fields(doc, "Job")?;
    let r = FieldReader::new(fields);

    let created_at = r.timestamp(fields::CREATED_AT).unwrap_or(DateTime::UNIX_EPOCH);

    Ok(JobListing {
        id: JobId::from_string(id),
        title: r.required_string("title", id)?,
        description: r.string("description"),
        company_name: r.string("companyName"),
        company_logo: r.get("companyLogo"),
        company_website: r.get("companyWebsite"),
        company_size: r
            .get::<String>("companySize")
            .and_then(|s| CompanySize::from_str(&s)),
        location: location_from(r.map("location")),
        job_type: r
            .get::<String>(fields::JOB_TYPE)
            .and_then(|s| JobType::from_str(&s))
            .unwrap_or_default(),
        experience_level: r
            .get::<String>(fields::EXPERIENCE_LEVEL)
            .and_then(|s| ExperienceLevel::from_str(&s))
            .unwrap_or_default(),
        salary: r.map("salary").map(salary_from),
        benefits: r.strings("benefits"),
        required_skills: r.strings("requiredSkills"),
        preferred_skills: r.strings("preferredSkills"),
        attributes: r.strings("attributes"),
        requirements: r.strings("requirements"),
        responsibilities: r.strings("responsibilities"),
        application_instructions: r.get("applicationInstructions"),
        application_url: r.get("applicationUrl"),
        application_deadline: r.timestamp("applicationDeadline"),
        applicants: r.strings(fields::APPLICANTS),
        applicant_count: r.get(fields::APPLICANT_COUNT).unwrap_or(0),
        ratings: ratings_from(fields.get(fields::RATINGS)),
        average_rating: r.get(fields::AVERAGE_RATING).unwrap_or(0.0),
        rating_count: r.get(fields::RATING_COUNT).unwrap_or(0),
        views: r.get(fields::VIEWS).unwrap_or(0),
        saves: r.get(fields::SAVES).unwrap_or(0),
        saves_user_ids: r.strings(fields::SAVES_USER_IDS),
        status: r
            .get::<String>(fields::STATUS)
            .and_then(|s| JobStatus::from_str(&s))
            .unwrap_or_default(),
        featured: r.get("featured").unwrap_or(false),
        priority: r.get("priority").unwrap_or(0),
        industry: r.get("industry"),
        category: r.get("category"),
        posted_by: r.string("postedBy"),
        contact_email: r.get("contactEmail"),
        created_at,
        updated_at: r.timestamp(fields::UPDATED_AT).unwrap_or(created_at),
        posted_at: r.timestamp(fields::POSTED_AT).unwrap_or(created_at),
        expires_at: r.timestamp("expiresAt"),
    })
}

// =============================================================================
// Applications
// =============================================================================

pub fn application_to_fields(app: &JobApplication) -> HashMap<String, Value> {
    let mut f = HashMap::new();
    put(&mut f, fields::USER_ID, app.user_id.as_str());
    put(&mut f, fields::APPLIED_AT, app.applied_at);
    put(&mut f, "status", app.status.as_str());
    put_opt(&mut f, "coverLetter", &app.cover_letter);
    put_opt(&mut f, fields::RESUME_URL, &app.resume_url);
    f
}

/// Unparseable `appliedAt` values normalize to the Unix epoch.
pub fn document_to_application(doc: &Document) -> FirestoreResult<JobApplication> {
    let (fields, id) = doc_fields(doc, "Application")?;
    let r = FieldReader::new(fields);

    Ok(JobApplication {
        id: id.to_string(),
        user_id: r.required_string(fields::USER_ID, id)?,
        applied_at: r
            .timestamp(fields::APPLIED_AT)
            .unwrap_or(DateTime::UNIX_EPOCH),
        status: r
            .get::<String>("status")
            .and_then(|s| ApplicationStatus::from_str(&s))
            .unwrap_or_default(),
        cover_letter: r.get("coverLetter"),
        resume_url: r.get(fields::RESUME_URL),
    })
}

// =============================================================================
// Users
// =============================================================================

pub fn user_to_fields(user: &UserProfile) -> HashMap<String, Value> {
    let mut f = HashMap::new();
    put(&mut f, "email", user.email.as_str());
    put(&mut f, "firstName", user.first_name.as_str());
    put(&mut f, "lastName", user.last_name.as_str());
    put(&mut f, "gender", user.gender.as_str());
    put(&mut f, "country", user.country.as_str());
    put(&mut f, "language", user.language.as_str());
    put(&mut f, "role", user.role.as_str());
    put_opt(&mut f, fields::RESUME_URL, &user.resume_url);
    put_opt(&mut f, fields::COVER_LETTER_URL, &user.cover_letter_url);
    put(&mut f, fields::CREATED_AT, user.created_at);
    put(&mut f, fields::UPDATED_AT, user.updated_at);
    f
}

pub fn document_to_user(doc: &Document) -> FirestoreResult<UserProfile> {
    let (fields, id) = doc_fields(doc, "User")?;
    let r = FieldReader::new(fields);

    let created_at = r.timestamp(fields::CREATED_AT).unwrap_or(DateTime::UNIX_EPOCH);

    Ok(UserProfile {
        id: id.to_string(),
        email: r.string("email"),
        first_name: r.string("firstName"),
        last_name: r.string("lastName"),
        gender: r.string("gender"),
        country: r.string("country"),
        language: r.string("language"),
        role: r
            .get("role")
            .unwrap_or_else(|| jobboard_models::user::DEFAULT_ROLE.to_string()),
        resume_url: r.get(fields::RESUME_URL),
        cover_letter_url: r.get(fields::COVER_LETTER_URL),
        created_at,
        updated_at: r.timestamp(fields::UPDATED_AT).unwrap_or(created_at),
    })
}
