//! Shared data models for the job board backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job listings and their engagement counters
//! - Ratings and the rating aggregate
//! - Applications and the per-user application view
//! - User profiles
//! - Search filters and contact submissions

pub mod application;
pub mod contact;
pub mod job;
pub mod rating;
pub mod search;
pub mod user;

// Re-export common types
pub use application::{
    ApplicationData, ApplicationStatus, JobApplication, UserApplication, UserApplicationsPage,
};
pub use contact::{ContactSubmission, StoredSubmission, SubmissionStatus};
pub use job::{
    ActiveJobsPage, CompanySize, ExperienceLevel, JobId, JobListing, JobStatus, JobType, Location,
    NewJobListing, SalaryPeriod, SalaryRange,
};
pub use rating::{JobRating, RatingSummary};
pub use search::SearchFilters;
pub use user::{NewUserProfile, UserProfile};
