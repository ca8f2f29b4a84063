//! Search filter configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::{ExperienceLevel, JobType};

/// Recognized search filters. Every field is optional; an absent field does not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Keep jobs requiring ANY of these skills.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Case-insensitive substring of city or country.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    /// Keep jobs whose salary maximum reaches this value.
    #[serde(default)]
    pub min_salary: Option<f64>,
    #[serde(default)]
    pub remote: Option<bool>,
    /// Bounds the store-side fetch, before residual filtering.
    #[serde(default)]
    pub limit_count: Option<u32>,
}

impl SearchFilters {
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_min_salary(mut self, min_salary: f64) -> Self {
        self.min_salary = Some(min_salary);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit_count = Some(limit);
        self
    }

    /// Location needle, if non-empty. Matched as given, without trimming.
    pub fn location_needle(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }

    /// Store-side fetch bound. Zero means unbounded, like an absent limit.
    pub fn fetch_limit(&self) -> Option<u32> {
        self.limit_count.filter(|l| *l > 0)
    }

    /// Salary threshold, if set and positive.
    pub fn salary_threshold(&self) -> Option<f64> {
        self.min_salary.filter(|m| *m > 0.0)
    }
}
