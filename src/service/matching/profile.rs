//! Worker and job snapshots consumed by the scoring engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Expert,
}

impl JobLevel {
    /// Fixed mapping from seniority level to the years of experience it
    /// demands.
    pub fn required_years(&self) -> f64 {
        match self {
            JobLevel::Entry => 1.0,
            JobLevel::Junior => 2.0,
            JobLevel::Mid => 4.0,
            JobLevel::Senior => 6.0,
            JobLevel::Lead => 8.0,
            JobLevel::Expert => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u32,
    pub max: u32,
}

impl SalaryRange {
    pub fn overlaps(&self, other: &SalaryRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: String,
    pub skills: Vec<String>,
    pub years_experience: f64,
    pub city: Option<String>,
    pub expected_salary: Option<SalaryRange>,
    pub availability: AvailabilityType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub level: JobLevel,
    pub remote: bool,
    pub city: Option<String>,
    pub salary: Option<SalaryRange>,
    pub full_time: bool,
}
