//! KFN scoring engine.
//!
//! A weighted linear combination of five sub-scores, each normalized to
//! 0-100 before weighting. [`MatchEngine::evaluate`] is a pure function of
//! the worker/job snapshots and the fixed weight table; persistence and
//! cache reuse happen in [`MatchEngine::score`].

use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::service::cache::store::CacheStore;
use crate::service::db::core::types::{Model, Operation, QueryDescriptor, QueryParams};
use crate::service::matching::profile::{AvailabilityType, JobPosting, WorkerProfile};
use crate::service::matching::score::{MatchScore, RecommendationTier, ScoreFactor, SubScore};
use crate::service::traits::RelationalStore;
use crate::tool::error::AppError;

pub const SKILLS_WEIGHT: f64 = 0.30;
pub const EXPERIENCE_WEIGHT: f64 = 0.25;
pub const LOCATION_WEIGHT: f64 = 0.15;
pub const SALARY_WEIGHT: f64 = 0.15;
pub const AVAILABILITY_WEIGHT: f64 = 0.15;

pub struct MatchEngine {
    store: Arc<dyn RelationalStore>,
    cache: Arc<CacheStore>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn RelationalStore>, cache: Arc<CacheStore>) -> Self {
        Self { store, cache }
    }

    /// Reuses a cached score for the worker/job pair when present; otherwise
    /// evaluates, persists one append-only record, caches, and returns it.
    pub async fn score(
        &self,
        worker: &WorkerProfile,
        job: &JobPosting,
    ) -> Result<MatchScore, AppError> {
        let cache_key = Self::eval_cache_key(&worker.id, &job.id);
        if let Some(hit) = self.cache.get(&cache_key).await {
            match serde_json::from_value::<MatchScore>(hit) {
                Ok(cached) => {
                    debug!(worker = %worker.id, job = %job.id, "reusing cached match score");
                    return Ok(cached);
                }
                Err(e) => debug!(error = %e, "discarding undecodable cached match score"),
            }
        }

        let score = Self::evaluate(worker, job);

        let mut payload = QueryParams::new();
        if let Value::Object(map) = serde_json::to_value(&score)? {
            payload.extend(map);
        }
        let descriptor = QueryDescriptor::new(Model::MatchScore, Operation::Create).data(payload);
        self.store.execute(&descriptor).await?;

        let value = serde_json::to_value(&score)?;
        let ttl = self.cache.ttl_for(Model::MatchScore);
        self.cache.set(&cache_key, &value, ttl).await;

        info!(
            worker = %worker.id,
            job = %job.id,
            overall = score.overall,
            tier = score.tier.as_str(),
            "match score persisted"
        );
        Ok(score)
    }

    fn eval_cache_key(worker_id: &str, job_id: &str) -> String {
        format!("cache:{}:eval:{worker_id}:{job_id}", Model::MatchScore)
    }

    /// Deterministic given identical snapshots: no hidden randomness, no
    /// wall-clock input to the arithmetic.
    pub fn evaluate(worker: &WorkerProfile, job: &JobPosting) -> MatchScore {
        let sub_scores = vec![
            Self::skills_score(worker, job),
            Self::experience_score(worker, job),
            Self::location_score(worker, job),
            Self::salary_score(worker, job),
            Self::availability_score(worker, job),
        ];

        let weighted: f64 = sub_scores.iter().map(|s| s.score * s.weight).sum();
        let overall = weighted.clamp(0.0, 100.0);
        let tier = RecommendationTier::from_score(overall);
        let insights = Self::insights(&sub_scores);

        MatchScore {
            id: Uuid::new_v4().to_string(),
            worker_id: worker.id.clone(),
            job_id: job.id.clone(),
            overall,
            sub_scores,
            tier,
            insights,
            scored_at: Utc::now(),
        }
    }

    fn skills_score(worker: &WorkerProfile, job: &JobPosting) -> SubScore {
        let have: HashSet<String> = worker.skills.iter().map(|s| s.to_lowercase()).collect();
        // empty requirement lists count as fully matched
        let ratio = |want: &[String]| -> (usize, f64) {
            if want.is_empty() {
                return (0, 1.0);
            }
            let matched = want
                .iter()
                .filter(|s| have.contains(&s.to_lowercase()))
                .count();
            (matched, matched as f64 / want.len() as f64)
        };

        let (required_matched, required_ratio) = ratio(&job.required_skills);
        let (preferred_matched, preferred_ratio) = ratio(&job.preferred_skills);
        let score = (0.7 * required_ratio + 0.3 * preferred_ratio) * 100.0;

        SubScore {
            factor: ScoreFactor::Skills,
            score,
            weight: SKILLS_WEIGHT,
            breakdown: json!({
                "requiredMatched": required_matched,
                "requiredTotal": job.required_skills.len(),
                "preferredMatched": preferred_matched,
                "preferredTotal": job.preferred_skills.len(),
            }),
        }
    }

    fn experience_score(worker: &WorkerProfile, job: &JobPosting) -> SubScore {
        let required_years = job.level.required_years();
        let ratio = (worker.years_experience / required_years).clamp(0.0, 1.0);

        SubScore {
            factor: ScoreFactor::Experience,
            score: ratio * 100.0,
            weight: EXPERIENCE_WEIGHT,
            breakdown: json!({
                "workerYears": worker.years_experience,
                "requiredYears": required_years,
            }),
        }
    }

    fn location_score(worker: &WorkerProfile, job: &JobPosting) -> SubScore {
        let cities_match = match (&worker.city, &job.city) {
            (Some(w), Some(j)) => w.eq_ignore_ascii_case(j),
            _ => false,
        };
        let matched = job.remote || cities_match;

        SubScore {
            factor: ScoreFactor::Location,
            score: if matched { 100.0 } else { 50.0 },
            weight: LOCATION_WEIGHT,
            breakdown: json!({
                "remote": job.remote,
                "workerCity": worker.city,
                "jobCity": job.city,
            }),
        }
    }

    fn salary_score(worker: &WorkerProfile, job: &JobPosting) -> SubScore {
        // a missing range on either side is treated as no constraint
        let overlaps = match (&worker.expected_salary, &job.salary) {
            (Some(w), Some(j)) => w.overlaps(j),
            _ => true,
        };

        SubScore {
            factor: ScoreFactor::Salary,
            score: if overlaps { 100.0 } else { 50.0 },
            weight: SALARY_WEIGHT,
            breakdown: json!({
                "workerRange": worker.expected_salary,
                "jobRange": job.salary,
            }),
        }
    }

    fn availability_score(worker: &WorkerProfile, job: &JobPosting) -> SubScore {
        let compatible = !job.full_time || worker.availability == AvailabilityType::FullTime;

        SubScore {
            factor: ScoreFactor::Availability,
            score: if compatible { 100.0 } else { 50.0 },
            weight: AVAILABILITY_WEIGHT,
            breakdown: json!({
                "jobFullTime": job.full_time,
                "workerAvailability": worker.availability,
            }),
        }
    }

    /// Simple threshold rules per factor; wording is advisory, not part of
    /// the scoring contract.
    fn insights(sub_scores: &[SubScore]) -> Vec<String> {
        let mut insights = Vec::new();
        for sub in sub_scores {
            match sub.factor {
                ScoreFactor::Skills => {
                    if sub.score >= 90.0 {
                        insights.push("Excellent skill coverage for this role".to_string());
                    } else if sub.score < 50.0 {
                        insights.push("Several required skills are missing".to_string());
                    }
                }
                ScoreFactor::Experience => {
                    if sub.score < 50.0 {
                        insights.push("Noticeably under the experience bar for this level".to_string());
                    }
                }
                ScoreFactor::Location => {
                    if sub.score < 100.0 {
                        insights.push("Location mismatch; remote work or relocation would be needed".to_string());
                    }
                }
                ScoreFactor::Salary => {
                    if sub.score < 100.0 {
                        insights.push("Salary expectations do not overlap the posted range".to_string());
                    }
                }
                ScoreFactor::Availability => {
                    if sub.score < 100.0 {
                        insights.push("Job requires full-time availability".to_string());
                    }
                }
            }
        }
        insights
    }
}
