//! Scoring engine behavior: arithmetic, determinism, and persistence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use jobcore::config::cache::CacheConfig;
use jobcore::service::cache::store::CacheStore;
use jobcore::service::db::core::types::{Model, Operation, QueryDescriptor};
use jobcore::service::matching::engine::MatchEngine;
use jobcore::service::matching::profile::{
    AvailabilityType, JobLevel, JobPosting, SalaryRange, WorkerProfile,
};
use jobcore::service::matching::score::{RecommendationTier, ScoreFactor};
use jobcore::service::traits::RelationalStore;
use jobcore::tool::error::AppError;

struct MockStore {
    calls: AtomicUsize,
    seen: Mutex<Vec<QueryDescriptor>>,
}

impl MockStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl RelationalStore for MockStore {
    async fn execute(&self, query: &QueryDescriptor) -> Result<Value, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().expect("mock store lock").push(query.clone());
        Ok(json!({ "persisted": true }))
    }
}

fn engine(store: Arc<MockStore>) -> MatchEngine {
    let cache = Arc::new(CacheStore::new(None, CacheConfig::default()));
    MatchEngine::new(store, cache)
}

fn worker() -> WorkerProfile {
    WorkerProfile {
        id: "worker-1".into(),
        skills: vec!["rust".into(), "sql".into()],
        years_experience: 4.0,
        city: Some("Berlin".into()),
        expected_salary: Some(SalaryRange { min: 60_000, max: 80_000 }),
        availability: AvailabilityType::FullTime,
    }
}

fn job() -> JobPosting {
    JobPosting {
        id: "job-1".into(),
        required_skills: vec!["rust".into(), "sql".into(), "kubernetes".into()],
        preferred_skills: vec!["grpc".into()],
        level: JobLevel::Mid,
        remote: false,
        city: Some("Berlin".into()),
        salary: Some(SalaryRange { min: 65_000, max: 90_000 }),
        full_time: true,
    }
}

fn sub_score(score: &jobcore::service::matching::score::MatchScore, factor: ScoreFactor) -> f64 {
    score
        .sub_scores
        .iter()
        .find(|s| s.factor == factor)
        .expect("missing factor")
        .score
}

#[test]
fn identical_snapshots_score_identically() {
    let a = MatchEngine::evaluate(&worker(), &job());
    let b = MatchEngine::evaluate(&worker(), &job());
    assert_eq!(a.overall, b.overall);
    assert_eq!(a.tier, b.tier);
    for (x, y) in a.sub_scores.iter().zip(b.sub_scores.iter()) {
        assert_eq!(x.score, y.score);
        assert_eq!(x.weight, y.weight);
    }
}

#[test]
fn partial_skill_coverage_scores_by_ratio() {
    // 2 of 3 required, 0 of 1 preferred: (0.7 * 2/3 + 0.3 * 0) * 100
    let score = MatchEngine::evaluate(&worker(), &job());
    let skills = sub_score(&score, ScoreFactor::Skills);
    let expected = 0.7 * (2.0 / 3.0) * 100.0;
    assert!((skills - expected).abs() < 1e-9, "skills {skills}");
}

#[test]
fn empty_requirement_lists_count_as_full_coverage() {
    let mut job = job();
    job.required_skills.clear();
    job.preferred_skills.clear();
    let score = MatchEngine::evaluate(&worker(), &job);
    assert_eq!(sub_score(&score, ScoreFactor::Skills), 100.0);
}

#[test]
fn a_fully_matched_pair_scores_one_hundred() {
    let mut worker = worker();
    worker.skills = vec!["rust".into(), "sql".into(), "kubernetes".into(), "grpc".into()];
    worker.years_experience = 6.0;
    let score = MatchEngine::evaluate(&worker, &job());
    assert_eq!(score.overall, 100.0);
    assert_eq!(score.tier, RecommendationTier::StrongMatch);
}

#[test]
fn the_overall_score_stays_within_bounds() {
    let worker = WorkerProfile {
        id: "worker-2".into(),
        skills: Vec::new(),
        years_experience: 0.0,
        city: None,
        expected_salary: Some(SalaryRange { min: 200_000, max: 250_000 }),
        availability: AvailabilityType::Contract,
    };
    let score = MatchEngine::evaluate(&worker, &job());
    assert!(score.overall >= 0.0 && score.overall <= 100.0);
    assert_eq!(score.tier, RecommendationTier::NoMatch);
}

#[test]
fn experience_is_capped_at_the_level_requirement() {
    let mut worker = worker();
    worker.years_experience = 20.0;
    let score = MatchEngine::evaluate(&worker, &job());
    assert_eq!(sub_score(&score, ScoreFactor::Experience), 100.0);
}

#[test]
fn remote_jobs_ignore_the_city_mismatch() {
    let mut worker = worker();
    worker.city = Some("Lisbon".into());
    let mut job = job();
    job.remote = true;
    let score = MatchEngine::evaluate(&worker, &job);
    assert_eq!(sub_score(&score, ScoreFactor::Location), 100.0);
}

#[test]
fn a_missing_salary_range_is_no_constraint() {
    let mut worker = worker();
    worker.expected_salary = None;
    let score = MatchEngine::evaluate(&worker, &job());
    assert_eq!(sub_score(&score, ScoreFactor::Salary), 100.0);
}

#[test]
fn part_time_workers_are_penalized_on_full_time_jobs() {
    let mut worker = worker();
    worker.availability = AvailabilityType::PartTime;
    let score = MatchEngine::evaluate(&worker, &job());
    assert_eq!(sub_score(&score, ScoreFactor::Availability), 50.0);
}

#[tokio::test]
async fn scoring_persists_one_append_only_record() {
    let store = MockStore::new();
    let engine = engine(store.clone());

    let result = engine.score(&worker(), &job()).await.expect("score");

    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    let persisted = store.seen.lock().expect("mock store lock")[0].clone();
    assert_eq!(persisted.model, Model::MatchScore);
    assert_eq!(persisted.operation, Operation::Create);
    let payload = persisted.data.expect("create payload");
    assert_eq!(payload.get("worker_id"), Some(&json!(result.worker_id)));
}

#[tokio::test]
async fn a_repeat_evaluation_reuses_the_cached_record() {
    let store = MockStore::new();
    let engine = engine(store.clone());

    let first = engine.score(&worker(), &job()).await.expect("first score");
    let second = engine.score(&worker(), &job()).await.expect("second score");

    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.id, second.id);
    assert_eq!(first.overall, second.overall);
}
