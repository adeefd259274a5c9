//! Persisted match-score record and recommendation tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationTier {
    StrongMatch,
    GoodMatch,
    FairMatch,
    WeakMatch,
    NoMatch,
}

impl RecommendationTier {
    pub fn from_score(overall: f64) -> Self {
        if overall >= 85.0 {
            RecommendationTier::StrongMatch
        } else if overall >= 70.0 {
            RecommendationTier::GoodMatch
        } else if overall >= 60.0 {
            RecommendationTier::FairMatch
        } else if overall >= 50.0 {
            RecommendationTier::WeakMatch
        } else {
            RecommendationTier::NoMatch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationTier::StrongMatch => "STRONG_MATCH",
            RecommendationTier::GoodMatch => "GOOD_MATCH",
            RecommendationTier::FairMatch => "FAIR_MATCH",
            RecommendationTier::WeakMatch => "WEAK_MATCH",
            RecommendationTier::NoMatch => "NO_MATCH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Skills,
    Experience,
    Location,
    Salary,
    Availability,
}

/// A single weighted factor, normalized to 0-100 before weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubScore {
    pub factor: ScoreFactor,
    pub score: f64,
    pub weight: f64,
    pub breakdown: Value,
}

/// One worker-to-job evaluation. Records are append-only: a re-evaluation
/// creates a new record, it never mutates a prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchScore {
    pub id: String,
    pub worker_id: String,
    pub job_id: String,
    pub overall: f64,
    pub sub_scores: Vec<SubScore>,
    pub tier: RecommendationTier,
    pub insights: Vec<String>,
    pub scored_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds_are_inclusive() {
        assert_eq!(RecommendationTier::from_score(85.0), RecommendationTier::StrongMatch);
        assert_eq!(RecommendationTier::from_score(84.9), RecommendationTier::GoodMatch);
        assert_eq!(RecommendationTier::from_score(70.0), RecommendationTier::GoodMatch);
        assert_eq!(RecommendationTier::from_score(69.9), RecommendationTier::FairMatch);
        assert_eq!(RecommendationTier::from_score(60.0), RecommendationTier::FairMatch);
        assert_eq!(RecommendationTier::from_score(59.9), RecommendationTier::WeakMatch);
        assert_eq!(RecommendationTier::from_score(50.0), RecommendationTier::WeakMatch);
        assert_eq!(RecommendationTier::from_score(49.9), RecommendationTier::NoMatch);
    }

    #[test]
    fn tier_serializes_in_wire_format() {
        let json = serde_json::to_string(&RecommendationTier::StrongMatch).unwrap();
        assert_eq!(json, "\"STRONG_MATCH\"");
    }
}
