//! Common type definitions for the data-access core.
//!
//! The [`QueryDescriptor`] is the semantic unit flowing through the
//! middleware pipeline. Entities are a closed [`Model`] enum so an invalid
//! model name is a compile error, not a runtime one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Query filter / write payload type - column name to JSON value.
pub type QueryParams = HashMap<String, Value>;

/// A single result row shaped as a JSON object.
pub type QueryRow = serde_json::Map<String, Value>;

/// Pipeline result payload: an object for read-one, an array for read-many,
/// a number for count/aggregate, a summary object for writes.
pub type QueryResult = Value;

/// The closed set of entities the core can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    User,
    Worker,
    Job,
    Application,
    Payment,
    Notification,
    Skill,
    Category,
    MatchScore,
}

/// Cache volatility classification, driving the TTL policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    Volatile,
    Stable,
    Standard,
}

impl Model {
    pub const ALL: [Model; 9] = [
        Model::User,
        Model::Worker,
        Model::Job,
        Model::Application,
        Model::Payment,
        Model::Notification,
        Model::Skill,
        Model::Category,
        Model::MatchScore,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            Model::User => "users",
            Model::Worker => "workers",
            Model::Job => "jobs",
            Model::Application => "applications",
            Model::Payment => "payments",
            Model::Notification => "notifications",
            Model::Skill => "skills",
            Model::Category => "categories",
            Model::MatchScore => "match_scores",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::User => "user",
            Model::Worker => "worker",
            Model::Job => "job",
            Model::Application => "application",
            Model::Payment => "payment",
            Model::Notification => "notification",
            Model::Skill => "skill",
            Model::Category => "category",
            Model::MatchScore => "match_score",
        }
    }

    /// Match scores are append-only records; everything else carries a
    /// `deletedAt` column and is soft-deleted through the pipeline.
    pub fn soft_deletable(&self) -> bool {
        !matches!(self, Model::MatchScore)
    }

    /// Allow-list of models the cache stage may serve.
    pub fn cacheable(&self) -> bool {
        matches!(
            self,
            Model::User
                | Model::Worker
                | Model::Job
                | Model::Skill
                | Model::Category
                | Model::MatchScore
        )
    }

    pub fn volatility(&self) -> Volatility {
        match self {
            Model::User
            | Model::Worker
            | Model::Application
            | Model::Payment
            | Model::Notification
            | Model::MatchScore => Volatility::Volatile,
            Model::Skill | Model::Category => Volatility::Stable,
            Model::Job => Volatility::Standard,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed set of operation kinds the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    FindOne,
    FindMany,
    Count,
    Aggregate,
    Create,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FindOne => "find_one",
            Operation::FindMany => "find_many",
            Operation::Count => "count",
            Operation::Aggregate => "aggregate",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::UpdateMany => "update_many",
            Operation::Delete => "delete",
            Operation::DeleteMany => "delete_many",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(
            self,
            Operation::FindOne | Operation::FindMany | Operation::Count | Operation::Aggregate
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate functions the terminal executor can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggFunc {
    pub fn sql(&self) -> &'static str {
        match self {
            AggFunc::Count => "COUNT",
            AggFunc::Sum => "SUM",
            AggFunc::Avg => "AVG",
            AggFunc::Min => "MIN",
            AggFunc::Max => "MAX",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub func: AggFunc,
    pub column: String,
}

/// The semantic unit flowing through the middleware pipeline.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub model: Model,
    pub operation: Operation,
    /// Equality / IS NULL predicates, column name to value.
    pub filter: QueryParams,
    /// Write payload for create/update operations.
    pub data: Option<QueryParams>,
    /// Requested page size for find-many.
    pub take: Option<u32>,
    /// Caller requested nested includes/selects/ordering; disables caching.
    pub has_relations: bool,
    /// Caller explicitly wants soft-deleted rows as well.
    pub include_deleted: bool,
    pub aggregate: Option<AggregateSpec>,
}

impl QueryDescriptor {
    pub fn new(model: Model, operation: Operation) -> Self {
        Self {
            model,
            operation,
            filter: QueryParams::new(),
            data: None,
            take: None,
            has_relations: false,
            include_deleted: false,
            aggregate: None,
        }
    }

    pub fn filter(mut self, column: &str, value: Value) -> Self {
        self.filter.insert(column.to_string(), value);
        self
    }

    pub fn data(mut self, data: QueryParams) -> Self {
        self.data = Some(data);
        self
    }

    pub fn take(mut self, take: u32) -> Self {
        self.take = Some(take);
        self
    }

    pub fn with_relations(mut self) -> Self {
        self.has_relations = true;
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn aggregate(mut self, func: AggFunc, column: &str) -> Self {
        self.aggregate = Some(AggregateSpec {
            func,
            column: column.to_string(),
        });
        self
    }
}
