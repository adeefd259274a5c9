//! Data-access core for the job-marketplace backend.
//!
//! Layers an explicit query middleware pipeline (logging, soft-delete
//! rewriting, caching) over every database call, backed by a dual-tier
//! cache store (Redis with an in-process fallback), a retrying transaction
//! executor, and the KFN worker/job match scorer. Repositories consume all
//! of it through the [`DataService`] facade.

pub mod config;
pub mod logging;
pub mod service;
pub mod tool;

pub use config::DataConfig;
pub use service::data_service::DataService;
pub use service::db::core::types::{Model, Operation, QueryDescriptor};
pub use service::db::retry::RetryPolicy;
pub use service::matching::profile::{JobPosting, WorkerProfile};
pub use service::matching::score::{MatchScore, RecommendationTier};
pub use tool::error::{AppError, ErrorSeverity};
