//! Soft-delete stage.
//!
//! Reads and updates against soft-deletable models observe only live rows
//! unless the caller constrained `deletedAt` itself or asked for deleted
//! rows. Deletes are rewritten to updates stamping `deletedAt`; nothing
//! reachable through the pipeline is ever physically removed.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{Next, QueryStage};
use crate::service::db::core::types::{Operation, QueryDescriptor, QueryParams, QueryResult};
use crate::tool::current_time;
use crate::tool::error::AppError;

pub const DELETED_AT: &str = "deletedAt";

#[derive(Default)]
pub struct SoftDeleteStage;

impl SoftDeleteStage {
    pub fn new() -> Self {
        Self
    }

    fn merge_live_filter(query: &mut QueryDescriptor) {
        if query.include_deleted || query.filter.contains_key(DELETED_AT) {
            return;
        }
        query.filter.insert(DELETED_AT.to_string(), Value::Null);
    }
}

#[async_trait]
impl QueryStage for SoftDeleteStage {
    async fn handle(&self, mut query: QueryDescriptor, next: Next<'_>) -> Result<QueryResult, AppError> {
        if query.model.soft_deletable() {
            match query.operation {
                Operation::FindOne
                | Operation::FindMany
                | Operation::Update
                | Operation::UpdateMany => {
                    Self::merge_live_filter(&mut query);
                }
                Operation::Delete | Operation::DeleteMany => {
                    query.operation = if query.operation == Operation::Delete {
                        Operation::Update
                    } else {
                        Operation::UpdateMany
                    };
                    let mut payload = QueryParams::new();
                    payload.insert(
                        DELETED_AT.to_string(),
                        Value::String(current_time::utc_timestamp()),
                    );
                    query.data = Some(payload);
                    Self::merge_live_filter(&mut query);
                    debug!(model = %query.model, "delete rewritten to soft-delete update");
                }
                Operation::Count | Operation::Aggregate | Operation::Create => {}
            }
        }
        next.run(query).await
    }
}
