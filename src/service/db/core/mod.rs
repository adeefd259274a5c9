pub mod executor;
pub mod transaction;
pub mod types;
