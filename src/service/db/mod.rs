pub mod core;
pub mod retry;
