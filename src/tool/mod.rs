pub mod current_time;
pub mod error;

pub use error::*;
