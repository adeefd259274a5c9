pub mod engine;
pub mod profile;
pub mod score;
