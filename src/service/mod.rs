pub mod cache;
pub mod data_service;
pub mod db;
pub mod matching;
pub mod pipeline;
pub mod traits;
