pub mod key;
pub mod remote;
pub mod store;
pub mod sweep;
