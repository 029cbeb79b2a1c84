pub mod config;
pub mod detect;
pub mod error;
pub mod models;
pub mod popup;
pub mod query;
pub mod storage;
