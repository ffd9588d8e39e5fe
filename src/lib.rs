// Library for tests and the dump binary to access modules

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod error;
pub mod history_repo;
pub mod lifecycle;
pub mod models;
pub mod retention;
pub mod source;
pub mod version;
pub mod worker;
