pub mod aggregate;
pub mod config;
pub mod domain;
pub mod generator;
pub mod logging;
pub mod metrics;
pub mod storage;
