pub mod auth;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod escalas;
pub mod store;
pub mod sync;
pub mod telemetry;
