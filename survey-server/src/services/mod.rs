//! Background services for survey-server

pub mod retention;

pub use retention::{RetentionService, RETENTION_PERIOD};
