// src/lib.rs

pub mod config;
pub mod error;
pub mod fetch;
pub mod grades;
pub mod monitor;
pub mod notify;
pub mod snapshot;
pub mod table;

pub use error::GradeError;
pub use grades::{extract_grades, GradeRecord};
pub use snapshot::{diff, Delta, Notice, Snapshot};
