//! fetchd: a job-managed download service wrapping an external media tool.
//!
//! Clients analyze a URL for selectable formats, start an asynchronous
//! download job, poll its status, and retrieve the finished artifact exactly
//! once. Artifacts live in a process-owned scratch directory and are removed
//! by the first of delivery or the delayed safety-net cleanup.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod workspace;

pub use error::{Error, Result};
