//! CLI command implementations.

pub mod log;
pub mod plan;
pub mod report;
pub mod run;
pub mod validity;
