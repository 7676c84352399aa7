pub mod error;
pub mod execution;
pub mod lifecycle;
pub mod report;
pub mod telemetry;
