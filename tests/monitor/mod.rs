pub mod alerting;
pub mod reporting;
