/// Job identifiers are opaque strings of the form `job_<type>_<suffix>`.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
