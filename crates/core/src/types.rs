/// Identifier of a version in the edit history. Never reused.
pub type VersionId = u64;

/// Identifier assigned to a reference image when it is attached.
pub type ReferenceId = u64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
