/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Coarse error classes used to decide recoverability
///
/// Every [`ExErrorKind`] belongs to exactly one class. The pipeline runner
/// decides what to do with a failure by class: `Fetch` aborts before any
/// side effect, `Db` is either skipped per row or fatal, `Ingest` and
/// `Commit` are fatal and keep the baseline where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Fetch,
    Db,
    Ingest,
    Commit,
    Run,
    Config,
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Fetch => "fetch",
            ErrorClass::Db => "db",
            ErrorClass::Ingest => "ingest",
            ErrorClass::Commit => "commit",
            ErrorClass::Run => "run",
            ErrorClass::Config => "config",
            ErrorClass::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, tests and the run ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Feed retrieval
    /// Network failure or non-success HTTP status while downloading the feed
    FetchFailed,
    /// The downloaded body is not a readable archive
    ArchiveLayout,
    /// The archive does not contain the expected period text file
    MissingMember,

    // Relational store
    Persistence,
    /// A `person_to_record` row already exists for this doc_id
    DuplicateLink,
    ConstraintViolation,

    // Transaction ingestion
    /// The external extraction collaborator failed or returned garbage
    ExternalService,

    // Baseline commit
    /// The snapshot cache could not be advanced after a successful ingestion
    CommitFailed,

    // Run governance
    /// Another live run holds the run lock for this cache slot
    RunLocked,
    Timeout,

    // Configuration / input
    Config,
    InvalidInput,

    // Integration
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::FetchFailed => "ERR_FETCH_FAILED",
            ExErrorKind::ArchiveLayout => "ERR_ARCHIVE_LAYOUT",
            ExErrorKind::MissingMember => "ERR_MISSING_MEMBER",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::DuplicateLink => "ERR_DUPLICATE_LINK",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::CommitFailed => "ERR_COMMIT_FAILED",
            ExErrorKind::RunLocked => "ERR_RUN_LOCKED",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Get the class this kind belongs to
    pub fn class(&self) -> ErrorClass {
        match self {
            ExErrorKind::FetchFailed | ExErrorKind::ArchiveLayout | ExErrorKind::MissingMember => {
                ErrorClass::Fetch
            }
            ExErrorKind::Persistence
            | ExErrorKind::DuplicateLink
            | ExErrorKind::ConstraintViolation => ErrorClass::Db,
            ExErrorKind::ExternalService => ErrorClass::Ingest,
            ExErrorKind::CommitFailed => ErrorClass::Commit,
            ExErrorKind::RunLocked | ExErrorKind::Timeout => ErrorClass::Run,
            ExErrorKind::Config | ExErrorKind::InvalidInput => ErrorClass::Config,
            ExErrorKind::Io | ExErrorKind::Serialization | ExErrorKind::Internal => {
                ErrorClass::Internal
            }
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus the
/// operation, entity and message needed to debug it from a log line.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (doc_id, cache key, period, ...)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// True when the failure only concerns a single filing row and the run
    /// may continue with the next one.
    pub fn is_row_recoverable(&self) -> bool {
        self.kind == ExErrorKind::DuplicateLink
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} error", self.code(), self.class())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

impl From<std::io::Error> for ExError {
    fn from(err: std::io::Error) -> Self {
        ExError::new(ExErrorKind::Io).with_message(err.to_string())
    }
}

// ========== End Error Facility ==========

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classes_follow_taxonomy() {
        assert_eq!(ExErrorKind::FetchFailed.class(), ErrorClass::Fetch);
        assert_eq!(ExErrorKind::MissingMember.class(), ErrorClass::Fetch);
        assert_eq!(ExErrorKind::DuplicateLink.class(), ErrorClass::Db);
        assert_eq!(ExErrorKind::ExternalService.class(), ErrorClass::Ingest);
        assert_eq!(ExErrorKind::CommitFailed.class(), ErrorClass::Commit);
        assert_eq!(ExErrorKind::RunLocked.class(), ErrorClass::Run);
    }

    #[test]
    fn test_only_duplicate_link_is_row_recoverable() {
        assert!(ExError::new(ExErrorKind::DuplicateLink).is_row_recoverable());
        assert!(!ExError::new(ExErrorKind::Persistence).is_row_recoverable());
        assert!(!ExError::new(ExErrorKind::CommitFailed).is_row_recoverable());
    }

    #[test]
    fn test_display_includes_code_op_and_cause() {
        let cause = ExError::new(ExErrorKind::Persistence).with_message("disk full");
        let err = ExError::new(ExErrorKind::CommitFailed)
            .with_op("commit_baseline")
            .with_entity_id("old")
            .with_message("baseline not advanced")
            .with_source(cause);

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_COMMIT_FAILED] commit error"));
        assert!(rendered.contains("'commit_baseline'"));
        assert!(rendered.contains("(entity_id: old)"));
        assert!(rendered.contains("caused by [ERR_PERSISTENCE]"));
    }

    #[test]
    fn test_std_error_source_chain() {
        use std::error::Error;

        let err = ExError::new(ExErrorKind::CommitFailed)
            .with_source(ExError::new(ExErrorKind::Io).with_message("broken pipe"));
        let source = err.source().expect("source should be exposed");
        assert!(source.to_string().contains("broken pipe"));
    }
}
