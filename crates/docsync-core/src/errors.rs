use docsync_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Stable classification of all errors in the sync engine. Each kind maps to
/// a stable error code usable for programmatic handling, testing, and
/// caller-facing responses. Cross-tenant access is always `NotFound`, never a
/// distinct forbidden kind, so callers cannot probe for existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    // Lookup
    NotFound,

    // Validation
    InvalidInput,
    InvalidFieldPath,
    UnknownTransform,
    /// A snapshot field exists but has the wrong shape for the operation
    WrongShape,

    // Storage
    Persistence,
    Serialization,
    Io,

    // Write races
    /// Lost a version-number race; safe to retry with a fresh max read
    Concurrency,

    // Cascade execution
    /// Some but not all targets were updated before a failure
    PartialCascade,
    /// Target count exceeded the configured cascade bound (no writes made)
    CascadeLimit,

    // Internal
    Internal,
}

impl SyncErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            SyncErrorKind::NotFound => "ERR_NOT_FOUND",
            SyncErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            SyncErrorKind::InvalidFieldPath => "ERR_INVALID_FIELD_PATH",
            SyncErrorKind::UnknownTransform => "ERR_UNKNOWN_TRANSFORM",
            SyncErrorKind::WrongShape => "ERR_WRONG_SHAPE",
            SyncErrorKind::Persistence => "ERR_PERSISTENCE",
            SyncErrorKind::Serialization => "ERR_SERIALIZATION",
            SyncErrorKind::Io => "ERR_IO",
            SyncErrorKind::Concurrency => "ERR_CONCURRENCY",
            SyncErrorKind::PartialCascade => "ERR_PARTIAL_CASCADE",
            SyncErrorKind::CascadeLimit => "ERR_CASCADE_LIMIT",
            SyncErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for kinds a caller may retry without changing the request.
    ///
    /// NotFound and the validation kinds indicate caller error and are
    /// never retried automatically.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            SyncErrorKind::Persistence
                | SyncErrorKind::Io
                | SyncErrorKind::Concurrency
                | SyncErrorKind::PartialCascade
        )
    }
}

/// Canonical structured error type
///
/// Carries classification plus context fields for debugging: the failing
/// operation, the entity involved, and the field path when one applies.
#[derive(Debug, Clone)]
pub struct SyncError {
    kind: SyncErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    field_path: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl SyncError {
    /// Create a new error with the specified kind
    pub fn new(kind: SyncErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            field_path: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add field path context
    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> SyncErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the field path context, if any
    pub fn field_path(&self) -> Option<&str> {
        self.field_path.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(field_path) = &self.field_path {
            write!(f, " (field_path: {})", field_path)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Errors raised by the snapshot value model
///
/// These cover shape and addressing problems inside a single snapshot. They
/// convert into the canonical facility at the engine boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// A field path failed to parse (empty, or an empty segment)
    #[error("Invalid field path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A snapshot root was not a map
    #[error("Snapshot root must be a map, got {actual}")]
    RootNotMap { actual: String },

    /// A field exists but has the wrong shape for the operation
    #[error("Field '{path}' has wrong shape: expected {expected}, got {actual}")]
    WrongShape {
        path: String,
        expected: String,
        actual: String,
    },
}

impl From<ValueError> for SyncError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::InvalidPath { path, reason } => {
                SyncError::new(SyncErrorKind::InvalidFieldPath)
                    .with_field_path(path)
                    .with_message(reason)
            }
            ValueError::RootNotMap { actual } => SyncError::new(SyncErrorKind::WrongShape)
                .with_message(format!("snapshot root must be a map, got {}", actual)),
            ValueError::WrongShape {
                path,
                expected,
                actual,
            } => SyncError::new(SyncErrorKind::WrongShape)
                .with_field_path(path)
                .with_message(format!("expected {}, got {}", expected, actual)),
        }
    }
}

/// Conversion from serde_json::Error to SyncError
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::new(SyncErrorKind::Serialization).with_message(err.to_string())
    }
}
