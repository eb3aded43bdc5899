use thiserror::Error;

/// Result type alias using RecordError
pub type Result<T> = std::result::Result<T, RecordError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers can match on without
/// parsing messages. The kinds split into three families: integrity/coding
/// errors raised by the record layer itself, execution errors reported by the
/// database driver, and configuration/IO failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidDefinition,
    NotFound,
    UnknownProperty,
    TypeMismatch,
    MissingParameter,
    DuplicateParameter,

    // Record lifecycle
    AlreadyPersisted,
    NotPersisted,
    DuplicateKey,
    PrimaryKeyImmutable,

    // Enum codec
    UnmappedEnum,
    NotAnEnumField,

    // Integration/IO
    MissingGeneratedKey,
    Persistence,
    Concurrency,
    Config,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidDefinition => "ERR_INVALID_DEFINITION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::UnknownProperty => "ERR_UNKNOWN_PROPERTY",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::MissingParameter => "ERR_MISSING_PARAMETER",
            ExErrorKind::DuplicateParameter => "ERR_DUPLICATE_PARAMETER",
            ExErrorKind::AlreadyPersisted => "ERR_ALREADY_PERSISTED",
            ExErrorKind::NotPersisted => "ERR_NOT_PERSISTED",
            ExErrorKind::DuplicateKey => "ERR_DUPLICATE_KEY",
            ExErrorKind::PrimaryKeyImmutable => "ERR_PRIMARY_KEY_IMMUTABLE",
            ExErrorKind::UnmappedEnum => "ERR_UNMAPPED_ENUM",
            ExErrorKind::NotAnEnumField => "ERR_NOT_AN_ENUM_FIELD",
            ExErrorKind::MissingGeneratedKey => "ERR_MISSING_GENERATED_KEY",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind signals a programming error rather than bad data or a
    /// failing database
    pub fn is_coding_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidDefinition
                | ExErrorKind::UnknownProperty
                | ExErrorKind::AlreadyPersisted
                | ExErrorKind::NotPersisted
                | ExErrorKind::DuplicateKey
                | ExErrorKind::PrimaryKeyImmutable
                | ExErrorKind::UnmappedEnum
                | ExErrorKind::NotAnEnumField
                | ExErrorKind::DuplicateParameter
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification plus whatever record context was known at the
/// point of failure (table, primary key, property).
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    primary_key: Option<i64>,
    property: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            primary_key: None,
            property: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add primary key context
    pub fn with_primary_key(mut self, key: i64) -> Self {
        self.primary_key = Some(key);
        self
    }

    /// Add property context
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
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

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn primary_key(&self) -> Option<i64> {
        self.primary_key
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// Fill in operation and table context if the error does not carry any yet
    ///
    /// Lets a store tag errors bubbling up from lower layers without
    /// overwriting more specific context set closer to the failure.
    pub fn in_context(mut self, op: &str, table: &str) -> Self {
        if self.op.is_none() {
            self.op = Some(op.to_string());
        }
        if self.table.is_none() {
            self.table = Some(table.to_string());
        }
        self
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(key) = self.primary_key {
            write!(f, " (primary_key: {})", key)?;
        }
        if let Some(property) = &self.property {
            write!(f, " (property: {})", property)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Integrity and coding errors raised by the record layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Invalid definition for table {table}: {reason}")]
    InvalidDefinition { table: String, reason: String },

    #[error("Duplicate primary key {key} in table {table}")]
    DuplicatePrimaryKey { table: String, key: i64 },

    #[error("Object already has primary key {key}; cannot insert it into {table}")]
    AlreadyPersisted { table: String, key: i64 },

    #[error("Object has no valid primary key (found {key}) for table {table}")]
    NotPersisted { table: String, key: i64 },

    #[error("No row with primary key {key} in table {table}")]
    NotFound { table: String, key: i64 },

    #[error("Unknown property: {property}")]
    UnknownProperty { property: String },

    #[error("Primary key property {property} of table {table} cannot be updated")]
    PrimaryKeyImmutable { table: String, property: String },

    #[error("Type mismatch for {property}: expected {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: String,
    },

    #[error("Missing parameter: {name}")]
    MissingParameter { name: String },

    #[error("Parameter supplied twice: {name}")]
    DuplicateParameter { name: String },

    #[error("Native value {native} has no database string for column {column}")]
    UnmappedEnum { column: String, native: i32 },

    #[error("Column {column} is not an enum field")]
    NotAnEnumField { column: String },

    #[error("Driver returned no generated key after insert into {table}")]
    MissingGeneratedKey { table: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<RecordError> for ExError {
    fn from(err: RecordError) -> Self {
        let message = err.to_string();
        match err {
            RecordError::InvalidDefinition { table, .. } => {
                ExError::new(ExErrorKind::InvalidDefinition).with_table(table)
            }
            RecordError::DuplicatePrimaryKey { table, key } => ExError::new(ExErrorKind::DuplicateKey)
                .with_table(table)
                .with_primary_key(key),
            RecordError::AlreadyPersisted { table, key } => {
                ExError::new(ExErrorKind::AlreadyPersisted)
                    .with_table(table)
                    .with_primary_key(key)
            }
            RecordError::NotPersisted { table, key } => ExError::new(ExErrorKind::NotPersisted)
                .with_table(table)
                .with_primary_key(key),
            RecordError::NotFound { table, key } => ExError::new(ExErrorKind::NotFound)
                .with_table(table)
                .with_primary_key(key),
            RecordError::UnknownProperty { property } => {
                ExError::new(ExErrorKind::UnknownProperty).with_property(property)
            }
            RecordError::PrimaryKeyImmutable { table, property } => {
                ExError::new(ExErrorKind::PrimaryKeyImmutable)
                    .with_table(table)
                    .with_property(property)
            }
            RecordError::TypeMismatch { property, .. } => {
                ExError::new(ExErrorKind::TypeMismatch).with_property(property)
            }
            RecordError::MissingParameter { name } => {
                ExError::new(ExErrorKind::MissingParameter).with_property(name)
            }
            RecordError::DuplicateParameter { name } => {
                ExError::new(ExErrorKind::DuplicateParameter).with_property(name)
            }
            RecordError::UnmappedEnum { column, .. } => {
                ExError::new(ExErrorKind::UnmappedEnum).with_property(column)
            }
            RecordError::NotAnEnumField { column } => {
                ExError::new(ExErrorKind::NotAnEnumField).with_property(column)
            }
            RecordError::MissingGeneratedKey { table } => {
                ExError::new(ExErrorKind::MissingGeneratedKey).with_table(table)
            }
            RecordError::Internal { .. } => ExError::new(ExErrorKind::Internal),
        }
        .with_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExErrorKind::NotFound.code(), "ERR_NOT_FOUND");
        assert_eq!(ExErrorKind::DuplicateKey.code(), "ERR_DUPLICATE_KEY");
        assert_eq!(ExErrorKind::UnmappedEnum.code(), "ERR_UNMAPPED_ENUM");
    }

    #[test]
    fn test_record_error_conversion_keeps_context() {
        let err: ExError = RecordError::DuplicatePrimaryKey {
            table: "hop".to_string(),
            key: 7,
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::DuplicateKey);
        assert_eq!(err.table(), Some("hop"));
        assert_eq!(err.primary_key(), Some(7));
        assert!(err.kind().is_coding_error());
        assert!(err.message().contains("Duplicate primary key 7"));
    }

    #[test]
    fn test_in_context_does_not_overwrite() {
        let err = ExError::new(ExErrorKind::Persistence)
            .with_op("junction_insert")
            .in_context("insert", "recipe");

        assert_eq!(err.op(), Some("junction_insert"));
        assert_eq!(err.table(), Some("recipe"));
    }

    #[test]
    fn test_display_includes_code_and_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("update")
            .with_table("fermentable")
            .with_primary_key(3)
            .with_message("no such row");

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_NOT_FOUND] in operation 'update': no such row"));
        assert!(rendered.contains("(table: fermentable)"));
        assert!(rendered.contains("(primary_key: 3)"));
    }
}
