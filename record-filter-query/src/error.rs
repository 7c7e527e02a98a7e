//! Error types for filter construction, compilation and execution.
//!
//! Every error carries a stable code for programmatic handling, context
//! about what was being built, and optional suggestions.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: F{category}{number}
//! - 1xxx: Restriction errors
//! - 2xxx: Scope and structural clause errors
//! - 3xxx: Registry and fragment errors
//! - 4xxx: Schema lookup errors
//! - 7xxx: Configuration errors
//! - 8xxx: Execution errors (passed through from the executor)
//!
//! ```rust
//! use record_filter_query::{ErrorCode, FilterError};
//!
//! let err = FilterError::duplicate_fragment("Post", "published");
//! assert_eq!(err.code, ErrorCode::DuplicateFragmentName);
//! assert_eq!(err.code.code(), "F3001");
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Restriction errors (1xxx)
    /// Restriction without an operator, or operand shape mismatch (F1001).
    MalformedRestriction = 1001,

    // Scope errors (2xxx)
    /// Structural clause called from a nested scope (F2001).
    NoSuchOperation = 2001,
    /// Order direction is neither ascending nor descending (F2002).
    InvalidDirection = 2002,
    /// Order or group clause naming no column (F2003).
    EmptyColumn = 2003,

    // Registry errors (3xxx)
    /// Fragment name already registered on the type or an ancestor (F3001).
    DuplicateFragmentName = 3001,
    /// Fragment invoked with the wrong argument count or shape (F3002).
    ArgumentMismatch = 3002,
    /// No fragment with that name on the type or its ancestors (F3003).
    UnknownFragment = 3003,

    // Schema errors (4xxx)
    /// No record type with that name (F4001).
    UnknownModel = 4001,
    /// No association with that name on the type (F4002).
    UnknownAssociation = 4002,
    /// A record type with that name is already registered (F4003).
    DuplicateModel = 4003,

    // Configuration errors (7xxx)
    /// Invalid configuration value (F7001).
    InvalidConfiguration = 7001,

    // Execution errors (8xxx)
    /// Failure reported by the query executor (F8001).
    Executor = 8001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "F1001").
    pub fn code(&self) -> String {
        format!("F{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::MalformedRestriction => "Malformed restriction",
            Self::NoSuchOperation => "Operation not available in this scope",
            Self::InvalidDirection => "Invalid order direction",
            Self::EmptyColumn => "Empty column reference",
            Self::DuplicateFragmentName => "Duplicate fragment name",
            Self::ArgumentMismatch => "Fragment argument mismatch",
            Self::UnknownFragment => "Unknown fragment",
            Self::UnknownModel => "Unknown record type",
            Self::UnknownAssociation => "Unknown association",
            Self::DuplicateModel => "Duplicate record type",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Executor => "Executor error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The DSL operation that was being performed.
    pub operation: Option<String>,
    /// The record type involved.
    pub model: Option<String>,
    /// The fragment involved.
    pub fragment: Option<String>,
    /// The column involved.
    pub column: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

/// Errors raised while building, compiling or executing a filter.
#[derive(Error, Debug)]
pub struct FilterError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl FilterError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the DSL operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the record type.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the fragment.
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.context.fragment = Some(fragment.into());
        self
    }

    /// Set the column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.context.column = Some(column.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A restriction that cannot be rendered.
    pub fn malformed_restriction(column: impl Into<String>, message: impl Into<String>) -> Self {
        let column = column.into();
        Self::new(
            ErrorCode::MalformedRestriction,
            format!("Malformed restriction on {}: {}", column, message.into()),
        )
        .with_column(&column)
    }

    /// A restriction built with `with`/`without` but never given an operator.
    pub fn missing_operator(column: impl Into<String>) -> Self {
        Self::malformed_restriction(column, "no operator was set")
            .with_suggestion(
                "Call equal_to, like, in_list, between, is_null or a comparison after with()",
            )
    }

    /// A structural clause called outside the outermost scope.
    pub fn no_such_operation(operation: impl Into<String>, scope: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorCode::NoSuchOperation,
            format!("{} is not available inside {}", operation, scope.into()),
        )
        .with_operation(&operation)
        .with_suggestion(
            "Declare limit, offset, order, group_by, select and distinct \
             at the top level of the filter",
        )
    }

    /// An order direction other than asc/desc.
    pub fn invalid_direction(direction: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidDirection,
            format!(
                "The direction for orders must be either asc or desc but was {}",
                direction.into()
            ),
        )
        .with_operation("order")
    }

    /// An order or group clause given an empty column or path.
    pub fn empty_column(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(
            ErrorCode::EmptyColumn,
            format!("{} needs a column, path or expression", operation),
        )
        .with_operation(&operation)
    }

    /// A fragment name collision on the type or one of its ancestors.
    pub fn duplicate_fragment(model: impl Into<String>, name: impl Into<String>) -> Self {
        let model = model.into();
        let name = name.into();
        Self::new(
            ErrorCode::DuplicateFragmentName,
            format!("A named filter with the name {} already exists on {}", name, model),
        )
        .with_model(&model)
        .with_fragment(&name)
    }

    /// A fragment invoked with arguments that do not fit its parameters.
    pub fn argument_mismatch(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self::new(
            ErrorCode::ArgumentMismatch,
            format!("Wrong arguments for {}: {}", fragment, message.into()),
        )
        .with_fragment(&fragment)
    }

    /// No fragment with the given name.
    pub fn unknown_fragment(model: impl Into<String>, name: impl Into<String>) -> Self {
        let model = model.into();
        let name = name.into();
        Self::new(
            ErrorCode::UnknownFragment,
            format!("No named filter {} on {} or its ancestors", name, model),
        )
        .with_model(&model)
        .with_fragment(&name)
    }

    /// No record type with the given name.
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(ErrorCode::UnknownModel, format!("No record type named {}", model))
            .with_model(&model)
    }

    /// A second record type registered under an existing name.
    pub fn duplicate_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::DuplicateModel,
            format!("A record type named {} is already registered", model),
        )
        .with_model(&model)
    }

    /// No association with the given name.
    pub fn unknown_association(model: impl Into<String>, relation: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::UnknownAssociation,
            format!("{} has no association named {}", model, relation.into()),
        )
        .with_model(&model)
    }

    /// An invalid configuration value.
    pub fn invalid_config(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid value {:?} for {}", value.into(), key.into()),
        )
    }

    /// Wrap a failure reported by the executor.
    pub fn executor<E: std::error::Error + Send + Sync + 'static>(source: E) -> Self {
        Self::new(ErrorCode::Executor, source.to_string()).with_source(source)
    }

    // ============== Error Checks ==============

    /// Check if this error was raised while building or compiling the filter,
    /// as opposed to executing it.
    pub fn is_programming_error(&self) -> bool {
        !matches!(self.code, ErrorCode::Executor | ErrorCode::InvalidConfiguration)
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref fragment) = self.context.fragment {
            output.push_str(&format!("  → Fragment: {}\n", fragment));
        }
        if let Some(ref column) = self.context.column {
            output.push_str(&format!("  → Column: {}\n", column));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::MalformedRestriction.code(), "F1001");
        assert_eq!(ErrorCode::NoSuchOperation.code(), "F2001");
        assert_eq!(ErrorCode::Executor.code(), "F8001");
    }

    #[test]
    fn test_duplicate_fragment_context() {
        let err = FilterError::duplicate_fragment("Post", "published");
        assert_eq!(err.context.model, Some("Post".to_string()));
        assert_eq!(err.context.fragment, Some("published".to_string()));
        assert!(err.to_string().starts_with("[F3001]"));
    }

    #[test]
    fn test_programming_errors() {
        assert!(FilterError::missing_operator("permalink").is_programming_error());
        assert!(FilterError::no_such_operation("limit", "a join").is_programming_error());

        let io = std::io::Error::other("connection reset");
        let err = FilterError::executor(io);
        assert!(!err.is_programming_error());
        assert!(err.source.is_some());
        assert_eq!(err.message, "connection reset");
    }

    #[test]
    fn test_display_full() {
        let err = FilterError::missing_operator("permalink");
        let output = err.display_full();
        assert!(output.contains("F1001"));
        assert!(output.contains("Column: permalink"));
        assert!(output.contains("Suggestions"));
    }
}
