use std::fmt;

/// Exit code for failures the user can fix (configuration, input, API keys).
pub const EXIT_USER_ERROR: u8 = 1;
/// Exit code for failures inside the extractor itself.
pub const EXIT_APPLICATION_ERROR: u8 = 2;

/// Application-specific error types.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Missing or invalid configuration parameter.
    ConfigError(String),
    /// Input table missing, unreadable or without columns.
    InputError(String),
    /// The Finstat API answered with a non-success status.
    ExternalApiError(String),
    /// The request never produced a response (timeout, connection, DNS).
    TransportError(String),
    /// A success response whose body could not be decoded.
    ResponseFormatError(String),
    /// Not a single identifier produced a record.
    EmptyResult {
        /// Number of identifiers that failed.
        failed: usize,
    },
    /// Writing an output table or manifest failed.
    OutputError(String),
    /// Reading or writing the persisted run state failed.
    StateError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for failures scoped to a single identifier.
    ///
    /// These never abort a run; the identifier is recorded as unavailable
    /// and the batch moves on.
    pub fn is_per_identifier(&self) -> bool {
        matches!(
            self.root(),
            AppError::ExternalApiError(_)
                | AppError::TransportError(_)
                | AppError::ResponseFormatError(_)
        )
    }

    /// Maps the error to the process exit code.
    pub fn exit_code(&self) -> u8 {
        match self.root() {
            AppError::ConfigError(_)
            | AppError::InputError(_)
            | AppError::EmptyResult { .. } => EXIT_USER_ERROR,
            _ => EXIT_APPLICATION_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InputError(msg) => write!(f, "Input error: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            AppError::ResponseFormatError(msg) => write!(f, "Response format error: {}", msg),
            AppError::EmptyResult { failed } => write!(
                f,
                "No output: all {} ICO inputs failed. Your API keys might be incorrect or all ICO inputs are invalid",
                failed
            ),
            AppError::OutputError(msg) => write!(f, "Output error: {}", msg),
            AppError::StateError(msg) => write!(f, "State error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::TransportError(format!("request timed out: {}", err))
        } else {
            AppError::TransportError(err.to_string())
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::OutputError(err.to_string())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::ResponseFormatError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
