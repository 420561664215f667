use std::fmt::Display;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The unified error type for parsum
#[derive(Error, Debug)]
pub enum ParsumError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Result sink error: {message}")]
    Sink {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Reduction failed on rank {rank}: {message}")]
    Reduction {
        code: u16,
        message: String,
        rank: usize,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Worker {rank} failed: {message}")]
    Worker {
        code: u16,
        message: String,
        rank: usize,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Arithmetic fault on rank {rank}: {message}")]
    Arithmetic {
        code: u16,
        message: String,
        rank: usize,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ParsumError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error with specific code and field
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    pub fn sink_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Sink {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn reduction_with_code(code: u16, rank: usize, message: impl Into<String>) -> Self {
        Self::Reduction {
            code,
            message: message.into(),
            rank,
            source: None,
        }
    }

    pub fn worker_with_code(code: u16, rank: usize, message: impl Into<String>) -> Self {
        Self::Worker {
            code,
            message: message.into(),
            rank,
            source: None,
        }
    }

    /// Create an arithmetic fault for a non-finite partial result
    pub fn non_finite(rank: usize, value: f64) -> Self {
        Self::Arithmetic {
            code: ErrorCode::ARITH_NON_FINITE,
            message: format!("partial result evaluated to {value}"),
            rank,
            source: None,
        }
    }

    /// Create a generic other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Sink { source: src, .. }
            | Self::Reduction { source: src, .. }
            | Self::Worker { source: src, .. }
            | Self::Arithmetic { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Validation { message, .. }
            | Self::Sink { message, .. }
            | Self::Reduction { message, .. }
            | Self::Worker { message, .. }
            | Self::Arithmetic { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Validation { .. } => 2,
            Self::Sink { .. } => 4,
            Self::Reduction { .. } | Self::Worker { .. } => 5,
            Self::Arithmetic { .. } => 6,
            Self::Other { .. } => 1,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Validation { code, .. }
            | Self::Sink { code, .. }
            | Self::Reduction { code, .. }
            | Self::Worker { code, .. }
            | Self::Arithmetic { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// Whether this error was induced by another worker's failure rather
    /// than being the root cause of a failed run.
    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            Self::Reduction { code, .. }
                if *code == ErrorCode::REDUCTION_PEER_LOST
                    || *code == ErrorCode::REDUCTION_COORDINATOR_LOST
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Validation { message, field, .. } => {
                if let Some(f) = field {
                    format!("Invalid value for '{}': {}", f, message)
                } else {
                    format!("Invalid value: {}", message)
                }
            }
            Self::Sink { message, .. } => format!("Could not emit result: {}", message),
            Self::Reduction { message, rank, .. } => {
                format!("Reduction aborted on worker {}: {}", rank, message)
            }
            Self::Worker { message, rank, .. } => format!("Worker {} died: {}", rank, message),
            Self::Arithmetic { message, rank, .. } => {
                format!("Worker {} hit an arithmetic fault: {}", rank, message)
            }
            Self::Other { message, .. } => message.clone(),
        }
    }
}

/// Type alias for Results using ParsumError
pub type Result<T> = std::result::Result<T, ParsumError>;

impl From<std::io::Error> for ParsumError {
    fn from(err: std::io::Error) -> Self {
        ParsumError::sink_with_code(ErrorCode::SINK_WRITE_FAILED, "I/O operation failed")
            .with_source(err)
    }
}

impl From<toml::de::Error> for ParsumError {
    fn from(err: toml::de::Error) -> Self {
        ParsumError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, "Invalid TOML syntax")
            .with_source(err)
    }
}
