/// Error code registry for parsum
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Validation errors
/// - 3000-3999: Result sink errors
/// - 4000-4999: Reduction errors
/// - 5000-5999: Worker errors
/// - 6000-6999: Arithmetic errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;

    // Validation errors (2000-2999)
    pub const VALIDATION_GENERIC: u16 = 2000;
    pub const VALIDATION_EMPTY_ITERATION_SPACE: u16 = 2001;
    pub const VALIDATION_NO_WORKERS: u16 = 2002;
    pub const VALIDATION_RANK_OUT_OF_RANGE: u16 = 2003;
    pub const VALIDATION_INVALID_LABEL: u16 = 2004;
    pub const VALIDATION_INVALID_GRID: u16 = 2005;

    // Result sink errors (3000-3999)
    pub const SINK_GENERIC: u16 = 3000;
    pub const SINK_WRITE_FAILED: u16 = 3001;

    // Reduction errors (4000-4999)
    pub const REDUCTION_GENERIC: u16 = 4000;
    pub const REDUCTION_PEER_LOST: u16 = 4001;
    pub const REDUCTION_COORDINATOR_LOST: u16 = 4002;
    pub const REDUCTION_PROTOCOL_VIOLATION: u16 = 4003;
    pub const REDUCTION_COORDINATOR_OUT_OF_RANGE: u16 = 4004;

    // Worker errors (5000-5999)
    pub const WORKER_PANICKED: u16 = 5001;
    pub const WORKER_CANCELLED: u16 = 5002;

    // Arithmetic errors (6000-6999)
    pub const ARITH_NON_FINITE: u16 = 6001;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        ErrorCode::CONFIG_GENERIC => "General configuration error",
        ErrorCode::CONFIG_NOT_FOUND => "Configuration file not found",
        ErrorCode::CONFIG_INVALID_TOML => "Configuration file is not valid TOML",

        ErrorCode::VALIDATION_GENERIC => "General validation error",
        ErrorCode::VALIDATION_EMPTY_ITERATION_SPACE => "Iteration space must hold at least one index",
        ErrorCode::VALIDATION_NO_WORKERS => "At least one worker is required",
        ErrorCode::VALIDATION_RANK_OUT_OF_RANGE => "Worker rank is outside the worker count",
        ErrorCode::VALIDATION_INVALID_LABEL => "Result label is not a short printable ASCII string",
        ErrorCode::VALIDATION_INVALID_GRID => "Sparse grid points and weights are inconsistent",

        ErrorCode::SINK_GENERIC => "General result sink error",
        ErrorCode::SINK_WRITE_FAILED => "Failed to write the result line",

        ErrorCode::REDUCTION_GENERIC => "General reduction error",
        ErrorCode::REDUCTION_PEER_LOST => "A worker left before contributing to the reduction",
        ErrorCode::REDUCTION_COORDINATOR_LOST => "The coordinator left before releasing workers",
        ErrorCode::REDUCTION_PROTOCOL_VIOLATION => "Workers disagree on the reduction protocol",
        ErrorCode::REDUCTION_COORDINATOR_OUT_OF_RANGE => "Coordinator rank is outside the world",

        ErrorCode::WORKER_PANICKED => "Worker panicked",
        ErrorCode::WORKER_CANCELLED => "Worker task was cancelled",

        ErrorCode::ARITH_NON_FINITE => "Partial result is not finite",

        ErrorCode::OTHER_GENERIC => "Unknown error",
        _ => "Unknown error code",
    }
}
