//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so it can be grepped in logs
//! and mapped onto an HTTP status.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - RESOLVE_xxx: Entity resolution errors
//! - JOB_xxx: Scan job errors
//! - SCORING_xxx: Scoring errors
//! - CACHE_xxx: Report cache errors
//! - EXTERNAL_xxx: Intelligence source errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Resolution Errors
    // ============================================
    /// Input did not match any entity grammar
    ResolveNoMatch,

    // ============================================
    // Scan Job Errors
    // ============================================
    /// Unknown job id
    JobNotFound,
    /// Attempted to move a job backwards or out of a terminal state
    JobInvalidTransition,
    /// Pipeline task died before reaching a terminal state
    JobAborted,

    // ============================================
    // Scoring Errors
    // ============================================
    /// Non-finite or otherwise unusable numeric input
    ScoringInvalidInput,

    // ============================================
    // Cache Errors
    // ============================================
    /// Report store unreachable or unwritable
    CacheUnavailable,
    /// Stored report could not be (de)serialized
    CacheCorrupt,

    // ============================================
    // External Source Errors
    // ============================================
    /// Source has no record for the entity (HTTP 404)
    ExternalNotFound,
    /// Source rate limited us (HTTP 429)
    ExternalRateLimited,
    /// Source did not answer in time
    ExternalTimeout,
    /// Source connection failed or returned garbage
    ExternalError,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Unauthorized (invalid API key)
    ApiUnauthorized,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveNoMatch => "RESOLVE_NO_MATCH",

            Self::JobNotFound => "JOB_NOT_FOUND",
            Self::JobInvalidTransition => "JOB_INVALID_TRANSITION",
            Self::JobAborted => "JOB_ABORTED",

            Self::ScoringInvalidInput => "SCORING_INVALID_INPUT",

            Self::CacheUnavailable => "CACHE_UNAVAILABLE",
            Self::CacheCorrupt => "CACHE_CORRUPT",

            Self::ExternalNotFound => "EXTERNAL_NOT_FOUND",
            Self::ExternalRateLimited => "EXTERNAL_RATE_LIMITED",
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::ExternalError => "EXTERNAL_ERROR",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::ApiNotFound => "API_NOT_FOUND",

            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest | Self::ConfigInvalidValue => 400,
            Self::ApiUnauthorized => 401,
            Self::ApiNotFound | Self::JobNotFound | Self::ExternalNotFound => 404,
            Self::ResolveNoMatch => 422,
            Self::ApiRateLimited | Self::ExternalRateLimited => 429,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalRateLimited
                | Self::ExternalTimeout
                | Self::ExternalError
                | Self::CacheUnavailable
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Query could not be classified
    pub fn no_match(query: &str) -> Self {
        Self::new(
            ErrorCode::ResolveNoMatch,
            format!("Could not classify this input: '{}'", query),
        )
    }

    /// Unknown job id
    pub fn job_not_found(job_id: &str) -> Self {
        Self::new(ErrorCode::JobNotFound, format!("Scan job not found: {}", job_id))
    }

    /// Illegal status transition
    pub fn invalid_transition(from: &str, to: &str) -> Self {
        Self::new(
            ErrorCode::JobInvalidTransition,
            format!("Illegal scan status transition: {} -> {}", from, to),
        )
    }

    /// Scoring input rejected
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScoringInvalidInput, msg)
    }

    /// Report store failure
    pub fn cache_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CacheUnavailable, msg)
    }

    /// Source has no record
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalNotFound, msg)
    }

    /// Source rate limited
    pub fn rate_limited(source: &str) -> Self {
        Self::new(
            ErrorCode::ExternalRateLimited,
            format!("{} rate limited (HTTP 429)", source),
        )
    }

    /// Generic source failure
    pub fn external(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalError, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API resource not found
    pub fn api_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotFound, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::CacheUnavailable, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ExternalError, "Connection failed")
        } else if err.is_decode() {
            Self::new(ErrorCode::ExternalError, format!("Invalid response body: {}", err))
        } else {
            Self::new(ErrorCode::ExternalError, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::CacheCorrupt, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::no_match("???");
        assert_eq!(err.code, ErrorCode::ResolveNoMatch);
        assert_eq!(err.code_str(), "RESOLVE_NO_MATCH");
        assert!(err.to_string().contains("Could not classify"));
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::ExternalTimeout.is_retryable());
        assert!(ErrorCode::ExternalRateLimited.is_retryable());
        assert!(!ErrorCode::ResolveNoMatch.is_retryable());
        assert!(!ErrorCode::ScoringInvalidInput.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ApiBadRequest.http_status(), 400);
        assert_eq!(ErrorCode::JobNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ResolveNoMatch.http_status(), 422);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::ScoringInvalidInput.http_status(), 500);
    }
}
