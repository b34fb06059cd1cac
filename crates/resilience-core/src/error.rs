//! Common error types for resilience-engine patterns.
//!
//! This module provides [`ResilienceError`], a unified error type that eliminates
//! the need for manual `From` trait implementations when composing multiple resilience
//! layers.
//!
//! # The Problem
//!
//! When using multiple resilience layers (bulkhead, circuit breaker, rate limiter, etc.),
//! you typically need to write repetitive `From` trait implementations:
//!
//! ```rust,ignore
//! // Without ResilienceError: ~80 lines of boilerplate for 4 layers
//! impl From<BulkheadError> for ServiceError { /* ... */ }
//! impl From<CircuitBreakerError> for ServiceError { /* ... */ }
//! impl From<RateLimiterError> for ServiceError { /* ... */ }
//! impl From<TimeoutError> for ServiceError { /* ... */ }
//! ```
//!
//! # The Solution
//!
//! Use [`ResilienceError<E>`] as your service error type:
//!
//! ```rust
//! use resilience_core::ResilienceError;
//!
//! #[derive(Debug, Clone)]
//! enum AppError {
//!     DatabaseDown,
//!     InvalidRequest,
//! }
//!
//! impl std::fmt::Display for AppError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         match self {
//!             AppError::DatabaseDown => write!(f, "Database down"),
//!             AppError::InvalidRequest => write!(f, "Invalid request"),
//!         }
//!     }
//! }
//!
//! impl std::error::Error for AppError {}
//!
//! type ServiceError = ResilienceError<AppError>;
//! ```
//!
//! # Pattern Matching
//!
//! ```rust
//! use resilience_core::ResilienceError;
//!
//! # #[derive(Debug)]
//! # struct AppError;
//! # impl std::fmt::Display for AppError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { Ok(()) }
//! # }
//! # impl std::error::Error for AppError {}
//! fn handle_error(error: ResilienceError<AppError>) {
//!     match error {
//!         ResilienceError::Timeout { layer } => {
//!             eprintln!("Timeout in {}", layer);
//!         }
//!         ResilienceError::CircuitOpen { name } => {
//!             eprintln!("Circuit breaker {:?} is open", name);
//!         }
//!         ResilienceError::BulkheadFull { in_flight, max_concurrent } => {
//!             eprintln!("Bulkhead full: {}/{}", in_flight, max_concurrent);
//!         }
//!         ResilienceError::RateLimited { retry_after } => {
//!             eprintln!("Rate limited, retry after {:?}", retry_after);
//!         }
//!         ResilienceError::Application(app_err) => {
//!             eprintln!("Application error: {}", app_err);
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// A common error type that wraps all resilience layer errors.
///
/// This allows users to compose multiple resilience patterns without
/// writing any error conversion code. Each resilience layer error automatically
/// converts into the appropriate `ResilienceError` variant.
///
/// # Type Parameters
///
/// - `E`: The application-specific error type from the wrapped service
#[derive(Debug, Clone)]
pub enum ResilienceError<E> {
    /// A timeout occurred.
    Timeout {
        /// The layer that timed out (e.g., "timeout", "bulkhead")
        layer: &'static str,
    },

    /// Circuit breaker is open, call rejected.
    CircuitOpen {
        /// Circuit breaker name (if configured)
        name: Option<String>,
    },

    /// Bulkhead is at capacity, call rejected.
    BulkheadFull {
        /// Current number of in-flight calls plus queued waiters
        in_flight: usize,
        /// Maximum allowed concurrent calls
        max_concurrent: usize,
    },

    /// Rate limiter rejected the call.
    RateLimited {
        /// How long to wait before retrying (if available)
        retry_after: Option<Duration>,
    },

    /// Retry engine exhausted its attempt budget.
    AttemptsExceeded {
        /// Number of attempts made before giving up.
        attempts: usize,
    },

    /// Hedge engine exhausted its wall-clock budget with no success.
    HedgeTimeout,

    /// A fail-fast gate is tripped.
    FailFastOpen {
        /// Fail-fast gate name (if configured)
        name: Option<String>,
    },

    /// A feature toggle gate is disabled.
    FeatureDisabled {
        /// Feature name.
        name: String,
    },

    /// The underlying application service returned an error.
    Application(E),
}

impl<E> fmt::Display for ResilienceError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceError::Timeout { layer } => write!(f, "Timeout in {}", layer),
            ResilienceError::CircuitOpen { name } => match name {
                Some(n) => write!(f, "Circuit breaker '{}' is open", n),
                None => write!(f, "Circuit breaker is open"),
            },
            ResilienceError::BulkheadFull {
                in_flight,
                max_concurrent,
            } => write!(f, "Bulkhead full ({}/{})", in_flight, max_concurrent),
            ResilienceError::RateLimited { retry_after } => match retry_after {
                Some(d) => write!(f, "Rate limited, retry after {:?}", d),
                None => write!(f, "Rate limited"),
            },
            ResilienceError::AttemptsExceeded { attempts } => {
                write!(f, "Retry attempts exceeded ({} attempts)", attempts)
            }
            ResilienceError::HedgeTimeout => write!(f, "Hedge timed out with no success"),
            ResilienceError::FailFastOpen { name } => match name {
                Some(n) => write!(f, "Fail-fast '{}' is tripped", n),
                None => write!(f, "Fail-fast is tripped"),
            },
            ResilienceError::FeatureDisabled { name } => {
                write!(f, "Feature '{}' is disabled", name)
            }
            ResilienceError::Application(e) => write!(f, "Application error: {}", e),
        }
    }
}

impl<E> std::error::Error for ResilienceError<E> where E: std::error::Error {}

impl<E> ResilienceError<E> {
    /// Returns `true` if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::Timeout { .. })
    }

    /// Returns `true` if this is a circuit breaker error.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Returns `true` if this is a bulkhead error.
    pub fn is_bulkhead_full(&self) -> bool {
        matches!(self, ResilienceError::BulkheadFull { .. })
    }

    /// Returns `true` if this is a rate limiter error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ResilienceError::RateLimited { .. })
    }

    /// Returns `true` if this is an application error.
    pub fn is_application(&self) -> bool {
        matches!(self, ResilienceError::Application(_))
    }

    /// Extracts the application error, if this is an `Application` variant.
    pub fn application_error(self) -> Option<E> {
        match self {
            ResilienceError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// The stable error-kind name, used by the control plane's exception-to-status
    /// mapping and by metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ResilienceError::Timeout { .. } => "timeout",
            ResilienceError::CircuitOpen { .. } => "circuit_open",
            ResilienceError::BulkheadFull { .. } => "bulkhead_full",
            ResilienceError::RateLimited { .. } => "rate_limited",
            ResilienceError::AttemptsExceeded { .. } => "attempts_exceeded",
            ResilienceError::HedgeTimeout => "hedge_timeout",
            ResilienceError::FailFastOpen { .. } => "fail_fast_open",
            ResilienceError::FeatureDisabled { .. } => "feature_disabled",
            ResilienceError::Application(_) => "application",
        }
    }

    /// The default HTTP status code for this error kind, per the error taxonomy.
    pub fn http_status(&self) -> u16 {
        match self {
            ResilienceError::RateLimited { .. } => 429,
            ResilienceError::CircuitOpen { .. }
            | ResilienceError::BulkheadFull { .. }
            | ResilienceError::AttemptsExceeded { .. }
            | ResilienceError::FailFastOpen { .. } => 503,
            ResilienceError::Timeout { .. } | ResilienceError::HedgeTimeout => 504,
            ResilienceError::FeatureDisabled { .. } => 403,
            ResilienceError::Application(_) => 500,
        }
    }

    /// Maps the application error using a function.
    ///
    /// ```rust
    /// use resilience_core::ResilienceError;
    ///
    /// let err: ResilienceError<String> = ResilienceError::Application("error".to_string());
    /// let mapped: ResilienceError<usize> = err.map_application(|s| s.len());
    /// assert_eq!(mapped.application_error(), Some(5));
    /// ```
    pub fn map_application<F, T>(self, f: F) -> ResilienceError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResilienceError::Timeout { layer } => ResilienceError::Timeout { layer },
            ResilienceError::CircuitOpen { name } => ResilienceError::CircuitOpen { name },
            ResilienceError::BulkheadFull {
                in_flight,
                max_concurrent,
            } => ResilienceError::BulkheadFull {
                in_flight,
                max_concurrent,
            },
            ResilienceError::RateLimited { retry_after } => {
                ResilienceError::RateLimited { retry_after }
            }
            ResilienceError::AttemptsExceeded { attempts } => {
                ResilienceError::AttemptsExceeded { attempts }
            }
            ResilienceError::HedgeTimeout => ResilienceError::HedgeTimeout,
            ResilienceError::FailFastOpen { name } => ResilienceError::FailFastOpen { name },
            ResilienceError::FeatureDisabled { name } => {
                ResilienceError::FeatureDisabled { name }
            }
            ResilienceError::Application(e) => ResilienceError::Application(f(e)),
        }
    }
}
