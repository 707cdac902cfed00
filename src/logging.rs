//! Logging shims
//!
//! The router never talks to a logging backend directly. Every log line goes
//! through one of the macros below, which forward to whichever backend was
//! selected at compile time:
//!
//! - `log` (default) - the `log` facade, pair it with `env_logger` or similar
//! - `tracing` - `tracing` events, picked up by any installed subscriber
//!
//! With neither feature enabled the macros expand to nothing.
//!
//! Registration is logged at debug level, individual match decisions at trace
//! level and rejected requests (404/405) at debug or warn level.

/// Trace-level logging (per-segment matching decisions).
#[doc(hidden)]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level logging (registration, dispatch outcomes).
#[doc(hidden)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Warn-level logging (method mismatches, ignored removals).
#[doc(hidden)]
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}
