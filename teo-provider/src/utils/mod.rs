//! Utility modules.

/// Handler log id and elapsed-time guard.
pub mod elapsed;

/// Log sanitization: secret masking and body truncation.
pub mod log_sanitizer;
