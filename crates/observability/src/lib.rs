//! Process-wide tracing setup for part summary services.

/// Initialize structured logging for the process.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, JSON formatting).
pub mod tracing;
