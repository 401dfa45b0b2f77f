//! Process-wide tracing setup shared by the dispensary binaries.

/// Subscriber installation (filters, JSON layer).
pub mod subscriber;

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize process-wide tracing with [`DEFAULT_FILTER`].
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    subscriber::init(DEFAULT_FILTER);
}
