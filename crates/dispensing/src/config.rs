//! Coordinator configuration.

use tracing::warn;

/// Environment variable: how many times a compensating increment is tried.
pub const COMPENSATION_ATTEMPTS_VAR: &str = "DISPENSARY_COMPENSATION_ATTEMPTS";

/// Environment variable: whether `LowStockReached` events are published.
pub const PUBLISH_LOW_STOCK_VAR: &str = "DISPENSARY_PUBLISH_LOW_STOCK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispenseConfig {
    /// Tries per compensating increment before reporting `CompensationFailed`.
    /// Always at least 1.
    pub compensation_attempts: u32,
    /// Publish a `LowStockReached` event for each dispensed medicine that ends
    /// at or below its threshold. Notices are returned in the outcome either way.
    pub publish_low_stock: bool,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            compensation_attempts: 3,
            publish_low_stock: true,
        }
    }
}

impl DispenseConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults for
    /// missing or unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let compensation_attempts = parse_or(
            COMPENSATION_ATTEMPTS_VAR,
            lookup(COMPENSATION_ATTEMPTS_VAR),
            defaults.compensation_attempts,
        )
        .max(1);

        let publish_low_stock = parse_or(
            PUBLISH_LOW_STOCK_VAR,
            lookup(PUBLISH_LOW_STOCK_VAR),
            defaults.publish_low_stock,
        );

        Self {
            compensation_attempts,
            publish_low_stock,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: core::str::FromStr + core::fmt::Debug,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("{key}={raw:?} is not valid; using default {default:?}");
            default
        }
    }
}
