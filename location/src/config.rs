//! Continuous-update request configuration.

use serde::{Deserialize, Serialize};

/// Accuracy/power tradeoff hint for the platform location service.
///
/// The service picks its sources (GPS, wifi, cell) from this hint; the
/// flow never interprets it beyond passing it through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccuracyPriority {
    /// High precision, typically GPS.
    #[default]
    HighAccuracy,
    /// City-block precision from wifi and cell positioning.
    BalancedPower,
    /// City-level precision, coarse sources only.
    LowPower,
    /// No active fixing; piggyback on fixes triggered by other apps.
    NoPower,
}

/// Settings for a continuous-update subscription.
///
/// Constructed once, read-only thereafter. Also the input to the optional
/// device settings check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRequestConfig {
    /// Desired update interval in milliseconds.
    pub update_interval_ms: u64,
    /// Fastest rate in milliseconds at which the screen can handle updates.
    pub fastest_interval_ms: u64,
    /// Desired accuracy/power tradeoff.
    pub priority: AccuracyPriority,
}

impl Default for LocationRequestConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 10_000,
            fastest_interval_ms: 5_000,
            priority: AccuracyPriority::HighAccuracy,
        }
    }
}
