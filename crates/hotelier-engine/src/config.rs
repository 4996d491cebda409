//! Engine configuration.

/// Configuration for the consistency engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reporting-day offset (minutes relative to UTC) for tenants that
    /// have not configured their own.
    pub default_reporting_offset_minutes: i32,
    /// Upper bound on reservation length, in nights. Longer stays are
    /// rejected as validation errors.
    pub max_stay_nights: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_reporting_offset_minutes: 0,
            max_stay_nights: 365,
        }
    }
}
