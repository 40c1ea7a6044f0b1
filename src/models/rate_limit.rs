use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Per-campaign anti-fraud thresholds. One `{max_attempts, window_minutes}`
/// pair per identifier class; the three limiters are independent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RateLimitConfig {
    pub ip_max_attempts: i32,
    pub ip_window_minutes: i32,
    pub email_max_attempts: i32,
    pub email_window_minutes: i32,
    pub device_max_attempts: i32,
    pub device_window_minutes: i32,
    pub auto_block_enabled: bool,
    pub block_duration_hours: i32,
}

impl Default for RateLimitConfig {
    /// Global fallback used whenever a campaign has no override row or the
    /// lookup fails.
    fn default() -> Self {
        RateLimitConfig {
            ip_max_attempts: 5,
            ip_window_minutes: 60,
            email_max_attempts: 3,
            email_window_minutes: 60,
            device_max_attempts: 5,
            device_window_minutes: 60,
            auto_block_enabled: true,
            block_duration_hours: 24,
        }
    }
}

/// Identifier classes the limiters key on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Ip,
    Email,
    Device,
}

impl IdentifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierKind::Ip => "ip",
            IdentifierKind::Email => "email",
            IdentifierKind::Device => "device",
        }
    }
}

/// Outcome of a single limiter probe. Consumed by the admission guard,
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct RateLimitCheck {
    pub allowed: bool,
    pub attempts: Option<i64>,
    pub max_attempts: Option<i32>,
    pub blocked_until: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl RateLimitCheck {
    pub fn allowed() -> Self {
        RateLimitCheck {
            allowed: true,
            ..Default::default()
        }
    }
}
