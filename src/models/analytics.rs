use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Aggregate dashboard counters, one row per campaign.
///
/// `total_views` belongs to the view-tracking subsystem; this service only
/// ever touches participations/completions/last_participation_at.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CampaignCounters {
    pub campaign_id: Uuid,
    pub total_views: i64,
    pub total_participations: i64,
    pub total_completions: i64,
    pub last_participation_at: Option<DateTime<Utc>>,
}

/// Values for a counters update (read-modify-write, see AnalyticsService)
#[derive(Debug, Clone)]
pub struct CounterUpdate {
    pub total_participations: i64,
    pub total_completions: i64,
    pub last_participation_at: DateTime<Utc>,
}
