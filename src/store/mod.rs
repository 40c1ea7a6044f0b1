pub mod postgres;

pub use postgres::PgParticipationStore;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CampaignCounters, CounterUpdate, IdentifierKind, NewParticipation, RateLimitCheck,
    RateLimitConfig,
};

#[derive(Error, Debug)]
pub enum StoreError {
    /// The enriched insert hit a schema without the tracking columns
    /// (SQLSTATE 42703). Distinguished so the recorder can fall back to
    /// the minimal insert without string-sniffing driver messages.
    #[error("undefined column: {0}")]
    MissingColumn(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_missing_column(&self) -> bool {
        matches!(self, StoreError::MissingColumn(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for crate::error::AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(err) => crate::error::AppError::DatabaseError(err),
            StoreError::MissingColumn(msg) => {
                crate::error::AppError::InternalError(format!("undefined column: {msg}"))
            }
        }
    }
}

/// Everything the admission pipeline needs from the backing store. The
/// services are generic over this trait so tests can drive them with an
/// in-memory mock that records invocations.
#[allow(async_fn_in_trait)]
pub trait ParticipationStore: Send + Sync + 'static {
    /// Per-campaign rate-limit overrides; Ok(None) when the campaign has
    /// no override row.
    async fn rate_limit_settings(&self, campaign_id: Uuid) -> StoreResult<Option<RateLimitConfig>>;

    /// Is any of the given identifiers on an active block list for this
    /// campaign?
    async fn is_blocked(
        &self,
        campaign_id: Uuid,
        ip: Option<&str>,
        email: Option<&str>,
        device_fingerprint: Option<&str>,
    ) -> StoreResult<bool>;

    /// Count prior attempts for the identifier within the window and
    /// record this one. Not allowed once `max_attempts` is reached.
    async fn check_rate_limit(
        &self,
        campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        max_attempts: i32,
        window_minutes: i32,
    ) -> StoreResult<RateLimitCheck>;

    /// Auto-block support: put an identifier on the block list until the
    /// given instant.
    async fn insert_block(
        &self,
        campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        reason: &str,
        blocked_until: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Insert a participation row. With `enriched` the tracking metadata
    /// goes into dedicated columns as well as the JSON payload; without it
    /// only campaign_id/email/participation_data/completed_at are written.
    async fn insert_participation(
        &self,
        row: &NewParticipation,
        enriched: bool,
    ) -> StoreResult<()>;

    async fn read_counters(&self, campaign_id: Uuid) -> StoreResult<Option<CampaignCounters>>;

    async fn insert_counters(
        &self,
        campaign_id: Uuid,
        total_participations: i64,
        total_completions: i64,
        last_participation_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn update_counters(
        &self,
        campaign_id: Uuid,
        update: &CounterUpdate,
    ) -> StoreResult<()>;
}
