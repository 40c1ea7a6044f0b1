use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::database::DbPool;
use crate::models::{
    CampaignCounters, CounterUpdate, IdentifierKind, NewParticipation, RateLimitCheck,
    RateLimitConfig,
};
use crate::store::{ParticipationStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgParticipationStore {
    pool: DbPool,
}

impl PgParticipationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pg_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.code().as_deref() == Some("42703")
    {
        return StoreError::MissingColumn(db.message().to_string());
    }
    StoreError::Database(e)
}

impl ParticipationStore for PgParticipationStore {
    async fn rate_limit_settings(&self, campaign_id: Uuid) -> StoreResult<Option<RateLimitConfig>> {
        let settings = sqlx::query_as::<_, RateLimitConfig>(
            r#"
            SELECT ip_max_attempts, ip_window_minutes,
                   email_max_attempts, email_window_minutes,
                   device_max_attempts, device_window_minutes,
                   auto_block_enabled, block_duration_hours
            FROM campaign_rate_limit_settings
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn is_blocked(
        &self,
        campaign_id: Uuid,
        ip: Option<&str>,
        email: Option<&str>,
        device_fingerprint: Option<&str>,
    ) -> StoreResult<bool> {
        let blocked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM blocked_participants
                WHERE campaign_id = $1
                  AND blocked_until > now()
                  AND ((identifier_kind = 'ip' AND identifier = $2)
                    OR (identifier_kind = 'email' AND identifier = $3)
                    OR (identifier_kind = 'device' AND identifier = $4))
            )
            "#,
        )
        .bind(campaign_id)
        .bind(ip)
        .bind(email)
        .bind(device_fingerprint)
        .fetch_one(&self.pool)
        .await?;

        Ok(blocked)
    }

    async fn check_rate_limit(
        &self,
        campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        max_attempts: i32,
        window_minutes: i32,
    ) -> StoreResult<RateLimitCheck> {
        let window_start = Utc::now() - Duration::minutes(window_minutes as i64);

        let attempts: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rate_limit_attempts
            WHERE campaign_id = $1
              AND identifier_kind = $2
              AND identifier = $3
              AND attempted_at >= $4
            "#,
        )
        .bind(campaign_id)
        .bind(kind.as_str())
        .bind(identifier)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        if attempts >= max_attempts as i64 {
            // The limit clears when the oldest attempt in the window ages out
            let oldest: Option<DateTime<Utc>> = sqlx::query_scalar(
                r#"
                SELECT MIN(attempted_at) FROM rate_limit_attempts
                WHERE campaign_id = $1
                  AND identifier_kind = $2
                  AND identifier = $3
                  AND attempted_at >= $4
                "#,
            )
            .bind(campaign_id)
            .bind(kind.as_str())
            .bind(identifier)
            .bind(window_start)
            .fetch_one(&self.pool)
            .await?;

            return Ok(RateLimitCheck {
                allowed: false,
                attempts: Some(attempts),
                max_attempts: Some(max_attempts),
                blocked_until: oldest.map(|t| t + Duration::minutes(window_minutes as i64)),
                reason: Some("rate_limited".to_string()),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO rate_limit_attempts (campaign_id, identifier_kind, identifier)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(campaign_id)
        .bind(kind.as_str())
        .bind(identifier)
        .execute(&self.pool)
        .await?;

        Ok(RateLimitCheck {
            allowed: true,
            attempts: Some(attempts + 1),
            max_attempts: Some(max_attempts),
            ..Default::default()
        })
    }

    async fn insert_block(
        &self,
        campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        reason: &str,
        blocked_until: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blocked_participants
                (campaign_id, identifier_kind, identifier, reason, blocked_until)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(campaign_id)
        .bind(kind.as_str())
        .bind(identifier)
        .bind(reason)
        .bind(blocked_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_participation(
        &self,
        row: &NewParticipation,
        enriched: bool,
    ) -> StoreResult<()> {
        if enriched {
            sqlx::query(
                r#"
                INSERT INTO participations
                    (campaign_id, email, participation_data, completed_at,
                     device_type, browser, os, country,
                     utm_source, utm_medium, utm_campaign,
                     referrer, user_agent, device_fingerprint, ip_address)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(row.campaign_id)
            .bind(&row.email)
            .bind(&row.participation_data)
            .bind(row.completed_at)
            .bind(&row.device_type)
            .bind(&row.browser)
            .bind(&row.os)
            .bind(&row.country)
            .bind(&row.utm_source)
            .bind(&row.utm_medium)
            .bind(&row.utm_campaign)
            .bind(&row.referrer)
            .bind(&row.user_agent)
            .bind(&row.device_fingerprint)
            .bind(&row.ip_address)
            .execute(&self.pool)
            .await
            .map_err(map_pg_error)?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO participations (campaign_id, email, participation_data, completed_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.campaign_id)
            .bind(&row.email)
            .bind(&row.participation_data)
            .bind(row.completed_at)
            .execute(&self.pool)
            .await
            .map_err(map_pg_error)?;
        }

        Ok(())
    }

    async fn read_counters(&self, campaign_id: Uuid) -> StoreResult<Option<CampaignCounters>> {
        let counters = sqlx::query_as::<_, CampaignCounters>(
            r#"
            SELECT campaign_id, total_views, total_participations,
                   total_completions, last_participation_at
            FROM campaign_analytics
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(counters)
    }

    async fn insert_counters(
        &self,
        campaign_id: Uuid,
        total_participations: i64,
        total_completions: i64,
        last_participation_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        // total_views stays at its column default (0); view tracking owns it
        sqlx::query(
            r#"
            INSERT INTO campaign_analytics
                (campaign_id, total_participations, total_completions, last_participation_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(campaign_id)
        .bind(total_participations)
        .bind(total_completions)
        .bind(last_participation_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_counters(
        &self,
        campaign_id: Uuid,
        update: &CounterUpdate,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE campaign_analytics
            SET total_participations = $2,
                total_completions = $3,
                last_participation_at = $4,
                updated_at = now()
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .bind(update.total_participations)
        .bind(update.total_completions)
        .bind(update.last_participation_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
