use crate::error::{AppError, AppResult};
use crate::models::{IdentifierKind, RateLimitConfig};
use crate::store::ParticipationStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Generic message on a block-list hit. Deliberately does not say which
/// signal matched, to avoid leaking enumeration info to abusers.
pub const BLOCKED_MESSAGE: &str = "Vous avez été temporairement bloqué en raison de tentatives suspectes. Veuillez réessayer plus tard.";

const IP_LIMIT_MESSAGE: &str =
    "Trop de tentatives depuis votre connexion. Veuillez réessayer après {time}.";
const EMAIL_LIMIT_MESSAGE: &str =
    "Cet email a déjà participé trop de fois. Veuillez réessayer après {time}.";
const DEVICE_LIMIT_MESSAGE: &str =
    "Trop de tentatives depuis cet appareil. Veuillez réessayer après {time}.";

/// Settings resolution plus the admission guard: block list first, then
/// the three independent limiters (IP, email, device fingerprint).
///
/// The three signals are individually weak (shared NAT, disposable email,
/// fingerprint collision); combined, an abuser has to defeat all three at
/// once. Store failures on any check fail open so an infrastructure hiccup
/// never turns away a legitimate participant.
#[derive(Clone)]
pub struct RateLimitService<S> {
    store: Arc<S>,
}

impl<S: ParticipationStore> RateLimitService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Campaign override, or the global defaults when there is none or the
    /// lookup fails. Never fails: settings resolution must not be able to
    /// take the participation pipeline down.
    pub async fn effective_settings(&self, campaign_id: Uuid) -> RateLimitConfig {
        match self.store.rate_limit_settings(campaign_id).await {
            Ok(Some(config)) => config,
            Ok(None) => RateLimitConfig::default(),
            Err(e) => {
                log::warn!(
                    "Rate limit settings lookup failed for campaign {campaign_id}, using defaults: {e}"
                );
                RateLimitConfig::default()
            }
        }
    }

    /// Short-circuits on the first violation. The IP check is skipped when
    /// no address could be resolved, the email check when the participation
    /// is anonymous; the device check always runs.
    pub async fn check_admission(
        &self,
        campaign_id: Uuid,
        ip: Option<&str>,
        email: Option<&str>,
        device_fingerprint: &str,
        config: &RateLimitConfig,
    ) -> AppResult<()> {
        match self
            .store
            .is_blocked(campaign_id, ip, email, Some(device_fingerprint))
            .await
        {
            Ok(true) => return Err(AppError::AdmissionDenied(BLOCKED_MESSAGE.to_string())),
            Ok(false) => {}
            Err(e) => {
                log::warn!("Block check failed for campaign {campaign_id}, failing open: {e}");
            }
        }

        if let Some(ip) = ip {
            self.check_one(
                campaign_id,
                ip,
                IdentifierKind::Ip,
                config.ip_max_attempts,
                config.ip_window_minutes,
                config,
                IP_LIMIT_MESSAGE,
            )
            .await?;
        }

        if let Some(email) = email {
            self.check_one(
                campaign_id,
                email,
                IdentifierKind::Email,
                config.email_max_attempts,
                config.email_window_minutes,
                config,
                EMAIL_LIMIT_MESSAGE,
            )
            .await?;
        }

        self.check_one(
            campaign_id,
            device_fingerprint,
            IdentifierKind::Device,
            config.device_max_attempts,
            config.device_window_minutes,
            config,
            DEVICE_LIMIT_MESSAGE,
        )
        .await?;

        Ok(())
    }

    async fn check_one(
        &self,
        campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        max_attempts: i32,
        window_minutes: i32,
        config: &RateLimitConfig,
        message: &str,
    ) -> AppResult<()> {
        let check = match self
            .store
            .check_rate_limit(campaign_id, identifier, kind, max_attempts, window_minutes)
            .await
        {
            Ok(check) => check,
            Err(e) => {
                log::warn!(
                    "Rate limit check ({}) failed for campaign {campaign_id}, failing open: {e}",
                    kind.as_str()
                );
                return Ok(());
            }
        };

        if check.allowed {
            return Ok(());
        }

        if config.auto_block_enabled {
            let until = Utc::now() + Duration::hours(config.block_duration_hours as i64);
            if let Err(e) = self
                .store
                .insert_block(campaign_id, identifier, kind, "rate_limit_exceeded", until)
                .await
            {
                log::warn!(
                    "Failed to auto-block {} identifier for campaign {campaign_id}: {e}",
                    kind.as_str()
                );
            }
        }

        let retry_at = check
            .blocked_until
            .unwrap_or_else(|| Utc::now() + Duration::minutes(window_minutes as i64));

        Err(AppError::AdmissionDenied(
            message.replace("{time}", &format_retry_time(retry_at)),
        ))
    }
}

fn format_retry_time(t: DateTime<Utc>) -> String {
    t.format("%H:%M").to_string()
}
