use crate::error::AppResult;
use crate::external::IpLookupService;
use crate::models::{NewParticipation, ParticipationAccepted, ParticipationRequest};
use crate::services::{AnalyticsService, RateLimitService};
use crate::store::ParticipationStore;
use crate::utils::{
    country_from_language, generate_device_fingerprint, normalize_email, parse_user_agent,
    utm_params, validate_email, validate_name, validate_phone,
};
use chrono::Utc;
use std::sync::Arc;

/// The participation admission pipeline:
/// validate -> fingerprint -> resolve IP -> effective settings ->
/// admission guard -> persist -> bump counters.
///
/// Only validation and admission errors reach the caller; recording and
/// analytics failures are logged and swallowed so the win/lose screen
/// renders regardless of storage trouble.
#[derive(Clone)]
pub struct ParticipationService<S> {
    store: Arc<S>,
    rate_limits: RateLimitService<S>,
    analytics: AnalyticsService<S>,
    ip_lookup: IpLookupService,
}

impl<S: ParticipationStore> ParticipationService<S> {
    pub fn new(store: Arc<S>, ip_lookup: IpLookupService) -> Self {
        Self {
            rate_limits: RateLimitService::new(store.clone()),
            analytics: AnalyticsService::new(store.clone()),
            store,
            ip_lookup,
        }
    }

    pub async fn record_participation(
        &self,
        request: ParticipationRequest,
        client_ip: Option<String>,
    ) -> AppResult<ParticipationAccepted> {
        let mut request = request;
        let email = validate_contact(&mut request)?;

        let fingerprint = generate_device_fingerprint(&request.device);
        let ip = self.ip_lookup.resolve(client_ip.as_deref()).await;

        let config = self.rate_limits.effective_settings(request.campaign_id).await;
        self.rate_limits
            .check_admission(
                request.campaign_id,
                ip.as_deref(),
                email.as_deref(),
                &fingerprint,
                &config,
            )
            .await?;

        let is_win = request.result.kind.is_win();

        if let Err(e) = self
            .persist(&request, email.as_deref(), ip.as_deref(), &fingerprint)
            .await
        {
            log::error!(
                "Failed to record participation for campaign {}: {e}",
                request.campaign_id
            );
        }

        if let Err(e) = self
            .analytics
            .record_participation(request.campaign_id, is_win)
            .await
        {
            log::error!(
                "Failed to update analytics for campaign {}: {e}",
                request.campaign_id
            );
        }

        Ok(ParticipationAccepted {
            device_fingerprint: fingerprint,
        })
    }

    /// Enriched insert first; a schema without the tracking columns (or any
    /// other insert failure) falls back to the minimal insert. The JSON
    /// payload carries the full enrichment either way, so no data is lost,
    /// only the dedicated queryable columns.
    async fn persist(
        &self,
        request: &ParticipationRequest,
        email: Option<&str>,
        ip: Option<&str>,
        fingerprint: &str,
    ) -> AppResult<()> {
        let device_info = parse_user_agent(&request.device.user_agent);
        let country = country_from_language(&request.device.language);
        let utm = request
            .page_url
            .as_deref()
            .map(utm_params)
            .unwrap_or_default();
        let now = Utc::now();

        let participation_data = serde_json::json!({
            "contact_data": &request.contact,
            "result": &request.result,
            "timestamp": now,
            "device_type": &device_info.device_type,
            "browser": &device_info.browser,
            "os": &device_info.os,
            "country": &country,
            "utm_source": &utm.source,
            "utm_medium": &utm.medium,
            "utm_campaign": &utm.campaign,
            "referrer": &request.referrer,
            "user_agent": &request.device.user_agent,
            "device_fingerprint": fingerprint,
            "ip_address": ip,
        });

        let row = NewParticipation {
            campaign_id: request.campaign_id,
            email: email.map(str::to_string),
            participation_data,
            completed_at: now,
            device_type: Some(device_info.device_type),
            browser: Some(device_info.browser),
            os: Some(device_info.os),
            country,
            utm_source: utm.source,
            utm_medium: utm.medium,
            utm_campaign: utm.campaign,
            referrer: request.referrer.clone(),
            user_agent: Some(request.device.user_agent.clone()),
            device_fingerprint: Some(fingerprint.to_string()),
            ip_address: ip.map(str::to_string),
        };

        match self.store.insert_participation(&row, true).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_missing_column() => {
                log::warn!(
                    "Participations table lacks tracking columns, falling back to minimal insert: {e}"
                );
                Ok(self.store.insert_participation(&row, false).await?)
            }
            Err(e) => {
                // Last-resort retry through the minimal path
                log::warn!("Enriched participation insert failed, retrying minimal: {e}");
                Ok(self.store.insert_participation(&row, false).await?)
            }
        }
    }
}

/// Field order matters: email, then phone, then name, aborting on the
/// first invalid one. Returns the normalized email used downstream as the
/// rate-limit identifier.
fn validate_contact(request: &mut ParticipationRequest) -> AppResult<Option<String>> {
    let mut normalized = None;

    if let Some(contact) = request.contact.as_mut()
        && let Some(email) = contact.email.as_mut()
    {
        validate_email(email)?;
        *email = normalize_email(email);
        normalized = Some(email.clone());
    }

    if normalized.is_none()
        && let Some(email) = request.email.as_mut()
    {
        validate_email(email)?;
        *email = normalize_email(email);
        normalized = Some(email.clone());
    }

    if let Some(contact) = request.contact.as_ref() {
        if let Some(phone) = contact.phone.as_deref() {
            validate_phone(phone)?;
        }
        if let Some(name) = contact.name.as_deref() {
            validate_name(name)?;
        }
    }

    Ok(normalized)
}
