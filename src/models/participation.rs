use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Body of POST /participations. Everything besides `campaign_id`,
/// `result` and `device` is optional: participations may be anonymous.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ParticipationRequest {
    /// Target campaign
    pub campaign_id: Uuid,
    /// Top-level email (legacy clients send it here instead of in `contact`)
    #[serde(default)]
    pub email: Option<String>,
    /// Form answers collected before/after the game
    #[serde(default)]
    pub contact: Option<ContactData>,
    /// Game outcome as computed by the campaign widget
    pub result: ParticipationOutcome,
    /// Raw environment signals used to derive the device fingerprint
    pub device: DeviceSignals,
    /// URL of the page hosting the campaign widget (utm extraction)
    #[serde(default)]
    pub page_url: Option<String>,
    /// document.referrer as reported by the widget
    #[serde(default)]
    pub referrer: Option<String>,
}

/// Contact form answers. Known fields are validated; any additional
/// per-campaign form field ends up in `extra` untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ContactData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ParticipationOutcome {
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    /// Quiz/form answers attached to the outcome (free-form)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub answers: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Win,
    Lose,
}

impl OutcomeKind {
    pub fn is_win(self) -> bool {
        matches!(self, OutcomeKind::Win)
    }
}

/// Browser environment snapshot taken by the widget. This is the injected
/// capability object behind `generate_device_fingerprint`, so the hash is
/// computable (and testable) without a DOM.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DeviceSignals {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub color_depth: i32,
    #[serde(default)]
    pub screen_width: i32,
    #[serde(default)]
    pub screen_height: i32,
    /// Minutes, as returned by Date.getTimezoneOffset()
    #[serde(default)]
    pub timezone_offset: i32,
    #[serde(default)]
    pub has_session_storage: bool,
    #[serde(default)]
    pub has_local_storage: bool,
    /// Trailing slice of the data-URL of a fixed offscreen canvas render
    #[serde(default)]
    pub canvas_hash: String,
}

/// Row shape for the participations table. `participation_data` always
/// carries the full payload (contact, result, tracking); the dedicated
/// tracking columns are only written on the enriched insert path.
#[derive(Debug, Clone)]
pub struct NewParticipation {
    pub campaign_id: Uuid,
    pub email: Option<String>,
    pub participation_data: Value,
    pub completed_at: DateTime<Utc>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub country: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub device_fingerprint: Option<String>,
    pub ip_address: Option<String>,
}

/// Response for an accepted participation
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipationAccepted {
    pub device_fingerprint: String,
}
