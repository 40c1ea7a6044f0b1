//! In-memory ParticipationStore used by the service tests. Configuration
//! fields are set before the store is wrapped in an Arc; invocation
//! recording goes through mutexes.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    CampaignCounters, CounterUpdate, IdentifierKind, NewParticipation, RateLimitCheck,
    RateLimitConfig,
};
use crate::store::{ParticipationStore, StoreError, StoreResult};

#[derive(Clone, Copy, Debug)]
pub enum MockFailure {
    MissingColumn,
    Database,
}

fn make_error(failure: MockFailure) -> StoreError {
    match failure {
        MockFailure::MissingColumn => StoreError::MissingColumn(
            "column \"device_type\" of relation \"participations\" does not exist".to_string(),
        ),
        MockFailure::Database => StoreError::Database(sqlx::Error::PoolTimedOut),
    }
}

#[derive(Default)]
pub struct MockStore {
    // Behavior knobs
    pub settings: Option<RateLimitConfig>,
    pub fail_settings: bool,
    pub blocked: bool,
    pub fail_block_check: bool,
    pub deny: Option<IdentifierKind>,
    pub deny_blocked_until: Option<DateTime<Utc>>,
    pub fail_rate_limit: bool,
    pub enriched_insert_failure: Option<MockFailure>,
    pub minimal_insert_failure: Option<MockFailure>,
    pub fail_counters: bool,
    pub counters: Mutex<Option<CampaignCounters>>,

    // Invocation records
    pub block_checks: Mutex<u32>,
    pub rate_limit_checks: Mutex<Vec<(IdentifierKind, String, i32, i32)>>,
    pub attempts: Mutex<HashMap<(IdentifierKind, String), i64>>,
    pub blocks: Mutex<Vec<(IdentifierKind, String)>>,
    pub inserts: Mutex<Vec<(NewParticipation, bool)>>,
    pub counter_inserts: Mutex<Vec<(i64, i64)>>,
    pub counter_updates: Mutex<Vec<CounterUpdate>>,
}

impl ParticipationStore for MockStore {
    async fn rate_limit_settings(
        &self,
        _campaign_id: Uuid,
    ) -> StoreResult<Option<RateLimitConfig>> {
        if self.fail_settings {
            return Err(make_error(MockFailure::Database));
        }
        Ok(self.settings.clone())
    }

    async fn is_blocked(
        &self,
        _campaign_id: Uuid,
        _ip: Option<&str>,
        _email: Option<&str>,
        _device_fingerprint: Option<&str>,
    ) -> StoreResult<bool> {
        *self.block_checks.lock().unwrap() += 1;
        if self.fail_block_check {
            return Err(make_error(MockFailure::Database));
        }
        Ok(self.blocked)
    }

    async fn check_rate_limit(
        &self,
        _campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        max_attempts: i32,
        window_minutes: i32,
    ) -> StoreResult<RateLimitCheck> {
        if self.fail_rate_limit {
            return Err(make_error(MockFailure::Database));
        }

        self.rate_limit_checks.lock().unwrap().push((
            kind,
            identifier.to_string(),
            max_attempts,
            window_minutes,
        ));

        if self.deny == Some(kind) {
            return Ok(RateLimitCheck {
                allowed: false,
                attempts: Some(max_attempts as i64),
                max_attempts: Some(max_attempts),
                blocked_until: self.deny_blocked_until,
                reason: Some("rate_limited".to_string()),
            });
        }

        // Window-less attempt counting, enough to exercise the thresholds
        let mut attempts = self.attempts.lock().unwrap();
        let count = attempts
            .entry((kind, identifier.to_string()))
            .or_insert(0);
        if *count >= max_attempts as i64 {
            return Ok(RateLimitCheck {
                allowed: false,
                attempts: Some(*count),
                max_attempts: Some(max_attempts),
                blocked_until: None,
                reason: Some("rate_limited".to_string()),
            });
        }
        *count += 1;

        Ok(RateLimitCheck {
            allowed: true,
            attempts: Some(*count),
            max_attempts: Some(max_attempts),
            ..Default::default()
        })
    }

    async fn insert_block(
        &self,
        _campaign_id: Uuid,
        identifier: &str,
        kind: IdentifierKind,
        _reason: &str,
        _blocked_until: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.blocks
            .lock()
            .unwrap()
            .push((kind, identifier.to_string()));
        Ok(())
    }

    async fn insert_participation(
        &self,
        row: &NewParticipation,
        enriched: bool,
    ) -> StoreResult<()> {
        self.inserts.lock().unwrap().push((row.clone(), enriched));
        let failure = if enriched {
            self.enriched_insert_failure
        } else {
            self.minimal_insert_failure
        };
        match failure {
            Some(f) => Err(make_error(f)),
            None => Ok(()),
        }
    }

    async fn read_counters(&self, _campaign_id: Uuid) -> StoreResult<Option<CampaignCounters>> {
        if self.fail_counters {
            return Err(make_error(MockFailure::Database));
        }
        Ok(self.counters.lock().unwrap().clone())
    }

    async fn insert_counters(
        &self,
        _campaign_id: Uuid,
        total_participations: i64,
        total_completions: i64,
        _last_participation_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.counter_inserts
            .lock()
            .unwrap()
            .push((total_participations, total_completions));
        Ok(())
    }

    async fn update_counters(
        &self,
        _campaign_id: Uuid,
        update: &CounterUpdate,
    ) -> StoreResult<()> {
        self.counter_updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}
