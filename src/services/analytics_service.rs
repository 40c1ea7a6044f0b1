use crate::error::AppResult;
use crate::models::CounterUpdate;
use crate::store::ParticipationStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Maintains the aggregate dashboard counters for a campaign.
///
/// The row is created lazily on the first participation and bumped with a
/// read-then-write afterwards. That read-modify-write is not transactional:
/// two concurrent participations can lose an increment. Accepted, because
/// these are approximate dashboard metrics, not billing-grade counts.
#[derive(Clone)]
pub struct AnalyticsService<S> {
    store: Arc<S>,
}

impl<S: ParticipationStore> AnalyticsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Bump total_participations (and total_completions on a win).
    /// total_views belongs to view tracking and is never written here.
    pub async fn record_participation(&self, campaign_id: Uuid, is_win: bool) -> AppResult<()> {
        let completions = if is_win { 1 } else { 0 };

        match self.store.read_counters(campaign_id).await? {
            None => {
                self.store
                    .insert_counters(campaign_id, 1, completions, Utc::now())
                    .await?;
            }
            Some(current) => {
                let update = CounterUpdate {
                    total_participations: current.total_participations + 1,
                    total_completions: current.total_completions + completions,
                    last_participation_at: Utc::now(),
                };
                self.store.update_counters(campaign_id, &update).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CampaignCounters;
    use crate::services::test_support::MockStore;

    #[tokio::test]
    async fn test_first_participation_inserts_fresh_row() {
        let store = Arc::new(MockStore::default());
        let service = AnalyticsService::new(store.clone());
        let campaign_id = Uuid::new_v4();

        service.record_participation(campaign_id, true).await.unwrap();

        let inserts = store.counter_inserts.lock().unwrap();
        assert_eq!(inserts.as_slice(), &[(1, 1)]);
        assert!(store.counter_updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lose_does_not_count_as_completion() {
        let store = Arc::new(MockStore::default());
        let service = AnalyticsService::new(store.clone());

        service
            .record_participation(Uuid::new_v4(), false)
            .await
            .unwrap();

        assert_eq!(store.counter_inserts.lock().unwrap().as_slice(), &[(1, 0)]);
    }

    #[tokio::test]
    async fn test_existing_row_is_incremented() {
        let mut mock = MockStore::default();
        let campaign_id = Uuid::new_v4();
        mock.counters = std::sync::Mutex::new(Some(CampaignCounters {
            campaign_id,
            total_views: 42,
            total_participations: 7,
            total_completions: 3,
            last_participation_at: None,
        }));
        let store = Arc::new(mock);
        let service = AnalyticsService::new(store.clone());

        service.record_participation(campaign_id, true).await.unwrap();

        let updates = store.counter_updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].total_participations, 8);
        assert_eq!(updates[0].total_completions, 4);
        // No insert path taken, so total_views was never written
        assert!(store.counter_inserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_propagates_to_caller_for_logging() {
        let mut mock = MockStore::default();
        mock.fail_counters = true;
        let service = AnalyticsService::new(Arc::new(mock));

        assert!(
            service
                .record_participation(Uuid::new_v4(), true)
                .await
                .is_err()
        );
    }
}
