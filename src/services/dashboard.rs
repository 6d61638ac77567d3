use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::repository::DailyMetric;
use crate::storage::Store;

use super::error::ServiceError;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub period: &'static str,
    pub average_pain: f64,
    pub mood_distribution: HashMap<String, i64>,
    pub energy_levels: HashMap<String, i64>,
    pub check_in_count: i64,
    pub time_series_data: Vec<DailyMetric>,
}

pub struct DashboardService {
    store: Arc<Store>,
}

impl DashboardService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// `days` coerces any value outside `{7, 30, 90}` to 7. An empty
    /// window yields all zeros and empty maps, never a failure.
    pub async fn summary(&self, user_id: Uuid, days: i64, cancel: &CancellationToken) -> Result<DashboardSummary, ServiceError> {
        let (period, window) = match days {
            7 => ("7d", 7),
            30 => ("30d", 30),
            90 => ("90d", 90),
            _ => ("7d", 7),
        };

        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(window - 1);

        let aggregate = self.store.dashboard_aggregate(user_id, from, to, cancel).await?;

        let average_pain = if aggregate.pain_sample_count > 0 {
            aggregate.pain_sum as f64 / aggregate.pain_sample_count as f64
        } else {
            0.0
        };

        Ok(DashboardSummary {
            period,
            average_pain,
            mood_distribution: aggregate.mood_counts.into_iter().collect(),
            energy_levels: aggregate.energy_counts.into_iter().collect(),
            check_in_count: aggregate.check_in_count,
            time_series_data: aggregate.daily_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn service() -> DashboardService {
        DashboardService::new(Arc::new(Store::new(open_memory_database().unwrap())))
    }

    #[tokio::test]
    async fn empty_dashboard_is_all_zeros_not_a_failure() {
        let service = service();
        let cancel = CancellationToken::new();
        let summary = service.summary(Uuid::new_v4(), 7, &cancel).await.unwrap();

        assert_eq!(summary.check_in_count, 0);
        assert_eq!(summary.average_pain, 0.0);
        assert!(summary.mood_distribution.is_empty());
        assert!(summary.energy_levels.is_empty());
        assert!(summary.time_series_data.is_empty());
    }

    #[tokio::test]
    async fn unrecognized_days_value_coerces_to_seven() {
        let service = service();
        let cancel = CancellationToken::new();
        let summary = service.summary(Uuid::new_v4(), 42, &cancel).await.unwrap();
        assert_eq!(summary.period, "7d");
    }
}
