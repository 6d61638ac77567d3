use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::enums::{AuditOperationType, FitnessDataType};
use crate::models::{BloodPressureReading, FitnessDataPoint, MenstruationCycle};
use crate::storage::Store;

use super::audit::{AuditService, RequestContext};
use super::error::ServiceError;

pub struct FitnessSyncSummary {
    pub ingested: usize,
    pub skipped_duplicate: usize,
}

pub struct HealthDataService {
    store: Arc<Store>,
    audit: Arc<AuditService>,
}

impl HealthDataService {
    pub fn new(store: Arc<Store>, audit: Arc<AuditService>) -> Self {
        Self { store, audit }
    }

    pub async fn record_blood_pressure(
        &self,
        user_id: Uuid,
        systolic: i32,
        diastolic: i32,
        pulse: i32,
        measured_at: DateTime<Utc>,
        context: RequestContext,
        cancel: &CancellationToken,
    ) -> Result<BloodPressureReading, ServiceError> {
        if !BloodPressureReading::in_range(systolic, diastolic, pulse) {
            return Err(ServiceError::validation(
                "blood pressure reading out of range: systolic [70,250], diastolic [40,150], pulse [30,220]",
            ));
        }

        self.store.ensure_user(user_id, cancel).await?;

        let reading = BloodPressureReading {
            id: Uuid::new_v4(),
            user_id,
            systolic,
            diastolic,
            pulse,
            measured_at,
        };
        self.store.insert_blood_pressure_reading(reading.clone(), cancel).await?;
        self.audit
            .record(user_id, AuditOperationType::Create, "blood_pressure_reading", &reading.id.to_string(), &context, None, cancel)
            .await;
        Ok(reading)
    }

    pub async fn list_blood_pressure(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<BloodPressureReading>, ServiceError> {
        Ok(self.store.list_blood_pressure_readings_in_range(user_id, from, to, cancel).await?)
    }

    pub async fn record_cycle(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        flow_intensity: Option<crate::models::enums::FlowIntensity>,
        symptoms: Vec<String>,
        context: RequestContext,
        cancel: &CancellationToken,
    ) -> Result<MenstruationCycle, ServiceError> {
        self.store.ensure_user(user_id, cancel).await?;

        let cycle = MenstruationCycle {
            id: Uuid::new_v4(),
            user_id,
            start_date,
            end_date,
            flow_intensity,
            symptoms,
        };
        self.store.insert_cycle(cycle.clone(), cancel).await?;
        self.audit
            .record(user_id, AuditOperationType::Create, "menstruation_cycle", &cycle.id.to_string(), &context, None, cancel)
            .await;
        Ok(cycle)
    }

    pub async fn list_cycles(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<MenstruationCycle>, ServiceError> {
        Ok(self.store.list_cycles_in_range(user_id, from, to, cancel).await?)
    }

    /// Fitness-data types outside the enumerated set are skipped (logged,
    /// counted) rather than failing the whole sync. Idempotent on
    /// `source_data_id`.
    pub async fn sync_fitness_data(
        &self,
        user_id: Uuid,
        points: Vec<RawFitnessPoint>,
        context: RequestContext,
        cancel: &CancellationToken,
    ) -> Result<FitnessSyncSummary, ServiceError> {
        self.store.ensure_user(user_id, cancel).await?;

        let mut ingested = 0;
        let mut skipped_duplicate = 0;

        for point in points {
            let Some(data_type) = FitnessDataType::ALL.iter().find(|t| t.as_str() == point.data_type).copied() else {
                tracing::warn!(data_type = %point.data_type, "skipped fitness point with unrecognized type");
                continue;
            };

            let record = FitnessDataPoint {
                id: Uuid::new_v4(),
                user_id,
                date: point.date,
                data_type,
                value: point.value,
                unit: point.unit,
                source: point.source,
                source_data_id: point.source_data_id,
            };

            if self.store.insert_fitness_data_point(record, cancel).await? {
                ingested += 1;
            } else {
                skipped_duplicate += 1;
            }
        }

        self.audit
            .record(
                user_id,
                AuditOperationType::Create,
                "fitness_sync",
                &user_id.to_string(),
                &context,
                Some(serde_json::json!({ "ingested": ingested, "skipped_duplicate": skipped_duplicate })),
                cancel,
            )
            .await;

        Ok(FitnessSyncSummary { ingested, skipped_duplicate })
    }

    pub async fn list_fitness_data(
        &self,
        user_id: Uuid,
        data_type: Option<FitnessDataType>,
        from: NaiveDate,
        to: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<FitnessDataPoint>, ServiceError> {
        Ok(self.store.list_fitness_data_in_range(user_id, data_type, from, to, cancel).await?)
    }
}

/// Wire-level fitness point before its `data_type` string is resolved
/// against the enumerated set.
pub struct RawFitnessPoint {
    pub date: NaiveDate,
    pub data_type: String,
    pub value: f64,
    pub unit: String,
    pub source: String,
    pub source_data_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn service() -> HealthDataService {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        let audit = Arc::new(AuditService::new(store.clone()));
        HealthDataService::new(store, audit)
    }

    fn context() -> RequestContext {
        RequestContext {
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn blood_pressure_out_of_range_fails_before_any_write() {
        let service = service();
        let cancel = CancellationToken::new();
        let result = service.record_blood_pressure(Uuid::new_v4(), 400, 80, 70, Utc::now(), context(), &cancel).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn fitness_sync_skips_unrecognized_type_but_ingests_the_rest() {
        let service = service();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();

        let points = vec![
            RawFitnessPoint {
                date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                data_type: "steps".into(),
                value: 8000.0,
                unit: "steps".into(),
                source: "healthkit".into(),
                source_data_id: "a1".into(),
            },
            RawFitnessPoint {
                date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                data_type: "teleportation".into(),
                value: 1.0,
                unit: "jumps".into(),
                source: "healthkit".into(),
                source_data_id: "a2".into(),
            },
        ];

        let summary = service.sync_fitness_data(user_id, points, context(), &cancel).await.unwrap();
        assert_eq!(summary.ingested, 1);
        assert_eq!(summary.skipped_duplicate, 0);
    }

    #[tokio::test]
    async fn fitness_sync_is_idempotent_on_source_data_id() {
        let service = service();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();

        let point = || RawFitnessPoint {
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            data_type: "steps".into(),
            value: 8000.0,
            unit: "steps".into(),
            source: "healthkit".into(),
            source_data_id: "dup-1".into(),
        };

        service.sync_fitness_data(user_id, vec![point()], context(), &cancel).await.unwrap();
        let summary = service.sync_fitness_data(user_id, vec![point()], context(), &cancel).await.unwrap();
        assert_eq!(summary.ingested, 0);
        assert_eq!(summary.skipped_duplicate, 1);
    }
}
