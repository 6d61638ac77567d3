use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::enums::AuditOperationType;
use crate::storage::{Store, UserDataExport};

use super::audit::{AuditService, RequestContext};
use super::error::ServiceError;

pub struct GdprService {
    store: Arc<Store>,
    audit: Arc<AuditService>,
}

/// Top-level export document: every per-user table plus the moment it
/// was read.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportDocument {
    pub exported_at: chrono::DateTime<Utc>,
    #[serde(flatten)]
    pub data: UserDataExport,
}

impl GdprService {
    pub fn new(store: Arc<Store>, audit: Arc<AuditService>) -> Self {
        Self { store, audit }
    }

    /// Single transaction across every user-owned table, then a
    /// soft-delete of `users`. The audit entry is recorded only on
    /// commit; a failure to record it afterward is logged but does not
    /// re-fail the erase — the erase itself is authoritative.
    pub async fn delete_user_data(&self, user_id: Uuid, context: RequestContext, cancel: &CancellationToken) -> Result<(), ServiceError> {
        self.store.erase_user_data(user_id, Utc::now(), cancel).await?;

        self.audit
            .record(user_id, AuditOperationType::Delete, "user", &user_id.to_string(), &context, None, cancel)
            .await;

        Ok(())
    }

    /// Reads every per-user table and serializes a single JSON document.
    /// The audit entry is recorded before the read, so the returned
    /// document's own `audit_log` includes this export.
    pub async fn export_user_data(&self, user_id: Uuid, context: RequestContext, cancel: &CancellationToken) -> Result<ExportDocument, ServiceError> {
        self.audit
            .record(user_id, AuditOperationType::Export, "user", &user_id.to_string(), &context, None, cancel)
            .await;

        let data = self.store.export_user_data(user_id, cancel).await?;

        Ok(ExportDocument {
            exported_at: Utc::now(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::FitnessDataType;
    use crate::models::{BloodPressureReading, FitnessDataPoint, HealthCheckIn, Session};

    fn services() -> (GdprService, Arc<Store>) {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        let audit = Arc::new(AuditService::new(store.clone()));
        (GdprService::new(store.clone(), audit), store)
    }

    #[tokio::test]
    async fn delete_user_data_removes_rows_and_leaves_an_audit_trail() {
        let (service, store) = services();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id, &cancel).await.unwrap();

        let session = Session::new(user_id);
        store.insert_session(session.clone(), &cancel).await.unwrap();
        store
            .insert_health_check_in(
                HealthCheckIn {
                    id: Uuid::new_v4(),
                    user_id,
                    session_id: session.id,
                    check_in_date: Utc::now().date_naive(),
                    symptoms: vec![],
                    mood: None,
                    pain_level: None,
                    energy_level: None,
                    sleep_quality: None,
                    medication_taken: None,
                    physical_activity: vec![],
                    breakfast: None,
                    lunch: None,
                    dinner: None,
                    general_feeling: None,
                    additional_notes: None,
                    raw_transcript: Some("raw".into()),
                    created_at: Utc::now(),
                },
                &cancel,
            )
            .await
            .unwrap();

        store
            .insert_blood_pressure_reading(
                BloodPressureReading {
                    id: Uuid::new_v4(),
                    user_id,
                    systolic: 120,
                    diastolic: 80,
                    pulse: 70,
                    measured_at: Utc::now(),
                },
                &cancel,
            )
            .await
            .unwrap();
        store
            .insert_fitness_data_point(
                FitnessDataPoint {
                    id: Uuid::new_v4(),
                    user_id,
                    date: Utc::now().date_naive(),
                    data_type: FitnessDataType::Steps,
                    value: 8000.0,
                    unit: "steps".into(),
                    source: "healthkit".into(),
                    source_data_id: "hk-1".into(),
                },
                &cancel,
            )
            .await
            .unwrap();

        let context = RequestContext {
            ip_address: None,
            user_agent: None,
        };
        service.delete_user_data(user_id, context, &cancel).await.unwrap();

        let export = store.export_user_data(user_id, &cancel).await.unwrap();
        assert!(export.health_check_ins.is_empty());
        assert!(export.blood_pressure_readings.is_empty());
        assert!(export.fitness_data.is_empty());
        assert_eq!(export.audit_log.len(), 1);
        assert_eq!(export.audit_log[0].operation_type, AuditOperationType::Delete);

        let user = store.get_user(user_id, &cancel).await.unwrap().unwrap();
        assert!(user.deleted_at.is_some());
    }

    #[tokio::test]
    async fn export_array_lengths_match_row_counts_at_read_time() {
        let (service, store) = services();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id, &cancel).await.unwrap();

        let med = crate::models::Medication {
            id: Uuid::new_v4(),
            user_id,
            name: "Ibuprofen".into(),
            dosage: "200mg".into(),
            frequency: "daily".into(),
            start_date: Utc::now().date_naive(),
            end_date: None,
            notes: None,
            active: true,
        };
        store.insert_medication(med, &cancel).await.unwrap();

        store
            .insert_blood_pressure_reading(
                BloodPressureReading {
                    id: Uuid::new_v4(),
                    user_id,
                    systolic: 118,
                    diastolic: 76,
                    pulse: 68,
                    measured_at: Utc::now(),
                },
                &cancel,
            )
            .await
            .unwrap();
        store
            .insert_fitness_data_point(
                FitnessDataPoint {
                    id: Uuid::new_v4(),
                    user_id,
                    date: Utc::now().date_naive(),
                    data_type: FitnessDataType::Steps,
                    value: 5000.0,
                    unit: "steps".into(),
                    source: "healthkit".into(),
                    source_data_id: "hk-2".into(),
                },
                &cancel,
            )
            .await
            .unwrap();

        let context = RequestContext {
            ip_address: None,
            user_agent: None,
        };
        let export = service.export_user_data(user_id, context, &cancel).await.unwrap();
        assert_eq!(export.data.medications.len(), 1);
        assert_eq!(export.data.blood_pressure_readings.len(), 1);
        assert_eq!(export.data.fitness_data.len(), 1);
        assert_eq!(export.data.audit_log[0].operation_type, AuditOperationType::Export);
    }
}
