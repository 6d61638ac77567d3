use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::enums::AuditOperationType;
use crate::models::{Medication, MedicationLog};
use crate::storage::Store;

use super::audit::{AuditService, RequestContext};
use super::error::ServiceError;

pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

pub struct MedicationService {
    store: Arc<Store>,
    audit: Arc<AuditService>,
}

impl MedicationService {
    pub fn new(store: Arc<Store>, audit: Arc<AuditService>) -> Self {
        Self { store, audit }
    }

    pub async fn add(&self, user_id: Uuid, med: NewMedication, context: RequestContext, cancel: &CancellationToken) -> Result<Medication, ServiceError> {
        if med.name.trim().is_empty() || med.dosage.trim().is_empty() || med.frequency.trim().is_empty() {
            return Err(ServiceError::validation("name, dosage and frequency are required"));
        }

        self.store.ensure_user(user_id, cancel).await?;

        let medication = Medication {
            id: Uuid::new_v4(),
            user_id,
            name: med.name,
            dosage: med.dosage,
            frequency: med.frequency,
            start_date: med.start_date,
            end_date: med.end_date,
            notes: med.notes,
            active: Medication::derive_active(med.end_date, Utc::now().date_naive()),
        };

        self.store.insert_medication(medication.clone(), cancel).await?;
        self.audit
            .record(user_id, AuditOperationType::Create, "medication", &medication.id.to_string(), &context, None, cancel)
            .await;
        Ok(medication)
    }

    pub async fn list(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Vec<Medication>, ServiceError> {
        let today = Utc::now().date_naive();
        Ok(self.store.list_medications(user_id, today, cancel).await?)
    }

    pub async fn update(&self, id: Uuid, patch: MedicationPatch, context: RequestContext, cancel: &CancellationToken) -> Result<Medication, ServiceError> {
        let mut medication = self
            .store
            .get_medication(id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("medication", id.to_string()))?;

        if let Some(name) = patch.name {
            medication.name = name;
        }
        if let Some(dosage) = patch.dosage {
            medication.dosage = dosage;
        }
        if let Some(frequency) = patch.frequency {
            medication.frequency = frequency;
        }
        if let Some(start_date) = patch.start_date {
            medication.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            medication.end_date = end_date;
        }
        if let Some(notes) = patch.notes {
            medication.notes = notes;
        }
        medication.active = Medication::derive_active(medication.end_date, Utc::now().date_naive());

        self.store.insert_medication(medication.clone(), cancel).await?;
        self.audit
            .record(medication.user_id, AuditOperationType::Update, "medication", &medication.id.to_string(), &context, None, cancel)
            .await;
        Ok(medication)
    }

    pub async fn delete(&self, id: Uuid, context: RequestContext, cancel: &CancellationToken) -> Result<(), ServiceError> {
        let medication = self
            .store
            .get_medication(id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("medication", id.to_string()))?;

        self.store.delete_medication(id, cancel).await?;
        self.audit
            .record(medication.user_id, AuditOperationType::Delete, "medication", &id.to_string(), &context, None, cancel)
            .await;
        Ok(())
    }

    pub async fn log_adherence(
        &self,
        medication_id: Uuid,
        taken_at: DateTime<Utc>,
        adherence: bool,
        context: RequestContext,
        cancel: &CancellationToken,
    ) -> Result<MedicationLog, ServiceError> {
        let medication = self
            .store
            .get_medication(medication_id, cancel)
            .await?
            .ok_or_else(|| ServiceError::not_found("medication", medication_id.to_string()))?;

        let log = MedicationLog {
            id: Uuid::new_v4(),
            medication_id,
            taken_at,
            adherence,
        };
        self.store.insert_medication_log(log.clone(), cancel).await?;
        self.audit
            .record(medication.user_id, AuditOperationType::Create, "medication_log", &log.id.to_string(), &context, None, cancel)
            .await;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn service() -> MedicationService {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        let audit = Arc::new(AuditService::new(store.clone()));
        MedicationService::new(store, audit)
    }

    fn context() -> RequestContext {
        RequestContext {
            ip_address: None,
            user_agent: None,
        }
    }

    fn new_medication() -> NewMedication {
        NewMedication {
            name: "Ibuprofen".into(),
            dosage: "200mg".into(),
            frequency: "twice daily".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn add_rejects_empty_name() {
        let service = service();
        let cancel = CancellationToken::new();
        let mut med = new_medication();
        med.name = "  ".into();
        let result = service.add(Uuid::new_v4(), med, context(), &cancel).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_preserves_id_and_user_id() {
        let service = service();
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        let added = service.add(user_id, new_medication(), context(), &cancel).await.unwrap();

        let patch = MedicationPatch {
            name: Some("Paracetamol".into()),
            dosage: None,
            frequency: None,
            start_date: None,
            end_date: None,
            notes: None,
        };
        let updated = service.update(added.id, patch, context(), &cancel).await.unwrap();
        assert_eq!(updated.id, added.id);
        assert_eq!(updated.user_id, user_id);
        assert_eq!(updated.name, "Paracetamol");
    }

    #[tokio::test]
    async fn log_adherence_rejects_unknown_medication() {
        let service = service();
        let cancel = CancellationToken::new();
        let result = service.log_adherence(Uuid::new_v4(), Utc::now(), true, context(), &cancel).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }
}
