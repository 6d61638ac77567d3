use std::sync::Arc;

use crate::adapters::{LlmClient, ObjectStore, SttClient, TtsClient};
use crate::services::{AuditService, CheckInService, DashboardService, GdprService, HealthDataService, MedicationService, ReportService};
use crate::storage::Store;

/// Shared application state injected into every handler via `State`.
/// Holds one instance of each domain service; adapters are owned by the
/// services that need them, not duplicated here.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub stt: Arc<dyn SttClient>,
    pub checkin: Arc<CheckInService>,
    pub medication: Arc<MedicationService>,
    pub health_data: Arc<HealthDataService>,
    pub dashboard: Arc<DashboardService>,
    pub report: Arc<ReportService>,
    pub gdpr: Arc<GdprService>,
    pub audit: Arc<AuditService>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(store: Arc<Store>, llm: Arc<dyn LlmClient>, tts: Arc<dyn TtsClient>, stt: Arc<dyn SttClient>, object_store: Arc<dyn ObjectStore>) -> Self {
        let audit = Arc::new(AuditService::new(store.clone()));

        Self {
            store: store.clone(),
            stt,
            checkin: Arc::new(CheckInService::new(store.clone(), llm, tts, object_store.clone(), audit.clone())),
            medication: Arc::new(MedicationService::new(store.clone(), audit.clone())),
            health_data: Arc::new(HealthDataService::new(store.clone(), audit.clone())),
            dashboard: Arc::new(DashboardService::new(store.clone())),
            report: Arc::new(ReportService::new(store.clone(), object_store, audit.clone())),
            gdpr: Arc::new(GdprService::new(store, audit.clone())),
            audit,
        }
    }
}
