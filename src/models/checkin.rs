use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{EnergyLevel, MedicationTaken, Mood, SleepQuality};

/// One extracted record per completed session, or per failed-extraction
/// fallback.
///
/// Invariant: either the extracted-enum fields are populated, or
/// `raw_transcript` is populated (fallback path) — never neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub check_in_date: NaiveDate,
    pub symptoms: Vec<String>,
    pub mood: Option<Mood>,
    pub pain_level: Option<u8>,
    pub energy_level: Option<EnergyLevel>,
    pub sleep_quality: Option<SleepQuality>,
    pub medication_taken: Option<MedicationTaken>,
    pub physical_activity: Vec<String>,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
    pub general_feeling: Option<String>,
    pub additional_notes: Option<String>,
    pub raw_transcript: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl HealthCheckIn {
    /// Invariant check used by repository tests and the service layer:
    /// either the extracted fields carry content or `raw_transcript` does.
    pub fn is_well_formed(&self) -> bool {
        let has_raw = self
            .raw_transcript
            .as_ref()
            .is_some_and(|s| !s.is_empty());
        let has_extracted = self.mood.is_some()
            || self.pain_level.is_some()
            || self.energy_level.is_some()
            || self.sleep_quality.is_some()
            || self.medication_taken.is_some();
        has_raw || has_extracted
    }
}
