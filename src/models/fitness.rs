use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::FitnessDataType;

/// `source_data_id` is globally unique and anchors idempotent ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessDataPoint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub data_type: FitnessDataType,
    pub value: f64,
    pub unit: String,
    pub source: String,
    pub source_data_id: String,
}
