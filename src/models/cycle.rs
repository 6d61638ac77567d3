use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::FlowIntensity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenstruationCycle {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: Option<FlowIntensity>,
    pub symptoms: Vec<String>,
}
