use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReportStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub date_range_start: NaiveDate,
    pub date_range_end: NaiveDate,
    pub blob_key: String,
    pub generated_at: DateTime<Utc>,
    pub status: ReportStatus,
}
