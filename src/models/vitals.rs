use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ranges `[70,250]`/`[40,150]`/`[30,220]` are enforced both at service
/// validation and at the storage check-constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodPressureReading {
    pub id: Uuid,
    pub user_id: Uuid,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: i32,
    pub measured_at: DateTime<Utc>,
}

impl BloodPressureReading {
    pub const SYSTOLIC_RANGE: std::ops::RangeInclusive<i32> = 70..=250;
    pub const DIASTOLIC_RANGE: std::ops::RangeInclusive<i32> = 40..=150;
    pub const PULSE_RANGE: std::ops::RangeInclusive<i32> = 30..=220;

    pub fn in_range(systolic: i32, diastolic: i32, pulse: i32) -> bool {
        Self::SYSTOLIC_RANGE.contains(&systolic)
            && Self::DIASTOLIC_RANGE.contains(&diastolic)
            && Self::PULSE_RANGE.contains(&pulse)
    }
}
