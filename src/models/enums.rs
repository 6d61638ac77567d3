//! String-backed enums shared by the data model and the extraction pipeline.
//!
//! Each enum round-trips through SQLite as its canonical lower-case string
//! (`as_str`) and is reconstructed with `FromStr`, returning
//! `DatabaseError::InvalidEnum` on an unrecognized value.

use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub const ALL: &'static [$name] = &[$(Self::$variant),+];
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(SessionStatus {
    Active => "active",
    Completed => "completed",
    Expired => "expired",
});

str_enum!(MessageRole {
    Assistant => "assistant",
    User => "user",
});

str_enum!(Mood {
    Positive => "positive",
    Neutral => "neutral",
    Negative => "negative",
});

str_enum!(EnergyLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(SleepQuality {
    Poor => "poor",
    Fair => "fair",
    Good => "good",
    Excellent => "excellent",
});

str_enum!(MedicationTaken {
    Yes => "yes",
    No => "no",
    Partial => "partial",
});

str_enum!(FlowIntensity {
    Light => "light",
    Moderate => "moderate",
    Heavy => "heavy",
});

str_enum!(FitnessDataType {
    Steps => "steps",
    HeartRate => "heart_rate",
    Sleep => "sleep",
    Calories => "calories",
    Distance => "distance",
    ActiveMinutes => "active_minutes",
});

str_enum!(AuditOperationType {
    Create => "CREATE",
    Update => "UPDATE",
    Delete => "DELETE",
    Export => "EXPORT",
});

str_enum!(ReportStatus {
    Generated => "generated",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_every_variant() {
        for v in Mood::ALL {
            assert_eq!(Mood::from_str(v.as_str()).unwrap(), *v);
        }
        for v in FitnessDataType::ALL {
            assert_eq!(FitnessDataType::from_str(v.as_str()).unwrap(), *v);
        }
    }

    #[test]
    fn unknown_value_is_invalid_enum() {
        let err = SessionStatus::from_str("bogus").unwrap_err();
        matches!(err, DatabaseError::InvalidEnum { .. });
    }
}
