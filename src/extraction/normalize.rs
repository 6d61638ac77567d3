use crate::models::enums::{EnergyLevel, MedicationTaken, Mood, SleepQuality};

use super::parse::ExtractedJson;

/// Intermediate, fully-normalized form of an extracted response: every
/// enum field is resolved to its strict type (coerced to a documented
/// default when the LLM's value was unrecognized), ready to become a
/// `HealthCheckIn`.
#[derive(Debug, Clone)]
pub struct RawExtraction {
    pub symptoms: Vec<String>,
    pub mood: Mood,
    pub pain_level: Option<u8>,
    pub energy_level: EnergyLevel,
    pub sleep_quality: SleepQuality,
    pub medication_taken: MedicationTaken,
    pub physical_activity: Vec<String>,
    pub breakfast: Option<String>,
    pub lunch: Option<String>,
    pub dinner: Option<String>,
    pub general_feeling: Option<String>,
    pub additional_notes: Option<String>,
}

/// Lower-cases and trims every enum field; unrecognized values coerce to
/// the documented default and emit a `tracing::warn!`. `pain_level`
/// clamps to `[0,10]`. List fields default to empty, never null.
pub fn normalize(extracted: ExtractedJson) -> RawExtraction {
    RawExtraction {
        symptoms: extracted.symptoms,
        mood: coerce_enum(extracted.mood.as_deref(), "mood", Mood::Neutral),
        pain_level: extracted.pain_level.map(|p| p.clamp(0.0, 10.0) as u8),
        energy_level: coerce_enum(extracted.energy_level.as_deref(), "energy_level", EnergyLevel::Medium),
        sleep_quality: coerce_enum(extracted.sleep_quality.as_deref(), "sleep_quality", SleepQuality::Fair),
        medication_taken: coerce_enum(extracted.medication_taken.as_deref(), "medication_taken", MedicationTaken::No),
        physical_activity: extracted.physical_activity,
        breakfast: non_empty(extracted.breakfast),
        lunch: non_empty(extracted.lunch),
        dinner: non_empty(extracted.dinner),
        general_feeling: non_empty(extracted.general_feeling),
        additional_notes: non_empty(extracted.additional_notes),
    }
}

fn coerce_enum<T>(raw: Option<&str>, field: &'static str, default: T) -> T
where
    T: std::str::FromStr,
{
    match raw {
        Some(value) => {
            let normalized = value.trim().to_lowercase();
            match T::from_str(&normalized) {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!(field, value = %value, "coerced unrecognized extraction value to default");
                    default
                }
            }
        }
        None => default,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mood_coerces_to_neutral() {
        let extracted = ExtractedJson {
            mood: Some("ecstatic".into()),
            ..Default::default()
        };
        assert_eq!(normalize(extracted).mood, Mood::Neutral);
    }

    #[test]
    fn pain_level_clamped_to_ten() {
        let extracted = ExtractedJson {
            pain_level: Some(57.0),
            ..Default::default()
        };
        assert_eq!(normalize(extracted).pain_level, Some(10));
    }

    #[test]
    fn missing_lists_default_to_empty_not_missing() {
        let normalized = normalize(ExtractedJson::default());
        assert!(normalized.symptoms.is_empty());
        assert!(normalized.physical_activity.is_empty());
    }

    #[test]
    fn enum_values_are_trimmed_and_lowercased() {
        let extracted = ExtractedJson {
            energy_level: Some("  HIGH ".into()),
            ..Default::default()
        };
        assert_eq!(normalize(extracted).energy_level, EnergyLevel::High);
    }
}
