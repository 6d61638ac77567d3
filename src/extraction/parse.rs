use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Mirrors `HealthCheckIn`'s extractable fields, loosely typed so a
/// malformed-but-present field normalizes instead of failing the parse
/// outright — only a totally unparseable response is a hard failure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExtractedJson {
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub pain_level: Option<f64>,
    #[serde(default)]
    pub energy_level: Option<String>,
    #[serde(default)]
    pub sleep_quality: Option<String>,
    #[serde(default)]
    pub medication_taken: Option<String>,
    #[serde(default)]
    pub physical_activity: Vec<String>,
    #[serde(default)]
    pub breakfast: Option<String>,
    #[serde(default)]
    pub lunch: Option<String>,
    #[serde(default)]
    pub dinner: Option<String>,
    #[serde(default)]
    pub general_feeling: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

/// Trims the response, strips fenced code-block markers, and parses a
/// single JSON object. A parse failure here is not retried — it goes
/// straight to the fallback path.
pub fn parse_llm_response(raw: &str) -> Result<ExtractedJson, ParseError> {
    let stripped = strip_code_fence(raw.trim());
    serde_json::from_str(stripped).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

fn strip_code_fence(s: &str) -> &str {
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    s.strip_suffix("```").unwrap_or(s).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_object() {
        let raw = r#"{"symptoms": ["fejfajas"], "mood": "neutral", "pain_level": 3}"#;
        let parsed = parse_llm_response(raw).unwrap();
        assert_eq!(parsed.symptoms, vec!["fejfajas".to_string()]);
        assert_eq!(parsed.pain_level, Some(3.0));
    }

    #[test]
    fn strips_fenced_code_block_markers() {
        let raw = "```json\n{\"symptoms\": []}\n```";
        let parsed = parse_llm_response(raw).unwrap();
        assert!(parsed.symptoms.is_empty());
    }

    #[test]
    fn invalid_json_is_a_hard_failure() {
        let raw = "not json at all";
        assert!(parse_llm_response(raw).is_err());
    }
}
