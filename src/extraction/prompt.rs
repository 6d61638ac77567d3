use crate::models::Message;

/// Builds the system message sent to the LLM: the literal conversation
/// as `role: content\n` lines, followed by the instruction to return
/// only the JSON object matching `HealthCheckIn`'s extractable fields.
pub fn build_prompt(messages: &[Message]) -> String {
    let mut transcript = String::new();
    for message in messages {
        transcript.push_str(message.role.as_str());
        transcript.push_str(": ");
        transcript.push_str(&message.content);
        transcript.push('\n');
    }

    format!(
        "{transcript}\n\
         Az alábbi beszélgetésből nyerd ki a strukturált egészségügyi adatokat. \
         return only the JSON object of this shape: \
         {{\"symptoms\": [string], \"mood\": \"positive\"|\"neutral\"|\"negative\", \
         \"pain_level\": number|null, \"energy_level\": \"low\"|\"medium\"|\"high\", \
         \"sleep_quality\": \"poor\"|\"fair\"|\"good\"|\"excellent\", \
         \"medication_taken\": \"yes\"|\"no\"|\"partial\", \"physical_activity\": [string], \
         \"breakfast\": string, \"lunch\": string, \"dinner\": string, \
         \"general_feeling\": string, \"additional_notes\": string}}. \
         Missing information becomes an empty string, empty array, or null pain. \
         Infer mood from overall tone. medication_taken is \"yes\" iff all taken, \
         \"no\" iff none taken, \"partial\" otherwise. Capture every symptom mention \
         and every physical activity."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::MessageRole;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn prompt_includes_every_message_as_role_colon_content() {
        let session_id = Uuid::new_v4();
        let messages = vec![
            Message {
                id: Uuid::new_v4(),
                session_id,
                role: MessageRole::Assistant,
                content: "Hogy erzi magat?".into(),
                audio_blob_key: None,
                created_at: Utc::now(),
                sequence: 1,
            },
            Message {
                id: Uuid::new_v4(),
                session_id,
                role: MessageRole::User,
                content: "Jol vagyok".into(),
                audio_blob_key: None,
                created_at: Utc::now(),
                sequence: 2,
            },
        ];

        let prompt = build_prompt(&messages);
        assert!(prompt.contains("assistant: Hogy erzi magat?"));
        assert!(prompt.contains("user: Jol vagyok"));
        assert!(prompt.contains("return only the JSON object"));
    }
}
