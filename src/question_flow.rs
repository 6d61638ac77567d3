//! The fixed, ordered health check-in script.
//!
//! Pure functions over an explicit cursor rather than interior mutable
//! state: a session's progress is reconstructed fresh, every call, from
//! `count(assistant messages)` in storage (see `services::checkin`), so
//! there is nothing here to keep consistent across requests.

use serde::{Deserialize, Serialize};

pub const TOTAL_QUESTIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    OpenEnded,
    Numeric,
    YesNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u8,
    pub text_hu: &'static str,
    pub question_type: QuestionType,
    pub required: bool,
}

/// Order: general feeling, physical activity, meals, pain, sleep,
/// energy, medication, additional notes. Only the last is optional.
const QUESTIONS: [Question; TOTAL_QUESTIONS] = [
    Question {
        id: 0,
        text_hu: "Hogy érzi magát ma általánosságban?",
        question_type: QuestionType::OpenEnded,
        required: true,
    },
    Question {
        id: 1,
        text_hu: "Végzett ma valamilyen fizikai tevékenységet?",
        question_type: QuestionType::OpenEnded,
        required: true,
    },
    Question {
        id: 2,
        text_hu: "Mit evett ma reggelire, ebédre és vacsorára?",
        question_type: QuestionType::OpenEnded,
        required: true,
    },
    Question {
        id: 3,
        text_hu: "Tapasztalt fájdalmat? Ha igen, 0-tól 10-ig mennyire erős?",
        question_type: QuestionType::Numeric,
        required: true,
    },
    Question {
        id: 4,
        text_hu: "Milyen volt az éjszakai alvása?",
        question_type: QuestionType::OpenEnded,
        required: true,
    },
    Question {
        id: 5,
        text_hu: "Milyen az energiaszintje most?",
        question_type: QuestionType::OpenEnded,
        required: true,
    },
    Question {
        id: 6,
        text_hu: "Bevette a felírt gyógyszereit ma?",
        question_type: QuestionType::YesNo,
        required: true,
    },
    Question {
        id: 7,
        text_hu: "Van még valami, amit szeretne hozzátenni?",
        question_type: QuestionType::OpenEnded,
        required: false,
    },
];

/// The question at `cursor`, or `None` once the script is exhausted.
pub fn next(cursor: usize) -> Option<&'static Question> {
    QUESTIONS.get(cursor)
}

pub fn by_id(id: u8) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

pub fn is_complete(cursor: usize) -> bool {
    cursor >= TOTAL_QUESTIONS
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownQuestion(u8),
    EmptyRequiredResponse(u8),
}

/// Rejects empty responses to required questions and unknown ids.
pub fn validate(id: u8, response: &str) -> Result<(), ValidationError> {
    let question = by_id(id).ok_or(ValidationError::UnknownQuestion(id))?;
    if question.required && response.trim().is_empty() {
        return Err(ValidationError::EmptyRequiredResponse(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_has_exactly_eight_questions_in_order() {
        assert_eq!(QUESTIONS.len(), TOTAL_QUESTIONS);
        for (i, q) in QUESTIONS.iter().enumerate() {
            assert_eq!(q.id as usize, i);
        }
    }

    #[test]
    fn only_the_last_question_is_optional() {
        for q in &QUESTIONS[..TOTAL_QUESTIONS - 1] {
            assert!(q.required, "question {} should be required", q.id);
        }
        assert!(!QUESTIONS[TOTAL_QUESTIONS - 1].required);
    }

    #[test]
    fn next_returns_none_past_end() {
        assert!(next(TOTAL_QUESTIONS).is_none());
        assert!(next(TOTAL_QUESTIONS + 5).is_none());
        assert!(next(0).is_some());
    }

    #[test]
    fn is_complete_true_iff_cursor_is_eight() {
        assert!(!is_complete(7));
        assert!(is_complete(8));
        assert!(is_complete(9));
    }

    #[test]
    fn validate_rejects_empty_required_response() {
        assert_eq!(validate(0, "  "), Err(ValidationError::EmptyRequiredResponse(0)));
        assert_eq!(validate(0, "jol vagyok"), Ok(()));
    }

    #[test]
    fn validate_allows_empty_optional_response() {
        assert_eq!(validate(7, ""), Ok(()));
    }

    #[test]
    fn validate_rejects_unknown_id() {
        assert_eq!(validate(99, "x"), Err(ValidationError::UnknownQuestion(99)));
    }
}
