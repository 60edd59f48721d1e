//! Question generation with strict output-contract validation.
//!
//! This path never fails: any completion error, parse failure, or invalid
//! question count degrades to a fixed generic question set.

use ai_llm_service::completion::CompletionClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::review::prompt::build_question_prompt;

pub const MIN_QUESTIONS: usize = 3;
pub const MAX_QUESTIONS: usize = 5;

/// Token budget for the question-generation completion.
const QUESTION_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Deserialize)]
struct QuestionsPayload {
    questions: Vec<String>,
}

/// Generates 3-5 comprehension questions from a diff transcript.
///
/// Targets five questions for large diffs and three otherwise. Falls back to
/// [`fallback_questions`] on any failure; the returned list always has a
/// valid length.
pub async fn generate_questions(
    llm: &CompletionClient,
    transcript: &str,
    is_large: bool,
) -> Vec<String> {
    let target = if is_large { MAX_QUESTIONS } else { MIN_QUESTIONS };
    let prompt = build_question_prompt(transcript, target);

    let raw = match llm.complete(&prompt, Some(QUESTION_MAX_TOKENS)).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "question generation failed, using fallback set");
            return fallback_questions();
        }
    };

    match parse_questions(&raw) {
        Some(questions) => {
            debug!(count = questions.len(), "questions generated");
            questions
        }
        None => {
            warn!("question response failed validation, using fallback set");
            fallback_questions()
        }
    }
}

/// Parses and validates a question payload.
///
/// Overshoot is truncated to [`MAX_QUESTIONS`]; undershoot (fewer than
/// [`MIN_QUESTIONS`], including an empty list) is rejected so the caller
/// falls back — the stored question set must always have a valid length.
fn parse_questions(raw: &str) -> Option<Vec<String>> {
    let cleaned = super::strip_code_fence(raw);
    let payload: QuestionsPayload = serde_json::from_str(cleaned).ok()?;

    let mut questions = payload.questions;
    if questions.len() < MIN_QUESTIONS {
        return None;
    }
    questions.truncate(MAX_QUESTIONS);
    Some(questions)
}

/// Fixed generic question set used whenever the model output is unusable.
pub fn fallback_questions() -> Vec<String> {
    vec![
        "What is the primary purpose of this change?".to_string(),
        "Are there any edge cases that this change does not handle?".to_string(),
        "How does this change interact with the existing codebase?".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_payload() {
        let raw = r#"{"questions": ["Why a?", "Why b?", "Why c?"]}"#;
        let qs = parse_questions(raw).unwrap();
        assert_eq!(qs.len(), 3);
        assert_eq!(qs[0], "Why a?");
    }

    #[test]
    fn strips_markdown_fence_before_parsing() {
        let raw = "```json\n{\"questions\": [\"a?\", \"b?\", \"c?\"]}\n```";
        assert_eq!(parse_questions(raw).unwrap().len(), 3);
    }

    #[test]
    fn overshoot_is_truncated_to_maximum() {
        let raw = r#"{"questions": ["1?", "2?", "3?", "4?", "5?", "6?", "7?"]}"#;
        let qs = parse_questions(raw).unwrap();
        assert_eq!(qs.len(), MAX_QUESTIONS);
        assert_eq!(qs[4], "5?");
    }

    #[test]
    fn undershoot_is_rejected() {
        assert!(parse_questions(r#"{"questions": ["only one?"]}"#).is_none());
        assert!(parse_questions(r#"{"questions": []}"#).is_none());
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(parse_questions("not json at all").is_none());
        assert!(parse_questions(r#"{"other": true}"#).is_none());
    }

    #[test]
    fn fallback_set_has_valid_length() {
        let qs = fallback_questions();
        assert!(qs.len() >= MIN_QUESTIONS && qs.len() <= MAX_QUESTIONS);
    }
}
