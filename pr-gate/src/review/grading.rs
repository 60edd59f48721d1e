//! Answer grading with strict output-contract validation.
//!
//! This path never fails and never silently reports a pass: any completion
//! error or parse/shape failure yields a hard-fail result with a fixed
//! system-error summary.

use ai_llm_service::completion::CompletionClient;
use tracing::{debug, warn};

use crate::review::prompt::build_grading_prompt;
use crate::store::GradingResult;

/// Token budget for the grading completion.
const GRADING_MAX_TOKENS: u32 = 2048;

/// Summary reported when grading itself breaks, as opposed to the reviewer
/// failing the check.
pub const SYSTEM_ERROR_SUMMARY: &str =
    "Grading failed due to a system error. Please try again.";

/// Grades reviewer answers against the PR diff.
///
/// Questions and answers are paired positionally by index. Returns a
/// [`GradingResult`] with per-answer feedback and overall pass/fail; on any
/// failure the result is [`failure_result`], never an error.
pub async fn grade_answers(
    llm: &CompletionClient,
    transcript: &str,
    questions: &[String],
    answers: &[String],
) -> GradingResult {
    let prompt = build_grading_prompt(transcript, questions, answers);

    let raw = match llm.complete(&prompt, Some(GRADING_MAX_TOKENS)).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "grading completion failed");
            return failure_result();
        }
    };

    match parse_grading(&raw) {
        Some(result) => {
            debug!(
                overall_pass = result.overall_pass,
                graded = result.answers.len(),
                "answers graded"
            );
            result
        }
        None => {
            warn!(raw_len = raw.len(), "grading response failed validation");
            failure_result()
        }
    }
}

/// Parses and shape-validates a grading payload.
///
/// The serde shape enforces `grade ∈ {PASS, FAIL}`; anything else is a
/// contract violation and rejects the whole payload.
fn parse_grading(raw: &str) -> Option<GradingResult> {
    let cleaned = super::strip_code_fence(raw);
    serde_json::from_str::<GradingResult>(cleaned).ok()
}

/// Fixed hard-fail result for system errors.
pub fn failure_result() -> GradingResult {
    GradingResult {
        overall_pass: false,
        answers: Vec::new(),
        summary: SYSTEM_ERROR_SUMMARY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Grade;

    #[test]
    fn parses_valid_grading_payload() {
        let raw = r#"{
            "overall_pass": true,
            "answers": [
                {"question": "Why?", "answer": "Because.", "grade": "PASS", "feedback": "good"},
                {"question": "How?", "answer": "So.", "grade": "FAIL", "feedback": "vague"}
            ],
            "summary": "Mostly solid."
        }"#;
        let result = parse_grading(raw).unwrap();
        assert!(result.overall_pass);
        assert_eq!(result.answers.len(), 2);
        assert_eq!(result.answers[0].grade, Grade::Pass);
        assert_eq!(result.answers[1].grade, Grade::Fail);
    }

    #[test]
    fn fenced_payload_is_accepted() {
        let raw = "```json\n{\"overall_pass\": false, \"answers\": [], \"summary\": \"nope\"}\n```";
        let result = parse_grading(raw).unwrap();
        assert!(!result.overall_pass);
    }

    #[test]
    fn malformed_response_yields_hard_fail() {
        assert!(parse_grading("I think the answers look fine!").is_none());
        assert!(parse_grading(r#"{"overall_pass": "yes"}"#).is_none());
        // Out-of-vocabulary grade values violate the contract.
        assert!(
            parse_grading(
                r#"{"overall_pass": true, "answers": [{"grade": "MAYBE"}], "summary": "s"}"#
            )
            .is_none()
        );

        let fallback = failure_result();
        assert!(!fallback.overall_pass);
        assert!(fallback.answers.is_empty());
        assert_eq!(fallback.summary, SYSTEM_ERROR_SUMMARY);
    }
}
