//! Prompt builders for question generation and answer grading.
//! Keep them short and surgical; both force a STRICT single-JSON-object reply.

use std::fmt::Write;

/// Transcript characters embedded into a prompt; the rest is dropped.
const TRANSCRIPT_PROMPT_BUDGET: usize = 15_000;

/// Bounded prefix of the diff transcript, safe on char boundaries.
fn bounded_transcript(transcript: &str) -> &str {
    match transcript.char_indices().nth(TRANSCRIPT_PROMPT_BUDGET) {
        Some((idx, _)) => &transcript[..idx],
        None => transcript,
    }
}

/// Build the question-generation prompt.
///
/// ## Contract enforced on the model
/// - Return exactly one JSON object, no markdown fences, no prose.
/// - Shape: `{"questions": ["...", ...]}` with `num_questions` entries.
pub fn build_question_prompt(transcript: &str, num_questions: usize) -> String {
    let mut s = String::with_capacity(2048);

    writeln!(
        s,
        "You are a senior code reviewer. Given the following pull request diff, generate \
{num_questions} specific comprehension questions that test whether a reviewer truly \
understands the changes being made."
    )
    .ok();

    writeln!(s, "\nGuidelines:").ok();
    writeln!(s, "- Ask \"why\" and \"how\" questions, not \"what changed\" questions").ok();
    writeln!(s, "- Test understanding of edge cases, error handling, and side effects").ok();
    writeln!(s, "- Ask about interactions with existing code when relevant").ok();
    writeln!(s, "- Avoid yes/no questions — require explanations").ok();
    writeln!(s, "- Questions should be answerable solely from the diff context").ok();

    writeln!(s, "\nPR Diff:\n{}", bounded_transcript(transcript)).ok();

    writeln!(
        s,
        "\nRespond with ONLY a JSON object in this exact format (no markdown fencing):"
    )
    .ok();
    writeln!(
        s,
        r#"{{"questions": ["Question 1?", "Question 2?", "Question 3?"]}}"#
    )
    .ok();

    s
}

/// Build the answer-grading prompt.
///
/// Questions and answers are paired positionally: question *i* corresponds to
/// answer *i*. The grading policy lives here, in the prompt — the orchestrator
/// only validates the reply shape.
///
/// ## Contract enforced on the model
/// - Return exactly one JSON object, no markdown fences, no prose.
/// - Shape: `{"overall_pass": bool, "answers": [{"question", "answer",
///   "grade": "PASS"|"FAIL", "feedback"}], "summary": "..."}`.
pub fn build_grading_prompt(transcript: &str, questions: &[String], answers: &[String]) -> String {
    let mut s = String::with_capacity(4096);

    writeln!(
        s,
        "You are a strict but fair senior code reviewer grading a colleague's understanding \
of a pull request. For each question below, judge whether the paired answer demonstrates \
real comprehension of the diff."
    )
    .ok();

    writeln!(s, "\nGrading policy:").ok();
    writeln!(
        s,
        "- Accept conceptual understanding over verbatim phrasing; wording does not matter"
    )
    .ok();
    writeln!(
        s,
        "- The answer must cite concrete details from the diff; vague generalities FAIL"
    )
    .ok();
    writeln!(
        s,
        "- Any wrong factual claim about the diff FAILs the answer, however confident"
    )
    .ok();
    writeln!(
        s,
        "- `overall_pass` is true only when at least 80% of the per-question grades are PASS"
    )
    .ok();

    writeln!(s, "\nPR Diff:\n{}", bounded_transcript(transcript)).ok();

    writeln!(s, "\nQuestions and answers (paired by number):").ok();
    for (i, (q, a)) in questions.iter().zip(answers.iter()).enumerate() {
        writeln!(s, "{}. Q: {}", i + 1, q).ok();
        writeln!(s, "   A: {}", a).ok();
    }

    writeln!(
        s,
        "\nRespond with ONLY a JSON object in this exact format (no markdown fencing):"
    )
    .ok();
    writeln!(
        s,
        r#"{{"overall_pass": true, "answers": [{{"question": "...", "answer": "...", "grade": "PASS", "feedback": "..."}}], "summary": "..."}}"#
    )
    .ok();

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_prompt_embeds_count_and_diff() {
        let p = build_question_prompt("### a.rs\n+fn a() {}", 5);
        assert!(p.contains("generate 5 specific comprehension questions"));
        assert!(p.contains("### a.rs"));
        assert!(p.contains(r#"{"questions""#));
    }

    #[test]
    fn transcript_is_bounded() {
        let long = "x".repeat(40_000);
        let p = build_question_prompt(&long, 3);
        assert!(p.len() < 20_000);
    }

    #[test]
    fn grading_prompt_pairs_positionally() {
        let qs = vec!["Why?".to_string(), "How?".to_string()];
        let ans = vec!["Because.".to_string(), "Like so.".to_string()];
        let p = build_grading_prompt("diff", &qs, &ans);
        assert!(p.contains("1. Q: Why?"));
        assert!(p.contains("   A: Because."));
        assert!(p.contains("2. Q: How?"));
        assert!(p.contains("80%"));
    }
}
