//! Review state machine: the workflow controller behind the webhook.
//!
//! Consumes the two qualifying webhook events, coordinates credential cache,
//! GitHub client, diff extractor and LLM orchestrator, persists review
//! records, and emits outbound notifications (PR comments, commit statuses).
//!
//! States: `pending_review → {passed, failed}`; `failed → pending_review` on
//! a later qualifying PR event. A `passed` record is only reset by a PR event
//! whose diff fingerprint differs from the stored one.
//!
//! Both public handlers are infallible at the call site: an error anywhere in
//! the flow is logged with PR context and suppressed, so one failing PR never
//! blocks processing of other events.

pub mod grading;
pub mod prompt;
pub mod questions;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use ai_llm_service::completion::CompletionClient;

use crate::answers::parse_numbered_answers;
use crate::auth::InstallationTokenCache;
use crate::diff::{self, NO_CHANGES_SENTINEL};
use crate::errors::GateResult;
use crate::github::{GitHubClient, StatusState, types::*};
use crate::metrics::ReviewMetrics;
use crate::store::{GradingResult, ReviewRecord, ReviewStatus, ReviewStore};

/// Commit-status descriptions (capped at 140 chars by the client).
const NO_CHANGES_DESCRIPTION: &str = "No code changes to review";
const PENDING_DESCRIPTION: &str = "Awaiting reviewer comprehension answers";
const PASSED_DESCRIPTION: &str = "Reviewer comprehension verified";
const FAILED_DESCRIPTION: &str = "Comprehension check failed — re-review required";

/// Shared, injectable dependencies for the event handlers.
///
/// Owned once at startup and shared via `Arc` by the HTTP layer; everything
/// inside carries its own synchronization.
pub struct GateContext {
    pub auth: InstallationTokenCache,
    pub store: ReviewStore,
    pub llm: CompletionClient,
    pub metrics: ReviewMetrics,
    /// API base, e.g. "https://api.github.com".
    pub github_api_base: String,
    /// Shared HTTP client for per-event GitHub clients.
    pub http: reqwest::Client,
}

impl GateContext {
    /// GitHub client bound to one installation token.
    fn github_client(&self, token: String) -> GitHubClient {
        GitHubClient::new(self.http.clone(), self.github_api_base.clone(), token)
    }
}

/// Strips a defensive leading/trailing triple-backtick fence from a model
/// reply before JSON parsing. Shared by both orchestrator operations.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the fence line (it may carry a language tag), then the closer.
        s = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        s = s.trim_end();
        s = s.strip_suffix("```").unwrap_or(s);
        s = s.trim();
    }
    s
}

// ---------------------------------------------------------------------------
// Pull-request events (opened / synchronize / reopened)
// ---------------------------------------------------------------------------

/// Handles a qualifying pull-request event; never propagates errors.
pub async fn handle_pull_request_event(ctx: &GateContext, event: PullRequestEvent) {
    let pr_id = event.repository.pr_id(event.pull_request.number);
    if let Err(e) = process_pull_request_event(ctx, &event).await {
        error!(pr_id = %pr_id, error = %e, "pull-request event failed");
    }
}

async fn process_pull_request_event(ctx: &GateContext, event: &PullRequestEvent) -> GateResult<()> {
    let pr = &event.pull_request;
    let repo = &event.repository;
    let pr_id = repo.pr_id(pr.number);

    if pr.draft {
        debug!(pr_id = %pr_id, "skipping draft PR");
        return Ok(());
    }

    let owner = repo.owner.login.as_str();
    let name = repo.name.as_str();
    let pr_sha = pr.head.sha.as_str();

    let token = ctx.auth.get_token(event.installation.id).await?;
    let client = ctx.github_client(token);

    let files = client.list_pr_files(owner, name, pr.number).await?;
    let diff = diff::extract(&files);
    debug!(
        pr_id = %pr_id,
        fingerprint = %diff.fingerprint,
        is_large = diff.is_large,
        "diff extracted"
    );

    if diff.transcript == NO_CHANGES_SENTINEL {
        client
            .set_commit_status(owner, name, pr_sha, StatusState::Success, NO_CHANGES_DESCRIPTION)
            .await?;
        return Ok(());
    }

    // Idempotency guard against redundant synchronize events and redelivered
    // webhooks: an unchanged fingerprint means the questions still apply.
    let existing = ctx.store.get(&pr_id).await;
    if !should_regenerate(existing.as_ref(), &diff.fingerprint) {
        debug!(pr_id = %pr_id, "diff unchanged, skipping question regeneration");
        return Ok(());
    }

    let questions = questions::generate_questions(&ctx.llm, &diff.transcript, diff.is_large).await;

    let comment_body = build_question_comment(&questions, diff.is_large);
    let comment = client
        .post_issue_comment(owner, name, pr.number, &comment_body)
        .await?;

    let record = refreshed_record(
        existing,
        &pr_id,
        pr_sha,
        event.installation.id,
        questions.clone(),
        diff.fingerprint,
        comment.id,
        Utc::now(),
    );
    ctx.store.upsert(record).await?;

    client
        .set_commit_status(owner, name, pr_sha, StatusState::Pending, PENDING_DESCRIPTION)
        .await?;

    ctx.metrics.record_questions_generated(questions.len());
    info!(pr_id = %pr_id, count = questions.len(), "posted comprehension questions");
    Ok(())
}

/// True when a fresh question set must be generated for this fingerprint.
fn should_regenerate(existing: Option<&ReviewRecord>, fingerprint: &str) -> bool {
    match existing {
        Some(record) => record.diff_hash != fingerprint,
        None => true,
    }
}

/// Builds the upserted record for a (re)generated question set.
///
/// A pre-existing record keeps its `created_at`; every review-cycle field is
/// reset so a previously passed or failed PR returns to `pending_review`.
#[allow(clippy::too_many_arguments)]
fn refreshed_record(
    existing: Option<ReviewRecord>,
    pr_id: &str,
    pr_sha: &str,
    installation_id: u64,
    questions: Vec<String>,
    diff_hash: String,
    bot_comment_id: u64,
    now: DateTime<Utc>,
) -> ReviewRecord {
    let created_at = existing.map(|r| r.created_at).unwrap_or(now);
    ReviewRecord {
        pr_id: pr_id.to_string(),
        pr_sha: pr_sha.to_string(),
        installation_id,
        questions,
        diff_hash,
        reviewer_answers: None,
        grading_result: None,
        status: ReviewStatus::PendingReview,
        reviewer_username: None,
        bot_comment_id: Some(bot_comment_id),
        created_at,
        reviewed_at: None,
    }
}

// ---------------------------------------------------------------------------
// Issue-comment events (created, on a pull request)
// ---------------------------------------------------------------------------

/// Handles a comment created on a tracked PR; never propagates errors.
pub async fn handle_issue_comment_event(ctx: &GateContext, event: IssueCommentEvent) {
    let pr_id = event.repository.pr_id(event.issue.number);
    if let Err(e) = process_issue_comment_event(ctx, &event).await {
        error!(pr_id = %pr_id, error = %e, "issue-comment event failed");
    }
}

async fn process_issue_comment_event(
    ctx: &GateContext,
    event: &IssueCommentEvent,
) -> GateResult<()> {
    let comment = &event.comment;
    let repo = &event.repository;
    let pr_number = event.issue.number;
    let pr_id = repo.pr_id(pr_number);

    if comment.user.kind == "Bot" {
        debug!(pr_id = %pr_id, author = %comment.user.login, "ignoring bot comment");
        return Ok(());
    }

    let Some(record) = ctx.store.get(&pr_id).await else {
        debug!(pr_id = %pr_id, "no review record, ignoring comment");
        return Ok(());
    };

    if record.status == ReviewStatus::Passed {
        debug!(pr_id = %pr_id, "already passed, ignoring comment");
        return Ok(());
    }

    let mut answers = parse_numbered_answers(&comment.body);
    let expected = record.questions.len();
    debug!(pr_id = %pr_id, parsed = answers.len(), expected, "parsed reviewer answers");

    let owner = repo.owner.login.as_str();
    let name = repo.name.as_str();

    if answers.len() < expected {
        let token = ctx.auth.get_token(event.installation.id).await?;
        let client = ctx.github_client(token);
        client
            .post_issue_comment(
                owner,
                name,
                pr_number,
                &build_incomplete_reply(answers.len(), expected),
            )
            .await?;
        return Ok(());
    }
    answers.truncate(expected);

    let token = ctx.auth.get_token(event.installation.id).await?;
    let client = ctx.github_client(token);

    // Re-fetch the current diff (not cached) for grading context.
    let files = client.list_pr_files(owner, name, pr_number).await?;
    let diff = diff::extract(&files);

    let result =
        grading::grade_answers(&ctx.llm, &diff.transcript, &record.questions, &answers).await;

    // Re-load before persisting: a synchronize event may have replaced the
    // record between the lookup above and now.
    let Some(current) = ctx.store.get(&pr_id).await else {
        debug!(pr_id = %pr_id, "record disappeared before grading persisted");
        return Ok(());
    };
    let graded = graded_record(current, answers.clone(), result.clone(), &comment.user.login, Utc::now());
    let status_sha = graded.pr_sha.clone();
    ctx.store.upsert(graded).await?;

    let feedback = build_feedback_comment(&comment.user.login, &result);
    client
        .post_issue_comment(owner, name, pr_number, &feedback)
        .await?;

    let (state, description) = if result.overall_pass {
        (StatusState::Success, PASSED_DESCRIPTION)
    } else {
        (StatusState::Failure, FAILED_DESCRIPTION)
    };
    client
        .set_commit_status(owner, name, &status_sha, state, description)
        .await?;

    ctx.metrics
        .record_review_result(result.overall_pass, answers.len());
    info!(
        pr_id = %pr_id,
        reviewer = %comment.user.login,
        pass = result.overall_pass,
        "comprehension check graded"
    );
    Ok(())
}

/// Applies a grading outcome to the freshly re-loaded record.
fn graded_record(
    mut record: ReviewRecord,
    answers: Vec<String>,
    result: GradingResult,
    reviewer: &str,
    now: DateTime<Utc>,
) -> ReviewRecord {
    record.status = if result.overall_pass {
        ReviewStatus::Passed
    } else {
        ReviewStatus::Failed
    };
    record.reviewer_answers = Some(answers);
    record.grading_result = Some(result);
    record.reviewer_username = Some(reviewer.to_string());
    record.reviewed_at = Some(now);
    record
}

// ---------------------------------------------------------------------------
// Outbound comment bodies
// ---------------------------------------------------------------------------

fn build_question_comment(questions: &[String], is_large: bool) -> String {
    let q_list = questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n");
    let large_warning = if is_large {
        "\n> **Note:** This is a large PR. Questions focus on the most critical changes.\n"
    } else {
        ""
    };
    format!(
        "## PR Comprehension Check\n\n\
         Please answer the following questions to verify your understanding of these changes:\n\n\
         {large_warning}\
         {q_list}\n\n\
         ---\n\
         **How to respond:** Reply to this comment with your answers numbered 1\u{2013}{}.\n\n\
         Status: \u{23f3} Awaiting reviewer answers",
        questions.len()
    )
}

fn build_incomplete_reply(found: usize, expected: usize) -> String {
    format!(
        "I found {found} answer(s) but expected {expected}. \
         Please reply with all answers in numbered format:\n\
         ```\n1. Your answer\n2. Your answer\n...\n```"
    )
}

fn build_feedback_comment(reviewer: &str, result: &GradingResult) -> String {
    let (header, status_line) = if result.overall_pass {
        (
            "## \u{2705} Comprehension Check Passed",
            format!(
                "@{reviewer}, your answers demonstrate solid understanding. \
                 The PR is now eligible for merging."
            ),
        )
    } else {
        (
            "## \u{274c} Comprehension Check Failed",
            format!(
                "@{reviewer}, some answers indicate gaps in understanding. \
                 Please review the code more carefully and reply with revised answers."
            ),
        )
    };

    let feedback_lines = result
        .answers
        .iter()
        .map(|item| {
            let icon = match item.grade {
                crate::store::Grade::Pass => "\u{2705}",
                crate::store::Grade::Fail => "\u{274c}",
            };
            format!(
                "**{icon} Q:** {}\n**A:** {}\n**Feedback:** {}\n",
                item.question, item.answer, item.feedback
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{header}\n\n{status_line}\n\n---\n\n{feedback_lines}\n---\n**Summary:** {}",
        result.summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AnswerGrade, Grade};

    fn pending_record(diff_hash: &str) -> ReviewRecord {
        ReviewRecord {
            pr_id: "o/r#1".to_string(),
            pr_sha: "sha-1".to_string(),
            installation_id: 42,
            questions: vec!["q1".into(), "q2".into(), "q3".into()],
            diff_hash: diff_hash.to_string(),
            reviewer_answers: None,
            grading_result: None,
            status: ReviewStatus::PendingReview,
            reviewer_username: None,
            bot_comment_id: Some(10),
            created_at: Utc::now(),
            reviewed_at: None,
        }
    }

    fn passing_result() -> GradingResult {
        GradingResult {
            overall_pass: true,
            answers: vec![AnswerGrade {
                question: "q1".into(),
                answer: "a1".into(),
                grade: Grade::Pass,
                feedback: "good".into(),
            }],
            summary: "Solid.".into(),
        }
    }

    #[test]
    fn identical_fingerprint_is_a_noop() {
        let record = pending_record("same-hash");
        assert!(!should_regenerate(Some(&record), "same-hash"));
        assert!(should_regenerate(Some(&record), "other-hash"));
        assert!(should_regenerate(None, "anything"));
    }

    #[test]
    fn changed_fingerprint_resets_a_passed_record() {
        let mut passed = pending_record("old-hash");
        passed.status = ReviewStatus::Passed;
        passed.reviewer_answers = Some(vec!["a1".into(), "a2".into(), "a3".into()]);
        passed.grading_result = Some(passing_result());
        passed.reviewer_username = Some("alice".into());
        passed.reviewed_at = Some(Utc::now());
        let created_at = passed.created_at;

        assert!(should_regenerate(Some(&passed), "new-hash"));

        let fresh = refreshed_record(
            Some(passed),
            "o/r#1",
            "sha-2",
            42,
            vec!["nq1".into(), "nq2".into(), "nq3".into()],
            "new-hash".into(),
            11,
            Utc::now(),
        );
        assert_eq!(fresh.status, ReviewStatus::PendingReview);
        assert_eq!(fresh.diff_hash, "new-hash");
        assert_eq!(fresh.pr_sha, "sha-2");
        assert!(fresh.reviewer_answers.is_none());
        assert!(fresh.grading_result.is_none());
        assert!(fresh.reviewer_username.is_none());
        assert!(fresh.reviewed_at.is_none());
        assert_eq!(fresh.bot_comment_id, Some(11));
        assert_eq!(fresh.created_at, created_at);
    }

    #[test]
    fn grading_outcome_drives_the_state_transition() {
        let record = pending_record("h");
        let now = Utc::now();
        let graded = graded_record(
            record.clone(),
            vec!["a1".into(), "a2".into(), "a3".into()],
            passing_result(),
            "alice",
            now,
        );
        assert_eq!(graded.status, ReviewStatus::Passed);
        assert_eq!(graded.reviewer_answers.as_ref().unwrap().len(), 3);
        assert_eq!(graded.reviewer_username.as_deref(), Some("alice"));
        assert_eq!(graded.reviewed_at, Some(now));

        let mut failing = passing_result();
        failing.overall_pass = false;
        let graded = graded_record(record, vec!["a1".into()], failing, "bob", now);
        assert_eq!(graded.status, ReviewStatus::Failed);
    }

    #[test]
    fn question_comment_numbers_every_question() {
        let qs = vec!["Why?".to_string(), "How?".to_string(), "Where?".to_string()];
        let body = build_question_comment(&qs, false);
        assert!(body.contains("1. Why?"));
        assert!(body.contains("3. Where?"));
        assert!(body.contains("numbered 1\u{2013}3"));
        assert!(!body.contains("large PR"));

        let large = build_question_comment(&qs, true);
        assert!(large.contains("This is a large PR"));
    }

    #[test]
    fn incomplete_reply_reports_both_counts() {
        let body = build_incomplete_reply(2, 3);
        assert!(body.contains("I found 2 answer(s) but expected 3"));
        assert!(body.contains("1. Your answer"));
    }

    #[test]
    fn feedback_comment_reflects_outcome() {
        let body = build_feedback_comment("alice", &passing_result());
        assert!(body.contains("Comprehension Check Passed"));
        assert!(body.contains("@alice"));
        assert!(body.contains("**Feedback:** good"));
        assert!(body.contains("**Summary:** Solid."));

        let mut failing = passing_result();
        failing.overall_pass = false;
        failing.answers[0].grade = Grade::Fail;
        let body = build_feedback_comment("bob", &failing);
        assert!(body.contains("Comprehension Check Failed"));
        assert!(body.contains("revised answers"));
    }

    #[test]
    fn fence_stripping_handles_common_shapes() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  ```json\n{\"a\":1}\n```  "), "{\"a\":1}");
    }
}
