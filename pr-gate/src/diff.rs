//! Diff extraction: turns the changed-file list of a PR into a bounded,
//! LLM-safe transcript plus a content fingerprint and a size classification.
//!
//! The transcript is a pure function of the input list (content and order);
//! identical inputs always produce identical transcripts and fingerprints.
//! The fingerprint is used for change detection only, not for security.

use sha2::{Digest, Sha256};

use crate::github::types::PrFile;

/// Lockfile/ignore basenames that never carry reviewable content.
const SKIP_BASENAMES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "Pipfile.lock",
    ".gitignore",
];

/// Binary/minified/generated suffixes excluded from the transcript.
const SKIP_EXTENSIONS: &[&str] = &[".min.js", ".min.css", ".map", ".svg", ".png", ".jpg", ".ico"];

/// Ceiling on the running patch-line total across all files.
const MAX_TOTAL_LINES: usize = 5000;

/// Ceiling on a single file's patch; longer patches are truncated.
const MAX_FILE_PATCH_LINES: usize = 500;

/// Transcript emitted when no file survives the skip rules.
pub const NO_CHANGES_SENTINEL: &str = "(no meaningful code changes)";

/// Result of [`extract`].
#[derive(Debug, Clone)]
pub struct DiffSummary {
    /// Human/LLM-readable rendering of the surviving patches.
    pub transcript: String,
    /// Lowercase-hex SHA-256 of the exact transcript bytes.
    pub fingerprint: String,
    /// True when the running patch-line total crossed [`MAX_TOTAL_LINES`].
    pub is_large: bool,
}

/// Extracts the reviewable diff transcript from a PR's changed-file list.
///
/// Files are visited in the order supplied. Denylisted names, denylisted
/// suffixes, and empty patches are skipped. Once the running line total
/// crosses [`MAX_TOTAL_LINES`], processing stops: the crossing file and
/// everything after it are excluded and the result is flagged large.
pub fn extract(files: &[PrFile]) -> DiffSummary {
    let mut parts: Vec<String> = Vec::new();
    let mut total_lines = 0usize;
    let mut is_large = false;

    for file in files {
        if should_skip(&file.filename) {
            continue;
        }

        let Some(patch) = file.patch.as_deref() else {
            continue;
        };
        if patch.is_empty() {
            continue;
        }

        let patch_lines = patch.bytes().filter(|b| *b == b'\n').count() + 1;
        total_lines += patch_lines;

        if total_lines > MAX_TOTAL_LINES {
            is_large = true;
            break;
        }

        let rendered = if patch_lines > MAX_FILE_PATCH_LINES {
            let truncated: Vec<&str> = patch.split('\n').take(MAX_FILE_PATCH_LINES).collect();
            format!("{}\n... (truncated)", truncated.join("\n"))
        } else {
            patch.to_string()
        };

        parts.push(format!(
            "### {} ({}: +{}/-{})\n```diff\n{}\n```",
            file.filename, file.status, file.additions, file.deletions, rendered
        ));
    }

    let transcript = if parts.is_empty() {
        NO_CHANGES_SENTINEL.to_string()
    } else {
        parts.join("\n\n")
    };

    let fingerprint = sha_hex(&transcript);

    DiffSummary {
        transcript,
        fingerprint,
        is_large,
    }
}

fn should_skip(filename: &str) -> bool {
    let basename = filename.rsplit('/').next().unwrap_or(filename);
    if SKIP_BASENAMES.contains(&basename) {
        return true;
    }
    SKIP_EXTENSIONS.iter().any(|ext| filename.ends_with(ext))
}

/// Compute a lowercase hex SHA-256 of a string.
fn sha_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    format!("{:x}", h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, patch: Option<&str>) -> PrFile {
        PrFile {
            filename: name.to_string(),
            status: "modified".to_string(),
            additions: 1,
            deletions: 0,
            patch: patch.map(|p| p.to_string()),
        }
    }

    fn patch_of_lines(n: usize) -> String {
        let mut s = String::new();
        for i in 0..n {
            s.push_str(&format!("+line {i}"));
            if i + 1 < n {
                s.push('\n');
            }
        }
        s
    }

    #[test]
    fn all_skipped_yields_sentinel() {
        let files = vec![
            file("Cargo.lock", Some("+x")),
            file("logo.svg", Some("+y")),
            file("src/lib.rs", None),
            file("src/empty.rs", Some("")),
        ];
        let out = extract(&files);
        assert_eq!(out.transcript, NO_CHANGES_SENTINEL);
        assert!(!out.is_large);
        // The sentinel still gets a fingerprint.
        assert_eq!(out.fingerprint.len(), 64);
    }

    #[test]
    fn nested_lockfile_is_skipped_by_basename() {
        let files = vec![file("web/frontend/package-lock.json", Some("+a"))];
        let out = extract(&files);
        assert_eq!(out.transcript, NO_CHANGES_SENTINEL);
    }

    #[test]
    fn transcript_contains_header_and_fenced_patch() {
        let files = vec![file("src/lib.rs", Some("+fn a() {}"))];
        let out = extract(&files);
        assert!(out.transcript.starts_with("### src/lib.rs (modified: +1/-0)"));
        assert!(out.transcript.contains("```diff\n+fn a() {}\n```"));
        assert!(!out.is_large);
    }

    #[test]
    fn crossing_total_ceiling_sets_large_and_drops_tail() {
        let big = patch_of_lines(3000);
        let files = vec![
            file("a.rs", Some(big.as_str())),
            file("b.rs", Some(big.as_str())),
            file("c.rs", Some(patch_of_lines(10).as_str())),
        ];
        let out = extract(&files);
        assert!(out.is_large);
        assert!(out.transcript.contains("### a.rs"));
        // b.rs crosses the ceiling and is excluded, as is everything after it.
        assert!(!out.transcript.contains("### b.rs"));
        assert!(!out.transcript.contains("### c.rs"));
    }

    #[test]
    fn exactly_at_ceiling_is_not_large() {
        let files = vec![file("a.rs", Some(patch_of_lines(5000).as_str()))];
        let out = extract(&files);
        assert!(!out.is_large);
        assert!(out.transcript.contains("### a.rs"));
    }

    #[test]
    fn oversized_single_patch_is_truncated_with_marker() {
        let files = vec![file("big.rs", Some(patch_of_lines(600).as_str()))];
        let out = extract(&files);
        assert!(out.transcript.contains("... (truncated)"));
        assert!(out.transcript.contains("+line 499"));
        assert!(!out.transcript.contains("+line 500\n"));
    }

    #[test]
    fn extraction_is_deterministic_and_order_sensitive() {
        let a = file("a.rs", Some("+a"));
        let b = file("b.rs", Some("+b"));

        let forward = extract(&[a.clone(), b.clone()]);
        let forward_again = extract(&[a.clone(), b.clone()]);
        let reversed = extract(&[b, a]);

        assert_eq!(forward.transcript, forward_again.transcript);
        assert_eq!(forward.fingerprint, forward_again.fingerprint);
        assert_ne!(forward.transcript, reversed.transcript);
        assert_ne!(forward.fingerprint, reversed.fingerprint);
    }
}
