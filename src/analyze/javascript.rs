use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Issue;
use crate::rules;

// Property writes only; bare innerHTML references are not flagged.
static INNER_HTML_WRITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.innerHTML\s*=").unwrap());
// `http://` followed by a host character, so malformed `http:///` is ignored.
static PLAIN_HTTP_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"http://[^/]").unwrap());

/// Line-scan one script for unsafe DOM writes and plaintext HTTP URLs.
///
/// Both passes walk the full line set independently, so a single line can be
/// reported by each of them. Line numbers are 1-based.
pub fn analyze_javascript(content: &str, filename: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if INNER_HTML_WRITE.is_match(line) {
            issues.push(
                Issue::from_rule(&rules::UNSAFE_INNER_HTML, filename)
                    .with_line(index + 1)
                    .with_snippet(line.trim())
                    .with_recommendation("Use textContent or createElement instead"),
            );
        }
    }

    for (index, line) in content.lines().enumerate() {
        if PLAIN_HTTP_URL.is_match(line) {
            issues.push(
                Issue::from_rule(&rules::HTTP_COMMUNICATION, filename)
                    .with_line(index + 1)
                    .with_snippet(line.trim())
                    .with_recommendation("Use HTTPS for all network communication"),
            );
        }
    }

    issues
}
