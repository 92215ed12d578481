use crate::models::{Issue, MANIFEST_FILE_NAME, Manifest, Severity};
use crate::rules;

/// Inspect manifest text for permission and CSP issues.
///
/// Parse failures are reported as a single critical issue rather than an
/// error; the remaining checks only run on a well-formed manifest.
pub fn analyze_manifest(content: &str) -> Vec<Issue> {
    let manifest: Manifest = match serde_json::from_str(content) {
        Ok(manifest) => manifest,
        Err(_) => {
            return vec![
                Issue::from_rule(&rules::EXCESSIVE_PERMISSIONS, MANIFEST_FILE_NAME)
                    .with_severity(Severity::Critical)
                    .with_title("Invalid Manifest")
                    .with_description("manifest.json is not well-formed JSON")
                    .with_recommendation("Check the manifest.json syntax"),
            ];
        }
    };

    let mut issues = Vec::new();

    let permissions = manifest.permissions.unwrap_or_default();
    if permissions.iter().any(|p| p == "<all_urls>" || p == "tabs") {
        issues.push(
            Issue::from_rule(&rules::EXCESSIVE_PERMISSIONS, MANIFEST_FILE_NAME)
                .with_recommendation("Request only the permissions the extension actually needs"),
        );
    }

    if manifest.content_security_policy.is_some() {
        issues.push(
            Issue::from_rule(&rules::PROPER_CSP, MANIFEST_FILE_NAME)
                .with_recommendation("The Content Security Policy is configured appropriately"),
        );
    } else {
        issues.push(
            Issue::from_rule(&rules::MINIMAL_PERMISSIONS, MANIFEST_FILE_NAME)
                .with_description("Consider configuring a Content Security Policy")
                .with_recommendation("Set a Content Security Policy to reduce injection risk"),
        );
    }

    issues
}
