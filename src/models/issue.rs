use serde::{Deserialize, Serialize};

use crate::rules::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
    Success,
}

/// One reported finding, attributed to a file inside the scanned archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub category: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    pub recommendation: String,
}

impl Issue {
    /// Start an issue from its catalog rule; severity, title, description and
    /// category default to the rule's metadata.
    pub fn from_rule(rule: &Rule, file: impl Into<String>) -> Self {
        Self {
            id: rule.id.to_string(),
            severity: rule.severity,
            title: rule.name.to_string(),
            description: rule.description.to_string(),
            category: rule.category.to_string(),
            file: file.into(),
            line_number: None,
            code_snippet: None,
            recommendation: String::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line_number = Some(line);
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.code_snippet = Some(snippet.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }
}
