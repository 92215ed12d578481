use crate::models::Severity;

/// Static descriptor for one category of finding.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub category: &'static str,
    pub description: &'static str,
}

pub static EXCESSIVE_PERMISSIONS: Rule = Rule {
    id: "ADDON_001",
    name: "Excessive Permissions",
    severity: Severity::High,
    category: "Manifest Security",
    description: "The extension requests permissions it does not appear to need",
};

pub static UNSAFE_INNER_HTML: Rule = Rule {
    id: "ADDON_002",
    name: "Unsafe innerHTML Usage",
    severity: Severity::Critical,
    category: "Code Security",
    description: "Assignment to innerHTML can introduce XSS vulnerabilities",
};

pub static HTTP_COMMUNICATION: Rule = Rule {
    id: "ADDON_003",
    name: "HTTP Communication",
    severity: Severity::Medium,
    category: "Communication Security",
    description: "Plaintext HTTP communication detected; HTTPS is recommended",
};

pub static PROPER_CSP: Rule = Rule {
    id: "ADDON_004",
    name: "Proper CSP Configuration",
    severity: Severity::Success,
    category: "Security Configuration",
    description: "A Content Security Policy is configured",
};

pub static MINIMAL_PERMISSIONS: Rule = Rule {
    id: "ADDON_005",
    name: "Minimal Permissions",
    severity: Severity::Info,
    category: "Best Practices",
    description: "Review the requested permission set",
};

pub static RULES: &[Rule] = &[
    EXCESSIVE_PERMISSIONS,
    UNSAFE_INNER_HTML,
    HTTP_COMMUNICATION,
    PROPER_CSP,
    MINIMAL_PERMISSIONS,
];

pub fn rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.id == id)
}
