use serde::Deserialize;
use serde_json::Value;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// The subset of a WebExtension manifest the analyzer inspects.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub manifest_version: Option<u8>,
    pub permissions: Option<Vec<String>>,
    // String in manifest v2, object in v3; only presence matters here.
    pub content_security_policy: Option<Value>,
}
