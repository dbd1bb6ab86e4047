//! Placeholder substitution for catalog command templates.
//!
//! Catalog commands are written against three literal placeholders. Rendering
//! is plain substring replacement, applied in the order target, ASN, org.
//!
//! Known limitation: rendering is not idempotent when a scope value itself
//! contains a later placeholder literal (e.g. an org named `ASXXXXX`), because
//! the later pass rewrites it again.

use serde::{Deserialize, Serialize};

pub const TARGET_PLACEHOLDER: &str = "target.com";
pub const ASN_PLACEHOLDER: &str = "ASXXXXX";
pub const ORG_PLACEHOLDER: &str = "Target Org";

pub const TARGET_FALLBACK: &str = "target.com";
pub const ASN_FALLBACK: &str = "AS12345";
pub const ORG_FALLBACK: &str = "Target Corp";

/// Reconnaissance scope entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scope {
    pub target: String,
    pub asn: String,
    pub org: String,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            target: TARGET_PLACEHOLDER.to_string(),
            asn: ASN_PLACEHOLDER.to_string(),
            org: ORG_PLACEHOLDER.to_string(),
        }
    }
}

impl Scope {
    #[must_use]
    pub fn new(target: impl Into<String>, asn: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            asn: asn.into(),
            org: org.into(),
        }
    }
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Substitute every placeholder occurrence in `template` with the scope value.
#[must_use]
pub fn render(template: &str, scope: &Scope) -> String {
    template
        .replace(TARGET_PLACEHOLDER, or_fallback(&scope.target, TARGET_FALLBACK))
        .replace(ASN_PLACEHOLDER, or_fallback(&scope.asn, ASN_FALLBACK))
        .replace(ORG_PLACEHOLDER, or_fallback(&scope.org, ORG_FALLBACK))
}
