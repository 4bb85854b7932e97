//! Issue types produced by the analyzer

use std::fmt;

use serde::Serialize;

use crate::parser::types::SourceLocation;
use crate::patch::types::SchemaChanges;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// A newer version than the pinned one exists
    Outdated,
    /// The pinned version is explicitly deprecated
    Deprecated,
    /// The pinned version has a known vulnerability
    Security,
    /// The action moved to another repository
    Migration,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Outdated => "outdated",
            IssueType::Deprecated => "deprecated",
            IssueType::Security => "security",
            IssueType::Migration => "migration",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A version-related finding for one dependency reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub repository: String,
    pub current_version: String,
    pub suggested_version: String,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    /// `repository@version` the action moved to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_changes: Option<SchemaChanges>,
    pub location: SourceLocation,
}
