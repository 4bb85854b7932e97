//! Catalog and result types for configuration patches

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patch::block::ConfigBlock;

/// One change to a configuration block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FieldOp {
    /// Set `field` to `value` unless it is already present
    Add { field: String, value: Value },
    /// Delete `field` if present
    Remove { field: String },
    /// Move the value of `field` to `new_field`
    Rename {
        field: String,
        #[serde(rename = "newField")]
        new_field: String,
    },
    /// Replace the value of `field` if present
    Modify { field: String, value: Value },
}

/// A field operation together with the reason it is needed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(flatten)]
    pub op: FieldOp,
    #[serde(default)]
    pub reason: String,
}

impl FieldPatch {
    pub fn add(field: &str, value: impl Into<Value>, reason: &str) -> Self {
        Self {
            op: FieldOp::Add {
                field: field.to_string(),
                value: value.into(),
            },
            reason: reason.to_string(),
        }
    }

    pub fn remove(field: &str, reason: &str) -> Self {
        Self {
            op: FieldOp::Remove {
                field: field.to_string(),
            },
            reason: reason.to_string(),
        }
    }

    pub fn rename(field: &str, new_field: &str, reason: &str) -> Self {
        Self {
            op: FieldOp::Rename {
                field: field.to_string(),
                new_field: new_field.to_string(),
            },
            reason: reason.to_string(),
        }
    }

    pub fn modify(field: &str, value: impl Into<Value>, reason: &str) -> Self {
        Self {
            op: FieldOp::Modify {
                field: field.to_string(),
                value: value.into(),
            },
            reason: reason.to_string(),
        }
    }
}

/// Field operations needed to move between two exact versions
///
/// When both `from_repository` and `to_repository` are set the transition is
/// relocation-scoped and only matches that exact repository pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPatch {
    pub from_version: String,
    pub to_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_repository: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldPatch>,
}

impl VersionPatch {
    pub fn new(from_version: &str, to_version: &str, fields: Vec<FieldPatch>) -> Self {
        Self {
            from_version: from_version.to_string(),
            to_version: to_version.to_string(),
            from_repository: None,
            to_repository: None,
            fields,
        }
    }

    /// Scope the transition to a move from `from_repository` to `to_repository`
    pub fn relocating(mut self, from_repository: &str, to_repository: &str) -> Self {
        self.from_repository = Some(from_repository.to_string());
        self.to_repository = Some(to_repository.to_string());
        self
    }

    pub fn is_relocation(&self) -> bool {
        self.from_repository.is_some() && self.to_repository.is_some()
    }

    pub fn matches_versions(&self, from_version: &str, to_version: &str) -> bool {
        self.from_version == from_version && self.to_version == to_version
    }

    pub fn matches_repositories(&self, from_repository: &str, to_repository: &str) -> bool {
        self.from_repository.as_deref() == Some(from_repository)
            && self.to_repository.as_deref() == Some(to_repository)
    }
}

/// All known transitions for one repository, in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRule {
    pub repository: String,
    #[serde(default)]
    pub transitions: Vec<VersionPatch>,
}

impl PatchRule {
    pub fn new(repository: &str, transitions: Vec<VersionPatch>) -> Self {
        Self {
            repository: repository.to_string(),
            transitions,
        }
    }
}

/// A field that was added or removed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub value: Value,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRename {
    pub from: String,
    pub to: String,
    pub value: Value,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldModification {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub reason: String,
}

/// Result of building a patch for one dependency
///
/// `applied == false` means no change is needed, which is a success state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patch {
    pub repository: String,
    pub target_repository: String,
    pub from_version: String,
    pub to_version: String,
    pub additions: Vec<FieldChange>,
    pub removals: Vec<FieldChange>,
    pub renames: Vec<FieldRename>,
    pub modifications: Vec<FieldModification>,
    pub applied: bool,
    pub warnings: Vec<String>,
    pub before: ConfigBlock,
    pub after: ConfigBlock,
}

impl Patch {
    pub(crate) fn empty(
        repository: &str,
        target_repository: &str,
        from_version: &str,
        to_version: &str,
        block: &ConfigBlock,
    ) -> Self {
        Self {
            repository: repository.to_string(),
            target_repository: target_repository.to_string(),
            from_version: from_version.to_string(),
            to_version: to_version.to_string(),
            additions: vec![],
            removals: vec![],
            renames: vec![],
            modifications: vec![],
            applied: false,
            warnings: vec![],
            before: block.clone(),
            after: block.clone(),
        }
    }

    pub fn is_relocation(&self) -> bool {
        self.repository != self.target_repository
    }

    /// Number of field-level changes
    pub fn change_count(&self) -> usize {
        self.additions.len() + self.removals.len() + self.renames.len() + self.modifications.len()
    }
}

/// Summary of the schema differences between two versions, without values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub renamed: Vec<(String, String)>,
    pub modified: Vec<String>,
    pub notes: Vec<String>,
}

impl SchemaChanges {
    pub fn from_transition(transition: &VersionPatch) -> Self {
        let mut changes = Self::default();
        for patch in &transition.fields {
            match &patch.op {
                FieldOp::Add { field, .. } => changes.added.push(field.clone()),
                FieldOp::Remove { field } => changes.removed.push(field.clone()),
                FieldOp::Rename { field, new_field } => {
                    changes.renamed.push((field.clone(), new_field.clone()))
                }
                FieldOp::Modify { field, .. } => changes.modified.push(field.clone()),
            }
            if !patch.reason.is_empty() {
                changes.notes.push(patch.reason.clone());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
            && self.modified.is_empty()
    }

    /// One-line summary, e.g. `added: fetch-depth; removed: token`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.added.is_empty() {
            parts.push(format!("added: {}", self.added.join(", ")));
        }
        if !self.removed.is_empty() {
            parts.push(format!("removed: {}", self.removed.join(", ")));
        }
        if !self.renamed.is_empty() {
            let renamed: Vec<String> = self
                .renamed
                .iter()
                .map(|(from, to)| format!("{} -> {}", from, to))
                .collect();
            parts.push(format!("renamed: {}", renamed.join(", ")));
        }
        if !self.modified.is_empty() {
            parts.push(format!("modified: {}", self.modified.join(", ")));
        }
        if parts.is_empty() {
            "no input changes".to_string()
        } else {
            parts.join("; ")
        }
    }
}
