//! Patch construction and conflict-safe application

use std::collections::HashMap;

use tracing::debug;

use crate::patch::block::ConfigBlock;
use crate::patch::catalog::default_patch_rules;
use crate::patch::types::{
    FieldChange, FieldModification, FieldOp, FieldPatch, FieldRename, Patch, PatchRule,
    SchemaChanges, VersionPatch,
};

/// Catalog of per-repository version transitions
pub struct PatchEngine {
    rules: HashMap<String, PatchRule>,
}

impl PatchEngine {
    pub fn new(rules: Vec<PatchRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.repository.clone(), rule))
                .collect(),
        }
    }

    /// Default catalog with `custom` rules replacing defaults of the same repository
    pub fn with_custom(custom: Vec<PatchRule>) -> Self {
        let mut engine = Self::default();
        for rule in custom {
            if engine.rules.contains_key(&rule.repository) {
                debug!("Custom patch rule replaces default for {}", rule.repository);
            }
            engine.rules.insert(rule.repository.clone(), rule);
        }
        engine
    }

    /// Find the transition for a move between two versions, optionally across repositories
    ///
    /// Rules are looked up under the source repository first, then under the
    /// target. A relocation-scoped transition must match the exact repository
    /// pair and wins over an unscoped transition for the same versions.
    fn find_transition(
        &self,
        from_repository: &str,
        from_version: &str,
        to_repository: &str,
        to_version: &str,
    ) -> Option<&VersionPatch> {
        let rule = self
            .rules
            .get(from_repository)
            .or_else(|| self.rules.get(to_repository))?;

        let mut candidates = rule
            .transitions
            .iter()
            .filter(|t| t.matches_versions(from_version, to_version));

        let scoped = candidates
            .clone()
            .find(|t| t.is_relocation() && t.matches_repositories(from_repository, to_repository));

        scoped.or_else(|| candidates.find(|t| !t.is_relocation()))
    }

    pub fn has_patch(&self, repository: &str, from_version: &str, to_version: &str) -> bool {
        self.has_patch_with_location(repository, from_version, to_version, repository)
    }

    pub fn has_patch_with_location(
        &self,
        repository: &str,
        from_version: &str,
        to_version: &str,
        target_repository: &str,
    ) -> bool {
        self.find_transition(repository, from_version, target_repository, to_version)
            .is_some()
    }

    /// Field-level summary of a transition without touching any block
    pub fn schema_changes(
        &self,
        from_repository: &str,
        from_version: &str,
        to_repository: &str,
        to_version: &str,
    ) -> Option<SchemaChanges> {
        self.find_transition(from_repository, from_version, to_repository, to_version)
            .map(SchemaChanges::from_transition)
    }

    /// Apply the transition for `repository` from `from_version` to `to_version`
    /// to `block` in place. A missing block is treated as empty.
    pub fn build_patch(
        &self,
        repository: &str,
        from_version: &str,
        to_version: &str,
        block: Option<&mut ConfigBlock>,
    ) -> Patch {
        self.build_patch_with_location(repository, from_version, to_version, repository, block)
    }

    /// Like [`build_patch`](Self::build_patch), moving the dependency to
    /// `target_repository` at the same time
    pub fn build_patch_with_location(
        &self,
        repository: &str,
        from_version: &str,
        to_version: &str,
        target_repository: &str,
        block: Option<&mut ConfigBlock>,
    ) -> Patch {
        let mut empty = ConfigBlock::new();
        let block = block.unwrap_or(&mut empty);
        let mut patch = Patch::empty(
            repository,
            target_repository,
            from_version,
            to_version,
            block,
        );

        let Some(transition) =
            self.find_transition(repository, from_version, target_repository, to_version)
        else {
            debug!(
                "No patch for {}@{} -> {}@{}",
                repository, from_version, target_repository, to_version
            );
            return patch;
        };

        for field_patch in &transition.fields {
            apply_field_patch(block, field_patch, &mut patch);
        }

        patch.after = block.clone();
        patch.applied = patch.change_count() > 0 || patch.is_relocation();
        patch
    }

    /// Build a patch against a copy of `block`, leaving the caller's block untouched
    pub fn preview_changes(
        &self,
        repository: &str,
        from_version: &str,
        to_version: &str,
        block: Option<&ConfigBlock>,
    ) -> Patch {
        self.preview_changes_with_location(repository, from_version, to_version, repository, block)
    }

    pub fn preview_changes_with_location(
        &self,
        repository: &str,
        from_version: &str,
        to_version: &str,
        target_repository: &str,
        block: Option<&ConfigBlock>,
    ) -> Patch {
        let mut copy = block.cloned().unwrap_or_default();
        self.build_patch_with_location(
            repository,
            from_version,
            to_version,
            target_repository,
            Some(&mut copy),
        )
    }
}

impl Default for PatchEngine {
    fn default() -> Self {
        Self::new(default_patch_rules())
    }
}

/// Apply one field operation. Conflicts are recorded as warnings and never
/// overwrite or drop existing values.
fn apply_field_patch(block: &mut ConfigBlock, field_patch: &FieldPatch, patch: &mut Patch) {
    let reason = &field_patch.reason;
    let warning = match &field_patch.op {
        FieldOp::Add { field, value } => {
            if block.contains_key(field) {
                Some(format!("add: '{}' is already set, keeping existing value", field))
            } else {
                block.insert(field.clone(), value.clone());
                patch.additions.push(FieldChange {
                    field: field.clone(),
                    value: value.clone(),
                    reason: reason.clone(),
                });
                None
            }
        }
        FieldOp::Remove { field } => match block.shift_remove(field) {
            Some(value) => {
                patch.removals.push(FieldChange {
                    field: field.clone(),
                    value,
                    reason: reason.clone(),
                });
                None
            }
            None => Some(format!("remove: '{}' is not set", field)),
        },
        FieldOp::Rename { field, new_field } => {
            if !block.contains_key(field) {
                Some(format!("rename: '{}' is not set", field))
            } else if block.contains_key(new_field) {
                Some(format!(
                    "rename: '{}' is already set, keeping both '{}' and '{}'",
                    new_field, field, new_field
                ))
            } else if let Some((index, _, value)) = block.shift_remove_full(field) {
                // Keep the renamed field where the old one was
                block.shift_insert(index, new_field.clone(), value.clone());
                patch.renames.push(FieldRename {
                    from: field.clone(),
                    to: new_field.clone(),
                    value,
                    reason: reason.clone(),
                });
                None
            } else {
                Some(format!("rename: '{}' is not set", field))
            }
        }
        FieldOp::Modify { field, value } => match block.get_mut(field) {
            Some(current) if current == value => {
                Some(format!("modify: '{}' already has the target value", field))
            }
            Some(current) => {
                let old_value = std::mem::replace(current, value.clone());
                patch.modifications.push(FieldModification {
                    field: field.clone(),
                    old_value,
                    new_value: value.clone(),
                    reason: reason.clone(),
                });
                None
            }
            None => Some(format!("modify: '{}' is not set", field)),
        },
    };

    if let Some(warning) = warning {
        debug!("Patch conflict for {}: {}", patch.repository, warning);
        patch.warnings.push(warning);
    }
}
