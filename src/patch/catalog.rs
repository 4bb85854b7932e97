//! Built-in patch catalog
//!
//! Baseline field transformations for widely used actions, available with
//! zero configuration. The catalog is rebuilt by every call and never mutated
//! after construction.

use crate::patch::types::{FieldPatch, PatchRule, VersionPatch};

/// Default patch rules, keyed by repository
pub fn default_patch_rules() -> Vec<PatchRule> {
    vec![
        PatchRule::new(
            "actions/checkout",
            vec![VersionPatch::new(
                "v1",
                "v4",
                vec![
                    FieldPatch::remove(
                        "token",
                        "v4 authenticates with the job's GITHUB_TOKEN; pass a token only when a PAT is required",
                    ),
                    FieldPatch::add(
                        "fetch-depth",
                        1,
                        "v4 clones a single commit; depth is made explicit to keep the old shallow behaviour visible",
                    ),
                ],
            )],
        ),
        PatchRule::new(
            "actions/setup-node",
            vec![
                VersionPatch::new(
                    "v1",
                    "v4",
                    vec![FieldPatch::rename(
                        "version",
                        "node-version",
                        "the `version` input was replaced by `node-version`",
                    )],
                ),
                VersionPatch::new(
                    "v2",
                    "v4",
                    vec![FieldPatch::remove(
                        "always-auth",
                        "registry auth is configured through `registry-url` and NODE_AUTH_TOKEN",
                    )],
                ),
            ],
        ),
        PatchRule::new(
            "actions/setup-java",
            vec![VersionPatch::new(
                "v1",
                "v4",
                vec![FieldPatch::add(
                    "distribution",
                    "zulu",
                    "`distribution` is required since v2; v1 always installed Zulu",
                )],
            )],
        ),
        PatchRule::new(
            "actions/setup-go",
            vec![VersionPatch::new(
                "v2",
                "v5",
                vec![FieldPatch::remove(
                    "stable",
                    "the `stable` input was removed; use `go-version: stable`",
                )],
            )],
        ),
        PatchRule::new(
            "actions/upload-artifact",
            vec![VersionPatch::new(
                "v3",
                "v4",
                vec![FieldPatch::add(
                    "overwrite",
                    false,
                    "v4 artifacts are immutable; uploading an existing name fails unless `overwrite` is set",
                )],
            )],
        ),
        PatchRule::new(
            "actions/create-release",
            vec![
                VersionPatch::new(
                    "v1",
                    "v2",
                    vec![
                        FieldPatch::rename(
                            "release_name",
                            "name",
                            "softprops/action-gh-release names the release with `name`",
                        ),
                        FieldPatch::rename(
                            "commitish",
                            "target_commitish",
                            "softprops/action-gh-release uses `target_commitish`",
                        ),
                    ],
                )
                .relocating("actions/create-release", "softprops/action-gh-release"),
            ],
        ),
        PatchRule::new(
            "actions-rs/toolchain",
            vec![
                VersionPatch::new(
                    "v1",
                    "stable",
                    vec![
                        FieldPatch::remove(
                            "override",
                            "dtolnay/rust-toolchain does not write rust-toolchain overrides",
                        ),
                        FieldPatch::remove(
                            "profile",
                            "dtolnay/rust-toolchain always installs the minimal profile",
                        ),
                        FieldPatch::rename(
                            "target",
                            "targets",
                            "dtolnay/rust-toolchain accepts a comma-separated `targets` list",
                        ),
                    ],
                )
                .relocating("actions-rs/toolchain", "dtolnay/rust-toolchain"),
            ],
        ),
    ]
}
