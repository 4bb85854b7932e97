use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// Abbreviated or full commit SHA (7 to 41 hex characters)
static SHA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{7,41}$").expect("valid SHA regex"));

/// Category of a version string, used to suggest replacements in the same shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `main` or `master`
    Branch,
    /// Commit SHA, abbreviated or full
    Sha,
    /// Anything else (`v4`, `v4.2.1`, `stable`, ...)
    Tag,
}

impl RefKind {
    pub fn classify(version: &str) -> Self {
        if is_branch(version) {
            RefKind::Branch
        } else if !version.starts_with('v') && SHA_PATTERN.is_match(version) {
            RefKind::Sha
        } else {
            RefKind::Tag
        }
    }
}

/// Branch references track a moving head and are never considered outdated
pub fn is_branch(version: &str) -> bool {
    matches!(version, "main" | "master")
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros, and
/// strips a leading `v`.
///
/// Examples:
/// - "v1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "v1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Whether the major version of `current` is below that of `minimum`.
///
/// Minor and patch differences are ignored (`v4.0` is not below `v4.1`).
/// Returns None when either side is not a (partial) semantic version.
pub fn is_below_major(current: &str, minimum: &str) -> Option<bool> {
    Some(parse_version(current)?.major < parse_version(minimum)?.major)
}

/// Leading major number of a tag (`v4.2.1` -> 4). Branches, SHAs and
/// tags without leading digits yield 0.
pub fn major_component(version: &str) -> u64 {
    if RefKind::classify(version) != RefKind::Tag {
        return 0;
    }
    let stripped = version.strip_prefix('v').unwrap_or(version);
    let digits: String = stripped.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Absolute distance between the major numbers of two versions
pub fn major_distance(current: &str, latest: &str) -> u64 {
    major_component(current).abs_diff(major_component(latest))
}
