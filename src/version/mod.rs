//! Version resolution layer
//!
//! Decides whether two version strings of one repository denote the same
//! commit, and whether one is stale relative to another, while keeping calls
//! to the remote authority to a minimum.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐
//! │   Remote    │────▶│    Cache    │◀────│ VersionResolver │
//! │  (lookup)   │     │ (two tiers) │     │    (compare)    │
//! └─────────────┘     └─────────────┘     └─────────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   Remotes   │
//! │(github, off)│
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Per-ref and per-repository caches with TTL
//! - [`resolver`]: Cache-first equivalence and staleness checks
//! - [`remote`]: Remote authority trait
//! - [`remotes`]: Concrete remote authorities (GitHub, offline)
//! - [`error`]: Error types for remote and resolution failures
//! - [`semver`]: Version string classification and major-version helpers

pub mod cache;
pub mod error;
pub mod remote;
pub mod remotes;
pub mod resolver;
pub mod semver;
