//! Status taxonomy: canonical funnel order and stage tags
//!
//! Every known status has a position in the canonical order (its *rank*) and
//! a [`StatusStage`]. The three closing stages (`accepted`, `ready_to_deploy`,
//! `deployed`) are *terminal*: the work is functionally done and only awaits
//! closure bookkeeping. Insight rules never call a terminal bucket a
//! bottleneck.
//!
//! ## Configuration Resolution
//!
//! 1. Explicit override path, when it exists
//! 2. `~/.local/share/radar/config/statuses.toml`, when it exists
//! 3. Embedded defaults (compiled into binary)
//!
//! Lookups are case-insensitive and ignore `_`, `-` and repeated whitespace.
//! Unknown statuses are non-terminal and rank after every known status.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default taxonomy (compiled into binary)
const DEFAULT_TAXONOMY: &str = include_str!("../../../config/statuses.toml");

/// Where a status sits in the resolution funnel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStage {
    /// Waiting for a first diagnosis
    Triage,
    /// Being worked on
    Active,
    /// Waiting on an external dependency
    Blocked,
    /// Under test or verification
    Verification,
    /// Accepted by the requester, pending release
    Accepted,
    /// Packaged and waiting for a deployment window
    ReadyToDeploy,
    /// Released, pending formal closure
    Deployed,
}

impl StatusStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Verification => "verification",
            Self::Accepted => "accepted",
            Self::ReadyToDeploy => "ready_to_deploy",
            Self::Deployed => "deployed",
        }
    }

    /// Functionally done, awaiting closure bookkeeping
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::ReadyToDeploy | Self::Deployed)
    }
}

impl fmt::Display for StatusStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatusStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "triage" => Ok(Self::Triage),
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            "verification" => Ok(Self::Verification),
            "accepted" => Ok(Self::Accepted),
            "ready_to_deploy" => Ok(Self::ReadyToDeploy),
            "deployed" => Ok(Self::Deployed),
            _ => Err(format!("Unknown status stage: {}", s)),
        }
    }
}

/// Normalize a status label for lookup
pub fn normalize_status(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A known status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// Display name, as listed in the taxonomy
    pub name: String,
    pub stage: StatusStage,
    /// Position in the canonical order, 0-based
    pub rank: usize,
}

/// Canonical status order with stage tags
#[derive(Debug, Clone)]
pub struct StatusTaxonomy {
    entries: Vec<StatusEntry>,
    lookup: HashMap<String, usize>,
}

impl Default for StatusTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StatusTaxonomy {
    /// The embedded default taxonomy
    pub fn builtin() -> Self {
        Self::from_toml(DEFAULT_TAXONOMY).expect("embedded status taxonomy is valid")
    }

    /// Load the taxonomy (override first, then default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let candidate = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_taxonomy_path(),
        };

        match candidate {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading status taxonomy override");
                let content = fs::read_to_string(&path)?;
                Self::from_toml(&content)
            }
            _ => Ok(Self::builtin()),
        }
    }

    /// Parse a taxonomy from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawTaxonomy = toml::from_str(content)?;
        let mut entries = Vec::with_capacity(raw.status.len());
        for status in raw.status {
            let stage = status.stage.parse::<StatusStage>().map_err(Error::InvalidConfig)?;
            entries.push((status.name, stage, status.aliases));
        }
        Self::from_entries(entries)
    }

    /// Build and validate a taxonomy from `(name, stage, aliases)` in funnel order
    pub fn from_entries(entries: Vec<(String, StatusStage, Vec<String>)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidConfig(
                "status taxonomy must list at least one status".into(),
            ));
        }

        let mut taxonomy = Self {
            entries: Vec::with_capacity(entries.len()),
            lookup: HashMap::new(),
        };

        for (rank, (name, stage, aliases)) in entries.into_iter().enumerate() {
            let name = name.trim().to_string();
            for label in std::iter::once(&name).chain(aliases.iter()) {
                let normalized = normalize_status(label);
                if normalized.is_empty() {
                    return Err(Error::InvalidConfig(format!(
                        "empty status label at position {}",
                        rank
                    )));
                }
                if taxonomy.lookup.insert(normalized, rank).is_some() {
                    return Err(Error::InvalidConfig(format!(
                        "status '{}' is listed more than once",
                        label.trim()
                    )));
                }
            }
            taxonomy.entries.push(StatusEntry { name, stage, rank });
        }

        Ok(taxonomy)
    }

    /// Known status for a label, if any
    pub fn lookup(&self, status: &str) -> Option<&StatusEntry> {
        self.lookup
            .get(&normalize_status(status))
            .map(|&idx| &self.entries[idx])
    }

    /// Rank in the canonical order; unknown statuses rank last
    pub fn rank(&self, status: &str) -> usize {
        self.lookup(status)
            .map(|e| e.rank)
            .unwrap_or(self.entries.len())
    }

    pub fn stage(&self, status: &str) -> Option<StatusStage> {
        self.lookup(status).map(|e| e.stage)
    }

    /// Whether the status is a terminal stage; unknown statuses are not
    pub fn is_terminal(&self, status: &str) -> bool {
        self.stage(status).is_some_and(|s| s.is_terminal())
    }

    /// Canonical display name for known statuses, the trimmed label otherwise
    pub fn display_name(&self, status: &str) -> String {
        self.lookup(status)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| status.trim().to_string())
    }

    /// Entries in canonical order
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Names of every status tagged with `stage`, in canonical order
    pub fn names_for_stage(&self, stage: StatusStage) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Default taxonomy override path
pub fn default_taxonomy_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("radar").join("config").join("statuses.toml"))
}

/// Raw taxonomy structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawTaxonomy {
    #[serde(default)]
    status: Vec<RawStatus>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    name: String,
    stage: String,
    #[serde(default)]
    aliases: Vec<String>,
}
