//! Learning store: per-scope insight state persisted as JSON
//!
//! A scope is one (country, data source) pairing. For each scope the store
//! keeps free-form counters (e.g. how often each insight was shown) and the
//! number of user interactions. The lifecycle is explicit: `load` once,
//! mutate in memory with `set_scope`, `save` when the caller decides.
//!
//! File layout: a JSON object mapping scope key to record. Files written with
//! the older `{"version": 1, "scopes": {...}}` envelope are still read.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::Result;

/// Free-form nested counters of one scope
pub type ScopeState = Map<String, Value>;

/// Country part of the key when no country is selected
pub const GLOBAL_COUNTRY: &str = "global";
/// Source part of the key when no source is selected
pub const ALL_SOURCES: &str = "all-sources";

/// Build the scope key `"{country}::{source_id}"`.
///
/// Each part falls back independently, so two empty parts give
/// `"global::all-sources"`.
pub fn learning_scope_key(country: &str, source_id: &str) -> String {
    let country = match country.trim() {
        "" => GLOBAL_COUNTRY,
        c => c,
    };
    let source = match source_id.trim() {
        "" => ALL_SOURCES,
        s => s,
    };
    format!("{}::{}", country, source)
}

/// Learning store path for the given settings
pub fn default_learning_path(settings: &Settings) -> PathBuf {
    settings.learning_path()
}

/// Persisted state of one scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeRecord {
    #[serde(default)]
    pub state: ScopeState,
    #[serde(default)]
    pub interactions: u64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub source_id: String,
    /// Last KPI snapshot the caller attached to this scope
    #[serde(default)]
    pub last_snapshot: ScopeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScopeRecord {
    /// Read a record without failing on odd field types
    fn from_value(value: &Value) -> Self {
        let obj = value.as_object();
        let field = |name: &str| obj.and_then(|o| o.get(name));
        let object = |name: &str| field(name).and_then(Value::as_object).cloned().unwrap_or_default();
        let text = |name: &str| {
            field(name)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        Self {
            state: object("state"),
            interactions: field("interactions").map(lenient_count).unwrap_or(0),
            country: text("country"),
            source_id: text("source_id"),
            last_snapshot: object("last_snapshot"),
            updated_at: field("updated_at")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }

    fn same_content(&self, other: &ScopeRecord) -> bool {
        self.state == other.state
            && self.interactions == other.interactions
            && self.country == other.country
            && self.source_id == other.source_id
            && self.last_snapshot == other.last_snapshot
    }

    fn belongs_to(&self, scope_key: &str, source_id: &str) -> bool {
        if self.source_id.is_empty() {
            scope_key.ends_with(&format!("::{}", source_id))
        } else {
            self.source_id == source_id
        }
    }
}

/// Counter stored as an integer, a non-negative float or a numeric string
pub(crate) fn lenient_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Per-scope learning state backed by a JSON file
#[derive(Debug)]
pub struct LearningStore {
    path: PathBuf,
    scopes: BTreeMap<String, ScopeRecord>,
    /// Fingerprint of the content last read from or written to disk
    last_saved: Option<String>,
}

impl LearningStore {
    /// Create an empty store backed by `path` (nothing is read yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scopes: BTreeMap::new(),
            last_saved: None,
        }
    }

    /// Create a store and load it
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory scopes with the file content.
    ///
    /// A missing, empty or unreadable file leaves the store empty.
    pub fn load(&mut self) {
        self.scopes.clear();
        self.last_saved = None;

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No learning store yet");
                return;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read learning store");
                return;
            }
        };
        if content.trim().is_empty() {
            return;
        }

        let root: Value = match serde_json::from_str(&content) {
            Ok(root) => root,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt learning store");
                return;
            }
        };
        let Some(obj) = root.as_object() else {
            warn!(path = %self.path.display(), "Learning store is not a JSON object, ignoring");
            return;
        };

        let (scopes, legacy) = match obj.get("scopes").and_then(Value::as_object) {
            Some(inner) if obj.keys().all(|k| k == "scopes" || k == "version") => (inner, true),
            _ => (obj, false),
        };
        for (key, value) in scopes {
            if value.is_object() {
                self.scopes.insert(key.clone(), ScopeRecord::from_value(value));
            } else {
                debug!(scope = %key, "Skipping malformed learning scope");
            }
        }

        // Legacy files are rewritten in the flat layout on the next save
        if !legacy {
            self.last_saved = self.fingerprint().ok();
        }
        debug!(path = %self.path.display(), scopes = self.scopes.len(), "Learning store loaded");
    }

    /// `(state, interactions)` of a scope; `({}, 0)` when unseen
    pub fn get_scope(&self, scope_key: &str) -> (ScopeState, u64) {
        self.scopes
            .get(scope_key)
            .map(|r| (r.state.clone(), r.interactions))
            .unwrap_or_default()
    }

    /// `(state, interactions, last_snapshot)` of a scope
    pub fn get_scope_bundle(&self, scope_key: &str) -> (ScopeState, u64, ScopeState) {
        self.scopes
            .get(scope_key)
            .map(|r| (r.state.clone(), r.interactions, r.last_snapshot.clone()))
            .unwrap_or_default()
    }

    pub fn record(&self, scope_key: &str) -> Option<&ScopeRecord> {
        self.scopes.get(scope_key)
    }

    pub fn scopes(&self) -> impl Iterator<Item = (&str, &ScopeRecord)> {
        self.scopes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Upsert a scope and return the key used.
    ///
    /// A non-blank `scope_key` wins; otherwise the key is derived from
    /// `country` and `source_id`. When `snapshot` is `None` the previous
    /// snapshot is kept. Writing identical content leaves the record untouched.
    pub fn set_scope(
        &mut self,
        scope_key: Option<&str>,
        state: ScopeState,
        interactions: u64,
        country: &str,
        source_id: &str,
        snapshot: Option<ScopeState>,
    ) -> String {
        let key = match scope_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => k.to_string(),
            None => learning_scope_key(country, source_id),
        };

        let current = self.scopes.get(&key);
        let record = ScopeRecord {
            state,
            interactions,
            country: country.trim().to_string(),
            source_id: source_id.trim().to_string(),
            last_snapshot: snapshot
                .or_else(|| current.map(|r| r.last_snapshot.clone()))
                .unwrap_or_default(),
            updated_at: Some(Utc::now()),
        };

        if current.is_some_and(|c| c.same_content(&record)) {
            return key;
        }
        self.scopes.insert(key.clone(), record);
        key
    }

    /// Remove every scope recorded for a source; returns how many were removed
    pub fn remove_source(&mut self, source_id: &str) -> usize {
        let sid = source_id.trim();
        if sid.is_empty() {
            return 0;
        }
        let before = self.scopes.len();
        self.scopes.retain(|key, record| !record.belongs_to(key, sid));
        let removed = before - self.scopes.len();
        if removed > 0 {
            info!(source = sid, removed, "Removed learning scopes");
        }
        removed
    }

    /// Count the scopes recorded for a source
    pub fn count_source_scopes(&self, source_id: &str) -> usize {
        let sid = source_id.trim();
        if sid.is_empty() {
            return 0;
        }
        self.scopes
            .iter()
            .filter(|(key, record)| record.belongs_to(key, sid))
            .count()
    }

    /// SHA-256 of the serialized scopes
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.scopes)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Whether the in-memory scopes differ from the file
    pub fn is_dirty(&self) -> bool {
        match (&self.last_saved, self.fingerprint()) {
            (Some(saved), Ok(current)) => *saved != current,
            _ => true,
        }
    }

    /// Write the scopes to disk through a temporary sibling file and a rename.
    ///
    /// Returns `false` without touching the disk when nothing changed since the
    /// last load or save.
    pub fn save(&mut self) -> Result<bool> {
        let fingerprint = self.fingerprint()?;
        if self.last_saved.as_deref() == Some(fingerprint.as_str()) {
            debug!(path = %self.path.display(), "Learning store unchanged, skipping save");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.scopes)?;
        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "insights_learning.json".into());
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), scopes = self.scopes.len(), "Learning store saved");
        self.last_saved = Some(fingerprint);
        Ok(true)
    }
}
