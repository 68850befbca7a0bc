//! File-backed artifact store.
//!
//! Every accepted task result is a pretty-printed JSON file under the
//! configured output directory; raw backend responses go to `debug/`.
//!
//! ```text
//! <root>/
//! ├── content_analysis.json
//! ├── content_plan.json
//! ├── content_20261017_101500.json
//! ├── optimization_20261017_103000.json
//! └── debug/
//!     ├── analyze_topic_response.txt
//!     └── ...
//! ```
//!
//! All writes go to a dot-prefixed temp file first and are renamed into
//! place, so a reader never sees a half-written artifact.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use contentagent_shared::{ArtifactRecord, ContentAgentError, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

/// Subdirectory holding verbatim backend responses.
pub const DEBUG_DIR: &str = "debug";

/// Filesystem store rooted at one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute-or-relative path of artifact `name` under the root.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Persist `value` as pretty JSON under `name`.
    #[instrument(skip_all, fields(name = %name))]
    pub fn save_json(&self, name: &str, value: &Value) -> Result<ArtifactRecord> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');

        let path = self.path_of(name);
        write_atomic(&path, &bytes)?;

        let record = ArtifactRecord {
            sha256: sha256_hex(&bytes),
            size_bytes: bytes.len(),
            path,
        };

        info!(
            path = %record.path.display(),
            size = record.size_bytes,
            "artifact saved"
        );
        Ok(record)
    }

    /// Load a previously saved artifact.
    ///
    /// A missing file is [`ContentAgentError::PriorArtifactMissing`] carrying
    /// `hint`, which tells the operator which step produces it.
    pub fn load_json(&self, name: &str, hint: &str) -> Result<Value> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(ContentAgentError::PriorArtifactMissing {
                path,
                hint: hint.to_string(),
            });
        }
        read_json(&path)
    }

    /// Write the verbatim backend response for `task` to `debug/<task>_response.txt`.
    pub fn write_debug(&self, task: &str, raw: &str) -> Result<PathBuf> {
        let path = self
            .root
            .join(DEBUG_DIR)
            .join(format!("{task}_response.txt"));
        write_atomic(&path, raw.as_bytes())?;
        debug!(path = %path.display(), len = raw.len(), "debug artifact written");
        Ok(path)
    }
}

/// Read and decode an operator-supplied JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| ContentAgentError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| {
        ContentAgentError::Serialization(format!("{}: {e}", path.display()))
    })
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.json`
pub fn timestamped_name(prefix: &str, at: DateTime<Local>) -> String {
    format!("{prefix}_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| ContentAgentError::io(dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| ContentAgentError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| ContentAgentError::io(path, e))?;
    Ok(())
}
