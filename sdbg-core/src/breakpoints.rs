//! Read-biased registry of `(absolute_path, line)` breakpoints.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Read-only view of the registry, returned to RPC clients.
pub type BreakpointSnapshot = HashMap<String, Vec<u32>>;

/// Set of breakpoints, keyed by canonical absolute path.
///
/// Reads dominate during tracing (every `line` event consults `contains`),
/// so lookups take a shared read lock; mutation (`add`) takes a write lock.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    by_path: RwLock<HashMap<PathBuf, BTreeSet<u32>>>,
}

impl BreakpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_path: RwLock::new(HashMap::new()),
        }
    }

    /// Canonicalize `path`, insert `line`. Idempotent.
    pub fn add(&self, path: &str, line: u32) -> Result<()> {
        let canonical = canonicalize(path, line)?;
        self.by_path
            .write()
            .entry(canonical)
            .or_default()
            .insert(line);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, path: &str, line: u32) -> bool {
        let Ok(canonical) = canonicalize(path, line) else {
            return false;
        };
        self.by_path
            .read()
            .get(&canonical)
            .is_some_and(|lines| lines.contains(&line))
    }

    #[must_use]
    pub fn snapshot(&self) -> BreakpointSnapshot {
        self.by_path
            .read()
            .iter()
            .map(|(path, lines)| {
                (
                    path.to_string_lossy().into_owned(),
                    lines.iter().copied().collect(),
                )
            })
            .collect()
    }
}

/// Canonicalize to an absolute path; falls back to lexical absolutization
/// when the path does not (yet) exist on disk, so breakpoints can be set
/// before the target's directory is mounted into the module search path.
fn canonicalize(path: &str, line: u32) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(EngineError::InvalidArgument {
            message: "breakpoint path must not be empty".into(),
        });
    }
    if line < 1 {
        return Err(EngineError::InvalidArgument {
            message: format!("breakpoint line must be >= 1, got {line}"),
        });
    }
    let raw = Path::new(path);
    match raw.canonicalize() {
        Ok(absolute) => Ok(absolute),
        Err(_) => {
            let cwd = std::env::current_dir().map_err(|e| EngineError::InvalidArgument {
                message: format!("cannot resolve working directory: {e}"),
            })?;
            Ok(path_clean::clean(&cwd.join(raw)))
        }
    }
}
