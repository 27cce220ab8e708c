//! Adapter-local error type. Never leaks `mlua::Error` across the engine
//! boundary; collaborator traits in `sdbg-core` speak `Result<_, String>`, so
//! every public entry point here flattens through `Display` at the edge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("io error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
