//! Loads and runs the target script in a fresh `mlua::Lua` instance's
//! global table (§4.7's CodeExecutor collaborator).

use std::path::Path;

use mlua::Lua;

use crate::error::AdapterError;

pub struct LuaCodeExecutor {
    lua: Lua,
}

impl LuaCodeExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }

    #[must_use]
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Populates Lua's conventional `arg` global (1-indexed, `arg[0]` the
    /// script path) before running, so the target sees its own argument
    /// vector the way a standalone `lua` interpreter would. The engine is
    /// otherwise transparent to it.
    ///
    /// # Errors
    /// Same as [`sdbg_core::CodeExecutor::run`].
    pub fn run_with_args(&self, path: &Path, args: &[String]) -> Result<(), String> {
        run_with_args_inner(&self.lua, path, args).map_err(|e| e.to_string())
    }
}

impl Default for LuaCodeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl sdbg_core::CodeExecutor for LuaCodeExecutor {
    fn run(&self, path: &Path) -> Result<(), String> {
        run_inner(&self.lua, path).map_err(|e| e.to_string())
    }
}

fn run_with_args_inner(lua: &Lua, path: &Path, args: &[String]) -> Result<(), AdapterError> {
    let arg_table = lua.create_table()?;
    arg_table.set(0, path.display().to_string())?;
    for (i, value) in args.iter().enumerate() {
        arg_table.set(i as i64 + 1, value.as_str())?;
    }
    lua.globals().set("arg", arg_table)?;
    run_inner(lua, path)
}

fn run_inner(lua: &Lua, path: &Path) -> Result<(), AdapterError> {
    let source = std::fs::read_to_string(path).map_err(|source| AdapterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let chunk_name = format!("@{}", path.display());
    lua.load(&source).set_name(chunk_name).exec()?;
    Ok(())
}
