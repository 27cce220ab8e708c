//! Best-effort `(file, line, column)` -> lexical name lookup (§4.7's
//! SymbolFinder collaborator). A line-oriented identifier scan, not a Lua
//! grammar parser: this lineage does not carry a Lua-parsing crate for this
//! purpose, and the contract only asks for "the syntactic name at that
//! position".

use std::fs;
use std::path::Path;

use sdbg_core::{Symbol, SymbolFinder};

pub struct LuaSymbolFinder {
    lines: Vec<String>,
}

impl SymbolFinder for LuaSymbolFinder {
    fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Ok(Self {
            lines: text.lines().map(str::to_string).collect(),
        })
    }

    fn get(&self, line: u32, column: u32) -> Option<Symbol> {
        let text = self.lines.get(line.checked_sub(1)? as usize)?;
        let bytes = text.as_bytes();
        let column = column as usize;
        if column >= bytes.len() || !is_ident_byte(bytes[column]) {
            return None;
        }

        let mut start = column;
        while start > 0 && is_ident_byte(bytes[start - 1]) {
            start -= 1;
        }
        let mut end = column;
        while end < bytes.len() && is_ident_byte(bytes[end]) {
            end += 1;
        }

        let expression = text[start..end].to_string();
        Some(Symbol {
            expression,
            line,
            #[allow(clippy::cast_possible_truncation)]
            column: start as u32,
            #[allow(clippy::cast_possible_truncation)]
            size: (end - start) as u32,
        })
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
