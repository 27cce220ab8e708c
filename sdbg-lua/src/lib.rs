//! mlua host adapter: binds `sdbg-core`'s abstract trace/frame model and
//! collaborator traits to a real embedded Lua interpreter.

pub mod error;
pub mod executor;
pub mod hook;
pub mod serializer;
pub mod symbols;

pub use error::AdapterError;
pub use executor::LuaCodeExecutor;
pub use hook::LuaTraceBridge;
pub use serializer::lua_to_json;
pub use symbols::LuaSymbolFinder;
