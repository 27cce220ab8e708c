//! Projects `mlua::Value` into the engine's `serde_json::Value` wire shape
//! (§10.3's Serializer collaborator). Deliberately thin: tables are walked
//! one level as either an array or an object, functions/userdata/threads
//! collapse to a string tag rather than failing the whole evaluation.

use mlua::Value as LuaValue;
use serde_json::Value as JsonValue;

#[must_use]
pub fn lua_to_json(value: &LuaValue) -> JsonValue {
    match value {
        LuaValue::Nil => JsonValue::Null,
        LuaValue::Boolean(b) => JsonValue::Bool(*b),
        LuaValue::Integer(i) => JsonValue::from(*i),
        LuaValue::Number(n) => serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        LuaValue::String(s) => JsonValue::String(s.to_string_lossy()),
        LuaValue::Table(table) => table_to_json(table),
        LuaValue::Function(_) => JsonValue::String("<function>".into()),
        LuaValue::Thread(_) => JsonValue::String("<thread>".into()),
        LuaValue::UserData(_) => JsonValue::String("<userdata>".into()),
        LuaValue::LightUserData(_) => JsonValue::String("<userdata>".into()),
        LuaValue::Error(e) => JsonValue::String(e.to_string()),
    }
}

fn table_to_json(table: &mlua::Table) -> JsonValue {
    let len = table.raw_len();
    if len > 0 && is_dense_array(table, len) {
        let mut items = Vec::with_capacity(len as usize);
        for i in 1..=len {
            let item: LuaValue = table.raw_get(i).unwrap_or(LuaValue::Nil);
            items.push(lua_to_json(&item));
        }
        return JsonValue::Array(items);
    }

    let mut object = serde_json::Map::new();
    for pair in table.clone().pairs::<LuaValue, LuaValue>() {
        let Ok((key, value)) = pair else { continue };
        let key = match key {
            LuaValue::String(s) => s.to_string_lossy(),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(n) => n.to_string(),
            other => format!("{other:?}"),
        };
        object.insert(key, lua_to_json(&value));
    }
    JsonValue::Object(object)
}

fn is_dense_array(table: &mlua::Table, len: mlua::Integer) -> bool {
    table
        .clone()
        .pairs::<LuaValue, LuaValue>()
        .count()
        == len as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        assert_eq!(lua_to_json(&LuaValue::Nil), JsonValue::Null);
        assert_eq!(lua_to_json(&LuaValue::Boolean(true)), JsonValue::Bool(true));
        assert_eq!(lua_to_json(&LuaValue::Integer(42)), JsonValue::from(42));
    }
}
