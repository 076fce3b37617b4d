//! JSON export: serialize resolved entities for downstream translation layers.
//!
//! ```text
//! Resolver::instantiate() → Entity → export_json() → [{ id, class, properties, dynamic }, ...]
//! ```
//!
//! Concrete values are written as plain JSON; random values keep their
//! distribution so a consumer can sample them itself.

use std::io::Write;

use serde::Serialize;

use crate::model::*;
use crate::{Error, Result};

/// One exported entity.
#[derive(Debug, Serialize)]
struct EntityRecord<'a> {
    id: u64,
    class: &'a str,
    properties: serde_json::Map<String, serde_json::Value>,
    dynamic: Vec<&'a str>,
}

/// Write `entities` to `writer` as a pretty-printed JSON array.
///
/// Every entity must be fully resolved.
pub fn export_json(entities: &[Entity], writer: &mut dyn Write) -> Result<()> {
    let mut records = Vec::with_capacity(entities.len());
    for entity in entities {
        if !entity.is_resolved() {
            return Err(Error::Incomplete(format!("entity {} ({})", entity.id, entity.class)));
        }
        let properties = entity
            .properties()
            .iter()
            .map(|(k, v)| Ok((k.clone(), format_resolved(v)?)))
            .collect::<Result<_>>()?;
        records.push(EntityRecord {
            id: entity.id.0,
            class: &entity.class,
            properties,
            dynamic: entity.dynamic_properties().iter().map(String::as_str).collect(),
        });
    }
    serde_json::to_writer_pretty(&mut *writer, &records)?;
    writeln!(writer)?;
    Ok(())
}

fn format_resolved(value: &Resolved) -> Result<serde_json::Value> {
    match value {
        Resolved::Concrete(v) => Ok(format_value(v)),
        Resolved::Random(d) => Ok(serde_json::json!({ "random": serde_json::to_value(d)? })),
    }
}

/// Format a Value as a plain JSON literal.
fn format_value(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(items.iter().map(format_value).collect()),
        Value::Map(m) => Json::Object(m.iter().map(|(k, v)| (k.clone(), format_value(v))).collect()),
        Value::Vector { x, y, z } => serde_json::json!([x, y, z]),
    }
}
