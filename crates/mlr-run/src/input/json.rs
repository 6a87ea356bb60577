use std::io::Read;

use mlr_lang::{Context, Record, Value};

use super::Batcher;
use crate::error::{Error, Result};

/// Reads a stream of JSON objects, or of arrays of objects.
///
/// String values are taken verbatim; only JSON numbers become numbers.
pub(super) fn read(
    source: impl Read,
    filename: &str,
    context: &mut Context,
    batcher: &mut Batcher,
) -> Result<()> {
    let stream = serde_json::Deserializer::from_reader(source).into_iter::<serde_json::Value>();

    for item in stream {
        let item = item.map_err(|source| Error::Json {
            filename: filename.to_string(),
            source,
        })?;
        let objects = match item {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };

        for object in objects {
            let record = match object {
                serde_json::Value::Object(fields) => fields
                    .into_iter()
                    .map(|(key, value)| (key, to_value(value)))
                    .collect::<Record>(),
                other => {
                    return Err(Error::NotAnObject {
                        filename: filename.to_string(),
                        got: json_type_name(&other),
                    });
                }
            };

            context.update_for_input_record();
            if !batcher.push(record, context) {
                return Ok(());
            }
        }
    }
    Ok(())
}

pub(crate) fn to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Void,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or_else(|| Value::from_string(n.to_string())),
        serde_json::Value::String(s) => Value::from_string(s),
        serde_json::Value::Array(items) => Value::Array(items.into_iter().map(to_value).collect()),
        serde_json::Value::Object(fields) => fields
            .into_iter()
            .map(|(key, value)| (key, to_value(value)))
            .collect(),
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
