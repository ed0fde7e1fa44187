use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types that can be requested as OpenAI strict structured output.
///
/// Blanket-implemented for any `JsonSchema + DeserializeOwned` type. The
/// generated schema is rewritten into the dialect OpenAI's strict mode
/// accepts: no `$ref` indirection, `additionalProperties: false` on every
/// object, and every property listed in `required` (nullable ones included).
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn response_schema() -> Value {
        let root = schema_for!(Self);
        let mut value = serde_json::to_value(root).unwrap_or_default();

        let defs = value.get("definitions").cloned().unwrap_or(Value::Null);
        expand_refs(&mut value, &defs);
        tighten_objects(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Replace `#/definitions/...` references with the definition bodies and
/// unwrap single-element `allOf` wrappers schemars emits around them.
fn expand_refs(value: &mut Value, defs: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("$ref").cloned() {
                if let Some(name) = target.strip_prefix("#/definitions/") {
                    if let Some(def) = defs.get(name) {
                        *value = def.clone();
                        expand_refs(value, defs);
                        return;
                    }
                }
            }

            if let Some(Value::Array(all_of)) = map.get("allOf").cloned() {
                if all_of.len() == 1 {
                    *value = all_of.into_iter().next().unwrap();
                    expand_refs(value, defs);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                expand_refs(v, defs);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                expand_refs(item, defs);
            }
        }
        _ => {}
    }
}

/// Force `additionalProperties: false` and an exhaustive `required` list on
/// every object schema in the tree.
fn tighten_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }

            for (_, v) in map.iter_mut() {
                tighten_objects(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                tighten_objects(item);
            }
        }
        _ => {}
    }
}
