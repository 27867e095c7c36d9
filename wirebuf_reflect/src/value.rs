/* Dynamic values - decoded messages without generated types */

use crate::errors::{ReflectError, ReflectResult};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as Json;
use wirebuf_gen::codegen::shared::layout::{DocumentLayout, Scalar, WireLayout};

/* A value shaped by a wire layout */
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /* Absent nullable scalar */
    Null,
    Bool(bool),
    /* Every signed integer scalar */
    Int(i64),
    /* Every unsigned integer scalar */
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /* Pairs in wire order */
    Map(Vec<(Value, Value)>),
    /* Fields in declaration order */
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Struct(fields.into_iter().map(|(name, v)| (name.into(), v)).collect())
    }

    /// Field of a struct value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Convert JSON into a value of `layout`, resolving embedded structs
    /// against `document`.
    pub fn from_json(json: &Json, layout: &WireLayout, document: &DocumentLayout) -> ReflectResult<Self> {
        from_json_at(json, layout, document, "$")
    }

    /// Convert JSON into a value of the named struct.
    pub fn struct_from_json(json: &Json, type_name: &str, document: &DocumentLayout) -> ReflectResult<Self> {
        let layout = WireLayout::Embedded {
            type_name: type_name.to_string(),
        };
        from_json_at(json, &layout, document, type_name)
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(path: &str, expected: impl Into<String>, found: &Json) -> ReflectError {
    ReflectError::TypeMismatch {
        path: path.to_string(),
        expected: expected.into(),
        found: json_kind(found).to_string(),
    }
}

fn scalar_from_json(json: &Json, scalar: Scalar, path: &str) -> ReflectResult<Value> {
    match scalar {
        Scalar::Bool => json.as_bool().map(Value::Bool).ok_or_else(|| mismatch(path, "bool", json)),
        Scalar::F32 | Scalar::F64 => json.as_f64().map(Value::Float).ok_or_else(|| mismatch(path, "number", json)),
        s if s.is_signed() => match (json.as_i64(), json.as_u64()) {
            (Some(v), _) => Ok(Value::Int(v)),
            (None, Some(v)) => Err(ReflectError::OutOfRange {
                path: path.to_string(),
                scalar,
                value: v.to_string(),
            }),
            _ => Err(mismatch(path, "integer", json)),
        },
        _ => match (json.as_u64(), json.as_i64()) {
            (Some(v), _) => Ok(Value::Uint(v)),
            (None, Some(v)) => Err(ReflectError::OutOfRange {
                path: path.to_string(),
                scalar,
                value: v.to_string(),
            }),
            _ => Err(mismatch(path, "unsigned integer", json)),
        },
    }
}

/* Hex string (optionally 0x-prefixed) or an array of byte values */
fn bytes_from_json(json: &Json, path: &str) -> ReflectResult<Vec<u8>> {
    match json {
        Json::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            hex::decode(digits).map_err(|_| mismatch(path, "hex string", json))
        }
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| mismatch(&format!("{}[{}]", path, i), "byte", item))
            })
            .collect(),
        other => Err(mismatch(path, "hex string or byte array", other)),
    }
}

/* JSON object keys are strings; non-string keys are parsed back per layout */
fn map_key_from_str(key: &str, layout: &WireLayout, document: &DocumentLayout, path: &str) -> ReflectResult<Value> {
    let json = match layout {
        WireLayout::String | WireLayout::DynamicBytes | WireLayout::FixedBytes { .. } => {
            Json::String(key.to_string())
        }
        _ => serde_json::from_str(key).map_err(|_| ReflectError::TypeMismatch {
            path: path.to_string(),
            expected: "map key literal".to_string(),
            found: "string".to_string(),
        })?,
    };
    from_json_at(&json, layout, document, path)
}

fn from_json_at(json: &Json, layout: &WireLayout, document: &DocumentLayout, path: &str) -> ReflectResult<Value> {
    match layout {
        WireLayout::Fixed { scalar } => scalar_from_json(json, *scalar, path),
        WireLayout::Nullable { scalar } => match json {
            Json::Null => Ok(Value::Null),
            other => scalar_from_json(other, *scalar, path),
        },
        WireLayout::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| mismatch(path, "string", json)),
        WireLayout::FixedBytes { .. } | WireLayout::DynamicBytes => bytes_from_json(json, path).map(Value::Bytes),
        WireLayout::FixedArray { elem, .. } | WireLayout::DynamicArray { elem } => {
            let items = json.as_array().ok_or_else(|| mismatch(path, "array", json))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| from_json_at(item, elem, document, &format!("{}[{}]", path, i)))
                .collect::<ReflectResult<Vec<_>>>()
                .map(Value::Array)
        }
        WireLayout::Map { key, value } => match json {
            Json::Object(entries) => entries
                .iter()
                .map(|(k, v)| {
                    let entry_path = format!("{}[{}]", path, k);
                    Ok((
                        map_key_from_str(k, key, document, &entry_path)?,
                        from_json_at(v, value, document, &entry_path)?,
                    ))
                })
                .collect::<ReflectResult<Vec<_>>>()
                .map(Value::Map),
            Json::Array(pairs) => pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| {
                    let entry_path = format!("{}[{}]", path, i);
                    match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => Ok((
                            from_json_at(k, key, document, &entry_path)?,
                            from_json_at(v, value, document, &entry_path)?,
                        )),
                        _ => Err(mismatch(&entry_path, "[key, value] pair", pair)),
                    }
                })
                .collect::<ReflectResult<Vec<_>>>()
                .map(Value::Map),
            other => Err(mismatch(path, "object or array of pairs", other)),
        },
        WireLayout::Embedded { type_name } => {
            let layout = document.get(type_name).ok_or_else(|| ReflectError::UnknownType {
                type_name: type_name.clone(),
            })?;
            let object = json.as_object().ok_or_else(|| mismatch(path, "object", json))?;
            if let Some(unknown) = object
                .keys()
                .find(|k| !layout.fields.iter().any(|f| &f.name == *k))
            {
                return Err(ReflectError::UnknownField {
                    path: path.to_string(),
                    field: unknown.clone(),
                });
            }
            layout
                .fields
                .iter()
                .map(|f| {
                    let field_path = format!("{}.{}", path, f.name);
                    match object.get(&f.name) {
                        Some(v) => Ok((f.name.clone(), from_json_at(v, &f.layout, document, &field_path)?)),
                        /* An absent nullable is the same as an explicit null */
                        None if matches!(f.layout, WireLayout::Nullable { .. }) => Ok((f.name.clone(), Value::Null)),
                        None => Err(ReflectError::MissingField {
                            path: path.to_string(),
                            field: f.name.clone(),
                        }),
                    }
                })
                .collect::<ReflectResult<Vec<_>>>()
                .map(Value::Struct)
        }
    }
}

/* Map keys rendered as JSON object keys when every key is a string */
struct Pair<'a>(&'a Value, &'a Value);

impl Serialize for Pair<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(self.0)?;
        seq.serialize_element(self.1)?;
        seq.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Uint(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::String(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&hex::encode(v)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(pairs) if pairs.iter().all(|(k, _)| matches!(k, Value::String(_))) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Map(pairs) => {
                let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                for (k, v) in pairs {
                    seq.serialize_element(&Pair(k, v))?;
                }
                seq.end()
            }
            Value::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, v) in fields {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wirebuf_types::{Document, Field, Kind, StructDef, TypeDescriptor};

    fn document() -> DocumentLayout {
        DocumentLayout::build(&Document::new(
            "p",
            vec![StructDef::new(
                "Item",
                vec![
                    Field::new("Id", Kind::Uint16),
                    Field::new("Hp", TypeDescriptor::pointer(TypeDescriptor::new(Kind::Int32))),
                    Field::new("Tag", TypeDescriptor::bytes(2)),
                ],
            )],
        ))
        .unwrap()
    }

    #[test]
    fn struct_from_json_keeps_declaration_order() {
        let doc = document();
        let value = Value::struct_from_json(&json!({"Tag": "0x0a0b", "Id": 7}), "Item", &doc).unwrap();
        assert_eq!(
            value,
            Value::structure([
                ("Id", Value::Uint(7)),
                ("Hp", Value::Null),
                ("Tag", Value::Bytes(vec![10, 11])),
            ])
        );
    }

    #[test]
    fn shape_errors_carry_paths() {
        let doc = document();
        let err = Value::struct_from_json(&json!({"Id": -1, "Tag": "00"}), "Item", &doc).unwrap_err();
        assert!(matches!(err, ReflectError::OutOfRange { ref path, .. } if path == "Item.Id"));

        let err = Value::struct_from_json(&json!({"Id": 1, "Tag": "00", "Extra": 1}), "Item", &doc).unwrap_err();
        assert!(matches!(err, ReflectError::UnknownField { ref field, .. } if field == "Extra"));

        let err = Value::struct_from_json(&json!({"Hp": 3}), "Item", &doc).unwrap_err();
        assert!(matches!(err, ReflectError::MissingField { ref field, .. } if field == "Id"));
    }

    #[test]
    fn maps_accept_objects_and_pairs() {
        let doc = document();
        let layout = WireLayout::Map {
            key: Box::new(WireLayout::Fixed { scalar: Scalar::U8 }),
            value: Box::new(WireLayout::String),
        };
        let from_object = Value::from_json(&json!({"1": "a", "2": "b"}), &layout, &doc).unwrap();
        let from_pairs = Value::from_json(&json!([[1, "a"], [2, "b"]]), &layout, &doc).unwrap();
        assert_eq!(from_object, from_pairs);
        assert_eq!(serde_json::to_value(&from_pairs).unwrap(), json!([[1, "a"], [2, "b"]]));
    }

    #[test]
    fn serializes_to_plain_json() {
        let value = Value::structure([
            ("Name", Value::String("x".into())),
            ("Blob", Value::Bytes(vec![0xde, 0xad])),
            ("Hp", Value::Null),
            ("Scores", Value::Map(vec![(Value::String("a".into()), Value::Int(-1))])),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"Name": "x", "Blob": "dead", "Hp": null, "Scores": {"a": -1}})
        );
    }
}
