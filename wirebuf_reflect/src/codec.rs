/* Layout interpreter: size, marshal and unmarshal of dynamic values */

use crate::errors::{ReflectError, ReflectResult};
use crate::value::Value;
use std::collections::HashMap;
use tracing::{debug, trace};
use wirebuf_gen::codegen::shared::layout::{
    DocumentLayout, LENGTH_PREFIX_WIDTH, MAX_EMPTY_ELEMENTS, PRESENCE_FLAG_WIDTH, Scalar, StructLayout, WireLayout,
};
use wirebuf_types::Document;

/// Deepest chain of embedded structs followed before giving up.
pub const MAX_DEPTH: usize = 64;

/// Interprets the wire layouts of one schema document.
#[derive(Debug, Clone)]
pub struct Codec {
    layouts: DocumentLayout,
    /* Fewest bytes each struct occupies on the wire */
    min_widths: HashMap<String, u64>,
}

impl Codec {
    pub fn new(document: &Document) -> ReflectResult<Self> {
        Ok(Self::from_layout(DocumentLayout::build(document)?))
    }

    pub fn from_layout(layouts: DocumentLayout) -> Self {
        let min_widths = layouts.struct_min_widths();
        Self { layouts, min_widths }
    }

    pub fn layouts(&self) -> &DocumentLayout {
        &self.layouts
    }

    fn lookup(&self, type_name: &str) -> ReflectResult<&StructLayout> {
        self.layouts.get(type_name).ok_or_else(|| ReflectError::UnknownType {
            type_name: type_name.to_string(),
        })
    }

    /// Encoded length of `value` as an instance of `type_name`.
    pub fn size(&self, type_name: &str, value: &Value) -> ReflectResult<usize> {
        let layout = embedded(type_name);
        let mut walk = Walk::new(self, type_name);
        walk.size(&layout, value)
    }

    /// Writes `value` at `offset`, returning the offset after it.
    pub fn marshal(&self, type_name: &str, value: &Value, buf: &mut [u8], offset: usize) -> ReflectResult<usize> {
        let layout = embedded(type_name);
        let mut walk = Walk::new(self, type_name);
        let mut writer = Writer { buf, pos: offset };
        walk.write(&layout, value, &mut writer)?;
        Ok(writer.pos)
    }

    /// Size, allocate exactly, marshal.
    pub fn encode(&self, type_name: &str, value: &Value) -> ReflectResult<Vec<u8>> {
        let size = self.size(type_name, value)?;
        let mut buf = vec![0u8; size];
        let end = self.marshal(type_name, value, &mut buf, 0)?;
        debug_assert_eq!(end, size, "size and marshal disagree for {}", type_name);
        debug!(type_name, bytes = size, "encoded value");
        Ok(buf)
    }

    /// Reads an instance of `type_name` at `offset`, returning it with the
    /// offset after it.
    pub fn unmarshal(&self, type_name: &str, buf: &[u8], offset: usize) -> ReflectResult<(Value, usize)> {
        let layout = embedded(type_name);
        let mut walk = Walk::new(self, type_name);
        let mut reader = Reader { buf, pos: offset };
        let value = walk.read(&layout, &mut reader)?;
        Ok((value, reader.pos))
    }

    /// Unmarshal from offset 0, requiring the whole buffer to be consumed.
    pub fn decode(&self, type_name: &str, buf: &[u8]) -> ReflectResult<Value> {
        let (value, consumed) = self.unmarshal(type_name, buf, 0)?;
        if consumed != buf.len() {
            return Err(ReflectError::TrailingBytes {
                type_name: type_name.to_string(),
                consumed,
                len: buf.len(),
            });
        }
        debug!(type_name, bytes = consumed, "decoded value");
        Ok(value)
    }

    /// JSON to a value of the named struct.
    pub fn value_from_json(&self, type_name: &str, json: &serde_json::Value) -> ReflectResult<Value> {
        self.lookup(type_name)?;
        Value::struct_from_json(json, type_name, &self.layouts)
    }
}

fn embedded(type_name: &str) -> WireLayout {
    WireLayout::Embedded {
        type_name: type_name.to_string(),
    }
}

struct Writer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8], path: &str) -> ReflectResult<()> {
        let end = check(self.buf.len(), self.pos, bytes.len(), path)?;
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

struct Reader<'b> {
    buf: &'b [u8],
    pos: usize,
}

impl<'b> Reader<'b> {
    fn take(&mut self, need: usize, path: &str) -> ReflectResult<&'b [u8]> {
        let end = check(self.buf.len(), self.pos, need, path)?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

fn check(len: usize, pos: usize, need: usize, path: &str) -> ReflectResult<usize> {
    match pos.checked_add(need) {
        Some(end) if end <= len => Ok(end),
        _ => Err(ReflectError::OutOfBounds {
            path: path.to_string(),
            offset: pos,
            need,
            len,
        }),
    }
}

/* One traversal; tracks the value path and struct depth for diagnostics */
struct Walk<'c> {
    codec: &'c Codec,
    path: Vec<String>,
    depth: usize,
}

impl<'c> Walk<'c> {
    fn new(codec: &'c Codec, root: &str) -> Self {
        Self {
            codec,
            path: vec![root.to_string()],
            depth: 0,
        }
    }

    fn path(&self) -> String {
        self.path.concat()
    }

    fn mismatch(&self, expected: &str, found: &Value) -> ReflectError {
        ReflectError::TypeMismatch {
            path: self.path(),
            expected: expected.to_string(),
            found: found.kind_name().to_string(),
        }
    }

    fn scoped<T>(&mut self, segment: String, f: impl FnOnce(&mut Self) -> ReflectResult<T>) -> ReflectResult<T> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    fn enter(&mut self, type_name: &str) -> ReflectResult<&'c StructLayout> {
        if self.depth >= MAX_DEPTH {
            return Err(ReflectError::DepthExceeded {
                path: self.path(),
                limit: MAX_DEPTH,
            });
        }
        self.depth += 1;
        self.codec.lookup(type_name)
    }

    fn count(&self, len: usize) -> ReflectResult<u32> {
        u32::try_from(len).map_err(|_| ReflectError::CountOverflow {
            path: self.path(),
            count: len,
        })
    }

    fn exact_len(&self, expected: u32, found: usize) -> ReflectResult<()> {
        if found as u64 != u64::from(expected) {
            return Err(ReflectError::LengthMismatch {
                path: self.path(),
                expected: u64::from(expected),
                found,
            });
        }
        Ok(())
    }

    /* Matches struct value fields to layout fields by name */
    fn struct_fields<'v>(
        &self,
        layout: &'c StructLayout,
        value: &'v Value,
    ) -> ReflectResult<Vec<(&'c str, &'c WireLayout, &'v Value)>> {
        let Value::Struct(fields) = value else {
            return Err(self.mismatch("struct", value));
        };
        if let Some((unknown, _)) = fields
            .iter()
            .find(|(name, _)| !layout.fields.iter().any(|f| &f.name == name))
        {
            return Err(ReflectError::UnknownField {
                path: self.path(),
                field: unknown.clone(),
            });
        }
        layout
            .fields
            .iter()
            .map(|f| {
                value
                    .field(&f.name)
                    .map(|v| (f.name.as_str(), &f.layout, v))
                    .ok_or_else(|| ReflectError::MissingField {
                        path: self.path(),
                        field: f.name.clone(),
                    })
            })
            .collect()
    }

    fn size(&mut self, layout: &WireLayout, value: &Value) -> ReflectResult<usize> {
        let prefix = LENGTH_PREFIX_WIDTH as usize;
        match layout {
            WireLayout::Fixed { scalar } => {
                scalar_bytes(*scalar, value).map_err(|e| self.scalar_error(e, *scalar, value))?;
                Ok(scalar.width() as usize)
            }
            WireLayout::Nullable { scalar } => match value {
                Value::Null => Ok(PRESENCE_FLAG_WIDTH as usize),
                v => {
                    scalar_bytes(*scalar, v).map_err(|e| self.scalar_error(e, *scalar, v))?;
                    Ok((PRESENCE_FLAG_WIDTH + scalar.width()) as usize)
                }
            },
            WireLayout::String => match value {
                Value::String(s) => {
                    self.count(s.len())?;
                    Ok(prefix + s.len())
                }
                other => Err(self.mismatch("string", other)),
            },
            WireLayout::FixedBytes { len } => match value {
                Value::Bytes(b) => {
                    self.exact_len(*len, b.len())?;
                    Ok(b.len())
                }
                other => Err(self.mismatch("bytes", other)),
            },
            WireLayout::DynamicBytes => match value {
                Value::Bytes(b) => {
                    self.count(b.len())?;
                    Ok(prefix + b.len())
                }
                other => Err(self.mismatch("bytes", other)),
            },
            WireLayout::FixedArray { len, elem } => {
                let items = self.items(value)?;
                self.exact_len(*len, items.len())?;
                self.sum_items(elem, items)
            }
            WireLayout::DynamicArray { elem } => {
                let items = self.items(value)?;
                self.count(items.len())?;
                Ok(prefix + self.sum_items(elem, items)?)
            }
            WireLayout::Map { key, value: val } => {
                let Value::Map(pairs) = value else {
                    return Err(self.mismatch("map", value));
                };
                self.count(pairs.len())?;
                let mut total = prefix;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    total += self.scoped(format!("[{}]", i), |w| Ok(w.size(key, k)? + w.size(val, v)?))?;
                }
                Ok(total)
            }
            WireLayout::Embedded { type_name } => {
                let layout = self.enter(type_name)?;
                let mut total = 0;
                for (name, field_layout, v) in self.struct_fields(layout, value)? {
                    total += self.scoped(format!(".{}", name), |w| w.size(field_layout, v))?;
                }
                self.depth -= 1;
                Ok(total)
            }
        }
    }

    fn items<'v>(&self, value: &'v Value) -> ReflectResult<&'v [Value]> {
        match value {
            Value::Array(items) => Ok(items),
            other => Err(self.mismatch("array", other)),
        }
    }

    fn sum_items(&mut self, elem: &WireLayout, items: &[Value]) -> ReflectResult<usize> {
        let mut total = 0;
        for (i, item) in items.iter().enumerate() {
            total += self.scoped(format!("[{}]", i), |w| w.size(elem, item))?;
        }
        Ok(total)
    }

    fn scalar_error(&self, error: ScalarError, scalar: Scalar, value: &Value) -> ReflectError {
        match error {
            ScalarError::Shape => self.mismatch(&format!("{:?} scalar", scalar), value),
            ScalarError::Range(text) => ReflectError::OutOfRange {
                path: self.path(),
                scalar,
                value: text,
            },
        }
    }

    fn write(&mut self, layout: &WireLayout, value: &Value, out: &mut Writer<'_>) -> ReflectResult<()> {
        match layout {
            WireLayout::Fixed { scalar } => {
                let bytes = scalar_bytes(*scalar, value).map_err(|e| self.scalar_error(e, *scalar, value))?;
                out.put(&bytes, &self.path())
            }
            WireLayout::Nullable { scalar } => match value {
                Value::Null => out.put(&[0], &self.path()),
                v => {
                    let bytes = scalar_bytes(*scalar, v).map_err(|e| self.scalar_error(e, *scalar, v))?;
                    out.put(&[1], &self.path())?;
                    out.put(&bytes, &self.path())
                }
            },
            WireLayout::String => match value {
                Value::String(s) => self.write_prefixed(s.as_bytes(), out),
                other => Err(self.mismatch("string", other)),
            },
            WireLayout::FixedBytes { len } => match value {
                Value::Bytes(b) => {
                    self.exact_len(*len, b.len())?;
                    out.put(b, &self.path())
                }
                other => Err(self.mismatch("bytes", other)),
            },
            WireLayout::DynamicBytes => match value {
                Value::Bytes(b) => self.write_prefixed(b, out),
                other => Err(self.mismatch("bytes", other)),
            },
            WireLayout::FixedArray { len, elem } => {
                let items = self.items(value)?;
                self.exact_len(*len, items.len())?;
                self.write_items(elem, items, out)
            }
            WireLayout::DynamicArray { elem } => {
                let items = self.items(value)?;
                let count = self.count(items.len())?;
                out.put(&count.to_le_bytes(), &self.path())?;
                self.write_items(elem, items, out)
            }
            WireLayout::Map { key, value: val } => {
                let Value::Map(pairs) = value else {
                    return Err(self.mismatch("map", value));
                };
                let count = self.count(pairs.len())?;
                out.put(&count.to_le_bytes(), &self.path())?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    self.scoped(format!("[{}]", i), |w| {
                        w.write(key, k, out)?;
                        w.write(val, v, out)
                    })?;
                }
                Ok(())
            }
            WireLayout::Embedded { type_name } => {
                let layout = self.enter(type_name)?;
                for (name, field_layout, v) in self.struct_fields(layout, value)? {
                    let start = out.pos;
                    self.scoped(format!(".{}", name), |w| w.write(field_layout, v, out))?;
                    trace!(field = name, start, end = out.pos, "wrote field");
                }
                self.depth -= 1;
                Ok(())
            }
        }
    }

    fn write_prefixed(&self, bytes: &[u8], out: &mut Writer<'_>) -> ReflectResult<()> {
        let count = self.count(bytes.len())?;
        out.put(&count.to_le_bytes(), &self.path())?;
        out.put(bytes, &self.path())
    }

    fn write_items(&mut self, elem: &WireLayout, items: &[Value], out: &mut Writer<'_>) -> ReflectResult<()> {
        for (i, item) in items.iter().enumerate() {
            self.scoped(format!("[{}]", i), |w| w.write(elem, item, out))?;
        }
        Ok(())
    }

    fn read(&mut self, layout: &WireLayout, input: &mut Reader<'_>) -> ReflectResult<Value> {
        match layout {
            WireLayout::Fixed { scalar } => self.read_scalar(*scalar, input),
            WireLayout::Nullable { scalar } => {
                let present = input.take(PRESENCE_FLAG_WIDTH as usize, &self.path())?[0] != 0;
                if present {
                    self.read_scalar(*scalar, input)
                } else {
                    Ok(Value::Null)
                }
            }
            WireLayout::String => {
                let offset = input.pos;
                let bytes = self.read_prefixed(input)?;
                String::from_utf8(bytes.to_vec())
                    .map(Value::String)
                    .map_err(|_| ReflectError::InvalidUtf8 {
                        path: self.path(),
                        offset,
                    })
            }
            WireLayout::FixedBytes { len } => Ok(Value::Bytes(input.take(*len as usize, &self.path())?.to_vec())),
            WireLayout::DynamicBytes => Ok(Value::Bytes(self.read_prefixed(input)?.to_vec())),
            WireLayout::FixedArray { len, elem } => self.read_items(elem, *len as usize, input),
            WireLayout::DynamicArray { elem } => {
                let count = self.read_elements(self.min_width(elem), input)?;
                self.read_items(elem, count, input)
            }
            WireLayout::Map { key, value } => {
                let width = self.min_width(key).saturating_add(self.min_width(value));
                let count = self.read_elements(width, input)?;
                /* Never trust the prefix for allocation */
                let mut pairs = Vec::new();
                for i in 0..count {
                    let pair = self.scoped(format!("[{}]", i), |w| Ok((w.read(key, input)?, w.read(value, input)?)))?;
                    pairs.push(pair);
                }
                Ok(Value::Map(pairs))
            }
            WireLayout::Embedded { type_name } => {
                let layout = self.enter(type_name)?;
                let mut fields = Vec::with_capacity(layout.fields.len());
                for f in &layout.fields {
                    let v = self.scoped(format!(".{}", f.name), |w| w.read(&f.layout, input))?;
                    fields.push((f.name.clone(), v));
                }
                self.depth -= 1;
                Ok(Value::Struct(fields))
            }
        }
    }

    fn read_count(&self, input: &mut Reader<'_>) -> ReflectResult<usize> {
        let raw = input.take(LENGTH_PREFIX_WIDTH as usize, &self.path())?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
    }

    fn min_width(&self, layout: &WireLayout) -> u64 {
        let widths = &self.codec.min_widths;
        layout.min_width(&mut |name| widths.get(name).copied().unwrap_or(0))
    }

    /* Count of a list or map whose entries take at least `width` bytes each */
    fn read_elements(&self, width: u64, input: &mut Reader<'_>) -> ReflectResult<usize> {
        let count = self.read_count(input)?;
        if width == 0 {
            if count as u64 > MAX_EMPTY_ELEMENTS {
                return Err(ReflectError::CountLimit {
                    path: self.path(),
                    count,
                    limit: MAX_EMPTY_ELEMENTS,
                });
            }
        } else {
            let need = usize::try_from(width).unwrap_or(usize::MAX).saturating_mul(count);
            check(input.buf.len(), input.pos, need, &self.path())?;
        }
        Ok(count)
    }

    fn read_prefixed<'b>(&self, input: &mut Reader<'b>) -> ReflectResult<&'b [u8]> {
        let len = self.read_count(input)?;
        input.take(len, &self.path())
    }

    fn read_items(&mut self, elem: &WireLayout, count: usize, input: &mut Reader<'_>) -> ReflectResult<Value> {
        let mut items = Vec::new();
        for i in 0..count {
            items.push(self.scoped(format!("[{}]", i), |w| w.read(elem, input))?);
        }
        Ok(Value::Array(items))
    }

    fn read_scalar(&self, scalar: Scalar, input: &mut Reader<'_>) -> ReflectResult<Value> {
        let raw = input.take(scalar.width() as usize, &self.path())?;
        let mut wide = [0u8; 8];
        wide[..raw.len()].copy_from_slice(raw);
        let bits = u64::from_le_bytes(wide);
        Ok(match scalar {
            Scalar::Bool => Value::Bool(bits != 0),
            Scalar::I8 => Value::Int(i64::from(bits as u8 as i8)),
            Scalar::I16 => Value::Int(i64::from(bits as u16 as i16)),
            Scalar::I32 => Value::Int(i64::from(bits as u32 as i32)),
            Scalar::I64 => Value::Int(bits as i64),
            Scalar::U8 | Scalar::U16 | Scalar::U32 | Scalar::U64 => Value::Uint(bits),
            Scalar::F32 => Value::Float(f64::from(f32::from_bits(bits as u32))),
            Scalar::F64 => Value::Float(f64::from_bits(bits)),
        })
    }
}

enum ScalarError {
    Shape,
    Range(String),
}

/* Little-endian bytes of a scalar value, range checked against its width */
fn scalar_bytes(scalar: Scalar, value: &Value) -> Result<Vec<u8>, ScalarError> {
    let range = |v: &dyn std::fmt::Display| ScalarError::Range(v.to_string());
    let signed = |v: &Value| -> Result<i64, ScalarError> {
        match v {
            Value::Int(i) => Ok(*i),
            Value::Uint(u) => i64::try_from(*u).map_err(|_| range(u)),
            _ => Err(ScalarError::Shape),
        }
    };
    let unsigned = |v: &Value| -> Result<u64, ScalarError> {
        match v {
            Value::Uint(u) => Ok(*u),
            Value::Int(i) => u64::try_from(*i).map_err(|_| range(i)),
            _ => Err(ScalarError::Shape),
        }
    };
    let float = |v: &Value| -> Result<f64, ScalarError> {
        match v {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Uint(u) => Ok(*u as f64),
            _ => Err(ScalarError::Shape),
        }
    };

    Ok(match scalar {
        Scalar::Bool => match value {
            Value::Bool(b) => vec![u8::from(*b)],
            _ => return Err(ScalarError::Shape),
        },
        Scalar::I8 => {
            let v = signed(value)?;
            i8::try_from(v).map_err(|_| range(&v))?.to_le_bytes().to_vec()
        }
        Scalar::I16 => {
            let v = signed(value)?;
            i16::try_from(v).map_err(|_| range(&v))?.to_le_bytes().to_vec()
        }
        Scalar::I32 => {
            let v = signed(value)?;
            i32::try_from(v).map_err(|_| range(&v))?.to_le_bytes().to_vec()
        }
        Scalar::I64 => signed(value)?.to_le_bytes().to_vec(),
        Scalar::U8 => {
            let v = unsigned(value)?;
            u8::try_from(v).map_err(|_| range(&v))?.to_le_bytes().to_vec()
        }
        Scalar::U16 => {
            let v = unsigned(value)?;
            u16::try_from(v).map_err(|_| range(&v))?.to_le_bytes().to_vec()
        }
        Scalar::U32 => {
            let v = unsigned(value)?;
            u32::try_from(v).map_err(|_| range(&v))?.to_le_bytes().to_vec()
        }
        Scalar::U64 => unsigned(value)?.to_le_bytes().to_vec(),
        Scalar::F32 => (float(value)? as f32).to_le_bytes().to_vec(),
        Scalar::F64 => float(value)?.to_le_bytes().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirebuf_types::{Field, Kind, StructDef, TypeDescriptor};

    fn codec(structs: Vec<StructDef>) -> Codec {
        Codec::new(&Document::new("p", structs)).unwrap()
    }

    #[test]
    fn signed_scalars_sign_extend() {
        let c = codec(vec![StructDef::new(
            "S",
            vec![Field::new("A", Kind::Int8), Field::new("B", Kind::Int16)],
        )]);
        let v = c.decode("S", &[0xff, 0xfe, 0xff]).unwrap();
        assert_eq!(v, Value::structure([("A", Value::Int(-1)), ("B", Value::Int(-2))]));
    }

    #[test]
    fn range_errors_name_the_field() {
        let c = codec(vec![StructDef::new("S", vec![Field::new("A", Kind::Uint8)])]);
        let err = c.encode("S", &Value::structure([("A", Value::Uint(256))])).unwrap_err();
        assert_eq!(
            err,
            ReflectError::OutOfRange {
                path: "S.A".to_string(),
                scalar: Scalar::U8,
                value: "256".to_string()
            }
        );
    }

    #[test]
    fn hostile_count_fails_without_allocating() {
        let c = codec(vec![StructDef::new(
            "S",
            vec![Field::new("Xs", TypeDescriptor::array(TypeDescriptor::new(Kind::Uint64), 0))],
        )]);
        let err = c.decode("S", &[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(
            err,
            ReflectError::OutOfBounds {
                path: "S.Xs".to_string(),
                offset: 4,
                need: 8 * 0xffff_ffff,
                len: 4
            }
        );
    }

    #[test]
    fn counts_of_empty_structs_are_capped() {
        let c = codec(vec![
            StructDef::new("Empty", vec![]),
            StructDef::new(
                "S",
                vec![Field::new("Xs", TypeDescriptor::array(TypeDescriptor::struct_ref("Empty"), 0))],
            ),
        ]);
        let err = c.decode("S", &[0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert_eq!(
            err,
            ReflectError::CountLimit {
                path: "S.Xs".to_string(),
                count: 0xffff_ffff,
                limit: MAX_EMPTY_ELEMENTS
            }
        );

        let mut buf = 3u32.to_le_bytes().to_vec();
        let v = c.decode("S", &buf).unwrap();
        assert_eq!(v, Value::structure([("Xs", Value::Array(vec![Value::Struct(vec![]); 3]))]));
        buf.push(0);
        assert!(matches!(c.decode("S", &buf), Err(ReflectError::TrailingBytes { consumed: 4, .. })));
    }

    #[test]
    fn map_counts_use_key_and_value_widths() {
        let c = codec(vec![StructDef::new(
            "S",
            vec![Field::new(
                "M",
                TypeDescriptor::map(TypeDescriptor::new(Kind::Uint16), TypeDescriptor::new(Kind::Bool)),
            )],
        )]);
        let mut buf = 2u32.to_le_bytes().to_vec();
        buf.extend([1, 0, 1, 2, 0, 0]);
        assert!(c.decode("S", &buf).is_ok());
        let err = c.decode("S", &buf[..9]).unwrap_err();
        assert!(matches!(err, ReflectError::OutOfBounds { ref path, offset: 4, need: 6, len: 9 } if path == "S.M"));
    }

    #[test]
    fn self_embedding_hits_depth_limit() {
        let c = codec(vec![StructDef::new(
            "Node",
            vec![Field::new("Next", TypeDescriptor::struct_ref("Node"))],
        )]);
        assert!(matches!(
            c.decode("Node", &[]),
            Err(ReflectError::DepthExceeded { limit: MAX_DEPTH, .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected_by_decode_only() {
        let c = codec(vec![StructDef::new("S", vec![Field::new("A", Kind::Uint8)])]);
        assert_eq!(c.unmarshal("S", &[1, 2], 0).unwrap().1, 1);
        assert!(matches!(c.decode("S", &[1, 2]), Err(ReflectError::TrailingBytes { consumed: 1, .. })));
    }

    #[test]
    fn unknown_type_is_reported() {
        let c = codec(vec![]);
        assert_eq!(
            c.decode("Missing", &[]),
            Err(ReflectError::UnknownType {
                type_name: "Missing".to_string()
            })
        );
    }
}
