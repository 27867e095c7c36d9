use super::ir::*;
use super::layout::{
    DocumentLayout, FieldLayout, LayoutError, PRESENCE_FLAG_WIDTH, LENGTH_PREFIX_WIDTH, Strategy,
    WireLayout, classify, unwrap_pointers,
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use wirebuf_types::{Document, StructDef, TypeDescriptor};

/// Lowers schema structs into size/marshal/unmarshal op programs.
pub struct IrBuilder<'a> {
    document: &'a Document,
    /* Struct minimum widths; empty when the document does not classify */
    min_widths: HashMap<String, u64>,
}

impl<'a> IrBuilder<'a> {
    pub fn new(document: &'a Document) -> Self {
        let min_widths = DocumentLayout::build(document)
            .map(|layout| layout.struct_min_widths())
            .unwrap_or_default();
        Self {
            document,
            min_widths,
        }
    }

    /// Builds codecs for every non-marker struct in declaration order.
    pub fn build_all(&self) -> Result<CodecIr, IrBuildError> {
        let types = self
            .document
            .message_structs()
            .map(|s| self.build_type(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CodecIr::new(self.document.package.clone(), types))
    }

    /// Builds the three programs of a single struct.
    pub fn build_type(&self, def: &StructDef) -> Result<TypeCodec, IrBuildError> {
        let mut fields = Vec::with_capacity(def.fields.len());
        let mut size = SizePass::default();
        let mut marshal = MarshalPass::default();
        let mut unmarshal = UnmarshalPass::new(&self.min_widths);

        for field in &def.fields {
            let wrap = |source: LayoutError| IrBuildError::Field {
                type_name: def.name.clone(),
                field: field.name.clone(),
                source,
            };
            let place = Place::field(&field.name);
            let layout = WireLayout::of(&field.ty).map_err(wrap)?;
            debug!(
                struct_name = %def.name,
                field = %field.name,
                width = ?layout.static_width(),
                "classified field"
            );

            size.emit(&place, &field.ty).map_err(wrap)?;
            marshal.emit(&place, &field.ty).map_err(wrap)?;
            unmarshal.emit(&place, &field.ty).map_err(wrap)?;
            fields.push(FieldLayout {
                name: field.name.clone(),
                layout,
            });
        }

        Ok(TypeCodec {
            type_name: def.name.clone(),
            fields,
            size: size.ops,
            marshal: marshal.ops,
            unmarshal: unmarshal.ops,
        })
    }
}

/* Static width of a descriptor, if any */
fn width_of(ty: &TypeDescriptor) -> Result<Option<u64>, LayoutError> {
    Ok(WireLayout::of(ty)?.static_width())
}

fn add(ops: &mut Vec<Op>, term: SizeTerm) {
    ops.push(Op::AddSize { term });
}

#[derive(Default)]
struct SizePass {
    ops: Vec<Op>,
    vars: VarAllocator,
}

impl SizePass {
    fn emit(&mut self, place: &Place, ty: &TypeDescriptor) -> Result<(), LayoutError> {
        let mut ops = std::mem::take(&mut self.ops);
        let result = self.emit_into(&mut ops, place, ty);
        self.ops = ops;
        result
    }

    fn emit_into(
        &mut self,
        ops: &mut Vec<Op>,
        place: &Place,
        ty: &TypeDescriptor,
    ) -> Result<(), LayoutError> {
        match classify(ty)? {
            Strategy::Fixed(scalar) => add(ops, SizeTerm::Const { bytes: scalar.width() }),
            Strategy::Nullable(scalar) => {
                add(ops, SizeTerm::Const { bytes: PRESENCE_FLAG_WIDTH });
                add(
                    ops,
                    SizeTerm::Optional {
                        value: place.clone(),
                        width: scalar.width(),
                    },
                );
            }
            Strategy::String => {
                add(ops, SizeTerm::Const { bytes: LENGTH_PREFIX_WIDTH });
                add(ops, SizeTerm::Utf8Len { of: place.clone() });
            }
            Strategy::FixedBytes { len } => add(ops, SizeTerm::Const { bytes: u64::from(len) }),
            Strategy::DynamicBytes => {
                add(ops, SizeTerm::Const { bytes: LENGTH_PREFIX_WIDTH });
                add(ops, SizeTerm::ByteLen { of: place.clone() });
            }
            Strategy::FixedArray { len, elem } => {
                match width_of(elem)?.and_then(|width| width.checked_mul(u64::from(len))) {
                    Some(bytes) => add(ops, SizeTerm::Const { bytes }),
                    None => self.each_item(ops, place, elem)?,
                }
            }
            Strategy::DynamicArray { elem } => {
                add(ops, SizeTerm::Const { bytes: LENGTH_PREFIX_WIDTH });
                match width_of(elem)? {
                    Some(width) => add(
                        ops,
                        SizeTerm::CountTimes {
                            of: place.clone(),
                            width,
                        },
                    ),
                    None => self.each_item(ops, place, elem)?,
                }
            }
            Strategy::Map { key, value } => {
                add(ops, SizeTerm::Const { bytes: LENGTH_PREFIX_WIDTH });
                match (width_of(key)?, width_of(value)?) {
                    (Some(k), Some(v)) => add(
                        ops,
                        SizeTerm::CountTimes {
                            of: place.clone(),
                            width: k + v,
                        },
                    ),
                    _ => {
                        let k = self.vars.fresh("key");
                        let v = self.vars.fresh("val");
                        let mut body = Vec::new();
                        self.emit_into(&mut body, &Place::local(&k), key)?;
                        self.emit_into(&mut body, &Place::local(&v), value)?;
                        ops.push(Op::ForEachEntry {
                            source: place.clone(),
                            key: k,
                            value: v,
                            body,
                        });
                    }
                }
            }
            Strategy::Embedded { .. } => add(ops, SizeTerm::Nested { of: place.clone() }),
        }
        Ok(())
    }

    fn each_item(
        &mut self,
        ops: &mut Vec<Op>,
        place: &Place,
        elem: &TypeDescriptor,
    ) -> Result<(), LayoutError> {
        let item = self.vars.fresh("item");
        let mut body = Vec::new();
        self.emit_into(&mut body, &Place::local(&item), elem)?;
        ops.push(Op::ForEach {
            source: place.clone(),
            item,
            body,
        });
        Ok(())
    }
}

#[derive(Default)]
struct MarshalPass {
    ops: Vec<Op>,
    vars: VarAllocator,
}

impl MarshalPass {
    fn emit(&mut self, place: &Place, ty: &TypeDescriptor) -> Result<(), LayoutError> {
        let mut ops = std::mem::take(&mut self.ops);
        let result = self.emit_into(&mut ops, place, ty);
        self.ops = ops;
        result
    }

    fn emit_into(
        &mut self,
        ops: &mut Vec<Op>,
        place: &Place,
        ty: &TypeDescriptor,
    ) -> Result<(), LayoutError> {
        let value = place.clone();
        match classify(ty)? {
            Strategy::Fixed(scalar) => ops.push(Op::WriteScalar { scalar, value }),
            Strategy::Nullable(scalar) => ops.push(Op::WriteNullable { scalar, value }),
            Strategy::String => ops.push(Op::WriteString { value }),
            Strategy::FixedBytes { len } => ops.push(Op::WriteBytes {
                value,
                len: Some(len),
            }),
            Strategy::DynamicBytes => ops.push(Op::WriteBytes { value, len: None }),
            Strategy::FixedArray { len, elem } => {
                ops.push(Op::CheckLen { of: value, len });
                self.each_item(ops, place, elem)?;
            }
            Strategy::DynamicArray { elem } => {
                ops.push(Op::WriteCount { of: value });
                self.each_item(ops, place, elem)?;
            }
            Strategy::Map { key, value: val } => {
                ops.push(Op::WriteCount { of: value });
                let k = self.vars.fresh("key");
                let v = self.vars.fresh("val");
                let mut body = Vec::new();
                self.emit_into(&mut body, &Place::local(&k), key)?;
                self.emit_into(&mut body, &Place::local(&v), val)?;
                ops.push(Op::ForEachEntry {
                    source: place.clone(),
                    key: k,
                    value: v,
                    body,
                });
            }
            Strategy::Embedded { .. } => ops.push(Op::MarshalNested { value }),
        }
        Ok(())
    }

    fn each_item(
        &mut self,
        ops: &mut Vec<Op>,
        place: &Place,
        elem: &TypeDescriptor,
    ) -> Result<(), LayoutError> {
        let item = self.vars.fresh("item");
        let mut body = Vec::new();
        self.emit_into(&mut body, &Place::local(&item), elem)?;
        ops.push(Op::ForEach {
            source: place.clone(),
            item,
            body,
        });
        Ok(())
    }
}

struct UnmarshalPass<'w> {
    ops: Vec<Op>,
    vars: VarAllocator,
    min_widths: &'w HashMap<String, u64>,
}

impl<'w> UnmarshalPass<'w> {
    fn new(min_widths: &'w HashMap<String, u64>) -> Self {
        Self {
            ops: Vec::new(),
            vars: VarAllocator::new(),
            min_widths,
        }
    }

    fn min_width(&self, ty: &TypeDescriptor) -> Result<u64, LayoutError> {
        let widths = self.min_widths;
        Ok(WireLayout::of(ty)?.min_width(&mut |name| widths.get(name).copied().unwrap_or(0)))
    }

    fn emit(&mut self, target: &Place, ty: &TypeDescriptor) -> Result<(), LayoutError> {
        let mut ops = std::mem::take(&mut self.ops);
        let result = self.emit_into(&mut ops, target, ty);
        self.ops = ops;
        result
    }

    fn emit_into(
        &mut self,
        ops: &mut Vec<Op>,
        target: &Place,
        ty: &TypeDescriptor,
    ) -> Result<(), LayoutError> {
        let place = target.clone();
        match classify(ty)? {
            Strategy::Fixed(scalar) => ops.push(Op::ReadScalar {
                scalar,
                target: place,
            }),
            Strategy::Nullable(scalar) => ops.push(Op::ReadNullable {
                scalar,
                target: place,
            }),
            Strategy::String => ops.push(Op::ReadString { target: place }),
            Strategy::FixedBytes { len } => ops.push(Op::ReadBytes {
                target: place,
                len: Some(len),
            }),
            Strategy::DynamicBytes => ops.push(Op::ReadBytes {
                target: place,
                len: None,
            }),
            Strategy::FixedArray { len, elem } => {
                let count = Count::Fixed { len };
                let list = self.vars.fresh("list");
                ops.push(Op::NewList {
                    var: list.clone(),
                    elem: unwrap_pointers(elem).clone(),
                    len: count.clone(),
                });
                self.repeat_items(ops, &list, elem, count, true)?;
                ops.push(Op::Assign { target: place, var: list });
            }
            Strategy::DynamicArray { elem } => {
                let count = self.vars.fresh("count");
                ops.push(Op::ReadCount {
                    var: count.clone(),
                    min_width: self.min_width(elem)?,
                });
                let count = Count::Var { name: count };
                let list = self.vars.fresh("list");
                ops.push(Op::NewList {
                    var: list.clone(),
                    elem: unwrap_pointers(elem).clone(),
                    len: count.clone(),
                });
                self.repeat_items(ops, &list, elem, count, false)?;
                ops.push(Op::Assign { target: place, var: list });
            }
            Strategy::Map { key, value } => {
                let count = self.vars.fresh("count");
                ops.push(Op::ReadCount {
                    var: count.clone(),
                    min_width: self.min_width(key)?.saturating_add(self.min_width(value)?),
                });
                let map = self.vars.fresh("map");
                ops.push(Op::NewMap {
                    var: map.clone(),
                    key: unwrap_pointers(key).clone(),
                    value: unwrap_pointers(value).clone(),
                });

                let index = self.vars.fresh("i");
                let k = self.vars.fresh("key");
                let v = self.vars.fresh("val");
                let mut body = Vec::new();
                self.declare_and_read(&mut body, &k, key)?;
                self.declare_and_read(&mut body, &v, value)?;
                body.push(Op::Insert {
                    map: map.clone(),
                    key: k,
                    value: v,
                });
                ops.push(Op::Repeat {
                    count: Count::Var { name: count },
                    index,
                    body,
                });
                ops.push(Op::Assign { target: place, var: map });
            }
            Strategy::Embedded { .. } => ops.push(Op::UnmarshalNested {
                target: place,
                ty: unwrap_pointers(ty).clone(),
            }),
        }
        Ok(())
    }

    fn declare_and_read(
        &mut self,
        ops: &mut Vec<Op>,
        var: &str,
        ty: &TypeDescriptor,
    ) -> Result<(), LayoutError> {
        ops.push(Op::DeclareLocal {
            var: var.to_string(),
            ty: unwrap_pointers(ty).clone(),
        });
        self.emit_into(ops, &Place::local(var), ty)
    }

    fn repeat_items(
        &mut self,
        ops: &mut Vec<Op>,
        list: &str,
        elem: &TypeDescriptor,
        count: Count,
        indexed: bool,
    ) -> Result<(), LayoutError> {
        let index = self.vars.fresh("i");
        let item = self.vars.fresh("item");
        let mut body = Vec::new();
        self.declare_and_read(&mut body, &item, elem)?;
        body.push(Op::Append {
            list: list.to_string(),
            item,
            index: indexed.then(|| index.clone()),
        });
        ops.push(Op::Repeat { count, index, body });
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum IrBuildError {
    #[error("field '{type_name}.{field}' cannot be lowered: {source}")]
    Field {
        type_name: String,
        field: String,
        #[source]
        source: LayoutError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::layout::Scalar;
    use wirebuf_types::{Field, Kind};

    fn single(fields: Vec<Field>) -> TypeCodec {
        let doc = Document::new("p", vec![StructDef::new("A", fields)]);
        IrBuilder::new(&doc).build_all().unwrap().types.remove(0)
    }

    fn consts(ops: &[Op]) -> Vec<u64> {
        ops.iter()
            .filter_map(|op| match op {
                Op::AddSize {
                    term: SizeTerm::Const { bytes },
                } => Some(*bytes),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ping_rsp_is_five_constant_bytes() {
        let codec = single(vec![
            Field::new("Seq", Kind::Int32),
            Field::new("Ok", Kind::Bool),
        ]);
        assert_eq!(codec.constant_size(), Some(5));
        assert_eq!(
            codec.marshal,
            vec![
                Op::WriteScalar {
                    scalar: Scalar::I32,
                    value: Place::field("Seq")
                },
                Op::WriteScalar {
                    scalar: Scalar::Bool,
                    value: Place::field("Ok")
                },
            ]
        );
        assert_eq!(codec.unmarshal.len(), 2);
    }

    #[test]
    fn nullable_sizes_flag_and_optional_value() {
        let codec = single(vec![Field::new(
            "Hp",
            TypeDescriptor::pointer(TypeDescriptor::new(Kind::Int16)),
        )]);
        assert_eq!(
            codec.size,
            vec![
                Op::AddSize {
                    term: SizeTerm::Const { bytes: 1 }
                },
                Op::AddSize {
                    term: SizeTerm::Optional {
                        value: Place::field("Hp"),
                        width: 2
                    }
                },
            ]
        );
        assert!(matches!(codec.unmarshal[0], Op::ReadNullable { scalar: Scalar::I16, .. }));
    }

    #[test]
    fn fixed_array_of_scalars_has_constant_size() {
        let codec = single(vec![Field::new(
            "Pos",
            TypeDescriptor::array(TypeDescriptor::new(Kind::Float32), 3),
        )]);
        assert_eq!(codec.constant_size(), Some(12));
        assert_eq!(
            codec.marshal[0],
            Op::CheckLen {
                of: Place::field("Pos"),
                len: 3
            }
        );
        assert!(matches!(codec.marshal[1], Op::ForEach { .. }));
        match &codec.unmarshal[..] {
            [
                Op::NewList {
                    len: Count::Fixed { len: 3 },
                    ..
                },
                Op::Repeat { body, .. },
                Op::Assign { .. },
            ] => assert!(matches!(body.last(), Some(Op::Append { index: Some(_), .. }))),
            other => panic!("unexpected program: {:?}", other),
        }
    }

    #[test]
    fn dynamic_array_of_strings_iterates() {
        let codec = single(vec![Field::new(
            "Names",
            TypeDescriptor::array(TypeDescriptor::string(), 0),
        )]);
        assert_eq!(consts(&codec.size), vec![4]);
        match &codec.size[1] {
            Op::ForEach { body, .. } => assert_eq!(consts(body), vec![4]),
            other => panic!("unexpected op: {:?}", other),
        }
        assert!(matches!(codec.marshal[0], Op::WriteCount { .. }));
        assert!(matches!(codec.unmarshal[0], Op::ReadCount { .. }));
    }

    #[test]
    fn static_map_uses_count_times() {
        let codec = single(vec![Field::new(
            "Scores",
            TypeDescriptor::map(
                TypeDescriptor::new(Kind::Uint32),
                TypeDescriptor::new(Kind::Float64),
            ),
        )]);
        assert_eq!(
            codec.size[1],
            Op::AddSize {
                term: SizeTerm::CountTimes {
                    of: Place::field("Scores"),
                    width: 12
                }
            }
        );
        match &codec.unmarshal[2] {
            Op::Repeat { body, .. } => {
                assert!(matches!(body.last(), Some(Op::Insert { .. })));
                assert_eq!(body.len(), 5);
            }
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn nested_containers_get_distinct_temporaries() {
        let inner = TypeDescriptor::array(TypeDescriptor::new(Kind::Int8), 0);
        let codec = single(vec![
            Field::new("A", TypeDescriptor::array(inner.clone(), 0)),
            Field::new("B", TypeDescriptor::array(inner, 0)),
        ]);
        let mut names = Vec::new();
        walk_ops(&codec.unmarshal, &mut |op| match op {
            Op::ReadCount { var, .. } | Op::NewList { var, .. } | Op::DeclareLocal { var, .. } => {
                names.push(var.clone())
            }
            Op::Repeat { index, .. } => names.push(index.clone()),
            _ => {}
        });
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len(), "{:?}", names);
        assert_eq!(names.len(), 16);
    }

    #[test]
    fn oversized_fixed_grid_falls_back_to_iteration() {
        let row = TypeDescriptor::array(TypeDescriptor::new(Kind::Uint64), u32::MAX);
        let codec = single(vec![Field::new("Grid", TypeDescriptor::array(row, u32::MAX))]);
        assert_eq!(codec.constant_size(), None);
        match &codec.size[..] {
            [Op::ForEach { body, .. }] => assert_eq!(consts(body), vec![8 * u64::from(u32::MAX)]),
            other => panic!("unexpected program: {:?}", other),
        }
    }

    #[test]
    fn counts_carry_element_min_width() {
        let doc = Document::new(
            "p",
            vec![
                StructDef::new("Empty", vec![]),
                StructDef::new(
                    "A",
                    vec![
                        Field::new("Ids", TypeDescriptor::array(TypeDescriptor::new(Kind::Uint32), 0)),
                        Field::new("Nothing", TypeDescriptor::array(TypeDescriptor::struct_ref("Empty"), 0)),
                        Field::new(
                            "Tags",
                            TypeDescriptor::map(TypeDescriptor::string(), TypeDescriptor::new(Kind::Bool)),
                        ),
                    ],
                ),
            ],
        );
        let ir = IrBuilder::new(&doc).build_all().unwrap();
        let mut widths = Vec::new();
        walk_ops(&ir.get("A").unwrap().unmarshal, &mut |op| {
            if let Op::ReadCount { min_width, .. } = op {
                widths.push(*min_width);
            }
        });
        assert_eq!(widths, vec![4, 0, 5]);
    }

    #[test]
    fn pointer_to_struct_delegates_to_pointee() {
        let codec = single(vec![Field::new(
            "Inner",
            TypeDescriptor::pointer(TypeDescriptor::struct_ref("B")),
        )]);
        assert_eq!(
            codec.size,
            vec![Op::AddSize {
                term: SizeTerm::Nested {
                    of: Place::field("Inner")
                }
            }]
        );
        match &codec.unmarshal[0] {
            Op::UnmarshalNested { ty, .. } => assert_eq!(ty.name(), Some("B")),
            other => panic!("unexpected op: {:?}", other),
        }
    }

    #[test]
    fn malformed_field_reports_location() {
        let doc = Document::new(
            "p",
            vec![StructDef::new("A", vec![Field::new("xs", Kind::Array)])],
        );
        match IrBuilder::new(&doc).build_all() {
            Err(IrBuildError::Field { type_name, field, .. }) => {
                assert_eq!((type_name.as_str(), field.as_str()), ("A", "xs"));
            }
            other => panic!("expected field error, got {:?}", other),
        }
    }
}
