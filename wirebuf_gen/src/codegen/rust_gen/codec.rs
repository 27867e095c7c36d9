/* Translation of codec IR programs into Rust methods */

use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::ir::{Count, Op, SizeTerm, TypeCodec};

use super::helpers::{place_expr, place_ref, place_value, scalar_to_rust_type};
use super::types::rust_type;

fn count(c: &Count) -> String {
    match c {
        Count::Fixed { len } => len.to_string(),
        Count::Var { name } => name.clone(),
    }
}

/* `impl T { size, marshal, unmarshal }` */
pub fn emit_codec_impl(codec: &TypeCodec) -> CodeNode {
    CodeNode::block(
        format!("impl {}", codec.type_name),
        vec![
            emit_size_fn(codec),
            CodeNode::Blank,
            emit_marshal_fn(codec),
            CodeNode::Blank,
            emit_unmarshal_fn(codec),
        ],
    )
}

pub fn emit_size_fn(codec: &TypeCodec) -> CodeNode {
    let mut body = vec![CodeNode::line("let mut size = 0usize;")];
    body.extend(size_ops(&codec.size));
    body.push(CodeNode::line("size"));
    CodeNode::block("pub fn size(&self) -> usize", body)
}

pub fn emit_marshal_fn(codec: &TypeCodec) -> CodeNode {
    let mut body = marshal_ops(&codec.marshal);
    body.push(CodeNode::line("n"));
    CodeNode::block("pub fn marshal(&self, b: &mut [u8], mut n: usize) -> usize", body)
}

pub fn emit_unmarshal_fn(codec: &TypeCodec) -> CodeNode {
    let mut body = unmarshal_ops(&codec.unmarshal);
    body.push(CodeNode::line("Ok(n)"));
    CodeNode::block(
        "pub fn unmarshal(&mut self, b: &[u8], mut n: usize) -> Result<usize, CodecError>",
        body,
    )
}

fn size_ops(program: &[Op]) -> Vec<CodeNode> {
    program.iter().map(size_op).collect()
}

fn size_op(op: &Op) -> CodeNode {
    match op {
        Op::AddSize { term } => match term {
            SizeTerm::Const { bytes } => CodeNode::line(format!("size += {};", bytes)),
            SizeTerm::Utf8Len { of } | SizeTerm::ByteLen { of } => {
                CodeNode::line(format!("size += {}.len();", place_expr(of)))
            }
            SizeTerm::CountTimes { of, width } => {
                CodeNode::line(format!("size += {}.len() * {};", place_expr(of), width))
            }
            SizeTerm::Optional { value, width } => CodeNode::block(
                format!("if {}.is_some()", place_expr(value)),
                vec![CodeNode::line(format!("size += {};", width))],
            ),
            SizeTerm::Nested { of } => CodeNode::line(format!("size += {}.size();", place_expr(of))),
        },
        Op::ForEach { source, item, body } => CodeNode::block(
            format!("for {} in {}.iter()", item, place_expr(source)),
            size_ops(body),
        ),
        Op::ForEachEntry {
            source,
            key,
            value,
            body,
        } => CodeNode::block(
            format!("for ({}, {}) in {}.iter()", key, value, place_expr(source)),
            size_ops(body),
        ),
        other => CodeNode::line(format!("/* unexpected size op: {:?} */", other)),
    }
}

/* Marshal side: fields are borrowed through `self`, locals are references */
fn marshal_ops(program: &[Op]) -> Vec<CodeNode> {
    program.iter().map(marshal_op).collect()
}

fn marshal_op(op: &Op) -> CodeNode {
    let line = |text: String| CodeNode::line(text);
    match op {
        Op::WriteScalar { scalar, value } => line(format!(
            "n = put::<{}>(b, n, {});",
            scalar_to_rust_type(*scalar),
            place_value(value)
        )),
        Op::WriteNullable { scalar, value } => line(format!(
            "n = put_opt::<{}>(b, n, {});",
            scalar_to_rust_type(*scalar),
            place_value(value)
        )),
        Op::WriteString { value } => line(format!("n = put_str(b, n, {});", place_ref(value))),
        Op::WriteBytes { value, len: None } => {
            line(format!("n = put_bytes(b, n, {});", place_ref(value)))
        }
        Op::WriteBytes {
            value,
            len: Some(len),
        } => line(format!("n = put_block(b, n, {}, {});", place_ref(value), len)),
        Op::WriteCount { of } => line(format!("n = put_len(b, n, {}.len());", place_expr(of))),
        Op::CheckLen { of, len } => line(format!(
            "assert_eq!({}.len(), {}, \"fixed-length field must hold exactly {} elements\");",
            place_expr(of),
            len,
            len
        )),
        Op::MarshalNested { value } => line(format!("n = {}.marshal(b, n);", place_expr(value))),
        Op::ForEach { source, item, body } => CodeNode::block(
            format!("for {} in {}.iter()", item, place_expr(source)),
            marshal_ops(body),
        ),
        Op::ForEachEntry {
            source,
            key,
            value,
            body,
        } => CodeNode::block(
            format!("for ({}, {}) in {}.iter()", key, value, place_expr(source)),
            marshal_ops(body),
        ),
        other => line(format!("/* unexpected marshal op: {:?} */", other)),
    }
}

/* Unmarshal side: every place is an owned, assignable slot */
fn unmarshal_ops(program: &[Op]) -> Vec<CodeNode> {
    program.iter().flat_map(unmarshal_op).collect()
}

fn unmarshal_op(op: &Op) -> Vec<CodeNode> {
    let line = |text: String| vec![CodeNode::line(text)];
    match op {
        Op::ReadScalar { scalar, target } => line(format!(
            "{} = get::<{}>(b, &mut n)?;",
            place_expr(target),
            scalar_to_rust_type(*scalar)
        )),
        Op::ReadNullable { scalar, target } => line(format!(
            "{} = get_opt::<{}>(b, &mut n)?;",
            place_expr(target),
            scalar_to_rust_type(*scalar)
        )),
        Op::ReadString { target } => line(format!("{} = get_str(b, &mut n)?;", place_expr(target))),
        Op::ReadBytes { target, len: None } => {
            line(format!("{} = get_bytes(b, &mut n)?;", place_expr(target)))
        }
        Op::ReadBytes {
            target,
            len: Some(len),
        } => line(format!(
            "{} = get_block(b, &mut n, {})?;",
            place_expr(target),
            len
        )),
        Op::ReadCount { var, min_width } => line(format!(
            "let {} = get_count(b, &mut n, {})?;",
            var,
            (*min_width).min(u64::from(u32::MAX))
        )),
        Op::UnmarshalNested { target, ty } => {
            let t = place_expr(target);
            vec![
                CodeNode::line(format!("{} = {}::default();", t, rust_type(ty))),
                CodeNode::line(format!("n = {}.unmarshal(b, n)?;", t)),
            ]
        }
        Op::DeclareLocal { var, ty } => line(format!(
            "let mut {}: {} = Default::default();",
            var,
            rust_type(ty)
        )),
        Op::NewList {
            var,
            elem,
            len: Count::Fixed { len },
        } => line(format!(
            "let mut {}: Vec<{}> = Vec::with_capacity({});",
            var,
            rust_type(elem),
            len
        )),
        Op::NewList { var, elem, .. } => line(format!(
            "let mut {}: Vec<{}> = Vec::new();",
            var,
            rust_type(elem)
        )),
        Op::NewMap { var, key, value } => line(format!(
            "let mut {}: indexmap::IndexMap<{}, {}> = indexmap::IndexMap::new();",
            var,
            rust_type(key),
            rust_type(value)
        )),
        /* Items arrive in index order, so pushing fills pre-sized lists too */
        Op::Append { list, item, .. } => line(format!("{}.push({});", list, item)),
        Op::Insert { map, key, value } => line(format!("{}.insert({}, {});", map, key, value)),
        Op::Assign { target, var } => line(format!("{} = {};", place_expr(target), var)),
        Op::Repeat { count: c, body, .. } => vec![CodeNode::block(
            format!("for _ in 0..{}", count(c)),
            unmarshal_ops(body),
        )],
        other => line(format!("/* unexpected unmarshal op: {:?} */", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::builder::IrBuilder;
    use crate::codegen::shared::code::render;
    use wirebuf_types::{Document, Field, Kind, StructDef, TypeDescriptor};

    fn codec_for(fields: Vec<Field>) -> TypeCodec {
        let doc = Document::new("p", vec![StructDef::new("A", fields)]);
        IrBuilder::new(&doc).build_all().unwrap().types.remove(0)
    }

    fn text(node: CodeNode) -> String {
        render(&[node], "    ").unwrap()
    }

    #[test]
    fn ping_rsp_methods() {
        let codec = codec_for(vec![Field::new("Seq", Kind::Int32), Field::new("Ok", Kind::Bool)]);
        let body = text(emit_codec_impl(&codec));
        assert!(body.contains("impl A {"));
        assert!(body.contains("n = put::<i32>(b, n, self.seq);"));
        assert!(body.contains("self.ok = get::<bool>(b, &mut n)?;"));
        assert!(body.contains("        Ok(n)\n"));
    }

    #[test]
    fn list_of_structs_borrows_items() {
        let codec = codec_for(vec![Field::new(
            "Items",
            TypeDescriptor::array(TypeDescriptor::struct_ref("Item"), 0),
        )]);
        let marshal = text(emit_marshal_fn(&codec));
        assert!(marshal.contains("n = put_len(b, n, self.items.len());"));
        assert!(marshal.contains("for item0 in self.items.iter() {"));
        assert!(marshal.contains("n = item0.marshal(b, n);"));

        let unmarshal = text(emit_unmarshal_fn(&codec));
        assert!(unmarshal.contains("let count0 = get_count(b, &mut n, 0)?;"));
        assert!(unmarshal.contains("let mut list1: Vec<Item> = Vec::new();"));
        assert!(unmarshal.contains("for _ in 0..count0 {"));
        assert!(unmarshal.contains("item3 = Item::default();"));
        assert!(unmarshal.contains("list1.push(item3);"));
        assert!(unmarshal.contains("self.items = list1;"));
    }

    #[test]
    fn nested_scalars_deref_locals() {
        let codec = codec_for(vec![Field::new(
            "Grid",
            TypeDescriptor::array(TypeDescriptor::array(TypeDescriptor::new(Kind::Uint16), 0), 0),
        )]);
        let marshal = text(emit_marshal_fn(&codec));
        assert!(marshal.contains("for item1 in item0.iter() {"));
        assert!(marshal.contains("n = put::<u16>(b, n, *item1);"));
        let size = text(emit_size_fn(&codec));
        assert!(size.contains("size += item0.len() * 2;"));
        let unmarshal = text(emit_unmarshal_fn(&codec));
        assert!(unmarshal.contains("let count0 = get_count(b, &mut n, 4)?;"));
        assert!(unmarshal.contains("get_count(b, &mut n, 2)?;"));
    }

    #[test]
    fn fixed_arrays_assert_their_length_before_writing() {
        let codec = codec_for(vec![Field::new(
            "Pos",
            TypeDescriptor::array(TypeDescriptor::new(Kind::Float32), 3),
        )]);
        let marshal = text(emit_marshal_fn(&codec));
        let check = marshal
            .find("assert_eq!(self.pos.len(), 3, \"fixed-length field must hold exactly 3 elements\");")
            .expect("length check");
        let write = marshal.find("for item0 in self.pos.iter() {").expect("element loop");
        assert!(check < write);
        assert!(text(emit_size_fn(&codec)).contains("size += 12;"));
    }

    #[test]
    fn map_and_nullable_locals() {
        let codec = codec_for(vec![Field::new(
            "Hp",
            TypeDescriptor::map(
                TypeDescriptor::string(),
                TypeDescriptor::pointer(TypeDescriptor::new(Kind::Int64)),
            ),
        )]);
        let marshal = text(emit_marshal_fn(&codec));
        assert!(marshal.contains("for (key0, val1) in self.hp.iter() {"));
        assert!(marshal.contains("n = put_str(b, n, key0);"));
        assert!(marshal.contains("n = put_opt::<i64>(b, n, *val1);"));
        let unmarshal = text(emit_unmarshal_fn(&codec));
        assert!(unmarshal.contains("let mut val4: Option<i64> = Default::default();"));
        assert!(unmarshal.contains("map1.insert(key3, val4);"));
    }
}
