/* Translation of codec IR programs into C# method bodies */

use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::ir::{Count, Op, Place, SizeTerm, TypeCodec};

use super::helpers::scalar_suffix;
use super::types::{new_array_expr, type_name};

fn place(p: &Place) -> String {
    match p {
        Place::Field { name } => format!("this.{}", name),
        Place::Local { name } => name.clone(),
    }
}

fn count(c: &Count) -> String {
    match c {
        Count::Fixed { len } => len.to_string(),
        Count::Var { name } => name.clone(),
    }
}

pub fn emit_size_fn(codec: &TypeCodec) -> CodeNode {
    let mut body = vec![CodeNode::line("int size = 0;")];
    body.extend(size_ops(&codec.size));
    body.push(CodeNode::line("return size;"));
    CodeNode::block("public int Size()", body)
}

pub fn emit_marshal_fn(codec: &TypeCodec) -> CodeNode {
    let mut body = ops(&codec.marshal);
    body.push(CodeNode::line("return n;"));
    CodeNode::block("public int Marshal(byte[] b, int n)", body)
}

pub fn emit_unmarshal_fn(codec: &TypeCodec) -> CodeNode {
    let mut body = ops(&codec.unmarshal);
    body.push(CodeNode::line("return n;"));
    CodeNode::block("public int Unmarshal(byte[] b, int n)", body)
}

fn size_ops(program: &[Op]) -> Vec<CodeNode> {
    program.iter().map(size_op).collect()
}

fn size_op(op: &Op) -> CodeNode {
    match op {
        Op::AddSize { term } => match term {
            SizeTerm::Const { bytes } => CodeNode::line(format!("size += {};", bytes)),
            SizeTerm::Utf8Len { of } => CodeNode::line(format!("size += StringSize({});", place(of))),
            SizeTerm::ByteLen { of } => CodeNode::line(format!("size += BytesSize({});", place(of))),
            SizeTerm::CountTimes { of, width } => {
                CodeNode::line(format!("size += {}.Count * {};", place(of), width))
            }
            SizeTerm::Optional { value, width } => CodeNode::block(
                format!("if ({}.HasValue)", place(value)),
                vec![CodeNode::line(format!("size += {};", width))],
            ),
            SizeTerm::Nested { of } => CodeNode::line(format!("size += {}.Size();", place(of))),
        },
        Op::ForEach { source, item, body } => CodeNode::block(
            format!("foreach (var {} in {})", item, place(source)),
            size_ops(body),
        ),
        Op::ForEachEntry {
            source,
            key,
            value,
            body,
        } => for_each_entry(source, key, value, size_ops(body)),
        other => CodeNode::line(format!("/* unexpected size op: {:?} */", other)),
    }
}

fn for_each_entry(source: &Place, key: &str, value: &str, inner: Vec<CodeNode>) -> CodeNode {
    let entry = format!("{}_{}", key, value);
    let mut body = vec![
        CodeNode::line(format!("var {} = {}.Key;", key, entry)),
        CodeNode::line(format!("var {} = {}.Value;", value, entry)),
    ];
    body.extend(inner);
    CodeNode::block(format!("foreach (var {} in {})", entry, place(source)), body)
}

fn ops(program: &[Op]) -> Vec<CodeNode> {
    program.iter().flat_map(op).collect()
}

fn op(op: &Op) -> Vec<CodeNode> {
    let line = |text: String| vec![CodeNode::line(text)];
    match op {
        Op::WriteScalar { scalar, value } => line(format!(
            "n = Put{}(b, n, {});",
            scalar_suffix(*scalar),
            place(value)
        )),
        Op::WriteNullable { scalar, value } => {
            let v = place(value);
            vec![
                CodeNode::block(
                    format!("if ({}.HasValue)", v),
                    vec![
                        CodeNode::line("n = PutBool(b, n, true);"),
                        CodeNode::line(format!(
                            "n = Put{}(b, n, {}.Value);",
                            scalar_suffix(*scalar),
                            v
                        )),
                    ],
                ),
                CodeNode::block("else", vec![CodeNode::line("n = PutBool(b, n, false);")]),
            ]
        }
        Op::WriteString { value } => line(format!("n = PutString(b, n, {});", place(value))),
        Op::WriteBytes { value, len: None } => {
            line(format!("n = PutBytes(b, n, {});", place(value)))
        }
        Op::WriteBytes {
            value,
            len: Some(len),
        } => line(format!("n = PutBlock(b, n, {}, {});", place(value), len)),
        Op::WriteCount { of } => line(format!("n = PutCount(b, n, {}.Count);", place(of))),
        Op::CheckLen { of, len } => vec![CodeNode::block(
            format!("if ({}.Length != {})", place(of), len),
            vec![CodeNode::line(format!(
                "throw new ArgumentException(\"fixed-length field must hold exactly {} elements\");",
                len
            ))],
        )],
        Op::MarshalNested { value } => line(format!("n = {}.Marshal(b, n);", place(value))),

        Op::ReadScalar { scalar, target } => line(format!(
            "{} = Get{}(b, ref n);",
            place(target),
            scalar_suffix(*scalar)
        )),
        Op::ReadNullable { scalar, target } => {
            let t = place(target);
            vec![
                CodeNode::block(
                    "if (GetBool(b, ref n))",
                    vec![CodeNode::line(format!(
                        "{} = Get{}(b, ref n);",
                        t,
                        scalar_suffix(*scalar)
                    ))],
                ),
                CodeNode::block("else", vec![CodeNode::line(format!("{} = null;", t))]),
            ]
        }
        Op::ReadString { target } => line(format!("{} = GetString(b, ref n);", place(target))),
        Op::ReadBytes { target, len: None } => {
            line(format!("{} = GetBytes(b, ref n);", place(target)))
        }
        Op::ReadBytes {
            target,
            len: Some(len),
        } => line(format!("{} = GetBlock(b, ref n, {});", place(target), len)),
        Op::ReadCount { var, min_width } => line(format!(
            "int {} = GetElementCount(b, ref n, {});",
            var,
            (*min_width).min(i32::MAX as u64)
        )),
        Op::UnmarshalNested { target, ty } => {
            let t = place(target);
            vec![
                CodeNode::line(format!("{} = new {}();", t, type_name(ty))),
                CodeNode::line(format!("n = {}.Unmarshal(b, n);", t)),
            ]
        }

        Op::DeclareLocal { var, ty } => {
            let t = type_name(ty);
            line(format!("{} {} = default({});", t, var, t))
        }
        Op::NewList {
            var,
            elem,
            len: Count::Fixed { len },
        } => {
            let e = type_name(elem);
            line(format!("{}[] {} = {};", e, var, new_array_expr(&e, *len)))
        }
        Op::NewList { var, elem, .. } => {
            let t = format!("List<{}>", type_name(elem));
            line(format!("{} {} = new {}();", t, var, t))
        }
        Op::NewMap { var, key, value } => {
            let t = format!("Dictionary<{}, {}>", type_name(key), type_name(value));
            line(format!("{} {} = new {}();", t, var, t))
        }
        Op::Append {
            list,
            item,
            index: Some(index),
        } => line(format!("{}[{}] = {};", list, index, item)),
        Op::Append {
            list,
            item,
            index: None,
        } => line(format!("{}.Add({});", list, item)),
        Op::Insert { map, key, value } => line(format!("{}[{}] = {};", map, key, value)),
        Op::Assign { target, var } => line(format!("{} = {};", place(target), var)),

        Op::ForEach { source, item, body } => vec![CodeNode::block(
            format!("foreach (var {} in {})", item, place(source)),
            ops(body),
        )],
        Op::ForEachEntry {
            source,
            key,
            value,
            body,
        } => vec![for_each_entry(source, key, value, ops(body))],
        Op::Repeat {
            count: c,
            index,
            body,
        } => vec![CodeNode::block(
            format!("for (int {i} = 0; {i} < {}; {i}++)", count(c), i = index),
            ops(body),
        )],

        Op::AddSize { .. } => vec![size_op(op)],
    }
}
