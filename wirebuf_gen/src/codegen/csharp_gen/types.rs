use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::ir::TypeCodec;
use crate::codegen::shared::layout::{Scalar, unwrap_pointers};
use wirebuf_types::{Kind, StructDef, TypeDescriptor};

use super::codec::{emit_marshal_fn, emit_size_fn, emit_unmarshal_fn};

/* C# spelling of a wire scalar */
pub fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "bool",
        Scalar::I8 => "sbyte",
        Scalar::U8 => "byte",
        Scalar::I16 => "short",
        Scalar::U16 => "ushort",
        Scalar::I32 => "int",
        Scalar::U32 => "uint",
        Scalar::I64 => "long",
        Scalar::U64 => "ulong",
        Scalar::F32 => "float",
        Scalar::F64 => "double",
    }
}

/* C# type of a descriptor; an explicit name always wins */
pub fn type_name(ty: &TypeDescriptor) -> String {
    if let Some(name) = ty.name() {
        return name.to_string();
    }
    let inner = |t: Option<&TypeDescriptor>| t.map(type_name).unwrap_or_else(|| "object".into());
    match ty.kind {
        Kind::Int | Kind::Int64 => "long".into(),
        Kind::Uint | Kind::Uint64 => "ulong".into(),
        Kind::Int8 => "sbyte".into(),
        Kind::Uint8 => "byte".into(),
        Kind::Int16 => "short".into(),
        Kind::Uint16 => "ushort".into(),
        Kind::Int32 => "int".into(),
        Kind::Uint32 => "uint".into(),
        Kind::Float32 => "float".into(),
        Kind::Float64 => "double".into(),
        Kind::String => "string".into(),
        Kind::Bytes => "byte[]".into(),
        Kind::Bool => "bool".into(),
        Kind::Map => format!("Dictionary<{}, {}>", inner(ty.key()), inner(ty.elem())),
        Kind::Array if ty.is_fixed_length() => format!("{}[]", inner(ty.elem())),
        Kind::Array => format!("List<{}>", inner(ty.elem())),
        Kind::Pointer => match ty.elem() {
            Some(pointee) if pointee.kind.is_scalar() => format!("Nullable<{}>", type_name(pointee)),
            pointee => inner(pointee),
        },
        Kind::Struct => "object".into(),
    }
}

/// Creation expression for a `len`-element array of `elem_type`, placing the
/// size in the outermost rank of jagged types (`new byte[4][]`).
pub fn new_array_expr(elem_type: &str, len: u32) -> String {
    let mut base = elem_type;
    let mut ranks = 0;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
        ranks += 1;
    }
    format!("new {}[{}]{}", base, len, "[]".repeat(ranks))
}

/* Initial value of a field declaration, if the field starts non-null */
pub fn field_initializer(ty: &TypeDescriptor) -> Option<String> {
    let ty = unwrap_pointers(ty);
    match ty.kind {
        Kind::Array if ty.is_fixed_length() => {
            let elem = ty.elem().map(type_name).unwrap_or_else(|| "object".into());
            Some(new_array_expr(&elem, ty.len))
        }
        Kind::Array | Kind::Map | Kind::Struct => Some(format!("new {}()", type_name(ty))),
        Kind::Bytes if ty.is_fixed_length() => Some(format!("new byte[{}]", ty.len)),
        _ => None,
    }
}

pub fn emit_field_decl(name: &str, ty: &TypeDescriptor) -> CodeNode {
    match field_initializer(ty) {
        Some(init) => CodeNode::line(format!("public {} {} = {};", type_name(ty), name, init)),
        None => CodeNode::line(format!("public {} {};", type_name(ty), name)),
    }
}

/* Nested class holding the fields and the three codec methods of a struct */
pub fn emit_class(def: &StructDef, codec: &TypeCodec) -> CodeNode {
    let mut body: Vec<CodeNode> = def
        .fields
        .iter()
        .map(|field| emit_field_decl(&field.name, &field.ty))
        .collect();
    if !body.is_empty() {
        body.push(CodeNode::Blank);
    }
    body.push(emit_size_fn(codec));
    body.push(CodeNode::Blank);
    body.push(emit_marshal_fn(codec));
    body.push(CodeNode::Blank);
    body.push(emit_unmarshal_fn(codec));

    CodeNode::block(format!("public class {}", def.name), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_csharp_types() {
        assert_eq!(type_name(&TypeDescriptor::new(Kind::Int)), "long");
        assert_eq!(type_name(&TypeDescriptor::new(Kind::Uint8)), "byte");
        assert_eq!(
            type_name(&TypeDescriptor::map(
                TypeDescriptor::string(),
                TypeDescriptor::array(TypeDescriptor::new(Kind::Int16), 0)
            )),
            "Dictionary<string, List<short>>"
        );
        assert_eq!(
            type_name(&TypeDescriptor::array(TypeDescriptor::bytes(0), 4)),
            "byte[][]"
        );
        assert_eq!(
            type_name(&TypeDescriptor::pointer(TypeDescriptor::new(Kind::Float32))),
            "Nullable<float>"
        );
        assert_eq!(
            type_name(&TypeDescriptor::pointer(TypeDescriptor::struct_ref("Item"))),
            "Item"
        );
        assert_eq!(
            type_name(&TypeDescriptor::new(Kind::Int32).named("Handle")),
            "Handle"
        );
    }

    #[test]
    fn jagged_arrays_size_the_outer_rank() {
        assert_eq!(new_array_expr("int", 3), "new int[3]");
        assert_eq!(new_array_expr("byte[]", 4), "new byte[4][]");
        assert_eq!(new_array_expr("List<int[]>", 2), "new List<int[]>[2]");
    }

    #[test]
    fn initializers_follow_shape() {
        assert_eq!(
            field_initializer(&TypeDescriptor::array(TypeDescriptor::new(Kind::Int32), 3)),
            Some("new int[3]".into())
        );
        assert_eq!(
            field_initializer(&TypeDescriptor::array(TypeDescriptor::string(), 0)),
            Some("new List<string>()".into())
        );
        assert_eq!(
            field_initializer(&TypeDescriptor::bytes(8)),
            Some("new byte[8]".into())
        );
        assert_eq!(
            field_initializer(&TypeDescriptor::struct_ref("Item")),
            Some("new Item()".into())
        );
        assert_eq!(field_initializer(&TypeDescriptor::string()), None);
    }
}
