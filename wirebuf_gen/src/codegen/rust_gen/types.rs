use crate::codegen::CodegenError;
use crate::codegen::shared::code::CodeNode;
use crate::codegen::shared::layout::{Scalar, unwrap_pointers};
use crate::codegen::shared::naming::rust_field_name;
use wirebuf_types::{Kind, StructDef, TypeDescriptor};

use super::helpers::scalar_to_rust_type;

/* Names the generated module defines for itself */
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    "CodecError",
    "Scalar",
    "MessageId",
    "Transport",
    "Handlers",
];

/* Rust type of a descriptor; names only apply to struct references */
pub fn rust_type(ty: &TypeDescriptor) -> String {
    let inner = |t: Option<&TypeDescriptor>| t.map(rust_type).unwrap_or_else(|| "()".into());
    if let Some(scalar) = Scalar::from_kind(ty.kind) {
        return scalar_to_rust_type(scalar).to_string();
    }
    match ty.kind {
        Kind::String => "String".into(),
        Kind::Bytes => "Vec<u8>".into(),
        Kind::Array => format!("Vec<{}>", inner(ty.elem())),
        Kind::Map => format!(
            "indexmap::IndexMap<{}, {}>",
            inner(ty.key()),
            inner(ty.elem())
        ),
        Kind::Pointer => match ty.elem() {
            Some(pointee) if pointee.kind.is_scalar() => format!("Option<{}>", rust_type(pointee)),
            pointee => inner(pointee),
        },
        Kind::Struct => ty.name().unwrap_or("()").to_string(),
        _ => "()".into(),
    }
}

/* Whether values of this descriptor can key an IndexMap (Hash + Eq) */
pub fn is_hashable(ty: &TypeDescriptor) -> bool {
    let ty = unwrap_pointers(ty);
    match ty.kind {
        Kind::String | Kind::Bytes => true,
        Kind::Array | Kind::Pointer => ty.elem().is_some_and(is_hashable),
        Kind::Map | Kind::Struct => false,
        kind => Scalar::from_kind(kind).is_some_and(|s| !s.is_float()),
    }
}

/* Reject shapes the Rust target cannot express */
pub fn check_supported(def: &StructDef) -> Result<(), CodegenError> {
    if RESERVED_TYPE_NAMES.contains(&def.name.as_str()) {
        return Err(CodegenError::Unsupported {
            location: def.name.clone(),
            reason: "struct name collides with a generated item".into(),
        });
    }
    let mut taken: Vec<(String, &str)> = Vec::with_capacity(def.fields.len());
    for field in &def.fields {
        let location = format!("{}.{}", def.name, field.name);
        let rust_name = rust_field_name(&field.name);
        if let Some((_, other)) = taken.iter().find(|(name, _)| *name == rust_name) {
            return Err(CodegenError::Unsupported {
                location,
                reason: format!("field name maps to '{}', already used by '{}'", rust_name, other),
            });
        }
        check_descriptor(&field.ty, &location)?;
        taken.push((rust_name, &field.name));
    }
    Ok(())
}

fn check_descriptor(ty: &TypeDescriptor, location: &str) -> Result<(), CodegenError> {
    if let Some(key) = ty.key() {
        if !is_hashable(key) {
            return Err(CodegenError::Unsupported {
                location: location.to_string(),
                reason: "map key type is not hashable in Rust (float, struct or map)".into(),
            });
        }
        check_descriptor(key, &format!("{}.key", location))?;
    }
    if let Some(elem) = ty.elem() {
        check_descriptor(elem, &format!("{}.elem", location))?;
    }
    Ok(())
}

/* Initial value used by the Default impl */
fn default_expr(ty: &TypeDescriptor) -> String {
    let ty = unwrap_pointers(ty);
    match ty.kind {
        Kind::Array if ty.is_fixed_length() => {
            format!("(0..{}).map(|_| Default::default()).collect()", ty.len)
        }
        Kind::Bytes if ty.is_fixed_length() => format!("vec![0u8; {}]", ty.len),
        _ => "Default::default()".into(),
    }
}

/* Struct definition plus its Default impl */
pub fn emit_struct(def: &StructDef) -> Vec<CodeNode> {
    let fields: Vec<CodeNode> = def
        .fields
        .iter()
        .map(|f| {
            let mut line = format!("pub {}: {},", rust_field_name(&f.name), rust_type(&f.ty));
            let ty = unwrap_pointers(&f.ty);
            if ty.is_fixed_length() {
                line.push_str(&format!(" /* exactly {} elements on the wire */", ty.len));
            }
            CodeNode::line(line)
        })
        .collect();

    let defaults: Vec<CodeNode> = def
        .fields
        .iter()
        .map(|f| {
            CodeNode::line(format!(
                "{}: {},",
                rust_field_name(&f.name),
                default_expr(&f.ty)
            ))
        })
        .collect();

    vec![
        CodeNode::line("#[derive(Debug, Clone, PartialEq)]"),
        CodeNode::block(format!("pub struct {}", def.name), fields),
        CodeNode::Blank,
        CodeNode::block(
            format!("impl Default for {}", def.name),
            vec![CodeNode::block(
                "fn default() -> Self",
                vec![CodeNode::block("Self", defaults)],
            )],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::code::render;
    use wirebuf_types::Field;

    #[test]
    fn maps_kinds_to_rust_types() {
        assert_eq!(rust_type(&TypeDescriptor::new(Kind::Uint)), "u64");
        assert_eq!(rust_type(&TypeDescriptor::bytes(4)), "Vec<u8>");
        assert_eq!(
            rust_type(&TypeDescriptor::map(
                TypeDescriptor::string(),
                TypeDescriptor::pointer(TypeDescriptor::new(Kind::Int8))
            )),
            "indexmap::IndexMap<String, Option<i8>>"
        );
        assert_eq!(
            rust_type(&TypeDescriptor::pointer(TypeDescriptor::struct_ref("Item"))),
            "Item"
        );
    }

    #[test]
    fn float_and_struct_keys_are_rejected() {
        let def = StructDef::new(
            "A",
            vec![Field::new(
                "M",
                TypeDescriptor::map(TypeDescriptor::new(Kind::Float32), TypeDescriptor::string()),
            )],
        );
        assert!(matches!(
            check_supported(&def),
            Err(CodegenError::Unsupported { .. })
        ));

        let def = StructDef::new(
            "A",
            vec![Field::new(
                "M",
                TypeDescriptor::map(TypeDescriptor::struct_ref("K"), TypeDescriptor::string()),
            )],
        );
        assert!(check_supported(&def).is_err());

        let def = StructDef::new(
            "A",
            vec![Field::new(
                "M",
                TypeDescriptor::map(TypeDescriptor::bytes(0), TypeDescriptor::new(Kind::Float64)),
            )],
        );
        assert!(check_supported(&def).is_ok());
    }

    #[test]
    fn fields_colliding_after_snake_case_are_rejected() {
        let def = StructDef::new(
            "Ping",
            vec![Field::new("Seq", Kind::Int32), Field::new("seq", Kind::Int64)],
        );
        match check_supported(&def) {
            Err(CodegenError::Unsupported { location, reason }) => {
                assert_eq!(location, "Ping.seq");
                assert!(reason.contains("'Seq'"));
            }
            other => panic!("expected a name collision, got {:?}", other),
        }

        let def = StructDef::new(
            "Ping",
            vec![Field::new("HostId", Kind::Int32), Field::new("Host", Kind::Int32)],
        );
        assert!(check_supported(&def).is_ok());
    }

    #[test]
    fn reserved_names_are_rejected() {
        assert!(check_supported(&StructDef::new("Transport", vec![])).is_err());
    }

    #[test]
    fn default_prefills_fixed_arrays() {
        let def = StructDef::new(
            "Grid",
            vec![
                Field::new("Cells", TypeDescriptor::array(TypeDescriptor::new(Kind::Uint8), 9)),
                Field::new("Key", TypeDescriptor::bytes(32)),
                Field::new("Name", TypeDescriptor::string()),
            ],
        );
        let text = render(&emit_struct(&def), "    ").unwrap();
        assert!(text.contains("pub cells: Vec<u8>, /* exactly 9 elements on the wire */"));
        assert!(text.contains("cells: (0..9).map(|_| Default::default()).collect(),"));
        assert!(text.contains("key: vec![0u8; 32],"));
        assert!(text.contains("name: Default::default(),"));
    }
}
