use crate::codegen::shared::ir::Place;
use crate::codegen::shared::layout::Scalar;
use crate::codegen::shared::naming::{escape_rust_keyword, rust_field_name, snake_case};

/* Convert a wire scalar to its Rust type */
pub fn scalar_to_rust_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "bool",
        Scalar::I8 => "i8",
        Scalar::U8 => "u8",
        Scalar::I16 => "i16",
        Scalar::U16 => "u16",
        Scalar::I32 => "i32",
        Scalar::U32 => "u32",
        Scalar::I64 => "i64",
        Scalar::U64 => "u64",
        Scalar::F32 => "f32",
        Scalar::F64 => "f64",
    }
}

/* Module name of a package (`Module1` -> `module1`) */
pub fn module_name(package: &str) -> String {
    escape_rust_keyword(&snake_case(package))
}

/* Method suffix derived from a struct name (`PingRsp` -> `ping_rsp`) */
pub fn method_suffix(struct_name: &str) -> String {
    snake_case(struct_name)
}

/* Place as an assignable/readable expression (`self.seq`, `item0`) */
pub fn place_expr(place: &Place) -> String {
    match place {
        Place::Field { name } => format!("self.{}", rust_field_name(name)),
        Place::Local { name } => name.clone(),
    }
}

/* Place read by value on the marshal side, where locals are references */
pub fn place_value(place: &Place) -> String {
    match place {
        Place::Field { name } => format!("self.{}", rust_field_name(name)),
        Place::Local { name } => format!("*{}", name),
    }
}

/* Place borrowed on the marshal side */
pub fn place_ref(place: &Place) -> String {
    match place {
        Place::Field { name } => format!("&self.{}", rust_field_name(name)),
        Place::Local { name } => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_render_by_context() {
        let field = Place::field("Type");
        let local = Place::local("item0");
        assert_eq!(place_expr(&field), "self.r#type");
        assert_eq!(place_value(&local), "*item0");
        assert_eq!(place_ref(&field), "&self.r#type");
        assert_eq!(place_ref(&local), "item0");
        assert_eq!(module_name("Module1"), "module1");
        assert_eq!(method_suffix("PingRsp"), "ping_rsp");
    }
}
