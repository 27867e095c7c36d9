use super::ir::CodecIr;
use super::ir_proto;
use super::layout::{DocumentLayout, Endianness, FieldLayout, Scalar, StructLayout, WireLayout};
use prost::Message;
use thiserror::Error;

/// Serialize the layout IR into pretty JSON.
pub fn layout_ir_to_json(layout: &DocumentLayout) -> serde_json::Result<String> {
    serde_json::to_string_pretty(layout)
}

/// Serialize the layout IR into YAML.
pub fn layout_ir_to_yaml(layout: &DocumentLayout) -> Result<String, IrSerializationError> {
    Ok(serde_yml::to_string(layout)?)
}

/// Serialize the layout IR into a protobuf byte vector.
pub fn layout_ir_to_protobuf(layout: &DocumentLayout) -> Result<Vec<u8>, IrSerializationError> {
    let proto: ir_proto::DocumentLayout = layout.into();
    let mut buf = Vec::with_capacity(proto.encoded_len());
    proto.encode(&mut buf).map_err(IrSerializationError::from)?;
    Ok(buf)
}

/// Serialize the codec IR (size/marshal/unmarshal programs) into pretty JSON.
pub fn codec_ir_to_json(codec: &CodecIr) -> serde_json::Result<String> {
    serde_json::to_string_pretty(codec)
}

#[derive(Debug, Error)]
pub enum IrSerializationError {
    #[error("failed to encode protobuf: {0}")]
    ProtobufEncode(#[from] prost::EncodeError),
    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yml::Error),
}

impl From<&DocumentLayout> for ir_proto::DocumentLayout {
    fn from(value: &DocumentLayout) -> Self {
        Self {
            version: value.version,
            package: value.package.clone(),
            byte_order: match value.byte_order {
                Endianness::Little => ir_proto::Endianness::Little as i32,
                Endianness::Big => ir_proto::Endianness::Big as i32,
            },
            structs: value.structs.iter().map(ir_proto::StructLayout::from).collect(),
        }
    }
}

impl From<&StructLayout> for ir_proto::StructLayout {
    fn from(value: &StructLayout) -> Self {
        Self {
            name: value.name.clone(),
            fields: value.fields.iter().map(ir_proto::FieldLayout::from).collect(),
        }
    }
}

impl From<&FieldLayout> for ir_proto::FieldLayout {
    fn from(value: &FieldLayout) -> Self {
        Self {
            name: value.name.clone(),
            layout: Some((&value.layout).into()),
        }
    }
}

impl From<Scalar> for ir_proto::Scalar {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Bool => ir_proto::Scalar::Bool,
            Scalar::I8 => ir_proto::Scalar::I8,
            Scalar::U8 => ir_proto::Scalar::U8,
            Scalar::I16 => ir_proto::Scalar::I16,
            Scalar::U16 => ir_proto::Scalar::U16,
            Scalar::I32 => ir_proto::Scalar::I32,
            Scalar::U32 => ir_proto::Scalar::U32,
            Scalar::I64 => ir_proto::Scalar::I64,
            Scalar::U64 => ir_proto::Scalar::U64,
            Scalar::F32 => ir_proto::Scalar::F32,
            Scalar::F64 => ir_proto::Scalar::F64,
        }
    }
}

fn scalar_node(scalar: Scalar) -> ir_proto::ScalarNode {
    ir_proto::ScalarNode {
        scalar: ir_proto::Scalar::from(scalar) as i32,
        width: scalar.width(),
    }
}

fn boxed(layout: &WireLayout) -> Option<Box<ir_proto::WireLayout>> {
    Some(Box::new(layout.into()))
}

impl From<&WireLayout> for ir_proto::WireLayout {
    fn from(value: &WireLayout) -> Self {
        use ir_proto::wire_layout::Strategy;
        let strategy = match value {
            WireLayout::Fixed { scalar } => Strategy::Fixed(scalar_node(*scalar)),
            WireLayout::Nullable { scalar } => Strategy::Nullable(scalar_node(*scalar)),
            WireLayout::String => Strategy::String(ir_proto::EmptyNode {}),
            WireLayout::FixedBytes { len } => Strategy::FixedBytes(ir_proto::BytesNode { len: *len }),
            WireLayout::DynamicBytes => Strategy::DynamicBytes(ir_proto::EmptyNode {}),
            WireLayout::FixedArray { len, elem } => Strategy::FixedArray(ir_proto::ArrayNode {
                len: *len,
                elem: boxed(elem),
            }),
            WireLayout::DynamicArray { elem } => Strategy::DynamicArray(ir_proto::ArrayNode {
                len: 0,
                elem: boxed(elem),
            }),
            WireLayout::Map { key, value } => Strategy::Map(ir_proto::MapNode {
                key: boxed(key),
                value: boxed(value),
            }),
            WireLayout::Embedded { type_name } => Strategy::Embedded(ir_proto::EmbeddedNode {
                type_name: type_name.clone(),
            }),
        };

        ir_proto::WireLayout {
            strategy: Some(strategy),
        }
    }
}
