use prost::{Message, Oneof};

#[derive(Clone, PartialEq, Message)]
pub struct DocumentLayout {
    #[prost(uint32, tag = "1")]
    pub version: u32,
    #[prost(string, tag = "2")]
    pub package: String,
    #[prost(enumeration = "Endianness", tag = "3")]
    pub byte_order: i32,
    #[prost(message, repeated, tag = "4")]
    pub structs: Vec<StructLayout>,
}

#[derive(Clone, PartialEq, Message)]
pub struct StructLayout {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, repeated, tag = "2")]
    pub fields: Vec<FieldLayout>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FieldLayout {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub layout: Option<WireLayout>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Endianness {
    Little = 0,
    Big = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Scalar {
    Bool = 0,
    I8 = 1,
    U8 = 2,
    I16 = 3,
    U16 = 4,
    I32 = 5,
    U32 = 6,
    I64 = 7,
    U64 = 8,
    F32 = 9,
    F64 = 10,
}

#[derive(Clone, PartialEq, Message)]
pub struct WireLayout {
    #[prost(oneof = "wire_layout::Strategy", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9")]
    pub strategy: Option<wire_layout::Strategy>,
}

pub mod wire_layout {
    use super::*;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum Strategy {
        #[prost(message, tag = "1")]
        Fixed(super::ScalarNode),
        #[prost(message, tag = "2")]
        Nullable(super::ScalarNode),
        #[prost(message, tag = "3")]
        String(super::EmptyNode),
        #[prost(message, tag = "4")]
        FixedBytes(super::BytesNode),
        #[prost(message, tag = "5")]
        DynamicBytes(super::EmptyNode),
        #[prost(message, tag = "6")]
        FixedArray(super::ArrayNode),
        #[prost(message, tag = "7")]
        DynamicArray(super::ArrayNode),
        #[prost(message, tag = "8")]
        Map(super::MapNode),
        #[prost(message, tag = "9")]
        Embedded(super::EmbeddedNode),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct EmptyNode {}

#[derive(Clone, PartialEq, Message)]
pub struct ScalarNode {
    #[prost(enumeration = "Scalar", tag = "1")]
    pub scalar: i32,
    #[prost(uint64, tag = "2")]
    pub width: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct BytesNode {
    #[prost(uint32, tag = "1")]
    pub len: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ArrayNode {
    /// Zero for length-prefixed arrays.
    #[prost(uint32, tag = "1")]
    pub len: u32,
    #[prost(message, optional, tag = "2")]
    pub elem: Option<Box<WireLayout>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MapNode {
    #[prost(message, optional, tag = "1")]
    pub key: Option<Box<WireLayout>>,
    #[prost(message, optional, tag = "2")]
    pub value: Option<Box<WireLayout>>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EmbeddedNode {
    #[prost(string, tag = "1")]
    pub type_name: String,
}
