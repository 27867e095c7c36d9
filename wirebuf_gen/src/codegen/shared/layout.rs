//! Wire layout classification shared by every emitter and back-end.
//!
//! Every [`TypeDescriptor`] maps to exactly one wire strategy: a fixed-width
//! scalar, a presence-flagged nullable scalar, a length-prefixed string or
//! byte block, a raw fixed byte block, a fixed or length-prefixed sequence, a
//! length-prefixed map, or an embedded struct. [`classify`] resolves one level
//! and borrows the child descriptors; [`WireLayout::of`] resolves the whole
//! tree.
//!
//! # Example
//! ```
//! use wirebuf_gen::codegen::shared::layout::*;
//! use wirebuf_gen::types::{Kind, TypeDescriptor};
//!
//! let ty = TypeDescriptor::array(TypeDescriptor::new(Kind::Int16), 0);
//! let layout = WireLayout::of(&ty).unwrap();
//! assert_eq!(
//!     layout,
//!     WireLayout::DynamicArray { elem: Box::new(WireLayout::Fixed { scalar: Scalar::I16 }) }
//! );
//! assert_eq!(layout.static_width(), None);
//! ```

use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use wirebuf_types::{Document, Kind, TypeDescriptor};

/// Schema version stamped on every exported layout IR.
pub const LAYOUT_IR_VERSION: u32 = 1;

/// Width in bytes of every string/bytes/array/map length prefix.
pub const LENGTH_PREFIX_WIDTH: u64 = 4;

/// Width in bytes of the presence flag preceding a nullable scalar.
pub const PRESENCE_FLAG_WIDTH: u64 = 1;

/// Largest element count decoders accept for a container whose elements
/// occupy no wire bytes. Every other count is bounded by the remaining input.
pub const MAX_EMPTY_ELEMENTS: u64 = 1 << 16;

/// Byte order used for every multi-byte scalar on the wire.
pub const BYTE_ORDER: Endianness = Endianness::Little;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Endianness {
    Little,
    Big,
}

/// Fixed-width wire scalar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Scalar {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Scalar {
    pub const ALL: [Scalar; 11] = [
        Scalar::Bool,
        Scalar::I8,
        Scalar::U8,
        Scalar::I16,
        Scalar::U16,
        Scalar::I32,
        Scalar::U32,
        Scalar::I64,
        Scalar::U64,
        Scalar::F32,
        Scalar::F64,
    ];

    pub fn width(self) -> u64 {
        match self {
            Scalar::Bool | Scalar::I8 | Scalar::U8 => 1,
            Scalar::I16 | Scalar::U16 => 2,
            Scalar::I32 | Scalar::U32 | Scalar::F32 => 4,
            Scalar::I64 | Scalar::U64 | Scalar::F64 => 8,
        }
    }

    /// INT and UINT travel as 64-bit scalars.
    pub fn from_kind(kind: Kind) -> Option<Scalar> {
        match kind {
            Kind::Bool => Some(Scalar::Bool),
            Kind::Int8 => Some(Scalar::I8),
            Kind::Uint8 => Some(Scalar::U8),
            Kind::Int16 => Some(Scalar::I16),
            Kind::Uint16 => Some(Scalar::U16),
            Kind::Int32 => Some(Scalar::I32),
            Kind::Uint32 => Some(Scalar::U32),
            Kind::Int | Kind::Int64 => Some(Scalar::I64),
            Kind::Uint | Kind::Uint64 => Some(Scalar::U64),
            Kind::Float32 => Some(Scalar::F32),
            Kind::Float64 => Some(Scalar::F64),
            _ => None,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Scalar::F32 | Scalar::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Scalar::I8 | Scalar::I16 | Scalar::I32 | Scalar::I64 | Scalar::F32 | Scalar::F64
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{kind:?} descriptor is missing its elem type")]
    MissingElem { kind: Kind },
    #[error("map descriptor is missing its key type")]
    MissingKey,
    #[error("struct descriptor is missing its name")]
    MissingStructName,
    #[error("field '{struct_name}.{field}': {source}")]
    Field {
        struct_name: String,
        field: String,
        #[source]
        source: Box<LayoutError>,
    },
}

/// One level of classification; child descriptors are borrowed so the
/// emitters can keep walking the descriptor tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy<'a> {
    Fixed(Scalar),
    Nullable(Scalar),
    String,
    FixedBytes { len: u32 },
    DynamicBytes,
    FixedArray { len: u32, elem: &'a TypeDescriptor },
    DynamicArray { elem: &'a TypeDescriptor },
    Map {
        key: &'a TypeDescriptor,
        value: &'a TypeDescriptor,
    },
    Embedded { type_name: &'a str },
}

/// Classify a descriptor. Pointers to numeric/bool kinds become nullable
/// scalars; every other pointer is unwrapped to its pointee.
pub fn classify(ty: &TypeDescriptor) -> Result<Strategy<'_>, LayoutError> {
    if let Some(scalar) = Scalar::from_kind(ty.kind) {
        return Ok(Strategy::Fixed(scalar));
    }
    match ty.kind {
        Kind::String => Ok(Strategy::String),
        Kind::Bytes => Ok(if ty.is_fixed_length() {
            Strategy::FixedBytes { len: ty.len }
        } else {
            Strategy::DynamicBytes
        }),
        Kind::Array => {
            let elem = require_elem(ty)?;
            Ok(if ty.is_fixed_length() {
                Strategy::FixedArray { len: ty.len, elem }
            } else {
                Strategy::DynamicArray { elem }
            })
        }
        Kind::Map => {
            let value = require_elem(ty)?;
            let key = ty.key().ok_or(LayoutError::MissingKey)?;
            Ok(Strategy::Map { key, value })
        }
        Kind::Pointer => {
            let pointee = require_elem(ty)?;
            match Scalar::from_kind(pointee.kind) {
                Some(scalar) => Ok(Strategy::Nullable(scalar)),
                None => classify(pointee),
            }
        }
        Kind::Struct => ty
            .name()
            .map(|type_name| Strategy::Embedded { type_name })
            .ok_or(LayoutError::MissingStructName),
        _ => unreachable!("scalar kinds are classified above"),
    }
}

fn require_elem(ty: &TypeDescriptor) -> Result<&TypeDescriptor, LayoutError> {
    ty.elem().ok_or(LayoutError::MissingElem { kind: ty.kind })
}

/// Strip transparent pointer wrappers, leaving nullable scalars in place.
pub fn unwrap_pointers(ty: &TypeDescriptor) -> &TypeDescriptor {
    match (ty.kind, ty.elem()) {
        (Kind::Pointer, Some(pointee)) if !pointee.kind.is_scalar() => unwrap_pointers(pointee),
        _ => ty,
    }
}

/// Fully resolved wire layout tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum WireLayout {
    Fixed { scalar: Scalar },
    Nullable { scalar: Scalar },
    String,
    FixedBytes { len: u32 },
    DynamicBytes,
    FixedArray { len: u32, elem: Box<WireLayout> },
    DynamicArray { elem: Box<WireLayout> },
    Map {
        key: Box<WireLayout>,
        value: Box<WireLayout>,
    },
    Embedded { type_name: String },
}

impl WireLayout {
    pub fn of(ty: &TypeDescriptor) -> Result<Self, LayoutError> {
        Ok(match classify(ty)? {
            Strategy::Fixed(scalar) => WireLayout::Fixed { scalar },
            Strategy::Nullable(scalar) => WireLayout::Nullable { scalar },
            Strategy::String => WireLayout::String,
            Strategy::FixedBytes { len } => WireLayout::FixedBytes { len },
            Strategy::DynamicBytes => WireLayout::DynamicBytes,
            Strategy::FixedArray { len, elem } => WireLayout::FixedArray {
                len,
                elem: Box::new(WireLayout::of(elem)?),
            },
            Strategy::DynamicArray { elem } => WireLayout::DynamicArray {
                elem: Box::new(WireLayout::of(elem)?),
            },
            Strategy::Map { key, value } => WireLayout::Map {
                key: Box::new(WireLayout::of(key)?),
                value: Box::new(WireLayout::of(value)?),
            },
            Strategy::Embedded { type_name } => WireLayout::Embedded {
                type_name: type_name.to_string(),
            },
        })
    }

    /// Encoded width when it never depends on the instance. Embedded structs
    /// are always treated as instance-dependent.
    pub fn static_width(&self) -> Option<u64> {
        match self {
            WireLayout::Fixed { scalar } => Some(scalar.width()),
            WireLayout::FixedBytes { len } => Some(u64::from(*len)),
            WireLayout::FixedArray { len, elem } => elem
                .static_width()
                .and_then(|width| width.checked_mul(u64::from(*len))),
            _ => None,
        }
    }
}

impl WireLayout {
    /// Fewest bytes any instance of this layout occupies. `embedded` answers
    /// the same question for a struct by name.
    pub fn min_width(&self, embedded: &mut dyn FnMut(&str) -> u64) -> u64 {
        match self {
            WireLayout::Fixed { scalar } => scalar.width(),
            WireLayout::Nullable { .. } => PRESENCE_FLAG_WIDTH,
            WireLayout::String
            | WireLayout::DynamicBytes
            | WireLayout::DynamicArray { .. }
            | WireLayout::Map { .. } => LENGTH_PREFIX_WIDTH,
            WireLayout::FixedBytes { len } => u64::from(*len),
            WireLayout::FixedArray { len, elem } => {
                elem.min_width(embedded).saturating_mul(u64::from(*len))
            }
            WireLayout::Embedded { type_name } => embedded(type_name),
        }
    }
}

/// Encoded width of a descriptor when it is schema-known.
pub fn static_width(ty: &TypeDescriptor) -> Result<Option<u64>, LayoutError> {
    Ok(WireLayout::of(ty)?.static_width())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub name: String,
    pub layout: WireLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
}

impl StructLayout {
    /// Sum of the field widths when every field is schema-known.
    pub fn static_width(&self) -> Option<u64> {
        self.fields
            .iter()
            .try_fold(0u64, |acc, f| acc.checked_add(f.layout.static_width()?))
    }
}

/// Layouts of every codec-bearing struct of a document, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub version: u32,
    pub package: String,
    pub byte_order: Endianness,
    pub structs: Vec<StructLayout>,
}

impl DocumentLayout {
    pub fn build(document: &Document) -> Result<Self, LayoutError> {
        let structs = document
            .message_structs()
            .map(|s| {
                let fields = s
                    .fields
                    .iter()
                    .map(|field| {
                        WireLayout::of(&field.ty)
                            .map(|layout| FieldLayout {
                                name: field.name.clone(),
                                layout,
                            })
                            .map_err(|source| LayoutError::Field {
                                struct_name: s.name.clone(),
                                field: field.name.clone(),
                                source: Box::new(source),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(StructLayout {
                    name: s.name.clone(),
                    fields,
                })
            })
            .collect::<Result<Vec<_>, LayoutError>>()?;

        Ok(Self {
            version: LAYOUT_IR_VERSION,
            package: document.package.clone(),
            byte_order: BYTE_ORDER,
            structs,
        })
    }

    pub fn get(&self, name: &str) -> Option<&StructLayout> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Minimum encoded width of every struct. Unknown structs and struct
    /// cycles contribute zero, so the result never overstates a width.
    pub fn struct_min_widths(&self) -> HashMap<String, u64> {
        let mut done = HashMap::new();
        for s in &self.structs {
            self.struct_min_width(&s.name, &mut done, &mut Vec::new());
        }
        done
    }

    fn struct_min_width(
        &self,
        name: &str,
        done: &mut HashMap<String, u64>,
        visiting: &mut Vec<String>,
    ) -> u64 {
        if let Some(width) = done.get(name) {
            return *width;
        }
        if visiting.iter().any(|v| v == name) {
            return 0;
        }
        let Some(layout) = self.get(name) else {
            return 0;
        };
        visiting.push(name.to_string());
        let mut total = 0u64;
        for field in &layout.fields {
            let width = field
                .layout
                .min_width(&mut |inner| self.struct_min_width(inner, done, visiting));
            total = total.saturating_add(width);
        }
        visiting.pop();
        done.insert(name.to_string(), total);
        total
    }
}
