//! Language-agnostic codec IR shared by every codegen backend.
//!
//! The builder lowers each struct into three op lists (size, marshal and
//! unmarshal). Ops carry every decision about wire layout, iteration and
//! temporaries; backends only translate them into target syntax. Offsets are
//! implicit: every write/read op advances the running offset of the function
//! by exactly the bytes it touches, in op order.
//!
//! # Example
//! ```
//! use wirebuf_gen::codegen::shared::ir::*;
//! use wirebuf_gen::codegen::shared::layout::Scalar;
//!
//! let codec = TypeCodec {
//!     type_name: "PingReq".into(),
//!     fields: vec![],
//!     size: vec![Op::AddSize { term: SizeTerm::Const { bytes: 4 } }],
//!     marshal: vec![Op::WriteScalar { scalar: Scalar::I32, value: Place::field("Seq") }],
//!     unmarshal: vec![Op::ReadScalar { scalar: Scalar::I32, target: Place::field("Seq") }],
//! };
//! let ir = CodecIr::new("module1", vec![codec]);
//!
//! assert_eq!(ir.version, CODEC_IR_VERSION);
//! assert_eq!(ir.types[0].constant_size(), Some(4));
//! ```

use super::layout::{FieldLayout, Scalar};
use serde_derive::{Deserialize, Serialize};
use wirebuf_types::TypeDescriptor;

/// Schema version used for every serialized codec IR export.
pub const CODEC_IR_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecIr {
    pub version: u32,
    pub package: String,
    pub types: Vec<TypeCodec>,
}

impl CodecIr {
    pub fn new(package: impl Into<String>, types: Vec<TypeCodec>) -> Self {
        Self {
            version: CODEC_IR_VERSION,
            package: package.into(),
            types,
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeCodec> {
        self.types.iter().find(|t| t.type_name == type_name)
    }
}

/// Size, marshal and unmarshal programs of a single struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCodec {
    pub type_name: String,
    pub fields: Vec<FieldLayout>,
    pub size: Vec<Op>,
    pub marshal: Vec<Op>,
    pub unmarshal: Vec<Op>,
}

impl TypeCodec {
    /// Total size when the size program is only constant terms.
    pub fn constant_size(&self) -> Option<u64> {
        self.size.iter().try_fold(0u64, |acc, op| match op {
            Op::AddSize {
                term: SizeTerm::Const { bytes },
            } => acc.checked_add(*bytes),
            _ => None,
        })
    }
}

/// Storage location an op reads from or writes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "place", rename_all = "kebab-case")]
pub enum Place {
    /// A field of the struct the function belongs to.
    Field { name: String },
    /// A temporary declared by an earlier op of the same function.
    Local { name: String },
}

impl Place {
    pub fn field(name: impl Into<String>) -> Self {
        Place::Field { name: name.into() }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Place::Local { name: name.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            Place::Field { name } | Place::Local { name } => name,
        }
    }
}

/// Element count of a container being built on the unmarshal side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "count", rename_all = "kebab-case")]
pub enum Count {
    Fixed { len: u32 },
    Var { name: String },
}

/// One addend of a size program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "term", rename_all = "kebab-case")]
pub enum SizeTerm {
    Const { bytes: u64 },
    /// Encoded UTF-8 length of a string.
    Utf8Len { of: Place },
    /// Length of a byte block.
    ByteLen { of: Place },
    /// Element count of a container times a static element width.
    CountTimes { of: Place, width: u64 },
    /// Width of a nullable scalar's value when present. The presence flag is a
    /// separate constant term.
    Optional { value: Place, width: u64 },
    /// Size of an embedded struct.
    Nested { of: Place },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Op {
    AddSize {
        term: SizeTerm,
    },

    WriteScalar {
        scalar: Scalar,
        value: Place,
    },
    WriteNullable {
        scalar: Scalar,
        value: Place,
    },
    WriteString {
        value: Place,
    },
    /// `len` is the schema length of a fixed block; fixed blocks have no prefix.
    WriteBytes {
        value: Place,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<u32>,
    },
    /// Length prefix of a dynamic container.
    WriteCount {
        of: Place,
    },
    /// A fixed-length container must hold exactly `len` elements before it
    /// is written; the size program already counted `len` of them.
    CheckLen {
        of: Place,
        len: u32,
    },
    MarshalNested {
        value: Place,
    },

    ReadScalar {
        scalar: Scalar,
        target: Place,
    },
    ReadNullable {
        scalar: Scalar,
        target: Place,
    },
    ReadString {
        target: Place,
    },
    ReadBytes {
        target: Place,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        len: Option<u32>,
    },
    /// Read a length prefix into a fresh local. `min_width` is the fewest
    /// bytes one element (or key/value pair) occupies; a count the remaining
    /// input cannot hold is rejected before any element is read.
    ReadCount {
        var: String,
        #[serde(default)]
        min_width: u64,
    },
    UnmarshalNested {
        target: Place,
        ty: TypeDescriptor,
    },

    /// Declare a temporary holding a default value of `ty`.
    DeclareLocal {
        var: String,
        ty: TypeDescriptor,
    },
    NewList {
        var: String,
        elem: TypeDescriptor,
        len: Count,
    },
    NewMap {
        var: String,
        key: TypeDescriptor,
        value: TypeDescriptor,
    },
    /// Store `item` into `list`; at position `index` when the list was
    /// pre-sized, at the end otherwise.
    Append {
        list: String,
        item: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
    },
    Insert {
        map: String,
        key: String,
        value: String,
    },
    /// Move a finished local into its final place.
    Assign {
        target: Place,
        var: String,
    },

    ForEach {
        source: Place,
        item: String,
        body: Vec<Op>,
    },
    ForEachEntry {
        source: Place,
        key: String,
        value: String,
        body: Vec<Op>,
    },
    Repeat {
        count: Count,
        index: String,
        body: Vec<Op>,
    },
}

impl Op {
    /// Nested op bodies, for walkers that do not care about the op itself.
    pub fn body(&self) -> Option<&[Op]> {
        match self {
            Op::ForEach { body, .. } | Op::ForEachEntry { body, .. } | Op::Repeat { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}

/// Visit every op of a program depth-first, in program order.
pub fn walk_ops<'a>(ops: &'a [Op], visit: &mut dyn FnMut(&'a Op)) {
    for op in ops {
        visit(op);
        if let Some(body) = op.body() {
            walk_ops(body, visit);
        }
    }
}

/// Hands out per-function temporary names (`count0`, `item1`, ...).
#[derive(Debug, Default)]
pub struct VarAllocator {
    next: u32,
}

impl VarAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, stem: &str) -> String {
        let name = format!("{}{}", stem, self.next);
        self.next += 1;
        name
    }
}
