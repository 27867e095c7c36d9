use serde_derive::{Deserialize, Serialize};

/// Name suffix marking a request struct when no explicit role is given.
pub const REQUEST_SUFFIX: &str = "Req";
/// Name suffix marking a response struct when no explicit role is given.
pub const RESPONSE_SUFFIX: &str = "Rsp";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Int,
    Uint,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    Bytes,
    Bool,
    Array,
    Map,
    Pointer,
    Struct,
}

impl Kind {
    /* Numeric and boolean kinds: encoded as fixed-width scalars */
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Kind::Int
                | Kind::Uint
                | Kind::Int8
                | Kind::Uint8
                | Kind::Int16
                | Kind::Uint16
                | Kind::Int32
                | Kind::Uint32
                | Kind::Int64
                | Kind::Uint64
                | Kind::Float32
                | Kind::Float64
                | Kind::Bool
        )
    }

    /* Kinds that must carry an element descriptor */
    pub fn requires_elem(self) -> bool {
        matches!(self, Kind::Array | Kind::Map | Kind::Pointer)
    }

    /* Kinds that must carry a key descriptor */
    pub fn requires_key(self) -> bool {
        matches!(self, Kind::Map)
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Recursive type descriptor as produced by the upstream schema parser.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDescriptor {
    pub kind: Kind,
    /// Element type for ARRAY, MAP (value side) and POINTER.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem: Option<Box<TypeDescriptor>>,
    /// Key type, MAP only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Box<TypeDescriptor>>,
    /// 0 means dynamic; anything else is a fixed length for ARRAY and BYTES.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub len: u32,
    /// Explicit target-type name; required for STRUCT references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl TypeDescriptor {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            elem: None,
            key: None,
            len: 0,
            name: None,
        }
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn bytes(len: u32) -> Self {
        Self {
            len,
            ..Self::new(Kind::Bytes)
        }
    }

    pub fn array(elem: TypeDescriptor, len: u32) -> Self {
        Self {
            elem: Some(Box::new(elem)),
            len,
            ..Self::new(Kind::Array)
        }
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self {
            elem: Some(Box::new(value)),
            key: Some(Box::new(key)),
            ..Self::new(Kind::Map)
        }
    }

    pub fn pointer(elem: TypeDescriptor) -> Self {
        Self {
            elem: Some(Box::new(elem)),
            ..Self::new(Kind::Pointer)
        }
    }

    pub fn struct_ref(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Kind::Struct)
        }
    }

    /// Attach an explicit target-type name override.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn elem(&self) -> Option<&TypeDescriptor> {
        self.elem.as_deref()
    }

    pub fn key(&self) -> Option<&TypeDescriptor> {
        self.key.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn is_fixed_length(&self) -> bool {
        self.len != 0
    }
}

impl From<Kind> for TypeDescriptor {
    fn from(kind: Kind) -> Self {
        TypeDescriptor::new(kind)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Part a struct plays in the request/response protocol.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Request,
    Response,
    Plain,
}

impl Role {
    /* Name suffix conventionally carried by structs of this role */
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Role::Request => Some(REQUEST_SUFFIX),
            Role::Response => Some(RESPONSE_SUFFIX),
            Role::Plain => None,
        }
    }

    /* Infer the role from a struct name suffix */
    pub fn from_name(name: &str) -> Role {
        let has_suffix =
            |suffix: &str| name.len() > suffix.len() && name.ends_with(suffix);
        if has_suffix(REQUEST_SUFFIX) {
            Role::Request
        } else if has_suffix(RESPONSE_SUFFIX) {
            Role::Response
        } else {
            Role::Plain
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct StructDef {
    pub name: String,
    /// Explicit protocol role; inferred from the name suffix when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            role: None,
            fields,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn role(&self) -> Role {
        self.role.unwrap_or_else(|| Role::from_name(&self.name))
    }

    /// Shared name of the request/response pair this struct belongs to.
    pub fn logical_name(&self) -> Option<&str> {
        let role = self.role();
        let suffix = role.suffix()?;
        match self.name.strip_suffix(suffix) {
            Some(prefix) if !prefix.is_empty() => Some(prefix),
            _ => Some(self.name.as_str()),
        }
    }

    pub fn is_package_marker(&self, package: &str) -> bool {
        self.name.eq_ignore_ascii_case(package)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Document {
    pub package: String,
    #[serde(default)]
    pub structs: Vec<StructDef>,
}

impl Document {
    pub fn new(package: impl Into<String>, structs: Vec<StructDef>) -> Self {
        Self {
            package: package.into(),
            structs,
        }
    }

    /// Structs that take part in codec generation, in declaration order.
    pub fn message_structs(&self) -> impl Iterator<Item = &StructDef> {
        self.structs
            .iter()
            .filter(move |s| !s.is_package_marker(&self.package))
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDef> {
        self.message_structs().find(|s| s.name == name)
    }
}
