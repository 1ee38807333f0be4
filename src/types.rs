//! Rust representation of the registry as it appears in `vk.xml`.

use std::fmt;
use std::num::{NonZeroU8, NonZeroUsize};

/// Errors from which parser cannot recover.
#[derive(Debug)]
#[non_exhaustive]
pub enum FatalError {
    MissingRegistryElement,
    IoError(std::io::Error),
    XmlError(xml::reader::Error),
}

impl From<std::io::Error> for FatalError {
    fn from(v: std::io::Error) -> FatalError {
        FatalError::IoError(v)
    }
}

impl From<xml::reader::Error> for FatalError {
    fn from(v: xml::reader::Error) -> FatalError {
        FatalError::XmlError(v)
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::MissingRegistryElement => write!(f, "missing <registry> root element"),
            FatalError::IoError(e) => write!(f, "{}", e),
            FatalError::XmlError(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FatalError::MissingRegistryElement => None,
            FatalError::IoError(e) => Some(e),
            FatalError::XmlError(e) => Some(e),
        }
    }
}

/// Errors from which parser can recover.
///
/// `xpath` is the location of the element which produced the error. Unknown
/// elements and attributes are tolerated; everything else loses information
/// that generation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    UnexpectedElement {
        xpath: String,
        name: String,
    },
    UnexpectedAttribute {
        xpath: String,
        name: String,
    },
    UnexpectedAttributeValue {
        xpath: String,
        name: String,
        value: String,
    },
    MissingElement {
        xpath: String,
        name: String,
    },
    MissingAttribute {
        xpath: String,
        name: String,
    },
    SchemaViolation {
        xpath: String,
        desc: String,
    },
    InvalidDeclaration {
        xpath: String,
        code: String,
        desc: String,
    },
    ParseIntError {
        xpath: String,
        text: String,
        error: std::num::ParseIntError,
    },
    Internal {
        desc: &'static str,
    },
}

impl Error {
    /// Whether this diagnostic makes the registry unusable for generation.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::UnexpectedElement { .. } | Error::UnexpectedAttribute { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedElement { xpath, name } => {
                write!(f, "{}: unexpected element <{}>", xpath, name)
            }
            Error::UnexpectedAttribute { xpath, name } => {
                write!(f, "{}: unexpected attribute '{}'", xpath, name)
            }
            Error::UnexpectedAttributeValue { xpath, name, value } => {
                write!(f, "{}: unexpected value '{}' of attribute '{}'", xpath, value, name)
            }
            Error::MissingElement { xpath, name } => {
                write!(f, "{}: missing element <{}>", xpath, name)
            }
            Error::MissingAttribute { xpath, name } => {
                write!(f, "{}: missing attribute '{}'", xpath, name)
            }
            Error::SchemaViolation { xpath, desc } => write!(f, "{}: {}", xpath, desc),
            Error::InvalidDeclaration { xpath, code, desc } => {
                write!(f, "{}: invalid declaration '{}': {}", xpath, code.trim(), desc)
            }
            Error::ParseIntError { xpath, text, error } => {
                write!(f, "{}: '{}' is not an integer: {}", xpath, text, error)
            }
            Error::Internal { desc } => write!(f, "internal parser error: {}", desc),
        }
    }
}

/// Returns whether an element tagged with `api` belongs to `target`.
///
/// Untagged elements belong to every API. Tags are comma separated lists.
pub fn api_matches(api: Option<&str>, target: &str) -> bool {
    match api {
        None => true,
        Some(list) => list.split(',').any(|a| a.trim() == target),
    }
}

/// Rust equivalent of `vk.xml` root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Registry {
    pub comment: Option<String>,
    pub platforms: Vec<Platform>,
    pub tags: Vec<Tag>,
    /// Type declarations in registry order.
    pub types: Vec<Type>,
    pub enums: Vec<Enums>,
    pub commands: Vec<Command>,
    pub features: Vec<Feature>,
    pub extensions: Vec<Extension>,
}

impl Registry {
    /// Name of the `<enums>` block holding the API constants.
    pub const API_CONSTANTS: &'static str = "API Constants";

    /// Looks up an API constant by name.
    pub fn constant(&self, name: &str) -> Option<&Enum> {
        self.enums
            .iter()
            .filter(|e| e.is_constants())
            .flat_map(|e| e.children.iter())
            .find(|e| e.name == name)
    }

    /// Looks up a `basetype` or `bitmask` typedef by name.
    pub fn typedef(&self, name: &str) -> Option<(&str, &str)> {
        self.types.iter().find_map(|t| match &t.definition {
            TypeDefinition::BaseType(td) if td.name == name => Some((td.name.as_str(), td.base.as_str())),
            TypeDefinition::Bitmask(TypeBitmask::Definition { name: n, base, .. }) if n == name => {
                Some((n.as_str(), base.as_str()))
            }
            _ => None,
        })
    }

    /// Follows `basetype` typedefs down to the first non-typedef name.
    pub fn base_type<'a>(&'a self, name: &'a str) -> crate::error::Result<&'a str> {
        let mut chain = vec![name];
        let mut current = name;
        while let Some((_, base)) = self.typedef(current) {
            if chain.contains(&base) {
                chain.push(base);
                return Err(crate::error::GenError::AliasCycle {
                    name: name.to_string(),
                    chain: chain.join(" -> "),
                });
            }
            chain.push(base);
            current = base;
        }
        Ok(current)
    }

    /// Looks up an `<enums>` block by name.
    pub fn enums_block(&self, name: &str) -> Option<&Enums> {
        self.enums.iter().find(|e| e.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Platform {
    pub name: String,
    pub protect: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Tag {
    pub name: String,
    pub author: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Type {
    pub api: Option<String>,
    pub requires: Option<String>,
    pub comment: Option<String>,
    pub definition: TypeDefinition,
}

impl Type {
    pub fn name(&self) -> &str {
        self.definition.name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum TypeDefinition {
    /// Type provided by a platform or C standard header.
    External { name: String },
    Include { name: String },
    Define { name: String },
    BaseType(TypeDef),
    /// Forward-declared platform struct only ever used behind a pointer.
    Opaque { name: String },
    Bitmask(TypeBitmask),
    Handle(TypeHandle),
    Enumeration { name: String, alias: Option<String> },
    FunctionPointer(TypeFunctionPointer),
    Struct(TypeStruct),
    Union(TypeStruct),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::External { name }
            | TypeDefinition::Include { name }
            | TypeDefinition::Define { name }
            | TypeDefinition::Opaque { name }
            | TypeDefinition::Enumeration { name, .. } => name,
            TypeDefinition::BaseType(td) => &td.name,
            TypeDefinition::Bitmask(b) => b.name(),
            TypeDefinition::Handle(h) => h.name(),
            TypeDefinition::FunctionPointer(fp) => &fp.proto.name,
            TypeDefinition::Struct(s) | TypeDefinition::Union(s) => s.name(),
        }
    }
}

/// `typedef <base> <name>;`, optionally through a pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TypeDef {
    pub name: String,
    pub base: String,
    pub pointer_level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TypeBitmask {
    Alias {
        name: String,
        alias: String,
    },
    Definition {
        name: String,
        base: String,
        /// Name of the `FlagBits` enumeration holding the bit values.
        bits: Option<String>,
    },
}

impl TypeBitmask {
    pub fn name(&self) -> &str {
        match self {
            TypeBitmask::Alias { name, .. } | TypeBitmask::Definition { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TypeHandle {
    Alias {
        name: String,
        alias: String,
    },
    Definition {
        name: String,
        handle_type: HandleType,
        parent: Option<String>,
        objtypeenum: Option<String>,
    },
}

impl TypeHandle {
    pub fn name(&self) -> &str {
        match self {
            TypeHandle::Alias { name, .. } | TypeHandle::Definition { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum HandleType {
    Dispatch,
    NoDispatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TypeFunctionPointer {
    pub proto: NameWithType,
    pub params: Vec<NameWithType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TypeStruct {
    Alias {
        name: String,
        alias: String,
    },
    Definition {
        name: String,
        members: Vec<Member>,
        returned_only: bool,
        struct_extends: Vec<String>,
    },
}

impl TypeStruct {
    pub fn name(&self) -> &str {
        match self {
            TypeStruct::Alias { name, .. } | TypeStruct::Definition { name, .. } => name,
        }
    }
}

/// Member of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Member {
    pub owner: String,
    pub definition: NameWithType,
    /// Comma separated list of APIs this member belongs to.
    pub api: Option<String>,
    pub values: Option<String>,
    pub explicit_offset: Option<usize>,
}

impl Member {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn type_name(&self) -> &str {
        &self.definition.type_name
    }

    pub fn pointer_level(&self) -> usize {
        self.definition.pointer_level()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum PointerKind {
    Single {
        is_const: bool,
    },
    Double {
        is_const: bool,
        inner_is_const: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ArrayLength {
    /// Length given by integer literal.
    Static(NonZeroUsize),
    /// Length given by API constant.
    Constant(String),
}

/// Parsed C declaration such as `const char* const* ppEnabledLayerNames`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct NameWithType {
    pub type_name: String,
    /// `const` before the type name.
    pub is_const: bool,
    pub pointer_kind: Option<PointerKind>,
    pub is_struct: bool,
    pub bitfield_size: Option<NonZeroU8>,
    pub array_shape: Option<Vec<ArrayLength>>,
    pub name: String,
}

impl NameWithType {
    pub fn pointer_level(&self) -> usize {
        match self.pointer_kind {
            None => 0,
            Some(PointerKind::Single { .. }) => 1,
            Some(PointerKind::Double { .. }) => 2,
        }
    }

    pub fn is_array(&self) -> bool {
        self.array_shape.as_ref().map_or(false, |s| !s.is_empty())
    }
}

/// `<enums>` block: API constants or the values of one enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Enums {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub bitwidth: Option<u32>,
    pub comment: Option<String>,
    pub children: Vec<Enum>,
}

impl Enums {
    pub fn is_constants(&self) -> bool {
        self.kind.as_deref() == Some("constants")
            || self.name.as_deref() == Some(Registry::API_CONSTANTS)
    }

    pub fn is_bitmask(&self) -> bool {
        self.kind.as_deref() == Some("bitmask")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Enum {
    pub name: String,
    pub comment: Option<String>,
    /// C type of an API constant (`uint32_t`, `float`, ...).
    pub type_suffix: Option<String>,
    pub api: Option<String>,
    pub spec: EnumSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum EnumSpec {
    /// Reference to a value defined elsewhere.
    None,
    Alias {
        alias: String,
        extends: Option<String>,
    },
    /// Extension enumerant, `1000000000 + (extnumber - 1) * 1000 + offset`.
    Offset {
        offset: i64,
        extends: String,
        extnumber: Option<i64>,
        /// False when `dir="-"`.
        dir: bool,
    },
    Bitpos {
        bitpos: i64,
        extends: Option<String>,
    },
    Value {
        value: String,
        extends: Option<String>,
    },
}

impl EnumSpec {
    pub fn extends(&self) -> Option<&str> {
        match self {
            EnumSpec::None => None,
            EnumSpec::Offset { extends, .. } => Some(extends),
            EnumSpec::Alias { extends, .. }
            | EnumSpec::Bitpos { extends, .. }
            | EnumSpec::Value { extends, .. } => extends.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Command {
    Alias { name: String, alias: String },
    Definition(Box<CommandDefinition>),
}

impl Command {
    pub fn name(&self) -> &str {
        match self {
            Command::Alias { name, .. } => name,
            Command::Definition(d) => &d.proto.name,
        }
    }

    pub fn api(&self) -> Option<&str> {
        match self {
            Command::Alias { .. } => None,
            Command::Definition(d) => d.api.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct CommandDefinition {
    pub api: Option<String>,
    pub comment: Option<String>,
    pub successcodes: Option<String>,
    pub errorcodes: Option<String>,
    pub proto: NameWithType,
    pub params: Vec<CommandParam>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CommandParam {
    pub api: Option<String>,
    pub len: Option<String>,
    pub optional: Option<String>,
    pub definition: NameWithType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Feature {
    pub api: String,
    pub name: String,
    pub number: String,
    pub depends: Option<String>,
    pub comment: Option<String>,
    pub children: Vec<ExtensionChild>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct Extension {
    pub name: String,
    pub number: Option<i64>,
    pub ext_type: Option<String>,
    pub platform: Option<String>,
    pub supported: Option<String>,
    pub provisional: bool,
    pub promotedto: Option<String>,
    /// `depends` expression, or the older `requires` list.
    pub depends: Option<String>,
    pub comment: Option<String>,
    pub children: Vec<ExtensionChild>,
}

impl Extension {
    /// Whether the `supported` attribute lists `api`.
    pub fn supports(&self, api: &str) -> bool {
        match &self.supported {
            Some(list) => list.split(',').any(|s| s == api),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ExtensionChild {
    Require {
        api: Option<String>,
        depends: Option<String>,
        comment: Option<String>,
        items: Vec<InterfaceItem>,
    },
    Remove {
        api: Option<String>,
        comment: Option<String>,
        items: Vec<InterfaceItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum InterfaceItem {
    Comment(String),
    Type { name: String, comment: Option<String> },
    Enum(Enum),
    Command { name: String, comment: Option<String> },
}
