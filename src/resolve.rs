//! Maps registry type names and C declarations to Rust types.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{GenError, Result};
use crate::names;
use crate::types::{NameWithType, PointerKind};
use crate::view::{Alias, AliasKind, VersionView, ViewType};

/// C types with a fixed Rust counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Char,
    Int,
    Float,
    Double,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Size,
}

impl Primitive {
    pub fn from_c_name(name: &str) -> Option<Primitive> {
        Some(match name {
            "void" => Primitive::Void,
            "char" => Primitive::Char,
            "int" => Primitive::Int,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "int8_t" => Primitive::Int8,
            "uint8_t" => Primitive::Uint8,
            "int16_t" => Primitive::Int16,
            "uint16_t" => Primitive::Uint16,
            "int32_t" => Primitive::Int32,
            "uint32_t" => Primitive::Uint32,
            "int64_t" => Primitive::Int64,
            "uint64_t" => Primitive::Uint64,
            "size_t" => Primitive::Size,
            _ => return None,
        })
    }

    pub fn rust_name(self) -> &'static str {
        match self {
            Primitive::Void => "c_void",
            Primitive::Char => "c_char",
            Primitive::Int => "c_int",
            Primitive::Float => "f32",
            Primitive::Double => "f64",
            Primitive::Int8 => "i8",
            Primitive::Uint8 => "u8",
            Primitive::Int16 => "i16",
            Primitive::Uint16 => "u16",
            Primitive::Int32 => "i32",
            Primitive::Uint32 => "u32",
            Primitive::Int64 => "i64",
            Primitive::Uint64 => "u64",
            Primitive::Size => "usize",
        }
    }

    /// Size in bytes, `None` for `void`.
    pub fn size(self, pointer_width: usize) -> Option<usize> {
        match self {
            Primitive::Void => None,
            Primitive::Char | Primitive::Int8 | Primitive::Uint8 => Some(1),
            Primitive::Int16 | Primitive::Uint16 => Some(2),
            Primitive::Int | Primitive::Float | Primitive::Int32 | Primitive::Uint32 => Some(4),
            Primitive::Double | Primitive::Int64 | Primitive::Uint64 => Some(8),
            Primitive::Size => Some(pointer_width),
        }
    }
}

/// A Rust type as it is written in the bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    /// `void` return type.
    Unit,
    Primitive(Primitive),
    Named(String),
    Pointer {
        mutable: bool,
        pointee: Box<TargetType>,
    },
    Array {
        element: Box<TargetType>,
        len: usize,
    },
}

impl TargetType {
    pub fn pointer(mutable: bool, pointee: TargetType) -> TargetType {
        // `void*` points at c_void, never at ()
        let pointee = match pointee {
            TargetType::Unit => TargetType::Primitive(Primitive::Void),
            other => other,
        };
        TargetType::Pointer {
            mutable,
            pointee: Box::new(pointee),
        }
    }

    pub fn is_unit(&self) -> bool {
        *self == TargetType::Unit
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetType::Unit => write!(f, "()"),
            TargetType::Primitive(p) => write!(f, "{}", p.rust_name()),
            TargetType::Named(name) => write!(f, "{}", name),
            TargetType::Pointer { mutable: true, pointee } => write!(f, "*mut {}", pointee),
            TargetType::Pointer { mutable: false, pointee } => write!(f, "*const {}", pointee),
            TargetType::Array { element, len } => write!(f, "[{}; {}]", element, len),
        }
    }
}

/// How typedefs are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Flags types keep their enumeration name.
    Declared,
    /// Every typedef is replaced by its base type.
    Collapsed,
}

pub struct Resolver<'a> {
    view: &'a VersionView,
    external_types: &'a BTreeMap<String, String>,
}

impl<'a> Resolver<'a> {
    pub fn new(view: &'a VersionView, external_types: &'a BTreeMap<String, String>) -> Resolver<'a> {
        Resolver {
            view,
            external_types,
        }
    }

    /// Resolves `name` behind `pointer_level` mutable pointers.
    pub fn resolve(&self, name: &str, pointer_level: usize) -> Result<TargetType> {
        let mut ty = self.resolve_base(name, ResolveMode::Declared, pointer_level)?;
        for _ in 0..pointer_level {
            ty = TargetType::pointer(true, ty);
        }
        Ok(ty)
    }

    /// Resolves a declaration without its array dimensions.
    pub fn resolve_declaration(&self, decl: &NameWithType, mode: ResolveMode) -> Result<TargetType> {
        let base = self.resolve_base(&decl.type_name, mode, decl.pointer_level())?;
        Ok(match decl.pointer_kind {
            None => base,
            Some(PointerKind::Single { is_const }) => TargetType::pointer(!is_const, base),
            Some(PointerKind::Double {
                is_const,
                inner_is_const,
            }) => TargetType::pointer(!is_const, TargetType::pointer(!inner_is_const, base)),
        })
    }

    /// Resolves a function parameter; array parameters decay to pointers.
    pub fn resolve_param(&self, decl: &NameWithType, mode: ResolveMode) -> Result<TargetType> {
        if decl.is_array() {
            let element = self.resolve_declaration(decl, mode)?;
            Ok(TargetType::pointer(!decl.is_const, element))
        } else {
            self.resolve_declaration(decl, mode)
        }
    }

    /// Resolves a type name to the Rust type it is spelled as.
    ///
    /// `pointer_level` is the indirection the name is used under; types
    /// with no known representation may only be used behind a pointer.
    pub fn resolve_base(
        &self,
        name: &str,
        mode: ResolveMode,
        pointer_level: usize,
    ) -> Result<TargetType> {
        let mut visited = HashSet::new();
        let mut chain: Vec<&str> = Vec::new();
        let mut current = name;
        let mut levels = 0;
        let ty = loop {
            if !visited.insert(current) {
                chain.push(current);
                return Err(GenError::AliasCycle {
                    name: name.to_string(),
                    chain: chain.join(" -> "),
                });
            }
            chain.push(current);

            if let Some(p) = Primitive::from_c_name(current) {
                break match p {
                    Primitive::Void if levels == 0 => TargetType::Unit,
                    p => TargetType::Primitive(p),
                };
            }

            if let Some(owner) = self.view.flags_owner(current) {
                match mode {
                    ResolveMode::Declared => break TargetType::Named(names::enum_type_name(owner)),
                    ResolveMode::Collapsed => {
                        current = owner;
                        continue;
                    }
                }
            }

            let lookup = self.view.lookup(current);
            if mode == ResolveMode::Declared {
                match lookup {
                    Some(ViewType::Enum(_))
                    | Some(ViewType::Alias(Alias {
                        kind: AliasKind::Enum,
                        ..
                    })) => break TargetType::Named(names::enum_type_name(current)),
                    _ => (),
                }
            }

            if let Some(td) = self.view.typedef(current) {
                levels += usize::from(td.pointer_level);
                current = td.base.as_str();
                continue;
            }

            break match lookup {
                Some(ViewType::Enum(_)) => TargetType::Named(names::enum_type_name(current)),
                Some(ViewType::Alias(alias)) => match alias.kind {
                    AliasKind::Enum => TargetType::Named(names::enum_type_name(current)),
                    _ => TargetType::Named(names::type_name(current)),
                },
                Some(ViewType::Struct(_))
                | Some(ViewType::Union(_))
                | Some(ViewType::Handle(_))
                | Some(ViewType::FuncPointer(_)) => TargetType::Named(names::type_name(current)),
                Some(ViewType::Opaque(_)) => {
                    if levels + pointer_level == 0 {
                        return Err(GenError::UnresolvedType {
                            name: current.to_string(),
                            context: format!("by-value use of opaque type through `{}`", name),
                        });
                    }
                    TargetType::Named(names::type_name(current))
                }
                Some(ViewType::External(_)) => match self.external_types.get(current) {
                    Some(mapped) => TargetType::Named(mapped.clone()),
                    None if levels + pointer_level > 0 => {
                        TargetType::Named(names::type_name(current))
                    }
                    None => {
                        return Err(GenError::UnresolvedType {
                            name: current.to_string(),
                            context: String::from("external type without a mapping"),
                        })
                    }
                },
                None => {
                    return Err(GenError::UnresolvedType {
                        name: current.to_string(),
                        context: format!("type resolution of `{}`", name),
                    })
                }
            };
        };

        let mut ty = ty;
        for _ in 0..levels {
            ty = TargetType::pointer(true, ty);
        }
        Ok(ty)
    }

    /// External types emitted as opaque structs because no mapping is configured.
    pub fn unmapped_externals(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.view
            .external_types
            .iter()
            .filter(move |name| !self.external_types.contains_key(name.as_str()))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::c::parse_declaration;
    use crate::config::GeneratorConfig;
    use crate::view::test_support::view;

    const REGISTRY: &str = r#"<registry>
        <types>
            <type requires="X11/Xlib.h" name="Display"/>
            <type requires="X11/Xlib.h" name="Window"/>
            <type requires="vk_platform" name="void"/>
            <type requires="vk_platform" name="char"/>
            <type requires="vk_platform" name="float"/>
            <type requires="vk_platform" name="uint32_t"/>
            <type requires="vk_platform" name="uint64_t"/>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkBool32</name>;</type>
            <type category="basetype">typedef <type>uint64_t</type> <name>VkDeviceSize</name>;</type>
            <type category="basetype">struct <name>ANativeWindow</name>;</type>
            <type requires="VkQueueFlagBits" category="bitmask">typedef <type>VkFlags</type> <name>VkQueueFlags</name>;</type>
            <type category="bitmask">typedef <type>VkFlags</type> <name>VkInstanceCreateFlags</name>;</type>
            <type name="VkQueueFlagBits" category="enum"/>
            <type name="VkResult" category="enum"/>
            <type category="handle"><type>VK_DEFINE_HANDLE</type>(<name>VkInstance</name>)</type>
            <type category="struct" name="VkHolder">
                <member><type>VkQueueFlags</type> <name>flags</name></member>
                <member><type>VkInstanceCreateFlags</type> <name>createFlags</name></member>
                <member><type>VkBool32</type> <name>enabled</name></member>
                <member><type>VkDeviceSize</type> <name>size</name></member>
                <member><type>VkResult</type> <name>result</name></member>
                <member><type>VkInstance</type> <name>instance</name></member>
                <member><type>Display</type>* <name>dpy</name></member>
                <member><type>Window</type> <name>window</name></member>
                <member>struct <type>ANativeWindow</type>* <name>nativeWindow</name></member>
                <member>const <type>char</type>* const* <name>ppNames</name></member>
                <member><type>void</type>* <name>pUserData</name></member>
            </type>
        </types>
        <enums name="VkQueueFlagBits" type="bitmask">
            <enum bitpos="0" name="VK_QUEUE_GRAPHICS_BIT"/>
        </enums>
        <enums name="VkResult" type="enum">
            <enum value="0" name="VK_SUCCESS"/>
        </enums>
        <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
            <require><type name="VkHolder"/></require>
        </feature>
    </registry>"#;

    fn declared(resolver: &Resolver<'_>, code: &str, mode: ResolveMode) -> String {
        let decl = parse_declaration(code).unwrap();
        resolver.resolve_param(&decl, mode).unwrap().to_string()
    }

    #[test]
    fn test_resolve_declarations() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let resolver = Resolver::new(&view, &config.external_types);
        let d = |code| declared(&resolver, code, ResolveMode::Declared);
        assert_eq!(d("VkQueueFlags flags"), "VkQueueFlags");
        assert_eq!(d("VkQueueFlagBits bit"), "VkQueueFlags");
        assert_eq!(d("VkInstanceCreateFlags flags"), "u32");
        assert_eq!(d("VkBool32 enabled"), "u32");
        assert_eq!(d("VkDeviceSize size"), "u64");
        assert_eq!(d("VkResult result"), "VkResult");
        assert_eq!(d("VkInstance instance"), "VkInstance");
        assert_eq!(d("Display* dpy"), "*mut Display");
        assert_eq!(d("Window window"), "u64");
        assert_eq!(d("struct ANativeWindow* nativeWindow"), "*mut ANativeWindow");
        assert_eq!(d("const char* const* ppNames"), "*const *const c_char");
        assert_eq!(d("void* pUserData"), "*mut c_void");
        assert_eq!(d("const float blendConstants[4]"), "*const f32");
        assert_eq!(d("void proto"), "()");
    }

    #[test]
    fn test_collapsed() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let resolver = Resolver::new(&view, &config.external_types);
        let c = |code| declared(&resolver, code, ResolveMode::Collapsed);
        assert_eq!(c("VkQueueFlags flags"), "u32");
        assert_eq!(c("VkQueueFlagBits bit"), "u32");
        assert_eq!(c("VkResult result"), "VkResult");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let resolver = Resolver::new(&view, &config.external_types);
        let first = resolver.resolve("VkBool32", 2).unwrap();
        assert_eq!(first, resolver.resolve("VkBool32", 2).unwrap());
        assert_eq!(first.to_string(), "*mut *mut u32");
    }

    #[test]
    fn test_unresolvable() {
        let view = view(REGISTRY);
        let empty = BTreeMap::new();
        let resolver = Resolver::new(&view, &empty);
        assert!(matches!(
            resolver.resolve("VkMissing", 0),
            Err(GenError::UnresolvedType { .. })
        ));
        assert!(matches!(
            resolver.resolve("Window", 0),
            Err(GenError::UnresolvedType { .. })
        ));
        assert!(matches!(
            resolver.resolve("ANativeWindow", 0),
            Err(GenError::UnresolvedType { .. })
        ));
        assert_eq!(resolver.resolve("Window", 1).unwrap().to_string(), "*mut Window");
        assert_eq!(resolver.unmapped_externals().collect::<Vec<_>>(), vec!["Display", "Window"]);
    }

    #[test]
    fn test_typedef_cycle() {
        let mut view = view(REGISTRY);
        view.typedefs.push(crate::types::TypeDef {
            name: String::from("VkLoopA"),
            base: String::from("VkLoopB"),
            pointer_level: 0,
        });
        view.typedefs.push(crate::types::TypeDef {
            name: String::from("VkLoopB"),
            base: String::from("VkLoopA"),
            pointer_level: 0,
        });
        view.reindex();
        let config = GeneratorConfig::default();
        let resolver = Resolver::new(&view, &config.external_types);
        assert!(matches!(
            resolver.resolve("VkLoopA", 0),
            Err(GenError::AliasCycle { .. })
        ));
    }
}
