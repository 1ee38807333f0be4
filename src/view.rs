//! Merged, deduplicated snapshot of the registry for one API selection:
//! the core features up to the configured version plus the selected
//! extensions, with extension enumerants folded into the enumerations they
//! extend and every referenced type pulled in.

use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::c;
use crate::config::{parse_version, GeneratorConfig};
use crate::depends;
use crate::error::{GenError, Result};
use crate::resolve::Primitive;
use crate::types::{
    api_matches, Command as RegistryCommand, CommandDefinition, Enum, EnumSpec, Extension,
    ExtensionChild, Feature, HandleType, InterfaceItem, Member, NameWithType, Registry, Type,
    TypeBitmask, TypeDef, TypeDefinition, TypeHandle, TypeStruct,
};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Constant {
    pub name: String,
    /// Declared C type, absent for extension constants.
    pub type_name: Option<String>,
    pub value: Option<String>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum EnumKind {
    Plain,
    Bitmask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct EnumType {
    /// Registry name; the bitmask typedef name for flag sets.
    pub name: String,
    pub kind: EnumKind,
    pub bitwidth: u32,
    /// `<enums>` block the values come from.
    pub source: String,
    pub values: Vec<EnumValue>,
}

/// Struct or union with its members in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StructType {
    pub name: String,
    pub members: Vec<Member>,
}

pub type UnionType = StructType;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Handle {
    pub name: String,
    pub dispatchable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FuncPointer {
    pub name: String,
    pub proto: NameWithType,
    pub params: Vec<NameWithType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Command {
    pub name: String,
    pub proto: NameWithType,
    pub params: Vec<NameWithType>,
    /// Command this entry point aliases, `vkFoo` for `vkFooKHR`.
    pub alias_of: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum AliasKind {
    Struct,
    Union,
    Enum,
    Handle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Alias {
    pub name: String,
    pub target: String,
    pub kind: AliasKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    FuncPointer(usize),
    Enum(usize),
    Union(usize),
    Struct(usize),
    Handle(usize),
    Alias(usize),
    Opaque(usize),
    External(usize),
}

/// A type of the view found by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType<'a> {
    FuncPointer(&'a FuncPointer),
    Enum(&'a EnumType),
    Union(&'a UnionType),
    Struct(&'a StructType),
    Handle(&'a Handle),
    Alias(&'a Alias),
    Opaque(&'a str),
    External(&'a str),
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct VersionView {
    pub name: String,
    pub api: String,
    pub constants: Vec<Constant>,
    pub func_pointers: Vec<FuncPointer>,
    pub enums: Vec<EnumType>,
    pub unions: Vec<UnionType>,
    pub structs: Vec<StructType>,
    pub handles: Vec<Handle>,
    pub commands: Vec<Command>,
    pub aliases: Vec<Alias>,
    pub typedefs: Vec<TypeDef>,
    pub opaque_types: Vec<String>,
    pub external_types: Vec<String>,
    /// Author tags (`KHR`, `EXT`, ...) used as name suffixes.
    pub vendor_tags: Vec<String>,

    #[cfg_attr(feature = "serialize", serde(skip))]
    index: HashMap<String, Entry>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    typedef_index: HashMap<String, usize>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    constant_index: HashMap<String, usize>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    flag_bits: HashMap<String, String>,
}

impl VersionView {
    /// Builds the view selected by `config` from a parsed registry.
    pub fn build(registry: &Registry, config: &GeneratorConfig) -> Result<VersionView> {
        config.validate()?;
        let mut builder = Builder::new(registry, config);
        builder.select()?;
        let mut view = builder.materialize()?;
        view.reindex();
        debug!(
            "view {}: {} constants, {} enums, {} structs, {} unions, {} handles, {} commands",
            view.name,
            view.constants.len(),
            view.enums.len(),
            view.structs.len(),
            view.unions.len(),
            view.handles.len(),
            view.commands.len()
        );
        Ok(view)
    }

    /// Rebuilds the name indices after the public collections were modified.
    pub fn reindex(&mut self) {
        let mut index = HashMap::new();
        for (i, v) in self.func_pointers.iter().enumerate() {
            index.insert(v.name.clone(), Entry::FuncPointer(i));
        }
        for (i, v) in self.enums.iter().enumerate() {
            index.insert(v.name.clone(), Entry::Enum(i));
        }
        for (i, v) in self.unions.iter().enumerate() {
            index.insert(v.name.clone(), Entry::Union(i));
        }
        for (i, v) in self.structs.iter().enumerate() {
            index.insert(v.name.clone(), Entry::Struct(i));
        }
        for (i, v) in self.handles.iter().enumerate() {
            index.insert(v.name.clone(), Entry::Handle(i));
        }
        for (i, v) in self.aliases.iter().enumerate() {
            index.insert(v.name.clone(), Entry::Alias(i));
        }
        for (i, v) in self.opaque_types.iter().enumerate() {
            index.insert(v.clone(), Entry::Opaque(i));
        }
        for (i, v) in self.external_types.iter().enumerate() {
            index.insert(v.clone(), Entry::External(i));
        }
        self.index = index;

        self.typedef_index = self
            .typedefs
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        self.constant_index = self
            .constants
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        self.flag_bits = self
            .enums
            .iter()
            .filter(|e| e.kind == EnumKind::Bitmask && e.source != e.name)
            .map(|e| (e.source.clone(), e.name.clone()))
            .collect();
    }

    pub fn lookup(&self, name: &str) -> Option<ViewType<'_>> {
        self.index.get(name).map(|entry| match *entry {
            Entry::FuncPointer(i) => ViewType::FuncPointer(&self.func_pointers[i]),
            Entry::Enum(i) => ViewType::Enum(&self.enums[i]),
            Entry::Union(i) => ViewType::Union(&self.unions[i]),
            Entry::Struct(i) => ViewType::Struct(&self.structs[i]),
            Entry::Handle(i) => ViewType::Handle(&self.handles[i]),
            Entry::Alias(i) => ViewType::Alias(&self.aliases[i]),
            Entry::Opaque(i) => ViewType::Opaque(&self.opaque_types[i]),
            Entry::External(i) => ViewType::External(&self.external_types[i]),
        })
    }

    pub fn typedef(&self, name: &str) -> Option<&TypeDef> {
        self.typedef_index.get(name).map(|&i| &self.typedefs[i])
    }

    pub fn constant(&self, name: &str) -> Option<&Constant> {
        self.constant_index.get(name).map(|&i| &self.constants[i])
    }

    /// Flags type that owns the values of a `FlagBits` enumeration.
    pub fn flags_owner(&self, bits: &str) -> Option<&str> {
        self.flag_bits.get(bits).map(String::as_str)
    }
}

struct Builder<'r> {
    registry: &'r Registry,
    config: &'r GeneratorConfig,
    api: &'r str,
    types: HashMap<&'r str, &'r Type>,
    commands: HashMap<&'r str, &'r RegistryCommand>,
    bits_owner: HashMap<&'r str, &'r str>,
    known_enumerants: HashSet<&'r str>,
    enabled: HashSet<&'r str>,
    required_types: Vec<(&'r str, &'r str)>,
    required_commands: Vec<&'r str>,
    removed: HashSet<&'r str>,
    extension_constants: Vec<Constant>,
    additions: HashMap<&'r str, Vec<(&'r Enum, Option<i64>)>>,
}

impl<'r> Builder<'r> {
    fn new(registry: &'r Registry, config: &'r GeneratorConfig) -> Builder<'r> {
        let api = config.api.as_str();
        let mut types = HashMap::new();
        let mut bits_owner = HashMap::new();
        for t in registry.types.iter() {
            if !api_matches(t.api.as_deref(), api) {
                continue;
            }
            types.entry(t.name()).or_insert(t);
            if let TypeDefinition::Bitmask(TypeBitmask::Definition {
                name,
                bits: Some(bits),
                ..
            }) = &t.definition
            {
                bits_owner.insert(bits.as_str(), name.as_str());
            }
        }

        let mut commands = HashMap::new();
        for c in registry.commands.iter() {
            if api_matches(c.api(), api) {
                commands.entry(c.name()).or_insert(c);
            }
        }

        let mut known_enumerants: HashSet<&str> = registry
            .enums
            .iter()
            .flat_map(|b| b.children.iter())
            .map(|e| e.name.as_str())
            .collect();
        let children = registry
            .features
            .iter()
            .flat_map(|f| f.children.iter())
            .chain(registry.extensions.iter().flat_map(|e| e.children.iter()));
        for child in children {
            if let ExtensionChild::Require { items, .. } = child {
                for item in items {
                    if let InterfaceItem::Enum(e) = item {
                        known_enumerants.insert(e.name.as_str());
                    }
                }
            }
        }

        Builder {
            registry,
            config,
            api,
            types,
            commands,
            bits_owner,
            known_enumerants,
            enabled: HashSet::new(),
            required_types: Vec::new(),
            required_commands: Vec::new(),
            removed: HashSet::new(),
            extension_constants: Vec::new(),
            additions: HashMap::new(),
        }
    }

    fn select(&mut self) -> Result<()> {
        let registry = self.registry;
        let limit = match &self.config.version {
            Some(v) => Some(parse_version(v).ok_or_else(|| {
                GenError::Config(format!("version `{}` is not of the form MAJOR.MINOR", v))
            })?),
            None => None,
        };

        if let Some(names) = &self.config.extensions {
            for name in names {
                if !registry.extensions.iter().any(|e| &e.name == name) {
                    return Err(GenError::UnknownExtension(name.clone()));
                }
            }
        }

        let features: Vec<&'r Feature> = registry
            .features
            .iter()
            .filter(|f| api_matches(Some(&f.api), self.api))
            .filter(|f| match (limit, parse_version(&f.number)) {
                (Some(limit), Some(number)) => number <= limit,
                _ => true,
            })
            .collect();
        let extensions: Vec<&'r Extension> = registry
            .extensions
            .iter()
            .filter(|e| self.extension_selected(e))
            .collect();

        self.enabled = features
            .iter()
            .map(|f| f.name.as_str())
            .chain(extensions.iter().map(|e| e.name.as_str()))
            .collect();

        let strict = self.config.strict;
        for e in extensions.iter() {
            if let Some(expr) = &e.depends {
                if !depends::satisfied(expr, strict, |n| self.enabled.contains(n))? {
                    warn!("extension {} depends on `{}`, which is not selected", e.name, expr);
                }
            }
        }

        for f in features.iter() {
            trace!("walking feature {}", f.name);
            self.walk(&f.children, None)?;
        }
        for e in extensions.iter() {
            trace!("walking extension {}", e.name);
            self.walk(&e.children, e.number)?;
        }

        let removed = &self.removed;
        self.required_types.retain(|(name, _)| !removed.contains(name));
        self.required_commands.retain(|name| !removed.contains(name));
        self.extension_constants.retain(|c| !removed.contains(c.name.as_str()));
        for values in self.additions.values_mut() {
            values.retain(|(e, _)| !removed.contains(e.name.as_str()));
        }
        Ok(())
    }

    fn extension_selected(&self, e: &Extension) -> bool {
        if !e.supports(self.api) {
            trace!("skipping extension {} (supported: {:?})", e.name, e.supported);
            return false;
        }
        if let Some(names) = &self.config.extensions {
            if !names.contains(&e.name) {
                return false;
            }
        }
        if let Some(platform) = &e.platform {
            if !self.config.platforms.contains(platform) {
                debug!("skipping extension {} for platform {}", e.name, platform);
                return false;
            }
        }
        if e.provisional && !self.config.provisional {
            debug!("skipping provisional extension {}", e.name);
            return false;
        }
        true
    }

    fn walk(&mut self, children: &'r [ExtensionChild], extnumber: Option<i64>) -> Result<()> {
        for child in children {
            match child {
                ExtensionChild::Require {
                    api,
                    depends,
                    items,
                    ..
                } => {
                    if !api_matches(api.as_deref(), self.api) {
                        continue;
                    }
                    if let Some(expr) = depends {
                        let strict = self.config.strict;
                        if !depends::satisfied(expr, strict, |n| self.enabled.contains(n))? {
                            trace!("skipping require block depending on `{}`", expr);
                            continue;
                        }
                    }
                    for item in items {
                        match item {
                            InterfaceItem::Type { name, .. } => {
                                self.required_types.push((name.as_str(), "required interface"))
                            }
                            InterfaceItem::Command { name, .. } => {
                                self.required_commands.push(name.as_str())
                            }
                            InterfaceItem::Enum(e) => self.require_enum(e, extnumber),
                            InterfaceItem::Comment(_) => (),
                        }
                    }
                }
                ExtensionChild::Remove { api, items, .. } => {
                    if !api_matches(api.as_deref(), self.api) {
                        continue;
                    }
                    for item in items {
                        match item {
                            InterfaceItem::Type { name, .. }
                            | InterfaceItem::Command { name, .. } => {
                                self.removed.insert(name.as_str());
                            }
                            InterfaceItem::Enum(e) => {
                                self.removed.insert(e.name.as_str());
                            }
                            InterfaceItem::Comment(_) => (),
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn require_enum(&mut self, e: &'r Enum, extnumber: Option<i64>) {
        if !api_matches(e.api.as_deref(), self.api) {
            return;
        }
        if let Some(target) = e.spec.extends() {
            self.additions.entry(target).or_default().push((e, extnumber));
            return;
        }
        let constant = match &e.spec {
            EnumSpec::Value { value, .. } => Constant {
                name: e.name.clone(),
                type_name: e.type_suffix.clone(),
                value: Some(value.clone()),
                alias: None,
            },
            EnumSpec::Alias { alias, .. } => Constant {
                name: e.name.clone(),
                type_name: e.type_suffix.clone(),
                value: None,
                alias: Some(alias.clone()),
            },
            // reference to an API constant
            _ => return,
        };
        if !self.extension_constants.iter().any(|c| c.name == constant.name) {
            self.extension_constants.push(constant);
        }
    }

    fn command_definition(&self, name: &'r str) -> Result<&'r CommandDefinition> {
        let mut current = name;
        let mut chain: Vec<&str> = Vec::new();
        loop {
            match self.commands.get(current).copied() {
                Some(RegistryCommand::Definition(d)) => return Ok(&**d),
                Some(RegistryCommand::Alias { alias, .. }) => {
                    if chain.contains(&current) {
                        chain.push(current);
                        return Err(GenError::AliasCycle {
                            name: name.to_string(),
                            chain: chain.join(" -> "),
                        });
                    }
                    chain.push(current);
                    current = alias.as_str();
                }
                None if current == name => {
                    return Err(GenError::UnresolvedType {
                        name: name.to_string(),
                        context: String::from("required command"),
                    })
                }
                None => {
                    return Err(GenError::DanglingAlias {
                        name: name.to_string(),
                        target: current.to_string(),
                    })
                }
            }
        }
    }

    fn materialize(mut self) -> Result<VersionView> {
        let registry = self.registry;
        let mut view = VersionView {
            name: self.config.name.clone(),
            api: self.config.api.clone(),
            vendor_tags: registry.tags.iter().map(|t| t.name.clone()).collect(),
            ..VersionView::default()
        };

        // Commands first: their signatures add to the required types.
        let required_commands: HashSet<&str> = self.required_commands.iter().copied().collect();
        for c in registry.commands.iter() {
            let name = c.name();
            if !required_commands.contains(name) || !self.is_indexed_command(c) {
                continue;
            }
            let definition = self.command_definition(name)?;
            let params: Vec<NameWithType> = definition
                .params
                .iter()
                .filter(|p| api_matches(p.api.as_deref(), self.api))
                .map(|p| p.definition.clone())
                .collect();
            let mut proto = definition.proto.clone();
            proto.name = name.to_string();

            let referrer = definition.proto.name.as_str();
            self.required_types.push((definition.proto.type_name.as_str(), referrer));
            for p in definition.params.iter() {
                if api_matches(p.api.as_deref(), self.api) {
                    self.required_types.push((p.definition.type_name.as_str(), referrer));
                }
            }

            view.commands.push(Command {
                name: name.to_string(),
                proto,
                params,
                alias_of: match c {
                    RegistryCommand::Alias { alias, .. } => Some(alias.clone()),
                    RegistryCommand::Definition(_) => None,
                },
            });
        }
        for name in required_commands.iter() {
            if !view.commands.iter().any(|c| c.name == *name) {
                return Err(GenError::UnresolvedType {
                    name: name.to_string(),
                    context: String::from("required command"),
                });
            }
        }

        let required = self.type_closure()?;

        for constant in registry.enums.iter().filter(|e| e.is_constants()) {
            for e in constant.children.iter() {
                if !api_matches(e.api.as_deref(), self.api) {
                    continue;
                }
                let (value, alias) = match &e.spec {
                    EnumSpec::Value { value, .. } => (Some(value.clone()), None),
                    EnumSpec::Alias { alias, .. } => (None, Some(alias.clone())),
                    _ => {
                        return Err(GenError::MalformedElement {
                            element: e.name.clone(),
                            desc: String::from("API constant without value or alias"),
                        })
                    }
                };
                view.constants.push(Constant {
                    name: e.name.clone(),
                    type_name: e.type_suffix.clone(),
                    value,
                    alias,
                });
            }
        }
        for c in std::mem::take(&mut self.extension_constants) {
            if !view.constants.iter().any(|v| v.name == c.name) {
                view.constants.push(c);
            }
        }

        let mut bitmask_aliases = Vec::new();
        let mut video_types = Vec::new();
        for t in registry.types.iter() {
            if !self.is_indexed_type(t) {
                continue;
            }
            match &t.definition {
                TypeDefinition::BaseType(td) => view.typedefs.push(td.clone()),
                TypeDefinition::Bitmask(TypeBitmask::Definition { name, base, .. }) => {
                    view.typedefs.push(TypeDef {
                        name: name.clone(),
                        base: base.clone(),
                        pointer_level: 0,
                    })
                }
                _ => (),
            }

            let name = t.name();
            if !required.contains(name) {
                continue;
            }
            match &t.definition {
                TypeDefinition::External { name } => {
                    if Primitive::from_c_name(name).is_some() {
                        continue;
                    }
                    if is_video_header(t) && !self.config.external_types.contains_key(name) {
                        video_types.push(name.as_str());
                    } else {
                        view.external_types.push(name.clone());
                    }
                }
                TypeDefinition::Include { .. }
                | TypeDefinition::Define { .. }
                | TypeDefinition::BaseType(_) => (),
                TypeDefinition::Opaque { name } => view.opaque_types.push(name.clone()),
                TypeDefinition::Bitmask(TypeBitmask::Definition {
                    name,
                    base,
                    bits: Some(bits),
                }) => {
                    let wide = registry.base_type(base)? == "uint64_t"
                        || registry.enums_block(bits).and_then(|b| b.bitwidth) == Some(64);
                    let bitwidth = if wide { 64 } else { 32 };
                    let enum_type = self.enum_type(name, EnumKind::Bitmask, bits, bitwidth)?;
                    view.enums.push(enum_type);
                }
                TypeDefinition::Bitmask(TypeBitmask::Definition { bits: None, .. }) => (),
                TypeDefinition::Bitmask(TypeBitmask::Alias { name, alias }) => {
                    bitmask_aliases.push((name, alias))
                }
                TypeDefinition::Handle(TypeHandle::Definition {
                    name, handle_type, ..
                }) => view.handles.push(Handle {
                    name: name.clone(),
                    dispatchable: *handle_type == HandleType::Dispatch,
                }),
                TypeDefinition::Handle(TypeHandle::Alias { name, alias }) => {
                    view.aliases.push(alias_of(name, alias, AliasKind::Handle))
                }
                TypeDefinition::Enumeration { name, alias: None } => {
                    if let Some(owner) = self.bits_owner.get(name.as_str()) {
                        if required.contains(owner) {
                            continue;
                        }
                    }
                    let block = registry.enums_block(name);
                    let kind = match block {
                        Some(b) if b.is_bitmask() => EnumKind::Bitmask,
                        Some(_) => EnumKind::Plain,
                        None if name.contains("FlagBits") => EnumKind::Bitmask,
                        None => EnumKind::Plain,
                    };
                    let bitwidth = block.and_then(|b| b.bitwidth).unwrap_or(32);
                    let enum_type = self.enum_type(name, kind, name, bitwidth)?;
                    view.enums.push(enum_type);
                }
                TypeDefinition::Enumeration {
                    name,
                    alias: Some(alias),
                } => view.aliases.push(alias_of(name, alias, AliasKind::Enum)),
                TypeDefinition::FunctionPointer(fp) => view.func_pointers.push(FuncPointer {
                    name: fp.proto.name.clone(),
                    proto: fp.proto.clone(),
                    params: fp.params.clone(),
                }),
                TypeDefinition::Struct(TypeStruct::Definition { name, members, .. }) => {
                    view.structs.push(StructType {
                        name: name.clone(),
                        members: members.clone(),
                    })
                }
                TypeDefinition::Struct(TypeStruct::Alias { name, alias }) => {
                    view.aliases.push(alias_of(name, alias, AliasKind::Struct))
                }
                TypeDefinition::Union(TypeStruct::Definition { name, members, .. }) => {
                    view.unions.push(StructType {
                        name: name.clone(),
                        members: members.clone(),
                    })
                }
                TypeDefinition::Union(TypeStruct::Alias { name, alias }) => {
                    view.aliases.push(alias_of(name, alias, AliasKind::Union))
                }
            }
        }

        for (name, alias) in bitmask_aliases {
            if view.enums.iter().any(|e| &e.name == alias) {
                view.aliases.push(alias_of(name, alias, AliasKind::Enum));
            } else {
                view.typedefs.push(TypeDef {
                    name: name.clone(),
                    base: alias.clone(),
                    pointer_level: 0,
                });
            }
        }

        // The codec headers are not part of the registry. Every by-value use
        // in the API is a profile or level enumeration, anything else is only
        // passed behind a pointer.
        for name in video_types {
            if used_by_value(&view, name) {
                trace!("video header type {} used by value, emitting as enumeration", name);
                view.enums.push(EnumType {
                    name: name.to_string(),
                    kind: EnumKind::Plain,
                    bitwidth: 32,
                    source: name.to_string(),
                    values: Vec::new(),
                });
            } else {
                view.opaque_types.push(name.to_string());
            }
        }

        Ok(view)
    }

    fn is_indexed_type(&self, t: &Type) -> bool {
        self.types
            .get(t.name())
            .map_or(false, |indexed| std::ptr::eq(*indexed, t))
    }

    fn is_indexed_command(&self, c: &RegistryCommand) -> bool {
        self.commands
            .get(c.name())
            .map_or(false, |indexed| std::ptr::eq(*indexed, c))
    }

    /// Names of every type reachable from the required interface.
    fn type_closure(&self) -> Result<HashSet<&'r str>> {
        let mut seen = HashSet::new();
        let mut queue = self.required_types.clone();
        while let Some((name, referrer)) = queue.pop() {
            if !seen.insert(name) {
                continue;
            }
            if let Some(owner) = self.bits_owner.get(name).copied() {
                queue.push((owner, name));
            }
            let t = match self.types.get(name).copied() {
                Some(t) => t,
                None if Primitive::from_c_name(name).is_some() => continue,
                None => {
                    return Err(GenError::UnresolvedType {
                        name: name.to_string(),
                        context: referrer.to_string(),
                    })
                }
            };
            for dependency in self.dependencies(&t.definition) {
                queue.push((dependency, name));
            }
        }
        Ok(seen)
    }

    fn dependencies(&self, definition: &'r TypeDefinition) -> Vec<&'r str> {
        match definition {
            TypeDefinition::BaseType(td) => vec![td.base.as_str()],
            TypeDefinition::Bitmask(TypeBitmask::Definition { base, bits, .. }) => {
                let mut deps = vec![base.as_str()];
                deps.extend(bits.as_deref());
                deps
            }
            TypeDefinition::Bitmask(TypeBitmask::Alias { alias, .. })
            | TypeDefinition::Handle(TypeHandle::Alias { alias, .. })
            | TypeDefinition::Struct(TypeStruct::Alias { alias, .. })
            | TypeDefinition::Union(TypeStruct::Alias { alias, .. })
            | TypeDefinition::Enumeration {
                alias: Some(alias), ..
            } => vec![alias.as_str()],
            TypeDefinition::FunctionPointer(fp) => std::iter::once(&fp.proto)
                .chain(fp.params.iter())
                .map(|d| d.type_name.as_str())
                .collect(),
            TypeDefinition::Struct(TypeStruct::Definition { members, .. })
            | TypeDefinition::Union(TypeStruct::Definition { members, .. }) => members
                .iter()
                .filter(|m| api_matches(m.api.as_deref(), self.api))
                .map(|m| m.type_name())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn enum_type(
        &self,
        name: &str,
        kind: EnumKind,
        source: &str,
        bitwidth: u32,
    ) -> Result<EnumType> {
        let mut values = EnumValues::new(name);
        if let Some(block) = self.registry.enums_block(source) {
            for e in block.children.iter() {
                if api_matches(e.api.as_deref(), self.api) {
                    values.collect(e, None)?;
                }
            }
        }
        if let Some(additions) = self.additions.get(source) {
            for (e, extnumber) in additions.iter() {
                values.collect(e, *extnumber)?;
            }
        }

        let mut values = values.resolve(&self.known_enumerants)?;
        if kind == EnumKind::Bitmask && !values.iter().any(|v| v.value == 0) {
            values.insert(
                0,
                EnumValue {
                    name: String::from("NONE"),
                    value: 0,
                    alias: None,
                },
            );
        }

        Ok(EnumType {
            name: name.to_string(),
            kind,
            bitwidth,
            source: source.to_string(),
            values,
        })
    }
}

fn is_video_header(t: &Type) -> bool {
    t.requires
        .as_deref()
        .map_or(false, |header| header.starts_with("vk_video/"))
}

/// Whether a struct, union, command or function pointer holds `name` without indirection.
fn used_by_value(view: &VersionView, name: &str) -> bool {
    let by_value = |d: &NameWithType| d.type_name == name && d.pointer_level() == 0;
    view.structs
        .iter()
        .chain(view.unions.iter())
        .flat_map(|s| s.members.iter())
        .any(|m| by_value(&m.definition))
        || view
            .commands
            .iter()
            .flat_map(|c| std::iter::once(&c.proto).chain(c.params.iter()))
            .any(|d| by_value(d))
        || view
            .func_pointers
            .iter()
            .flat_map(|f| std::iter::once(&f.proto).chain(f.params.iter()))
            .any(|d| by_value(d))
}

fn alias_of(name: &str, target: &str, kind: AliasKind) -> Alias {
    Alias {
        name: name.to_string(),
        target: target.to_string(),
        kind,
    }
}

/// Computes the value of an extension enumerant given by offset.
pub fn extension_enum_value(extnumber: i64, offset: i64, positive: bool) -> i64 {
    let value = 1_000_000_000 + (extnumber - 1) * 1000 + offset;
    if positive {
        value
    } else {
        -value
    }
}

enum Pending {
    Value(i64),
    Alias(String),
}

/// Enumerants of one enumeration in declaration order, before alias resolution.
struct EnumValues<'a> {
    owner: &'a str,
    entries: Vec<(String, Pending)>,
}

impl<'a> EnumValues<'a> {
    fn new(owner: &'a str) -> EnumValues<'a> {
        EnumValues {
            owner,
            entries: Vec::new(),
        }
    }

    fn collect(&mut self, e: &Enum, extnumber: Option<i64>) -> Result<()> {
        let malformed = |desc: String| GenError::MalformedElement {
            element: e.name.clone(),
            desc,
        };
        let pending = match &e.spec {
            EnumSpec::None => return Ok(()),
            EnumSpec::Value { value, .. } => Pending::Value(
                c::parse_integer(value)
                    .ok_or_else(|| malformed(format!("value `{}` is not an integer", value)))?,
            ),
            EnumSpec::Bitpos { bitpos, .. } => {
                if !(0..64).contains(bitpos) {
                    return Err(malformed(format!("bit position {} out of range", bitpos)));
                }
                Pending::Value((1u64 << bitpos) as i64)
            }
            EnumSpec::Offset {
                offset,
                extnumber: own,
                dir,
                ..
            } => {
                let number = own.or(extnumber).ok_or_else(|| {
                    malformed(String::from("offset given without an extension number"))
                })?;
                Pending::Value(extension_enum_value(number, *offset, *dir))
            }
            EnumSpec::Alias { alias, .. } => Pending::Alias(alias.clone()),
        };

        if let Some((_, existing)) = self.entries.iter().find(|(n, _)| *n == e.name) {
            return match (existing, &pending) {
                (Pending::Value(a), Pending::Value(b)) if a != b => Err(GenError::ConflictingValue {
                    owner: self.owner.to_string(),
                    name: e.name.clone(),
                    first: *a,
                    second: *b,
                }),
                _ => Ok(()),
            };
        }
        self.entries.push((e.name.clone(), pending));
        Ok(())
    }

    fn resolve(self, known: &HashSet<&str>) -> Result<Vec<EnumValue>> {
        let owner = self.owner;
        let lookup: HashMap<&str, &Pending> =
            self.entries.iter().map(|(n, p)| (n.as_str(), p)).collect();
        let mut values = Vec::with_capacity(self.entries.len());
        for (name, pending) in self.entries.iter() {
            match pending {
                Pending::Value(value) => values.push(EnumValue {
                    name: name.clone(),
                    value: *value,
                    alias: None,
                }),
                Pending::Alias(target) => {
                    let mut chain = vec![name.as_str()];
                    let mut current = target.as_str();
                    let value = loop {
                        match lookup.get(current) {
                            Some(Pending::Value(v)) => break Some(*v),
                            Some(Pending::Alias(next)) => {
                                if chain.contains(&current) {
                                    chain.push(current);
                                    return Err(GenError::AliasCycle {
                                        name: name.clone(),
                                        chain: chain.join(" -> "),
                                    });
                                }
                                chain.push(current);
                                current = next.as_str();
                            }
                            None if known.contains(current) => break None,
                            None => {
                                return Err(GenError::DanglingAlias {
                                    name: format!("{}::{}", owner, name),
                                    target: current.to_string(),
                                })
                            }
                        }
                    };
                    match value {
                        Some(value) => values.push(EnumValue {
                            name: name.clone(),
                            value,
                            alias: Some(target.clone()),
                        }),
                        None => debug!(
                            "dropping {}::{}, its target {} is not part of the view",
                            owner, name, current
                        ),
                    }
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::parse::parse_stream;

    pub fn registry(xml: &str) -> Registry {
        let (registry, errors) = parse_stream(xml.as_bytes()).unwrap();
        assert!(errors.iter().all(|e| !e.is_fatal()), "{:?}", errors);
        registry
    }

    pub fn view(xml: &str) -> VersionView {
        VersionView::build(&registry(xml), &GeneratorConfig::default()).unwrap()
    }

    pub fn view_with(xml: &str, config: &GeneratorConfig) -> Result<VersionView> {
        VersionView::build(&registry(xml), config)
    }
}
