use std::io::Read;
use xml::reader::XmlEvent;

use crate::c;
use crate::types::*;

type XmlEvents<R> = xml::reader::Events<R>;
type XmlAttribute = xml::attribute::OwnedAttribute;

//--------------------------------------------------------------------------------------------------
struct ParseCtx<R: Read> {
    events: XmlEvents<R>,
    xpath: String,
    errors: Vec<Error>,
    xml_error: Option<xml::reader::Error>,
}

impl<R: Read> ParseCtx<R> {
    fn next_event(&mut self) -> Option<XmlEvent> {
        match self.events.next() {
            Some(Ok(e)) => Some(e),
            Some(Err(e)) => {
                if self.xml_error.is_none() {
                    self.xml_error = Some(e);
                }
                None
            }
            None => None,
        }
    }

    fn push_element(&mut self, name: &str) {
        self.xpath.push('/');
        self.xpath.push_str(name);
    }

    fn pop_element(&mut self) {
        if let Some(separator_pos) = self.xpath.rfind('/') {
            self.xpath.truncate(separator_pos);
        } else {
            self.errors.push(Error::Internal {
                desc: "ParseCtx push_element/pop_element mismatch.",
            });
        }
    }

    fn invalid_declaration(&mut self, code: String, desc: String) {
        self.errors.push(Error::InvalidDeclaration {
            xpath: self.xpath.clone(),
            code,
            desc,
        });
    }
}

//--------------------------------------------------------------------------------------------------
macro_rules! unwrap_attribute (
    ($ctx:expr, $element:ident, $attribute:ident) => {
        let $attribute = match $attribute {
            Some(val) => val,
            None => {
                $ctx.errors.push(Error::MissingAttribute {
                    xpath: $ctx.xpath.clone(),
                    name: String::from(stringify!($attribute)),
                });
                return None;
            }
        };
    };
);

macro_rules! unwrap_element (
    ($ctx:expr, $value:ident, $element:expr) => {
        let $value = match $value {
            Some(val) => val,
            None => {
                $ctx.errors.push(Error::MissingElement {
                    xpath: $ctx.xpath.clone(),
                    name: String::from($element),
                });
                return None;
            }
        };
    };
);

macro_rules! match_attributes {
    ($ctx:expr, $a:ident in $attributes:expr, $($p:pat => $e:expr),+) => {
        for $a in $attributes {
            let n = $a.name.local_name.as_str();
            match n {
                $(
                    $p => $e,
                )+
                _ => $ctx.errors.push(Error::UnexpectedAttribute {
                    xpath: $ctx.xpath.clone(),
                    name: String::from(n),
                })
            }
        }
    };
}

macro_rules! match_elements {
    ($ctx:expr, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::StartElement { name, .. } => {
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => {
                            $ctx.errors.push(Error::UnexpectedElement {
                                xpath: $ctx.xpath.clone(),
                                name: String::from(name),
                            });
                            consume_current_element($ctx);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    $ctx.pop_element();
                    break;
                }
                _ => {}
            }
        }
    };

    ( $ctx:expr, $attributes:ident, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::StartElement { name, $attributes, .. } => {
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => {
                            $ctx.errors.push(Error::UnexpectedElement {
                                xpath: $ctx.xpath.clone(),
                                name: String::from(name),
                            });
                            consume_current_element($ctx);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    $ctx.pop_element();
                    break;
                }
                _ => {}
            }
        }
    };
}

macro_rules! match_elements_combine_text {
    ( $ctx:expr, $buffer:ident, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::Characters(text) => $buffer.push_str(&text),
                XmlEvent::Whitespace(text) => $buffer.push_str(&text),
                XmlEvent::StartElement { name, .. } => {
                    $buffer.push(' ');
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => {
                            $ctx.errors.push(Error::UnexpectedElement {
                                xpath: $ctx.xpath.clone(),
                                name: String::from(name),
                            });
                            consume_current_element($ctx);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    $buffer.push(' ');
                    $ctx.pop_element();
                    break;
                },
                _ => {}
            }
        }
    };

    ( $ctx:expr, $attributes:ident, $buffer:ident, $($p:pat => $e:expr),+) => {
        while let Some(e) = $ctx.next_event() {
            match e {
                XmlEvent::Characters(text) => $buffer.push_str(&text),
                XmlEvent::Whitespace(text) => $buffer.push_str(&text),
                XmlEvent::StartElement { name, $attributes, .. } => {
                    let name = name.local_name.as_str();
                    $ctx.push_element(name);
                    match name {
                        $(
                            $p => $e,
                        )+
                        _ => {
                            $ctx.errors.push(Error::UnexpectedElement {
                                xpath: $ctx.xpath.clone(),
                                name: String::from(name),
                            });
                            consume_current_element($ctx);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    $ctx.pop_element();
                    break;
                }
                _ => {}
            }
        }
    };
}

//--------------------------------------------------------------------------------------------------
/// Parses the Vulkan XML file into a Rust object.
pub fn parse_file(path: &std::path::Path) -> Result<(Registry, Vec<Error>), FatalError> {
    let file = std::io::BufReader::new(std::fs::File::open(path)?);
    let parser = xml::reader::ParserConfig::new().create_reader(file);
    parse_xml(parser.into_iter())
}

/// Parses the Vulkan XML file from stream into a Rust object.
pub fn parse_stream<T: std::io::Read>(stream: T) -> Result<(Registry, Vec<Error>), FatalError> {
    let parser = xml::reader::ParserConfig::new().create_reader(stream);
    parse_xml(parser.into_iter())
}

fn parse_xml<R: Read>(events: XmlEvents<R>) -> Result<(Registry, Vec<Error>), FatalError> {
    let mut ctx = ParseCtx {
        events,
        xpath: String::from(""),
        errors: Vec::new(),
        xml_error: None,
    };

    let mut result = None;

    {
        let ctx = &mut ctx;
        match_elements! {ctx,
            "registry" => result = Some(parse_registry(ctx))
        }
    }

    if let Some(e) = ctx.xml_error {
        return Err(FatalError::XmlError(e));
    }

    match result {
        Some(registry) => Ok((registry, ctx.errors)),
        None => Err(FatalError::MissingRegistryElement),
    }
}

fn parse_registry<R: Read>(ctx: &mut ParseCtx<R>) -> Registry {
    let mut registry = Registry::default();

    match_elements! {ctx, attributes,
        "comment" => registry.comment = Some(parse_text_element(ctx)),
        "platforms" => {
            match_attributes!{ctx, a in attributes,
                "comment" => ()
            }
            match_elements!{ctx, attributes,
                "platform" => if let Some(v) = parse_platform(ctx, attributes) {
                    registry.platforms.push(v);
                }
            }
        },
        "tags" => {
            match_attributes!{ctx, a in attributes,
                "comment" => ()
            }
            match_elements!{ctx, attributes,
                "tag" => if let Some(v) = parse_tag(ctx, attributes) {
                    registry.tags.push(v);
                }
            }
        },
        "types" => {
            match_attributes!{ctx, a in attributes,
                "comment" => ()
            }
            match_elements!{ctx, attributes,
                "comment" => {
                    parse_text_element(ctx);
                },
                "type" => if let Some(v) = parse_type(ctx, attributes) {
                    registry.types.push(v);
                }
            }
        },
        "enums" => if let Some(v) = parse_enums(ctx, attributes) {
            registry.enums.push(v);
        },
        "commands" => {
            match_attributes!{ctx, a in attributes,
                "comment" => ()
            }
            match_elements!{ctx, attributes,
                "command" => if let Some(v) = parse_command(ctx, attributes) {
                    registry.commands.push(v);
                }
            }
        },
        "feature" => if let Some(v) = parse_feature(ctx, attributes) {
            registry.features.push(v);
        },
        "extensions" => {
            match_attributes!{ctx, a in attributes,
                "comment" => ()
            }
            match_elements!{ctx, attributes,
                "extension" => if let Some(v) = parse_extension(ctx, attributes) {
                    registry.extensions.push(v);
                }
            }
        },
        "vendorids" | "formats" | "spirvextensions" | "spirvcapabilities" | "sync" | "videocodecs" => {
            consume_current_element(ctx)
        }
    }

    registry
}

fn parse_platform<R: Read>(
    ctx: &mut ParseCtx<R>,
    attributes: Vec<XmlAttribute>,
) -> Option<Platform> {
    let mut name = None;
    let mut comment = None;
    let mut protect = None;

    match_attributes! {ctx, a in attributes,
        "name"    => name    = Some(a.value),
        "comment" => comment = Some(a.value),
        "protect" => protect = Some(a.value)
    }

    consume_current_element(ctx);

    unwrap_attribute!(ctx, platform, name);
    unwrap_attribute!(ctx, platform, protect);

    Some(Platform {
        name,
        protect,
        comment,
    })
}

fn parse_tag<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Tag> {
    let mut name = None;
    let mut author = None;
    let mut contact = None;

    match_attributes! {ctx, a in attributes,
        "name"    => name    = Some(a.value),
        "author"  => author  = Some(a.value),
        "contact" => contact = Some(a.value)
    }

    consume_current_element(ctx);

    unwrap_attribute!(ctx, tag, name);
    unwrap_attribute!(ctx, tag, author);
    unwrap_attribute!(ctx, tag, contact);

    Some(Tag {
        name,
        author,
        contact,
    })
}

fn parse_type<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Type> {
    let mut api = None;
    let mut alias = None;
    let mut requires = None;
    let mut name = None;
    let mut category = None;
    let mut parent = None;
    let mut returnedonly = None;
    let mut structextends = None;
    let mut bitvalues = None;
    let mut objtypeenum = None;
    let mut comment = None;

    match_attributes! {ctx, a in attributes,
        "api"            => api            = Some(a.value),
        "alias"          => alias          = Some(a.value),
        "requires"       => requires       = Some(a.value),
        "name"           => name           = Some(a.value),
        "category"       => category       = Some(a.value),
        "parent"         => parent         = Some(a.value),
        "returnedonly"   => returnedonly   = Some(a.value),
        "structextends"  => structextends  = Some(a.value),
        "bitvalues"      => bitvalues      = Some(a.value),
        "objtypeenum"    => objtypeenum    = Some(a.value),
        "comment"        => comment        = Some(a.value),
        "allowduplicate" | "deprecated" => ()
    }

    let owner = name.clone().unwrap_or_default();
    let mut code = String::new();
    let mut markup_type = None;
    let mut markup_name = None;
    let mut members = Vec::new();
    let mut proto = None;
    let mut params = Vec::new();

    match_elements_combine_text! {ctx, attributes, code,
        "member" => if let Some(m) = parse_member(ctx, attributes, &owner) {
            members.push(m);
        },
        "comment" => {
            parse_text_element(ctx);
        },
        "name" => {
            let text = parse_text_element(ctx);
            code.push_str(&text);
            markup_name = Some(text);
        },
        "type" => {
            let text = parse_text_element(ctx);
            code.push_str(&text);
            if markup_type.is_none() {
                markup_type = Some(text);
            }
        },
        "apientry" => code.push_str(&parse_text_element(ctx)),
        "proto" => {
            let code = parse_code_element(ctx);
            match c::parse_prototype(&code) {
                Ok(v) => proto = Some(v),
                Err(desc) => ctx.invalid_declaration(code, desc),
            }
        },
        "param" => {
            let code = parse_code_element(ctx);
            match c::parse_declaration(&code) {
                Ok(v) => params.push(v),
                Err(desc) => ctx.invalid_declaration(code, desc),
            }
        }
    }

    let definition = match category.as_deref() {
        None => {
            unwrap_attribute!(ctx, type, name);
            TypeDefinition::External { name }
        }
        Some("include") => {
            let name = name.or(markup_name);
            unwrap_attribute!(ctx, type, name);
            TypeDefinition::Include { name }
        }
        Some("define") => {
            let name = name.or(markup_name);
            unwrap_attribute!(ctx, type, name);
            TypeDefinition::Define { name }
        }
        Some("basetype") => {
            let name = markup_name.or(name);
            unwrap_element!(ctx, name, "name");
            match markup_type {
                Some(base) => TypeDefinition::BaseType(TypeDef {
                    name,
                    base,
                    pointer_level: code.matches('*').count() as u8,
                }),
                None if code.contains('*') => TypeDefinition::BaseType(TypeDef {
                    name,
                    base: String::from("void"),
                    pointer_level: 1,
                }),
                None => TypeDefinition::Opaque { name },
            }
        }
        Some("bitmask") => {
            if let Some(alias) = alias {
                unwrap_attribute!(ctx, type, name);
                TypeDefinition::Bitmask(TypeBitmask::Alias { name, alias })
            } else {
                let name = markup_name;
                unwrap_element!(ctx, name, "name");
                let base = markup_type;
                unwrap_element!(ctx, base, "type");
                TypeDefinition::Bitmask(TypeBitmask::Definition {
                    name,
                    base,
                    bits: bitvalues.or(requires.clone()),
                })
            }
        }
        Some("handle") => {
            if let Some(alias) = alias {
                unwrap_attribute!(ctx, type, name);
                TypeDefinition::Handle(TypeHandle::Alias { name, alias })
            } else {
                let name = markup_name;
                unwrap_element!(ctx, name, "name");
                let handle_type = match markup_type.as_deref() {
                    Some("VK_DEFINE_HANDLE") => HandleType::Dispatch,
                    Some("VK_DEFINE_NON_DISPATCHABLE_HANDLE") => HandleType::NoDispatch,
                    other => {
                        ctx.errors.push(Error::SchemaViolation {
                            xpath: ctx.xpath.clone(),
                            desc: format!("Unknown handle macro {:?} for handle {}.", other, name),
                        });
                        return None;
                    }
                };
                TypeDefinition::Handle(TypeHandle::Definition {
                    name,
                    handle_type,
                    parent,
                    objtypeenum,
                })
            }
        }
        Some("enum") => {
            unwrap_attribute!(ctx, type, name);
            TypeDefinition::Enumeration { name, alias }
        }
        Some("funcpointer") => match proto {
            Some(proto) => TypeDefinition::FunctionPointer(TypeFunctionPointer { proto, params }),
            None => match c::parse_function_pointer(&code) {
                Ok((proto, params)) => {
                    TypeDefinition::FunctionPointer(TypeFunctionPointer { proto, params })
                }
                Err(desc) => {
                    ctx.invalid_declaration(code, desc);
                    return None;
                }
            },
        },
        Some(category @ "struct") | Some(category @ "union") => {
            unwrap_attribute!(ctx, type, name);
            let definition = match alias {
                Some(alias) => TypeStruct::Alias { name, alias },
                None => TypeStruct::Definition {
                    name,
                    members,
                    returned_only: returnedonly.as_deref() == Some("true"),
                    struct_extends: structextends
                        .map(|s| s.split(',').map(String::from).collect())
                        .unwrap_or_default(),
                },
            };
            if category == "struct" {
                TypeDefinition::Struct(definition)
            } else {
                TypeDefinition::Union(definition)
            }
        }
        Some(other) => {
            ctx.errors.push(Error::UnexpectedAttributeValue {
                xpath: ctx.xpath.clone(),
                name: String::from("category"),
                value: String::from(other),
            });
            return None;
        }
    };

    Some(Type {
        api,
        requires,
        comment,
        definition,
    })
}

fn parse_member<R: Read>(
    ctx: &mut ParseCtx<R>,
    attributes: Vec<XmlAttribute>,
    owner: &str,
) -> Option<Member> {
    let mut api = None;
    let mut values = None;

    match_attributes! {ctx, a in attributes,
        "api"    => api    = Some(a.value),
        "values" => values = Some(a.value),
        "len" | "altlen" | "externsync" | "optional" | "selector" | "selection"
            | "noautovalidity" | "validextensionstructs" | "limittype" | "objecttype"
            | "deprecated" | "featurelink" | "stride" => ()
    }

    let code = parse_code_element(ctx);
    match c::parse_declaration(&code) {
        Ok(definition) => Some(Member {
            owner: String::from(owner),
            definition,
            api,
            values,
            explicit_offset: None,
        }),
        Err(desc) => {
            ctx.invalid_declaration(code, desc);
            None
        }
    }
}

fn parse_enums<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Enums> {
    let mut name = None;
    let mut kind = None;
    let mut bitwidth = None;
    let mut comment = None;
    let mut children = Vec::new();

    match_attributes! {ctx, a in attributes,
        "name"     => name     = Some(a.value),
        "type"     => kind     = Some(a.value),
        "bitwidth" => bitwidth = Some(a.value),
        "comment"  => comment  = Some(a.value),
        "start" | "end" | "vendor" => ()
    }

    match_elements! {ctx, attributes,
        "enum" => if let Some(v) = parse_enum(ctx, attributes) {
            children.push(v);
        },
        "unused" => consume_current_element(ctx),
        "comment" => {
            parse_text_element(ctx);
        }
    }

    let bitwidth = match bitwidth {
        Some(text) => match parse_integer(ctx, &text).map(u32::try_from) {
            Some(Ok(v)) => Some(v),
            _ => return None,
        },
        None => None,
    };

    Some(Enums {
        name,
        kind,
        bitwidth,
        comment,
        children,
    })
}

fn parse_command<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Command> {
    let mut name = None;
    let mut alias = None;
    let mut api = None;
    let mut successcodes = None;
    let mut errorcodes = None;
    let mut comment = None;

    match_attributes! {ctx, a in attributes,
        "name"         => name         = Some(a.value),
        "alias"        => alias        = Some(a.value),
        "api"          => api          = Some(a.value),
        "successcodes" => successcodes = Some(a.value),
        "errorcodes"   => errorcodes   = Some(a.value),
        "comment"      => comment      = Some(a.value),
        "queues" | "renderpass" | "cmdbufferlevel" | "pipeline" | "tasks" | "videocoding"
            | "conditionalrendering" | "allownoqueues" | "export" => ()
    }

    if let Some(alias) = alias {
        unwrap_attribute!(ctx, command, name);
        consume_current_element(ctx);
        return Some(Command::Alias { name, alias });
    }

    let mut proto = None;
    let mut params = Vec::new();

    match_elements! {ctx, attributes,
        "proto" => {
            let code = parse_code_element(ctx);
            match c::parse_prototype(&code) {
                Ok(v) => proto = Some(v),
                Err(desc) => ctx.invalid_declaration(code, desc),
            }
        },
        "param" => {
            let mut api = None;
            let mut len = None;
            let mut optional = None;

            match_attributes!{ctx, a in attributes,
                "api"      => api      = Some(a.value),
                "len"      => len      = Some(a.value),
                "optional" => optional = Some(a.value),
                "altlen" | "externsync" | "noautovalidity" | "objecttype" | "validstructs"
                    | "stride" => ()
            }

            let code = parse_code_element(ctx);
            match c::parse_declaration(&code) {
                Ok(definition) => params.push(CommandParam {
                    api,
                    len,
                    optional,
                    definition,
                }),
                Err(desc) => ctx.invalid_declaration(code, desc),
            }
        },
        "alias" | "implicitexternsyncparams" => consume_current_element(ctx),
        "description" => {
            parse_text_element(ctx);
        }
    }

    unwrap_element!(ctx, proto, "proto");

    Some(Command::Definition(Box::new(CommandDefinition {
        api,
        comment,
        successcodes,
        errorcodes,
        proto,
        params,
    })))
}

fn parse_enum<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Enum> {
    let mut name = None;
    let mut comment = None;
    let mut type_suffix = None;
    let mut api = None;
    let mut extends = None;
    let mut value = None;
    let mut bitpos = None;
    let mut extnumber = None;
    let mut offset = None;
    let mut positive = true;
    let mut alias = None;

    match_attributes! {ctx, a in attributes,
        "name" => name = Some(a.value),
        "comment" => comment = Some(a.value),
        "type" => type_suffix = Some(a.value),
        "api" => api = Some(a.value),
        "extends" => extends = Some(a.value),
        "value" => value = Some(a.value),
        "offset" => offset = Some(a.value),
        "dir" => {
            if a.value.as_str() == "-" {
                positive = false;
            } else {
                ctx.errors.push(Error::UnexpectedAttributeValue {
                    xpath: ctx.xpath.clone(),
                    name: String::from("dir"),
                    value: a.value
                });
            }
        },
        "bitpos" => bitpos = Some(a.value),
        "extnumber" => extnumber = Some(a.value),
        "alias" => alias = Some(a.value),
        "protect" | "deprecated" => ()
    }

    unwrap_attribute!(ctx, enum, name);

    let count = [offset.is_some(), bitpos.is_some(), value.is_some(), alias.is_some()]
        .iter()
        .filter(|v| **v)
        .count();
    if count > 1 {
        ctx.errors.push(Error::SchemaViolation {
            xpath: ctx.xpath.clone(),
            desc: format!(
                "Unable to determine correct specification of enum: offset={:?}, bitpos={:?}, value={:?}, alias={:?}",
                offset, bitpos, value, alias
            ),
        });
        consume_current_element(ctx);
        return None;
    }

    let spec = if let Some(alias) = alias {
        EnumSpec::Alias { alias, extends }
    } else if let Some(offset) = offset {
        let offset = match parse_integer(ctx, &offset) {
            Some(v) => v,
            None => {
                consume_current_element(ctx);
                return None;
            }
        };
        if let Some(extends) = extends {
            EnumSpec::Offset {
                offset,
                extends,
                extnumber: match extnumber {
                    Some(extnumber) => parse_integer(ctx, &extnumber),
                    None => None,
                },
                dir: positive,
            }
        } else {
            ctx.errors.push(Error::SchemaViolation {
                xpath: ctx.xpath.clone(),
                desc: String::from("enum with an offset has no `extends`"),
            });
            consume_current_element(ctx);
            return None;
        }
    } else if let Some(bitpos) = bitpos {
        let bitpos = match parse_integer(ctx, &bitpos) {
            Some(v) => v,
            None => {
                consume_current_element(ctx);
                return None;
            }
        };
        EnumSpec::Bitpos { bitpos, extends }
    } else if let Some(value) = value {
        EnumSpec::Value { value, extends }
    } else {
        EnumSpec::None
    };

    consume_current_element(ctx);

    Some(Enum {
        name,
        comment,
        type_suffix,
        api,
        spec,
    })
}

fn parse_feature<R: Read>(ctx: &mut ParseCtx<R>, attributes: Vec<XmlAttribute>) -> Option<Feature> {
    let mut api = None;
    let mut name = None;
    let mut number = None;
    let mut depends = None;
    let mut comment = None;
    let mut children = Vec::new();

    match_attributes! {ctx, a in attributes,
        "api"     => api     = Some(a.value),
        "name"    => name    = Some(a.value),
        "number"  => number  = Some(a.value),
        "depends" => depends = Some(a.value),
        "comment" => comment = Some(a.value),
        "protect" | "apitype" => ()
    }

    match_elements! {ctx, attributes,
        "require" => children.push(parse_extension_item_require(ctx, attributes)),
        "remove"  => children.push(parse_extension_item_remove(ctx, attributes)),
        "deprecate" => consume_current_element(ctx)
    }

    unwrap_attribute!(ctx, feature, api);
    unwrap_attribute!(ctx, feature, name);
    unwrap_attribute!(ctx, feature, number);

    Some(Feature {
        api,
        name,
        number,
        depends,
        comment,
        children,
    })
}

fn parse_extension<R: Read>(
    ctx: &mut ParseCtx<R>,
    attributes: Vec<XmlAttribute>,
) -> Option<Extension> {
    let mut name = None;
    let mut comment = None;
    let mut number = None;
    let mut platform = None;
    let mut ext_type = None;
    let mut requires = None;
    let mut depends = None;
    let mut supported = None;
    let mut promotedto = None;
    let mut provisional = None;
    let mut children = Vec::new();

    match_attributes! {ctx, a in attributes,
        "name"         => name          = Some(a.value),
        "comment"      => comment       = Some(a.value),
        "number"       => number        = Some(a.value),
        "platform"     => platform      = Some(a.value),
        "type"         => ext_type      = Some(a.value),
        "requires"     => requires      = Some(a.value),
        "depends"      => depends       = Some(a.value),
        "supported"    => supported     = Some(a.value),
        "promotedto"   => promotedto    = Some(a.value),
        "provisional"  => provisional   = Some(a.value),
        "protect" | "author" | "contact" | "requiresCore" | "deprecatedby" | "obsoletedby"
            | "specialuse" | "sortorder" | "ratified" | "nofeatures" => ()
    }

    let number = match number {
        Some(text) => parse_integer(ctx, &text),
        None => None,
    };

    let provisional = match provisional {
        Some(value) => {
            if value == "true" {
                true
            } else {
                ctx.errors.push(Error::SchemaViolation {
                    xpath: ctx.xpath.clone(),
                    desc: format!("Unexpected value of 'provisional' attribute: {}", value),
                });
                false
            }
        }
        None => false,
    };

    unwrap_attribute!(ctx, extension, name);

    match_elements! {ctx, attributes,
        "require" => children.push(parse_extension_item_require(ctx, attributes)),
        "remove" => children.push(parse_extension_item_remove(ctx, attributes)),
        "deprecate" => consume_current_element(ctx)
    }

    Some(Extension {
        name,
        number,
        ext_type,
        platform,
        supported,
        provisional,
        promotedto,
        depends: depends.or(requires),
        comment,
        children,
    })
}

fn parse_extension_item_require<R: Read>(
    ctx: &mut ParseCtx<R>,
    attributes: Vec<XmlAttribute>,
) -> ExtensionChild {
    let mut api = None;
    let mut extension = None;
    let mut feature = None;
    let mut depends = None;
    let mut comment = None;
    let mut items = Vec::new();

    match_attributes! {ctx, a in attributes,
        "api"       => api       = Some(a.value),
        "extension" => extension = Some(a.value),
        "feature"   => feature   = Some(a.value),
        "depends"   => depends   = Some(a.value),
        "comment"   => comment   = Some(a.value),
        "profile"   => ()
    }

    parse_interface_items(ctx, &mut items);

    let depends = depends.or_else(|| match (feature, extension) {
        (Some(feature), Some(extension)) => Some(format!("{}+{}", feature, extension)),
        (feature, extension) => feature.or(extension),
    });

    ExtensionChild::Require {
        api,
        depends,
        comment,
        items,
    }
}

fn parse_extension_item_remove<R: Read>(
    ctx: &mut ParseCtx<R>,
    attributes: Vec<XmlAttribute>,
) -> ExtensionChild {
    let mut api = None;
    let mut comment = None;
    let mut items = Vec::new();

    match_attributes! {ctx, a in attributes,
        "api"     => api     = Some(a.value),
        "comment" => comment = Some(a.value),
        "profile" | "reasonlink" => ()
    }

    parse_interface_items(ctx, &mut items);

    ExtensionChild::Remove {
        api,
        comment,
        items,
    }
}

fn parse_interface_items<R: Read>(ctx: &mut ParseCtx<R>, items: &mut Vec<InterfaceItem>) {
    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                let name = name.local_name.as_str();
                ctx.push_element(name);
                if let Some(v) = parse_interface_item(ctx, name, attributes) {
                    items.push(v);
                }
            }
            XmlEvent::EndElement { .. } => {
                ctx.pop_element();
                break;
            }
            _ => {}
        }
    }
}

fn parse_interface_item<R: Read>(
    ctx: &mut ParseCtx<R>,
    name: &str,
    attributes: Vec<XmlAttribute>,
) -> Option<InterfaceItem> {
    match name {
        "comment" => Some(InterfaceItem::Comment(parse_text_element(ctx))),
        "type" => {
            let mut name = None;
            let mut comment = None;
            match_attributes! {ctx, a in attributes,
                "name"    => name    = Some(a.value),
                "comment" => comment = Some(a.value)
            }
            consume_current_element(ctx);
            unwrap_attribute!(ctx, type, name);
            Some(InterfaceItem::Type { name, comment })
        }
        "enum" => parse_enum(ctx, attributes).map(InterfaceItem::Enum),
        "command" => {
            let mut name = None;
            let mut comment = None;
            match_attributes! {ctx, a in attributes,
                "name"    => name    = Some(a.value),
                "comment" => comment = Some(a.value)
            }
            consume_current_element(ctx);
            unwrap_attribute!(ctx, command, name);
            Some(InterfaceItem::Command { name, comment })
        }
        // feature structure members enabling an interface, nothing to generate
        "feature" => {
            consume_current_element(ctx);
            None
        }
        _ => {
            ctx.errors.push(Error::UnexpectedElement {
                xpath: ctx.xpath.clone(),
                name: String::from(name),
            });
            consume_current_element(ctx);
            None
        }
    }
}

fn parse_integer<R: Read>(ctx: &mut ParseCtx<R>, text: &str) -> Option<i64> {
    let parse_res = if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else {
        text.parse::<i64>()
    };

    match parse_res {
        Ok(v) => Some(v),
        Err(error) => {
            ctx.errors.push(Error::ParseIntError {
                xpath: ctx.xpath.clone(),
                text: String::from(text),
                error,
            });
            None
        }
    }
}

/// Collects the C code of a `<member>`, `<param>` or `<proto>` element,
/// dropping embedded comments.
fn parse_code_element<R: Read>(ctx: &mut ParseCtx<R>) -> String {
    let mut code = String::new();
    match_elements_combine_text! {ctx, code,
        "type" => code.push_str(&parse_text_element(ctx)),
        "name" => code.push_str(&parse_text_element(ctx)),
        "enum" => code.push_str(&parse_text_element(ctx)),
        "comment" => {
            parse_text_element(ctx);
        }
    }
    code
}

fn consume_current_element<R: Read>(ctx: &mut ParseCtx<R>) {
    let mut depth = 1;
    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::StartElement { name, .. } => {
                ctx.push_element(name.local_name.as_str());
                depth += 1;
            }
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                ctx.pop_element();
                if depth == 0 {
                    break;
                }
            }
            _ => (),
        }
    }
}

fn parse_text_element<R: Read>(ctx: &mut ParseCtx<R>) -> String {
    let mut result = String::new();
    let mut depth = 1;
    while let Some(e) = ctx.next_event() {
        match e {
            XmlEvent::StartElement { name, .. } => {
                ctx.push_element(name.local_name.as_str());
                depth += 1;
            }
            XmlEvent::Characters(text) => result.push_str(&text),
            XmlEvent::EndElement { .. } => {
                depth -= 1;
                ctx.pop_element();
                if depth == 0 {
                    break;
                }
            }
            _ => (),
        }
    }
    result
}
