//! API constants as Rust literals.

use std::collections::HashMap;

use crate::c::{self, Literal, Radix};
use crate::error::{GenError, Result};
use crate::view::Constant;

/// Parses constant text and strips its C suffixes.
pub fn normalize(text: &str) -> std::result::Result<Literal, String> {
    c::parse_literal(text)
}

/// Rust spelling of a literal: `(~0U)` is `!0`, `"name"` is `b"name\0"`.
pub fn rust_literal(literal: &Literal) -> String {
    fn integer(value: u64, radix: Radix) -> String {
        match radix {
            Radix::Decimal => value.to_string(),
            Radix::Octal => format!("{:#o}", value),
            Radix::Hexadecimal => format!("{:#x}", value),
        }
    }
    match literal {
        Literal::Integer { value, radix } => integer(*value, *radix),
        Literal::Complement { value, radix } => format!("!{}", integer(*value, *radix)),
        Literal::Float(text) => text.clone(),
        Literal::Str(text) => format!("b\"{}\\0\"", text),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstant {
    pub literal: Literal,
    pub rust_type: String,
}

impl ResolvedConstant {
    pub fn rust_literal(&self) -> String {
        rust_literal(&self.literal)
    }
}

/// Resolves constants of a view, following aliases to their literal.
pub struct ConstantNormalizer<'a> {
    constants: HashMap<&'a str, &'a Constant>,
}

impl<'a> ConstantNormalizer<'a> {
    pub fn new(constants: &'a [Constant]) -> ConstantNormalizer<'a> {
        ConstantNormalizer {
            constants: constants.iter().map(|c| (c.name.as_str(), c)).collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedConstant> {
        let mut visited: Vec<&str> = Vec::new();
        let mut declared_type = None;
        let mut current = name;
        loop {
            let constant = match self.constants.get(current) {
                Some(c) => *c,
                None if visited.is_empty() => {
                    return Err(GenError::UnresolvedType {
                        name: name.to_string(),
                        context: String::from("constant reference"),
                    })
                }
                None => {
                    return Err(GenError::DanglingAlias {
                        name: name.to_string(),
                        target: current.to_string(),
                    })
                }
            };
            if visited.contains(&current) {
                visited.push(current);
                return Err(GenError::AliasCycle {
                    name: name.to_string(),
                    chain: visited.join(" -> "),
                });
            }
            visited.push(current);
            if declared_type.is_none() {
                declared_type = constant.type_name.as_deref();
            }

            match (&constant.value, &constant.alias) {
                (Some(value), _) => {
                    let literal = normalize(value).map_err(|desc| GenError::InvalidLiteral {
                        name: constant.name.clone(),
                        value: value.clone(),
                        desc,
                    })?;
                    let rust_type = rust_type(name, declared_type, &literal)?;
                    return Ok(ResolvedConstant { literal, rust_type });
                }
                (None, Some(alias)) => current = alias.as_str(),
                (None, None) => {
                    return Err(GenError::MalformedElement {
                        element: constant.name.clone(),
                        desc: String::from("constant has neither value nor alias"),
                    })
                }
            }
        }
    }

    /// Integer value of a constant, `None` if it is not an integer.
    pub fn integer(&self, name: &str) -> Result<Option<usize>> {
        if !self.constants.contains_key(name) {
            return Ok(None);
        }
        Ok(match self.resolve(name)?.literal {
            Literal::Integer { value, .. } => usize::try_from(value).ok(),
            _ => None,
        })
    }
}

fn rust_type(name: &str, declared: Option<&str>, literal: &Literal) -> Result<String> {
    let invalid = |desc: &str| GenError::InvalidLiteral {
        name: name.to_string(),
        value: rust_literal(literal),
        desc: desc.to_string(),
    };
    let ty = match (declared, literal) {
        (_, Literal::Str(_)) => "&[u8]",
        (Some("float"), Literal::Float(_)) | (None, Literal::Float(_)) => "f32",
        (Some("double"), Literal::Float(_)) => "f64",
        (_, Literal::Float(_)) => return Err(invalid("float value for an integer constant")),
        (Some("float"), _) | (Some("double"), _) => {
            return Err(invalid("integer value for a float constant"))
        }
        (Some("uint8_t"), _) => "u8",
        (Some("uint16_t"), _) => "u16",
        (Some("uint32_t"), _) => "u32",
        (Some("uint64_t"), _) => "u64",
        (Some("int32_t"), _) | (Some("int"), _) => "i32",
        (Some("int64_t"), _) => "i64",
        (Some("size_t"), _) => "usize",
        (Some(other), _) => return Err(invalid(&format!("unsupported constant type `{}`", other))),
        (None, Literal::Integer { value, .. }) | (None, Literal::Complement { value, .. }) => {
            if *value > u64::from(u32::MAX) {
                "u64"
            } else {
                "u32"
            }
        }
    };
    Ok(ty.to_string())
}
