//! Rust identifiers for registry names.

use std::collections::{HashMap, HashSet};

use crate::error::{GenError, Result};

/// Words that cannot be used as plain identifiers.
pub const RESERVED: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Escapes reserved words with a trailing underscore.
pub fn sanitize(identifier: &str) -> String {
    if RESERVED.contains(&identifier) {
        format!("{}_", identifier)
    } else {
        identifier.to_string()
    }
}

/// `camelCase` to `snake_case`; acronym runs stay together (`deviceUUID` is `device_uuid`).
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Struct field or parameter name.
pub fn field_name(name: &str) -> String {
    sanitize(&snake_case(name))
}

/// Struct, union, handle and function pointer names are kept as declared.
pub fn type_name(name: &str) -> String {
    sanitize(name)
}

/// Lowercases every capital that follows another capital, except the last
/// capital of a run that starts a new word: `KHR` becomes `Khr`.
pub fn collapse_acronyms(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_ascii_lowercase());
            if c.is_ascii_uppercase() && prev_upper && !next_lower {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

/// Rust name of an enumeration: `VkSurfaceTransformFlagBitsKHR` is `VkSurfaceTransformFlagsKhr`.
pub fn enum_type_name(name: &str) -> String {
    sanitize(&collapse_acronyms(&name.replace("FlagBits", "Flags")))
}

/// Name of an enumerant inside its enumeration.
///
/// The words spelling the enumeration name are stripped from the front:
/// `VK_IMAGE_TYPE_2D` of `VkImageType` is `TYPE_2D`, since an identifier
/// cannot start with a digit.
pub fn enum_member_name(enum_name: &str, member: &str, vendor_tags: &[String]) -> String {
    let mut stem = enum_name;
    if let Some(tag) = vendor_tags.iter().find(|t| stem.ends_with(t.as_str())) {
        stem = &stem[..stem.len() - tag.len()];
    }
    let stem = stem.replace("FlagBits", "").replace("Flags", "");

    // SCREAMING spelling of the stem and the offsets where its words end
    let mut prefix = String::new();
    let mut boundaries = HashSet::new();
    for word in snake_case(&stem).split('_') {
        let mut prev_digit = None;
        for c in word.chars() {
            let digit = c.is_ascii_digit();
            if prev_digit.map_or(false, |p| p != digit) {
                boundaries.insert(prefix.len());
            }
            prev_digit = Some(digit);
            prefix.push(c.to_ascii_uppercase());
        }
        boundaries.insert(prefix.len());
    }

    let words: Vec<&str> = member.split('_').filter(|w| !w.is_empty()).collect();
    let mut consumed = String::new();
    let mut stripped = 0;
    for (i, word) in words.iter().enumerate() {
        // keep at least one word
        if i + 1 == words.len() {
            break;
        }
        consumed.push_str(word);
        if !prefix.starts_with(&consumed) || !boundaries.contains(&consumed.len()) {
            break;
        }
        stripped = i + 1;
    }
    if stripped > 0 && words[stripped].starts_with(|c: char| c.is_ascii_digit()) {
        stripped -= 1;
    }
    sanitize(&words[stripped..].join("_"))
}

/// Output names claimed in one scope, such as the fields of one struct.
#[derive(Debug, Default)]
pub struct NameTable {
    scope: String,
    claimed: HashMap<String, String>,
}

impl NameTable {
    pub fn new(scope: &str) -> NameTable {
        NameTable {
            scope: scope.to_string(),
            claimed: HashMap::new(),
        }
    }

    /// Claims `output` for the element identified by `identity`.
    ///
    /// Returns false when the same element already claimed the name and its
    /// emission should be skipped. Two elements claiming one name is an error.
    pub fn claim(&mut self, output: &str, identity: &str) -> Result<bool> {
        match self.claimed.get(output) {
            None => {
                self.claimed.insert(output.to_string(), identity.to_string());
                Ok(true)
            }
            Some(previous) if previous == identity => Ok(false),
            Some(previous) => Err(GenError::NameCollision {
                scope: self.scope.clone(),
                output: output.to_string(),
                first: previous.clone(),
                second: identity.to_string(),
            }),
        }
    }
}
