use std::path::PathBuf;

use thiserror::Error;

use crate::types;

/// Errors that abort a generation run. No output is written when one occurs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenError {
    #[error("failed to read registry {}: {source}", .path.display())]
    Registry {
        path: PathBuf,
        #[source]
        source: types::FatalError,
    },

    #[error("registry is malformed ({count} diagnostics), first at {first}")]
    Malformed { count: usize, first: types::Error },

    #[error("`{element}` is malformed: {desc}")]
    MalformedElement { element: String, desc: String },

    #[error("unresolvable type `{name}` referenced by `{context}`")]
    UnresolvedType { name: String, context: String },

    #[error("`{name}` is an alias of `{target}`, which does not exist")]
    DanglingAlias { name: String, target: String },

    #[error("alias cycle while resolving `{name}`: {chain}")]
    AliasCycle { name: String, chain: String },

    #[error("`{first}` and `{second}` both map to `{output}` in {scope}")]
    NameCollision {
        scope: String,
        output: String,
        first: String,
        second: String,
    },

    #[error("constant `{name}` has unparseable value `{value}`: {desc}")]
    InvalidLiteral {
        name: String,
        value: String,
        desc: String,
    },

    #[error("array bound `{constant}` of `{owner}.{member}` is not an integer")]
    NonNumericBound {
        owner: String,
        member: String,
        constant: String,
    },

    #[error("`{owner}.{member}` declares offset {declared}, layout computes {computed}")]
    LayoutMismatch {
        owner: String,
        member: String,
        declared: usize,
        computed: usize,
    },

    #[error("`{owner}.{member}` is a {bits}-bit field, which is not a whole number of bytes")]
    UnsupportedBitfield {
        owner: String,
        member: String,
        bits: u8,
    },

    #[error("value {value} of `{owner}::{member}` does not fit in {repr}")]
    ValueOutOfRange {
        owner: String,
        member: String,
        value: i64,
        repr: &'static str,
    },

    #[error("enumerant `{name}` of `{owner}` is defined as both {first} and {second}")]
    ConflictingValue {
        owner: String,
        name: String,
        first: i64,
        second: i64,
    },

    #[error("`{owner}`: {desc}")]
    Inconsistent { owner: String, desc: String },

    #[error("unknown extension `{0}` requested")]
    UnknownExtension(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to format output")]
    Fmt(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;
