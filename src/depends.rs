//! `depends` expressions of features, extensions and require blocks, such as
//! `VK_KHR_get_physical_device_properties2+(VK_KHR_surface,VK_VERSION_1_1)`.
//! `,` is logical or, `+` is logical and and binds tighter.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::separated_list1,
    sequence::delimited,
    Finish, IResult,
};

use crate::error::{GenError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Depends {
    Name(String),
    All(Vec<Depends>),
    Any(Vec<Depends>),
}

impl Depends {
    pub fn parse(text: &str) -> std::result::Result<Depends, String> {
        match all_consuming(any)(text).finish() {
            Ok((_, expr)) => Ok(expr),
            Err(e) => Err(format!("{:?} at '{}'", e.code, e.input)),
        }
    }

    pub fn evaluate<F: Fn(&str) -> bool>(&self, is_enabled: &F) -> bool {
        match self {
            Depends::Name(name) => is_enabled(name),
            Depends::All(terms) => terms.iter().all(|t| t.evaluate(is_enabled)),
            Depends::Any(terms) => terms.iter().any(|t| t.evaluate(is_enabled)),
        }
    }

    /// Names mentioned anywhere in the expression.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Depends::Name(name) => vec![name.as_str()],
            Depends::All(terms) | Depends::Any(terms) => {
                terms.iter().flat_map(|t| t.names()).collect()
            }
        }
    }
}

fn name(input: &str) -> IResult<&str, Depends> {
    map(
        delimited(
            multispace0,
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == ':'),
            multispace0,
        ),
        |n: &str| Depends::Name(n.to_string()),
    )(input)
}

fn term(input: &str) -> IResult<&str, Depends> {
    alt((
        delimited(
            delimited(multispace0, char('('), multispace0),
            any,
            delimited(multispace0, char(')'), multispace0),
        ),
        name,
    ))(input)
}

fn flatten(mut terms: Vec<Depends>, wrap: fn(Vec<Depends>) -> Depends) -> Depends {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        wrap(terms)
    }
}

fn all(input: &str) -> IResult<&str, Depends> {
    map(separated_list1(char('+'), term), |t| flatten(t, Depends::All))(input)
}

fn any(input: &str) -> IResult<&str, Depends> {
    map(separated_list1(char(','), all), |t| flatten(t, Depends::Any))(input)
}

/// Evaluates `text` against the set of enabled feature and extension names.
///
/// An unparseable expression is an error when `strict` is set and
/// unsatisfied otherwise.
pub fn satisfied<F: Fn(&str) -> bool>(text: &str, strict: bool, is_enabled: F) -> Result<bool> {
    match Depends::parse(text) {
        Ok(expr) => Ok(expr.evaluate(&is_enabled)),
        Err(desc) if strict => Err(GenError::MalformedElement {
            element: format!("depends=\"{}\"", text),
            desc,
        }),
        Err(e) => {
            log::warn!("unable to parse depends expression `{}`: {}", text, e);
            Ok(false)
        }
    }
}
