//! Parsers for the fragments of C that appear inside registry elements:
//! member and parameter declarations, function pointer typedefs and the
//! literal values of API constants.

use nom::{
    branch::alt,
    bytes::complete::{escaped, is_not, tag},
    character::complete::{
        alpha1, alphanumeric1, char, digit0, digit1, hex_digit1, multispace0, oct_digit1, one_of,
    },
    combinator::{all_consuming, map, map_res, not, opt, peek, recognize, value},
    error::ParseError,
    multi::{many0, many0_count, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Finish, IResult,
};
use std::num::{NonZeroU8, NonZeroUsize};
use std::str::FromStr;

use crate::types::{ArrayLength, NameWithType, PointerKind};

/// A combinator that takes a parser `inner` and produces a parser that also consumes both leading and
/// trailing whitespace, returning the output of `inner`.
pub fn ws<'a, F: 'a, O, E: ParseError<&'a str>>(
    inner: F,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(word), not(peek(alt((alphanumeric1, tag("_"))))))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Octal,
    Hexadecimal,
}

/// Literal value of an API constant with C suffixes removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer { value: u64, radix: Radix },
    /// `~N`, bitwise complement of an unsigned integer.
    Complement { value: u64, radix: Radix },
    /// Float text without the `f`/`F` suffix.
    Float(String),
    Str(String),
}

fn decimal(input: &str) -> IResult<&str, u64> {
    map_res(recognize(pair(one_of("123456789"), digit0)), u64::from_str)(input)
}

fn octal(input: &str) -> IResult<&str, u64> {
    map_res(preceded(char('0'), oct_digit1), |out: &str| {
        u64::from_str_radix(out, 8)
    })(input)
}

fn hexadecimal(input: &str) -> IResult<&str, u64> {
    map_res(
        preceded(alt((tag("0x"), tag("0X"))), hex_digit1),
        |out: &str| u64::from_str_radix(out, 16),
    )(input)
}

fn integer_suffix(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(pair(one_of("uU"), alt((tag("ll"), tag("LL"))))),
        recognize(pair(one_of("uU"), opt(one_of("lL")))),
        recognize(pair(alt((tag("ll"), tag("LL"))), opt(one_of("uU")))),
        recognize(pair(one_of("lL"), opt(one_of("uU")))),
    ))(input)
}

fn integer_constant(input: &str) -> IResult<&str, (u64, Radix)> {
    terminated(
        alt((
            map(hexadecimal, |v| (v, Radix::Hexadecimal)),
            map(octal, |v| (v, Radix::Octal)),
            map(decimal, |v| (v, Radix::Decimal)),
            value((0, Radix::Decimal), char('0')),
        )),
        opt(integer_suffix),
    )(input)
}

fn float_constant(input: &str) -> IResult<&str, String> {
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    map(
        terminated(
            recognize(tuple((digit1, char('.'), digit0, opt(exponent)))),
            opt(one_of("fFlL")),
        ),
        String::from,
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, &str> {
    map(
        delimited(
            char('"'),
            opt(escaped(is_not("\"\\"), '\\', one_of(r#""n\"#))),
            char('"'),
        ),
        |s| s.unwrap_or(""),
    )(input)
}

fn literal_value(input: &str) -> IResult<&str, Literal> {
    alt((
        map(string_literal, |s| Literal::Str(s.to_string())),
        map(
            preceded(ws(char('~')), integer_constant),
            |(value, radix)| Literal::Complement { value, radix },
        ),
        map(float_constant, Literal::Float),
        map(integer_constant, |(value, radix)| Literal::Integer { value, radix }),
    ))(input)
}

fn parenthesized_literal(input: &str) -> IResult<&str, Literal> {
    alt((
        delimited(ws(char('(')), parenthesized_literal, ws(char(')'))),
        ws(literal_value),
    ))(input)
}

fn signed_integer(input: &str) -> IResult<&str, i64> {
    map_res(
        pair(opt(ws(char('-'))), integer_constant),
        |(sign, (value, _))| -> Result<i64, std::num::TryFromIntError> {
            let value = i64::try_from(value)?;
            Ok(if sign.is_some() { -value } else { value })
        },
    )(input)
}

fn run<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
    input: &'a str,
) -> Result<O, String> {
    match all_consuming(delimited(multispace0, parser, multispace0))(input).finish() {
        Ok((_, out)) => Ok(out),
        Err(e) => Err(format!("{:?} at '{}'", e.code, e.input.trim())),
    }
}

/// Parses the literal value of a constant: `256`, `0x10`, `(~0U)`, `1000.0F`, `"VK_KHR_surface"`.
pub fn parse_literal(text: &str) -> Result<Literal, String> {
    run(parenthesized_literal, text)
}

/// Parses the value of an enumerant: `-1`, `0x7FFFFFFF`, `1000`.
pub fn parse_integer(text: &str) -> Option<i64> {
    run(signed_integer, text).ok()
}

// `*` optionally followed by `const`, which qualifies the pointer itself.
fn pointer(input: &str) -> IResult<&str, bool> {
    preceded(
        ws(char('*')),
        map(opt(ws(keyword("const"))), |c| c.is_some()),
    )(input)
}

fn array_dimension(input: &str) -> IResult<&str, ArrayLength> {
    delimited(
        ws(char('[')),
        alt((
            map_res(integer_constant, |(v, _)| {
                usize::try_from(v)
                    .ok()
                    .and_then(NonZeroUsize::new)
                    .map(ArrayLength::Static)
                    .ok_or("zero or oversized array length")
            }),
            map(identifier, |c| ArrayLength::Constant(c.to_string())),
        )),
        ws(char(']')),
    )(input)
}

fn bitfield(input: &str) -> IResult<&str, NonZeroU8> {
    preceded(
        ws(char(':')),
        map_res(digit1, |d: &str| {
            d.parse::<u8>()
                .ok()
                .and_then(NonZeroU8::new)
                .ok_or("invalid bit-field width")
        }),
    )(input)
}

struct DeclaredType<'a> {
    is_const: bool,
    is_struct: bool,
    type_name: &'a str,
    pointers: Vec<bool>,
}

fn declared_type(input: &str) -> IResult<&str, DeclaredType<'_>> {
    map(
        tuple((
            opt(ws(keyword("const"))),
            opt(ws(keyword("struct"))),
            ws(identifier),
            many0(pointer),
        )),
        |(is_const, is_struct, type_name, pointers)| DeclaredType {
            is_const: is_const.is_some(),
            is_struct: is_struct.is_some(),
            type_name,
            pointers,
        },
    )(input)
}

fn declaration(
    input: &str,
) -> IResult<&str, (DeclaredType<'_>, &str, Vec<ArrayLength>, Option<NonZeroU8>)> {
    tuple((
        declared_type,
        ws(identifier),
        many0(array_dimension),
        opt(bitfield),
    ))(input)
}

fn pointer_kind(is_const: bool, pointers: &[bool]) -> Result<Option<PointerKind>, String> {
    match pointers {
        [] => Ok(None),
        [_] => Ok(Some(PointerKind::Single { is_const })),
        [outer, _] => Ok(Some(PointerKind::Double {
            is_const: *outer,
            inner_is_const: is_const,
        })),
        _ => Err(format!("unsupported pointer depth {}", pointers.len())),
    }
}

fn build(
    ty: DeclaredType<'_>,
    name: &str,
    dims: Vec<ArrayLength>,
    bits: Option<NonZeroU8>,
) -> Result<NameWithType, String> {
    Ok(NameWithType {
        type_name: ty.type_name.to_string(),
        is_const: ty.is_const,
        pointer_kind: pointer_kind(ty.is_const, &ty.pointers)?,
        is_struct: ty.is_struct,
        bitfield_size: bits,
        array_shape: if dims.is_empty() { None } else { Some(dims) },
        name: name.to_string(),
    })
}

/// Parses a member or parameter declaration such as `const char* const* ppNames`,
/// `float matrix[3][4]` or `uint32_t mask:8`.
pub fn parse_declaration(code: &str) -> Result<NameWithType, String> {
    let (ty, name, dims, bits) = run(declaration, code)?;
    build(ty, name, dims, bits)
}

fn function_pointer_name(input: &str) -> IResult<&str, &str> {
    delimited(
        pair(ws(char('(')), opt(ws(tag("VKAPI_PTR")))),
        preceded(ws(char('*')), ws(identifier)),
        ws(char(')')),
    )(input)
}

fn parameter_list(
    input: &str,
) -> IResult<&str, Vec<(DeclaredType<'_>, &str, Vec<ArrayLength>, Option<NonZeroU8>)>> {
    alt((
        map(terminated(ws(keyword("void")), peek(char(')'))), |_| Vec::new()),
        separated_list1(ws(char(',')), declaration),
    ))(input)
}

fn function_pointer(
    input: &str,
) -> IResult<
    &str,
    (
        DeclaredType<'_>,
        &str,
        Vec<(DeclaredType<'_>, &str, Vec<ArrayLength>, Option<NonZeroU8>)>,
    ),
> {
    delimited(
        ws(keyword("typedef")),
        tuple((
            declared_type,
            function_pointer_name,
            delimited(ws(char('(')), parameter_list, ws(char(')'))),
        )),
        ws(char(';')),
    )(input)
}

/// Parses `typedef R (VKAPI_PTR *PFN_name)(params);` into the prototype and parameters.
pub fn parse_function_pointer(code: &str) -> Result<(NameWithType, Vec<NameWithType>), String> {
    let (ret, name, params) = run(function_pointer, code)?;
    let proto = build(ret, name, Vec::new(), None)?;
    let params = params
        .into_iter()
        .map(|(ty, name, dims, bits)| build(ty, name, dims, bits))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((proto, params))
}

/// Parses the `<proto>` of a command (`VkResult vkCreateInstance`) or of a
/// function pointer (`void* (VKAPI_PTR *PFN_vkAllocationFunction)`).
pub fn parse_prototype(code: &str) -> Result<NameWithType, String> {
    let (ty, name) = run(
        pair(declared_type, alt((function_pointer_name, ws(identifier)))),
        code,
    )?;
    build(ty, name, Vec::new(), None)
}
