use super::ast::{Argument, Expr, ParsedStatement};
use crate::ir::Function;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{
        alpha1, alphanumeric1, char, digit0, digit1, multispace1, one_of, satisfy, space1,
    },
    combinator::{map, map_opt, map_res, not, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

// --- Helpers ---

pub fn comment(input: &str) -> IResult<&str, ()> {
    value((), pair(tag("//"), take_while(|c| c != '\n')))(input)
}

/// Skips any run of whitespace and `//` comments.
pub fn sp(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(sp, inner)
}

/// A reserved word that is not the prefix of a longer identifier.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(terminated(
        tag(word),
        not(satisfy(|c: char| c.is_alphanumeric() || c == '_')),
    ))
}

fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn usize_parser(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

fn u64_parser(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(input)
}

/// Unsigned real literal: `3`, `3.`, `3.14`, `.5`, `1e-3`. Literals too
/// large for an `f64` are rejected.
fn real(input: &str) -> IResult<&str, f64> {
    map_opt(
        recognize(tuple((
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite()),
    )(input)
}

fn semicolon(input: &str) -> IResult<&str, char> {
    ws(char(';'))(input)
}

// --- Expressions ---

/// Deepest nesting of parentheses, function calls, signs and exponents
/// accepted in one expression.
pub const MAX_EXPR_DEPTH: usize = 64;

fn nested(input: &str, depth: usize) -> Result<usize, nom::Err<Error<&str>>> {
    if depth >= MAX_EXPR_DEPTH {
        Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)))
    } else {
        Ok(depth + 1)
    }
}

fn function_call(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (rest, name) = identifier(input)?;
    let func = Function::from_name(&name)
        .ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Tag)))?;
    let (rest, _) = ws(char('('))(rest)?;
    let depth = nested(input, depth)?;
    let (rest, arg) = terminated(|i| expr_at(i, depth), ws(char(')')))(rest)?;
    Ok((rest, Expr::Call(func, Box::new(arg))))
}

fn parenthesised(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (rest, _) = char('(')(input)?;
    let depth = nested(input, depth)?;
    terminated(move |i| expr_at(i, depth), ws(char(')')))(rest)
}

fn primary(input: &str, depth: usize) -> IResult<&str, Expr> {
    ws(alt((
        map(real, Expr::Float),
        |i| parenthesised(i, depth),
        |i| function_call(i, depth),
        map(identifier, Expr::Var),
    )))(input)
}

// Right-associative; binds tighter than unary minus.
fn power(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, base) = primary(input, depth)?;
    let (rest, caret) = opt(ws(char('^')))(input)?;
    if caret.is_none() {
        return Ok((input, base));
    }
    let depth = nested(input, depth)?;
    let (rest, exponent) = unary(rest, depth)?;
    Ok((rest, Expr::Pow(Box::new(base), Box::new(exponent))))
}

fn unary(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (rest, sign) = opt(ws(one_of("+-")))(input)?;
    let Some(sign) = sign else {
        return power(input, depth);
    };
    let depth = nested(input, depth)?;
    let (rest, operand) = unary(rest, depth)?;
    Ok((
        rest,
        if sign == '-' {
            Expr::Neg(Box::new(operand))
        } else {
            operand
        },
    ))
}

fn term(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = unary(input, depth)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), |i| unary(i, depth)))(input)?;
    let folded = rest.into_iter().fold(first, |lhs, (op, rhs)| match op {
        '*' => Expr::Mul(Box::new(lhs), Box::new(rhs)),
        _ => Expr::Div(Box::new(lhs), Box::new(rhs)),
    });
    Ok((input, folded))
}

fn expr_at(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, first) = term(input, depth)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), |i| term(i, depth)))(input)?;
    let folded = rest.into_iter().fold(first, |lhs, (op, rhs)| match op {
        '+' => Expr::Add(Box::new(lhs), Box::new(rhs)),
        _ => Expr::Sub(Box::new(lhs), Box::new(rhs)),
    });
    Ok((input, folded))
}

/// A parameter expression with the usual precedence: `^` over unary minus
/// over `* /` over `+ -`. Nesting deeper than [`MAX_EXPR_DEPTH`] is a hard
/// failure.
pub fn expr(input: &str) -> IResult<&str, Expr> {
    expr_at(input, 0)
}

// --- QASM Parsers ---

pub fn openqasm_version(input: &str) -> IResult<&str, String> {
    map(
        tuple((
            tag("OPENQASM"),
            space1,
            take_while1(|c: char| c != ';'),
            tag(";"),
        )),
        |(_, _, version, _): (&str, &str, &str, &str)| version.trim().to_string(),
    )(input)
}

pub fn include(input: &str) -> IResult<&str, ParsedStatement> {
    map(
        tuple((
            keyword("include"),
            ws(delimited(char('"'), take_while1(|c| c != '"'), char('"'))),
            semicolon,
        )),
        |(_, filename, _): (&str, &str, char)| ParsedStatement::Include(filename.to_string()),
    )(input)
}

fn register_decl<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, (String, usize)> {
    map(
        tuple((
            keyword(word),
            ws(identifier),
            delimited(ws(char('[')), ws(usize_parser), ws(char(']'))),
            semicolon,
        )),
        |(_, name, size, _)| (name, size),
    )
}

pub fn qreg(input: &str) -> IResult<&str, ParsedStatement> {
    map(register_decl("qreg"), |(name, size)| ParsedStatement::QReg(name, size))(input)
}

pub fn creg(input: &str) -> IResult<&str, ParsedStatement> {
    map(register_decl("creg"), |(name, size)| ParsedStatement::CReg(name, size))(input)
}

fn argument(input: &str) -> IResult<&str, Argument> {
    pair(
        ws(identifier),
        opt(delimited(ws(char('[')), ws(usize_parser), ws(char(']')))),
    )(input)
}

fn argument_list(input: &str) -> IResult<&str, Vec<Argument>> {
    separated_list1(ws(char(',')), argument)(input)
}

fn identifier_list(input: &str) -> IResult<&str, Vec<String>> {
    separated_list0(ws(char(',')), ws(identifier))(input)
}

pub fn gate_call(input: &str) -> IResult<&str, ParsedStatement> {
    let (input, name) = ws(identifier)(input)?;
    let (input, params) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expr),
        ws(char(')')),
    ))(input)?;
    let (input, qubits) = argument_list(input)?;
    let (input, _) = semicolon(input)?;

    Ok((
        input,
        ParsedStatement::Gate(name, qubits, params.unwrap_or_default()),
    ))
}

pub fn measure(input: &str) -> IResult<&str, ParsedStatement> {
    map(
        tuple((keyword("measure"), argument, ws(tag("->")), argument, semicolon)),
        |(_, q, _, c, _)| ParsedStatement::Measure(q, c),
    )(input)
}

pub fn reset(input: &str) -> IResult<&str, ParsedStatement> {
    map(
        tuple((keyword("reset"), argument, semicolon)),
        |(_, q, _)| ParsedStatement::Reset(q),
    )(input)
}

pub fn barrier(input: &str) -> IResult<&str, ParsedStatement> {
    map(
        tuple((keyword("barrier"), argument_list, semicolon)),
        |(_, qubits, _)| ParsedStatement::Barrier(qubits),
    )(input)
}

fn gate_signature(input: &str) -> IResult<&str, (String, Vec<String>, Vec<String>)> {
    let (input, name) = ws(identifier)(input)?;
    let (input, params) = opt(delimited(ws(char('(')), identifier_list, ws(char(')'))))(input)?;
    let (input, qubits) = identifier_list(input)?;
    Ok((input, (name, params.unwrap_or_default(), qubits)))
}

pub fn gate_def(input: &str) -> IResult<&str, ParsedStatement> {
    let (input, _) = keyword("gate")(input)?;
    let (input, (name, params, qubits)) = gate_signature(input)?;
    let (input, body) = delimited(
        ws(char('{')),
        many0(alt((barrier, gate_call))),
        ws(char('}')),
    )(input)?;
    Ok((input, ParsedStatement::GateDef(name, params, qubits, body)))
}

pub fn opaque(input: &str) -> IResult<&str, ParsedStatement> {
    let (input, _) = keyword("opaque")(input)?;
    let (input, (name, params, qubits)) = gate_signature(input)?;
    let (input, _) = semicolon(input)?;
    Ok((input, ParsedStatement::Opaque(name, params, qubits)))
}

pub fn if_stmt(input: &str) -> IResult<&str, ParsedStatement> {
    map(
        tuple((
            keyword("if"),
            ws(char('(')),
            ws(identifier),
            ws(tag("==")),
            ws(u64_parser),
            ws(char(')')),
            alt((measure, reset, gate_call)),
        )),
        |(_, _, creg, _, value, _, op)| ParsedStatement::If(creg, value, Box::new(op)),
    )(input)
}

/// Any statement allowed after the version header.
pub fn statement(input: &str) -> IResult<&str, ParsedStatement> {
    alt((
        include, qreg, creg, gate_def, opaque, measure, reset, barrier, if_stmt, gate_call,
    ))(input)
}
