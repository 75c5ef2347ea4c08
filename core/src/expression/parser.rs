//! A `nom`-based parser for template expressions.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    super::ast::{
        BinaryOp,
        Call,
        Expression,
    },
    nom::{
        branch::alt,
        bytes::complete::{
            tag,
            take_while,
        },
        character::complete::{
            alpha1,
            char,
            digit1,
            multispace0,
        },
        combinator::{
            map,
            opt,
            recognize,
            value,
        },
        error::{
            Error as NomError,
            ErrorKind,
            ParseError,
        },
        multi::separated_list0,
        sequence::{
            delimited,
            pair,
            preceded,
        },
        Err as NomErr,
        IResult,
        Parser,
    },
    serde_json::{
        Number as JsonNumber,
        Value as JsonValue,
    },
    std::cell::Cell,
};

const NULL: &str = "null";
const TRUE: &str = "true";
const FALSE: &str = "false";

/// Parse a complete expression.
pub(crate)
fn parse_expression(input: &str) -> Result<Expression, String> {
    let terms = Cell::new(0);
    let scope = Scope { depth: 0, terms: &terms, };

    match expression(input.trim(), scope) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(format!("unexpected {rem:?}")),
        Err(NomErr::Failure(e)) if e.code == ErrorKind::TooLarge => {
            Err(format!("nested deeper than {MAX_NESTING} levels"))
        },
        Err(NomErr::Failure(e)) if e.code == ErrorKind::Count => {
            Err(format!("more than {MAX_TERMS} terms"))
        },
        Err(e) => Err(e.to_string()),
    }
}

/// Whether the input is exactly one identifier.
pub(crate)
fn is_identifier(input: &str) -> bool {
    matches!(identifier(input), Ok(("", _)))
}

/// Whether the identifier is a keyword literal rather than a name.
pub(crate)
fn is_keyword(input: &str) -> bool {
    matches!(input, NULL | TRUE | FALSE)
}

pub(crate)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// A single or double quoted string. Backslash escapes the quote, a
/// backslash, `n`, `r` and `t`; any other escaped character is kept as is.
pub(crate)
fn string_literal(input: &str) -> IResult<&str, String> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c)) if c == '"' || c == '\'' => c,
        _ => return Err(NomErr::Error(NomError::from_error_kind(input, ErrorKind::Char))),
    };

    let mut output = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            let ch = match c {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                c if c == quote || c == '\\' => c,
                c => {
                    output.push('\\');
                    c
                },
            };
            output.push(ch);
            escaped = false;
        }
        else if c == '\\' {
            escaped = true;
        }
        else if c == quote {
            return Ok((&input[idx + c.len_utf8()..], output));
        }
        else {
            output.push(c);
        }
    }

    Err(NomErr::Error(NomError::from_error_kind(input, ErrorKind::Char)))
}

/// A combinator that takes a parser `inner` and produces a parser that consumes surrounding whitespace.
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// How deep groups, calls, indexes and negations may nest.
pub(crate) const MAX_NESTING: usize = 32;
/// How many terms one expression may hold.
pub(crate) const MAX_TERMS: usize = 512;

/// Limits shared by every parser of one expression.
#[derive(Clone, Copy)]
struct Scope<'b> {
    depth: usize,
    terms: &'b Cell<usize>,
}

impl Scope<'_> {
    fn nested<'a>(self, input: &'a str) -> Result<Self, NomErr<NomError<&'a str>>> {
        if self.depth >= MAX_NESTING {
            return Err(NomErr::Failure(NomError::from_error_kind(input, ErrorKind::TooLarge)));
        }

        Ok(Self { depth: self.depth + 1, ..self })
    }

    fn term<'a>(self, input: &'a str) -> Result<(), NomErr<NomError<&'a str>>> {
        let count = self.terms.get() + 1;
        if count > MAX_TERMS {
            return Err(NomErr::Failure(NomError::from_error_kind(input, ErrorKind::Count)));
        }

        self.terms.set(count);
        Ok(())
    }
}

/// Fold `operand (op operand)*` left to right.
fn binary_chain<'a, P, O>(
    input: &'a str,
    scope: Scope<'_>,
    mut operand: P,
    mut op: O,
) -> IResult<&'a str, Expression>
where
    P: Parser<&'a str, Output = Expression, Error = NomError<&'a str>>,
    O: Parser<&'a str, Output = BinaryOp, Error = NomError<&'a str>>,
{
    let (mut input, mut lhs) = operand.parse(input)?;

    loop {
        match op.parse(input) {
            Ok((rest, op)) => {
                let (rest, rhs) = operand.parse(rest)?;
                scope.term(input)?;
                lhs = Expression::binary(op, lhs, rhs);
                input = rest;
            },
            Err(NomErr::Error(_)) => return Ok((input, lhs)),
            Err(e) => return Err(e),
        }
    }
}

fn expression<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    ws(|i: &'a str| concat(i, scope)).parse(input)
}

fn concat<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    binary_chain(
        input,
        scope,
        |i: &'a str| sum(i, scope),
        ws(value(BinaryOp::Concat, char('.'))),
    )
}

fn sum<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    binary_chain(
        input,
        scope,
        |i: &'a str| product(i, scope),
        ws(alt((
            value(BinaryOp::Add, char('+')),
            value(BinaryOp::Sub, char('-')),
        ))),
    )
}

fn product<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    binary_chain(
        input,
        scope,
        |i: &'a str| unary(i, scope),
        ws(alt((
            value(BinaryOp::Mul, char('*')),
            value(BinaryOp::Div, char('/')),
            value(BinaryOp::Rem, char('%')),
        ))),
    )
}

fn unary<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    let minus: IResult<&str, char> = ws(char('-')).parse(input);

    match minus {
        Ok((rest, _)) => {
            let (rest, operand) = unary(rest, scope.nested(input)?)?;
            scope.term(input)?;
            Ok((rest, Expression::Negate(Box::new(operand))))
        },
        Err(NomErr::Error(_)) => postfix(input, scope),
        Err(e) => Err(e),
    }
}

enum Access {
    Member(String),
    Index(Expression),
}

fn index<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Access> {
    let (rest, _) = ws(char('[')).parse(input)?;
    let (rest, index) = expression(rest, scope.nested(input)?)?;
    let (rest, _) = char(']')(rest)?;
    Ok((rest, Access::Index(index)))
}

fn access<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Access> {
    alt((
        map(
            preceded(ws(tag("->")), identifier),
            |key| Access::Member(key.to_owned()),
        ),
        |i: &'a str| index(i, scope),
    ))
    .parse(input)
}

fn postfix<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    let (mut input, mut target) = primary(input, scope)?;

    loop {
        match access(input, scope) {
            Ok((rest, Access::Member(key))) => {
                scope.term(input)?;
                target = Expression::Member { target: Box::new(target), key, };
                input = rest;
            },
            Ok((rest, Access::Index(index))) => {
                scope.term(input)?;
                target = Expression::Index {
                    target: Box::new(target),
                    index: Box::new(index),
                };
                input = rest;
            },
            Err(NomErr::Error(_)) => return Ok((input, target)),
            Err(e) => return Err(e),
        }
    }
}

fn group<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    let (rest, _) = char('(')(input)?;
    let (rest, expr) = expression(rest, scope.nested(input)?)?;
    let (rest, _) = char(')')(rest)?;
    Ok((rest, expr))
}

fn primary<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    let (rest, expr) = ws(alt((
        number,
        map(string_literal, |s| Expression::Literal(JsonValue::String(s))),
        map(preceded(char('$'), identifier), |name| Expression::Variable(name.to_owned())),
        |i: &'a str| named(i, scope),
        |i: &'a str| group(i, scope),
    )))
    .parse(input)?;

    scope.term(input)?;
    Ok((rest, expr))
}

fn number(input: &str) -> IResult<&str, Expression> {
    let (rest, digits) = recognize(pair(
        digit1,
        opt(pair(char('.'), digit1)),
    ))
    .parse(input)?;

    let number = if digits.contains('.') {
        digits.parse::<f64>()
            .ok()
            .and_then(JsonNumber::from_f64)
    }
    else {
        digits.parse::<i64>().ok().map(JsonNumber::from)
    };

    match number {
        Some(n) => Ok((rest, Expression::Literal(JsonValue::Number(n)))),
        None => Err(NomErr::Error(NomError::from_error_kind(input, ErrorKind::Digit))),
    }
}

/// A keyword literal or a function call. Bare names are not expressions.
fn named<'a>(input: &'a str, scope: Scope<'_>) -> IResult<&'a str, Expression> {
    let (rest, name) = identifier(input)?;
    let open: IResult<&str, char> = ws(char('(')).parse(rest);

    match open {
        Ok((rest, _)) => {
            let inner = scope.nested(input)?;
            let (rest, args) = separated_list0(
                ws(char(',')),
                |i: &'a str| expression(i, inner),
            )
            .parse(rest)?;
            let (rest, _) = ws(char(')')).parse(rest)?;

            Ok((rest, Expression::Call(Call {
                name: name.to_owned(),
                callee: None,
                args,
            })))
        },
        Err(NomErr::Error(_)) => match name {
            NULL => Ok((rest, Expression::Literal(JsonValue::Null))),
            TRUE => Ok((rest, Expression::Literal(JsonValue::Bool(true)))),
            FALSE => Ok((rest, Expression::Literal(JsonValue::Bool(false)))),
            _ => Err(NomErr::Error(NomError::from_error_kind(input, ErrorKind::Tag))),
        },
        Err(e) => Err(e),
    }
}
