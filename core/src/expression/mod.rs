//! Resolves the directives left after tag substitution.
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

pub(crate) mod ast;
pub(crate) mod engine;
pub(crate) mod parser;

use {
    crate::{
        error::{
            Error,
            Result,
        },
        escape::Escaper,
        functions::{
            to_string,
            Builtin,
            FunctionRegistry,
        },
        scan::Directive,
        tag::{
            escape_for,
            Piece,
        },
        template::Template,
    },
    ast::{
        Call,
        Callee,
        Expression,
    },
    engine::{
        evaluate,
        EvaluationContext,
    },
    log::trace,
    parser::{
        is_identifier,
        is_keyword,
        parse_expression,
    },
};

/// Bind every call in the expression, registered functions first. Returns
/// the name of the first call that cannot be bound.
pub(crate)
fn bind(expr: &mut Expression, functions: &FunctionRegistry) -> std::result::Result<(), String> {
    expr.calls_mut(&mut |call: &mut Call| {
        call.callee = if let Some(func) = functions.get(&call.name) {
            Some(Callee::Registered(func.clone()))
        }
        else if let Some(builtin) = Builtin::from_name(&call.name) {
            Some(Callee::Builtin(builtin))
        }
        else {
            return Err(call.name.to_owned());
        };

        Ok(())
    })
}

fn evaluate_directive(
    template: &Template,
    directive: &Directive,
    functions: &FunctionRegistry,
) -> Result<Option<String>> {
    let body = directive.body;

    // unknown tag
    if body.is_empty() || (is_identifier(body) && !is_keyword(body)) {
        trace!("dropping {:?} in {:?}", directive.raw, template.path());
        return Ok(None);
    }

    let mut expr = parse_expression(body).map_err(|message| Error::Expression(
        body.to_owned(),
        message,
        template.path().to_owned(),
    ))?;

    bind(&mut expr, functions).map_err(|name| Error::UnregisteredFunction(
        name,
        body.to_owned(),
        template.path().to_owned(),
    ))?;

    let ctx = EvaluationContext { template, fragment: body, };
    let value = evaluate(&expr, &ctx)?;
    Ok(Some(to_string(&value)))
}

/// Evaluate every pending directive and join the pieces into the output.
pub(crate)
fn resolve(
    template: &Template,
    pieces: Vec<Piece<'_>>,
    functions: &FunctionRegistry,
    escaper: &dyn Escaper,
) -> Result<String> {
    let mut output = String::new();

    for piece in pieces {
        match piece {
            Piece::Text(text) => output.push_str(text),
            Piece::Value(value) => output.push_str(&value),
            Piece::Pending(directive) => {
                if let Some(value) = evaluate_directive(template, &directive, functions)? {
                    output.push_str(&escape_for(directive.kind, &value, escaper));
                }
            },
        }
    }

    Ok(output)
}
