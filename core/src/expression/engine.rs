//! Evaluates bound expressions against a template.
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
        Callee,
        Expression,
    },
    crate::{
        error::{
            Error,
            Result,
        },
        functions::{
            number,
            to_number,
            to_string,
        },
        template::Template,
    },
    serde_json::Value as JsonValue,
};

/// What an expression may see while it is evaluated: the variables of the
/// template chain and nothing else.
pub(crate)
struct EvaluationContext<'a> {
    pub(crate) template: &'a Template,
    /// The expression source, for error messages.
    pub(crate) fragment: &'a str,
}

impl EvaluationContext<'_> {
    fn failure<S: Into<String>>(&self, message: S) -> Error {
        Error::Evaluation(
            self.fragment.to_owned(),
            message.into(),
            self.template.path().to_owned(),
        )
    }
}

fn type_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn index(ctx: &EvaluationContext, target: JsonValue, index: JsonValue) -> Result<JsonValue> {
    match (target, index) {
        (JsonValue::Array(mut items), JsonValue::Number(n)) => match n.as_u64() {
            Some(idx) if (idx as usize) < items.len() => Ok(items.swap_remove(idx as usize)),
            Some(_) => Ok(JsonValue::Null),
            None => Err(ctx.failure(format!("{n} is not a valid index"))),
        },
        (JsonValue::Object(mut map), JsonValue::String(key)) => {
            Ok(map.remove(&key).unwrap_or(JsonValue::Null))
        },
        (JsonValue::Object(mut map), JsonValue::Number(n)) => {
            Ok(map.remove(&n.to_string()).unwrap_or(JsonValue::Null))
        },
        (JsonValue::Null, _) => Ok(JsonValue::Null),
        (target, index) => Err(ctx.failure(format!(
            "cannot index {} with {}",
            type_name(&target),
            type_name(&index),
        ))),
    }
}

/// Apply a numeric operation. `op` yields `None` when dividing by zero.
fn arithmetic<F>(ctx: &EvaluationContext, lhs: &JsonValue, rhs: &JsonValue, op: F) -> Result<JsonValue>
where
    F: FnOnce(f64, f64) -> Option<f64>
{
    let l = to_number(lhs).map_err(|m| ctx.failure(m))?;
    let r = to_number(rhs).map_err(|m| ctx.failure(m))?;

    match op(l, r) {
        Some(n) => number(n).map_err(|m| ctx.failure(m)),
        None => Err(ctx.failure("division by zero")),
    }
}

/// Evaluate an expression whose calls have all been bound.
pub(crate)
fn evaluate(expr: &Expression, ctx: &EvaluationContext) -> Result<JsonValue> {
    match expr {
        Expression::Literal(v) => Ok(v.clone()),
        Expression::Variable(name) => ctx.template.variable(name)
            .cloned()
            .ok_or_else(|| Error::UnknownVariable(
                name.to_owned(),
                ctx.fragment.to_owned(),
                ctx.template.path().to_owned(),
            )),
        Expression::Member { target, key } => match evaluate(target, ctx)? {
            JsonValue::Object(mut map) => Ok(map.remove(key).unwrap_or(JsonValue::Null)),
            JsonValue::Null => Ok(JsonValue::Null),
            v => Err(ctx.failure(format!(
                "cannot read property {key:?} of {}",
                type_name(&v),
            ))),
        },
        Expression::Index { target, index: idx } => {
            let target = evaluate(target, ctx)?;
            let idx = evaluate(idx, ctx)?;
            index(ctx, target, idx)
        },
        Expression::Call(call) => {
            let args = call.args.iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>>>()?;

            let result = match &call.callee {
                Some(Callee::Registered(f)) => f(&args),
                Some(Callee::Builtin(b)) => b.call(&args),
                None => return Err(Error::UnregisteredFunction(
                    call.name.to_owned(),
                    ctx.fragment.to_owned(),
                    ctx.template.path().to_owned(),
                )),
            };

            result.map_err(|m| ctx.failure(format!("{}: {m}", call.name)))
        },
        Expression::Negate(operand) => {
            let v = evaluate(operand, ctx)?;
            let n = to_number(&v).map_err(|m| ctx.failure(m))?;
            number(-n).map_err(|m| ctx.failure(m))
        },
        Expression::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, ctx)?;
            let rhs = evaluate(rhs, ctx)?;

            match op {
                BinaryOp::Concat => Ok(JsonValue::String(to_string(&lhs) + &to_string(&rhs))),
                BinaryOp::Add => arithmetic(ctx, &lhs, &rhs, |l, r| Some(l + r)),
                BinaryOp::Sub => arithmetic(ctx, &lhs, &rhs, |l, r| Some(l - r)),
                BinaryOp::Mul => arithmetic(ctx, &lhs, &rhs, |l, r| Some(l * r)),
                BinaryOp::Div => arithmetic(ctx, &lhs, &rhs, |l, r| (r != 0.0).then(|| l / r)),
                BinaryOp::Rem => arithmetic(ctx, &lhs, &rhs, |l, r| (r != 0.0).then(|| l % r)),
            }
        },
    }
}
