//! The syntax tree of template expressions.
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
    crate::functions::{
        Builtin,
        TemplateFunction,
    },
    serde_json::Value as JsonValue,
    std::{
        fmt::{
            Debug,
            Formatter,
            Result as FmtResult,
        },
        sync::Arc,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub(crate)
enum Expression {
    /// A string, number, boolean or null.
    Literal(JsonValue),
    /// A bound variable (`$name`).
    Variable(String),
    /// Property access (`$user->name`).
    Member {
        target: Box<Expression>,
        key: String,
    },
    /// Index access (`$items[0]`, `$map["key"]`).
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    Call(Call),
    Negate(Box<Expression>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate)
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Concat,
}

/// A function call. Parsing leaves `callee` empty; binding fills it in before
/// anything is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub(crate)
struct Call {
    pub(crate) name: String,
    pub(crate) callee: Option<Callee>,
    pub(crate) args: Vec<Expression>,
}

/// What a call was bound to.
#[derive(Clone)]
pub(crate)
enum Callee {
    Registered(TemplateFunction),
    Builtin(Builtin),
}

impl Debug for Callee {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Registered(_) => fmtr.write_str("Registered(..)"),
            Self::Builtin(b) => fmtr.write_fmt(format_args!("Builtin({b:?})")),
        }
    }
}

impl PartialEq for Callee {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Registered(a), Self::Registered(b)) => Arc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl Expression {
    pub(crate)
    fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Self::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), }
    }

    /// Visit every call in the tree.
    pub(crate)
    fn calls_mut<F, E>(&mut self, f: &mut F) -> Result<(), E>
    where
        F: FnMut(&mut Call) -> Result<(), E>
    {
        match self {
            Self::Literal(_) | Self::Variable(_) => Ok(()),
            Self::Member { target, .. } => target.calls_mut(f),
            Self::Index { target, index } => {
                target.calls_mut(f)?;
                index.calls_mut(f)
            },
            Self::Call(call) => {
                for arg in call.args.iter_mut() {
                    arg.calls_mut(f)?;
                }

                f(call)
            },
            Self::Negate(operand) => operand.calls_mut(f),
            Self::Binary { lhs, rhs, .. } => {
                lhs.calls_mut(f)?;
                rhs.calls_mut(f)
            },
        }
    }
}
