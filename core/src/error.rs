//! Error types for the Fortune Template Compiler.
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
    crate::file::Coordinate,
    serde_json::Error as JsonError,
    std::{
        io::Error as IOError,
        path::PathBuf,
        result::Result as StdResult,
    },
    thiserror::Error,
};

/// The error type for the Fortune Template Compiler.
///
/// Every variant aborts the compilation that raised it. Template paths are
/// carried as the name the template was loaded under.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error in {1:?} {0}")]
    IO(#[source] IOError, PathBuf),
    #[error("Json error in {1:?} {0}")]
    JsonParse(#[source] JsonError, PathBuf),
    #[error("Template {0:?} was not found")]
    TemplateNotFound(String),
    #[error("Invalid delimiters: {0}")]
    InvalidDelimiters(String),
    /// An opened directive that never closes: what, fragment, where, template.
    #[error("Unterminated {0} {1:?} in {3:?} at {2}")]
    UnterminatedDirective(String, String, Coordinate, String),
    /// A structural statement with bad arguments: fragment, reason, where, template.
    #[error("Malformed directive {0:?} in {3:?} at {2}: {1}")]
    MalformedDirective(String, String, Coordinate, String),
    #[error("Template {0:?} appears twice in the inheritance chain of {1:?}")]
    InheritanceCycle(String, String),
    #[error("Template {0:?} includes itself from {1:?}")]
    IncludeCycle(String, String),
    #[error("Part {0:?} shows itself in {1:?}")]
    RecursivePart(String, String),
    #[error("Resolution of {0} exceeded the maximum depth of {1} in {2:?}")]
    RecursionLimit(String, usize, String),
    #[error("Resolution of {1:?} expanded more than {0} parts and includes")]
    ExpansionLimit(usize, String),
    #[error("Function {0:?} called in {1:?} is not registered in {2:?}")]
    UnregisteredFunction(String, String, String),
    #[error("Variable ${0} used in {1:?} is not bound in {2:?}")]
    UnknownVariable(String, String, String),
    #[error("Malformed expression {0:?} in {2:?}: {1}")]
    Expression(String, String, String),
    #[error("Cannot evaluate {0:?} in {2:?}: {1}")]
    Evaluation(String, String, String),
}

/// The result type for the Fortune Template Compiler.
pub type Result<T> = StdResult<T, Error>;
