//! The Fortune Template Compiler.
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

mod compiler;
mod config;
mod delimiter;
mod error;
mod escape;
mod expression;
mod file;
mod functions;
mod loader;
mod path;
mod scan;
mod statement;
mod tag;
mod template;
#[cfg(test)]
mod test;

pub use {
    compiler::{
        Compiler,
        DEFAULT_MAX_DEPTH,
        DEFAULT_MAX_EXPANSIONS,
    },
    config::{
        Config,
        DelimiterPair,
        EscapeMode,
    },
    delimiter::{
        Delimiter,
        DelimiterKind,
        Delimiters,
        ESCAPE,
    },
    error::{
        Error,
        Result,
    },
    escape::{
        Escaper,
        HtmlEscaper,
        IdentityEscaper,
    },
    file::Coordinate,
    functions::{
        Builtin,
        FunctionRegistry,
        TemplateFunction,
    },
    loader::{
        Builder,
        Factory,
        FileSource,
        MemorySource,
        TemplateSource,
        DEFAULT_EXTENSIONS,
    },
    template::{
        Chain,
        Template,
    },
};
