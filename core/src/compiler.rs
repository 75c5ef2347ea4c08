//! The compilation pipeline.
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
    crate::{
        error::Result,
        escape::{
            Escaper,
            HtmlEscaper,
        },
        expression,
        functions::FunctionRegistry,
        loader::Factory,
        statement::StatementResolver,
        tag,
        template::Template,
    },
    log::debug,
};

/// How deep `extends`, `include`, `show` and `parent` may nest.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How many parts may be shown and templates included in one compilation.
pub const DEFAULT_MAX_EXPANSIONS: usize = 10_000;

/// Compiles templates into their final output.
///
/// Statements are resolved first, then tags, then expressions. Every stage
/// runs on every compilation and an error from any of them aborts the
/// compilation without output.
///
/// # Examples
///
/// ```rust
/// use fortune_core::{ Compiler, Factory, IdentityEscaper, MemorySource, };
///
/// let source = MemorySource::new()
///     .with("parent", "<% part(\"title\") %>Default<% endpart %><h1><% show(\"title\") %></h1>")
///     .with("child", "<% extends(\"parent\") %><% part(\"title\") %>Custom<% endpart %>");
/// let compiler = Compiler::new(Factory::new(source)).with_escaper(IdentityEscaper);
///
/// assert_eq!("<h1>Custom</h1>", compiler.render("child").unwrap());
/// ```
pub
struct Compiler {
    factory: Factory,
    escaper: Box<dyn Escaper>,
    functions: FunctionRegistry,
    max_depth: usize,
    max_expansions: usize,
}

impl Compiler {
    /// A compiler that HTML-escapes escaped tags and knows no functions
    /// beyond the built-ins.
    pub
    fn new(factory: Factory) -> Self {
        Self {
            factory,
            escaper: Box::new(HtmlEscaper),
            functions: FunctionRegistry::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    pub
    fn with_escaper<E: Escaper + 'static>(mut self, escaper: E) -> Self {
        self.escaper = Box::new(escaper);
        self
    }

    pub
    fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub
    fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub
    fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub
    fn factory(&self) -> &Factory {
        &self.factory
    }

    pub
    fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub
    fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub
    fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    /// Compile a template.
    ///
    /// The template's parts and parent chain are filled in as a side effect.
    pub
    fn compile(&self, template: &mut Template) -> Result<String> {
        debug!("compiling {:?}", template.path());

        let content = StatementResolver::new(&self.factory, self.max_depth, self.max_expansions)
            .resolve(template)?;
        let pieces = tag::resolve(template, &content, self.escaper.as_ref())?;
        expression::resolve(template, pieces, &self.functions, self.escaper.as_ref())
    }

    /// Load a template by name or alias and compile it.
    pub
    fn render(&self, name: &str) -> Result<String> {
        let mut template = self.factory.load(name)?;
        self.compile(&mut template)
    }
}
