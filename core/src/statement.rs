//! Resolves structural statements: inheritance, includes and parts.
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
        delimiter::DelimiterKind,
        error::{
            Error,
            Result,
        },
        expression::parser::{
            identifier,
            string_literal,
        },
        loader::Factory,
        scan::{
            fragment,
            scan,
            Directive,
            Segment,
        },
        template::Template,
    },
    log::{
        debug,
        trace,
    },
    std::{
        cell::Cell,
        sync::Arc,
    },
};

const EXTENDS: &str = "extends";
const INCLUDE: &str = "include";
const PART: &str = "part";
const ENDPART: &str = "endpart";
const SHOW: &str = "show";
const PARENT: &str = "parent";

/// A structural statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate)
enum Statement {
    Extends(String),
    Include(String),
    Part(String),
    EndPart,
    Show(String),
    /// A named part, or the enclosing part when unnamed.
    Parent(Option<String>),
}

/// The quoted name of `("name")`.
fn argument(args: &str) -> Option<String> {
    let inner = args.strip_prefix('(')?
        .strip_suffix(')')?
        .trim();

    match string_literal(inner) {
        Ok(("", name)) if !name.is_empty() => Some(name),
        _ => None,
    }
}

/// Whether the arguments are absent or `()`.
fn no_arguments(args: &str) -> bool {
    args.is_empty() || args.strip_prefix('(')
        .and_then(|a| a.strip_suffix(')'))
        .is_some_and(|a| a.trim().is_empty())
}

impl Statement {
    /// Read a directive as a structural statement.
    ///
    /// Tags and statements beginning with any other name are not structural
    /// and yield `None`. A structural keyword with bad arguments is an error.
    pub(crate)
    fn of(directive: &Directive, path: &str) -> Result<Option<Self>> {
        if directive.kind != DelimiterKind::Statement {
            return Ok(None);
        }

        let (args, keyword) = match identifier(directive.body) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(None),
        };
        let args = args.trim();

        let malformed = |reason: &str| Error::MalformedDirective(
            fragment(directive.raw),
            reason.to_owned(),
            directive.coord,
            path.to_owned(),
        );

        let named = |make: fn(String) -> Self| argument(args)
            .map(|name| Some(make(name)))
            .ok_or_else(|| malformed(&format!("{keyword} expects one quoted name")));

        match keyword {
            EXTENDS => named(Self::Extends),
            INCLUDE => named(Self::Include),
            PART => named(Self::Part),
            SHOW => named(Self::Show),
            ENDPART if no_arguments(args) => Ok(Some(Self::EndPart)),
            ENDPART => Err(malformed("endpart takes no arguments")),
            PARENT if no_arguments(args) => Ok(Some(Self::Parent(None))),
            PARENT => argument(args)
                .map(|name| Some(Self::Parent(Some(name))))
                .ok_or_else(|| malformed("parent expects at most one quoted name")),
            _ => Ok(None),
        }
    }
}

fn statement_of(segment: &Segment, path: &str) -> Result<Option<Statement>> {
    match segment {
        Segment::Directive(directive) => Statement::of(directive, path),
        Segment::Text(_) | Segment::Escaped { .. } => Ok(None),
    }
}

/// Resolves the structural statements of a template.
pub(crate)
struct StatementResolver<'f> {
    factory: &'f Factory,
    max_depth: usize,
    max_expansions: usize,
    /// Parts shown and templates included so far, across the whole chain.
    expansions: Cell<usize>,
}

impl<'f> StatementResolver<'f> {
    pub(crate)
    fn new(factory: &'f Factory, max_depth: usize, max_expansions: usize) -> Self {
        Self { factory, max_depth, max_expansions, expansions: Cell::new(0), }
    }

    fn limit(&self, directive: &str, template: &Template) -> Error {
        Error::RecursionLimit(directive.to_owned(), self.max_depth, template.path().to_owned())
    }

    /// Count one more part expansion or include.
    fn expanded(&self, template: &Template) -> Result<()> {
        let count = self.expansions.get() + 1;
        if count > self.max_expansions {
            return Err(Error::ExpansionLimit(self.max_expansions, template.path().to_owned()));
        }

        self.expansions.set(count);
        Ok(())
    }

    /// Resolve the statements of a template, returning its content.
    ///
    /// Parts are captured into the template and each ancestor, and the
    /// inheritance chain is attached once every ancestor is loaded.
    pub(crate)
    fn resolve(&self, template: &mut Template) -> Result<String> {
        let mut content = template.raw().to_owned();
        let mut ancestors: Vec<Template> = Vec::new();
        let mut seen = vec![ template.path().to_owned(), ];

        while let Some(spliced) = self.extend(template, &content, &mut ancestors, &mut seen)? {
            content = spliced;
        }

        let content = self.include(template, &content, &mut vec![ template.path().to_owned(), ])?;
        let content = capture_parts(template, &content)?;

        let mut chain = template.take_parent();
        for mut ancestor in ancestors.into_iter().rev() {
            ancestor.set_parent(chain);
            chain = Some(Arc::new(ancestor));
        }
        template.set_parent(chain);

        if template.parent().is_some() {
            debug!(
                "{:?} inherits from {:?}",
                template.path(),
                template.ancestors().map(|t| t.path()).collect::<Vec<_>>(),
            );
        }

        self.expand(template, &content, 0, None, &mut Vec::new())
    }

    /// Replace the first `extends` with the prepared content of its template.
    fn extend(
        &self,
        template: &Template,
        content: &str,
        ancestors: &mut Vec<Template>,
        seen: &mut Vec<String>,
    ) -> Result<Option<String>> {
        let segments = scan(content, template.delimiters(), template.path())?;

        let mut found = None;
        for (idx, segment) in segments.iter().enumerate() {
            if let Some(Statement::Extends(name)) = statement_of(segment, template.path())? {
                found = Some((idx, name));
                break;
            }
        }

        let (idx, name) = match found {
            Some(found) => found,
            None => return Ok(None),
        };

        if ancestors.len() >= self.max_depth {
            return Err(self.limit(EXTENDS, template));
        }

        if seen.contains(&name) {
            return Err(Error::InheritanceCycle(name, template.path().to_owned()));
        }

        let mut parent = self.factory.load(&name)?;
        if seen.iter().any(|p| p == parent.path()) {
            return Err(Error::InheritanceCycle(name, template.path().to_owned()));
        }

        debug!("{:?} extends {:?}", template.path(), parent.path());
        parent.set_delimiters(template.delimiters().clone());

        let raw = parent.raw().to_owned();
        let raw = self.include(&parent, &raw, &mut vec![ parent.path().to_owned(), ])?;
        let parent_content = capture_parts(&mut parent, &raw)?;

        seen.push(name);
        seen.push(parent.path().to_owned());
        ancestors.push(parent);

        let mut spliced = String::with_capacity(content.len() + parent_content.len());
        for (i, segment) in segments.iter().enumerate() {
            if i == idx {
                spliced.push_str(&parent_content);
            }
            else {
                spliced.push_str(segment.raw());
            }
        }

        Ok(Some(spliced))
    }

    /// Replace each `include` with the raw content of its template.
    fn include(&self, template: &Template, content: &str, stack: &mut Vec<String>) -> Result<String> {
        let mut output = String::with_capacity(content.len());

        for segment in scan(content, template.delimiters(), template.path())? {
            let name = match statement_of(&segment, template.path())? {
                Some(Statement::Include(name)) => name,
                _ => {
                    output.push_str(segment.raw());
                    continue;
                },
            };

            if stack.len() > self.max_depth {
                return Err(self.limit(INCLUDE, template));
            }

            if stack.contains(&name) {
                return Err(Error::IncludeCycle(name, template.path().to_owned()));
            }

            self.expanded(template)?;
            let included = self.factory.load(&name)?;
            if stack.iter().any(|p| p == included.path()) {
                return Err(Error::IncludeCycle(name, template.path().to_owned()));
            }

            trace!("{:?} includes {:?}", template.path(), included.path());
            stack.push(included.path().to_owned());
            let expanded = self.include(template, included.raw(), stack);
            stack.pop();
            output.push_str(&expanded?);
        }

        Ok(output)
    }

    /// Resolve `show` and `parent`, dropping any other structural statement.
    ///
    /// `level` is the position in the chain of the template that defined the
    /// content, so that `parent` looks one step above it.
    fn expand(
        &self,
        template: &Template,
        content: &str,
        level: usize,
        enclosing: Option<&str>,
        stack: &mut Vec<(String, usize)>,
    ) -> Result<String> {
        let mut output = String::with_capacity(content.len());

        for segment in scan(content, template.delimiters(), template.path())? {
            let found = match statement_of(&segment, template.path())? {
                None => {
                    output.push_str(segment.raw());
                    continue;
                },
                Some(Statement::Show(name)) => template.part_from(0, &name)
                    .map(|(found, part)| (name, found, part)),
                Some(Statement::Parent(name)) => match name.as_deref().or(enclosing) {
                    Some(name) => template.part_from(level + 1, name)
                        .map(|(found, part)| (name.to_owned(), found, part)),
                    None => None,
                },
                Some(_) => None,
            };

            match found {
                Some((name, found, part)) => {
                    output.push_str(&self.expand_part(template, &name, found, part, stack)?);
                },
                None => trace!("dropping {:?} in {:?}", segment.raw(), template.path()),
            }
        }

        Ok(output)
    }

    fn expand_part(
        &self,
        template: &Template,
        name: &str,
        level: usize,
        content: &str,
        stack: &mut Vec<(String, usize)>,
    ) -> Result<String> {
        if stack.iter().any(|(n, l)| n == name && *l == level) {
            return Err(Error::RecursivePart(name.to_owned(), template.path().to_owned()));
        }

        if stack.len() >= self.max_depth {
            return Err(self.limit(SHOW, template));
        }

        self.expanded(template)?;

        stack.push((name.to_owned(), level));
        let expanded = self.expand(template, content, level, Some(name), stack);
        stack.pop();
        expanded
    }
}

struct OpenPart<'a> {
    name: String,
    body: String,
    directive: Directive<'a>,
}

/// Capture `part` blocks into the template, returning what remains.
///
/// Parts of other names may nest; each is captured on its own and removed
/// from the part around it. A later definition replaces an earlier one and
/// an `endpart` with nothing open is dropped.
fn capture_parts(template: &mut Template, content: &str) -> Result<String> {
    let path = template.path().to_owned();
    let mut output = String::with_capacity(content.len());
    let mut open: Vec<OpenPart> = Vec::new();

    for segment in scan(content, template.delimiters(), &path)? {
        match (statement_of(&segment, &path)?, segment) {
            (Some(Statement::Part(name)), Segment::Directive(directive)) => {
                if open.iter().any(|p| p.name == name) {
                    return Err(Error::MalformedDirective(
                        fragment(directive.raw),
                        format!("part {name:?} is already open"),
                        directive.coord,
                        path,
                    ));
                }

                open.push(OpenPart { name, body: String::new(), directive, });
            },
            (Some(Statement::EndPart), _) => match open.pop() {
                Some(part) => {
                    trace!("captured part {:?} in {:?}", part.name, path);
                    template.set_part(part.name, part.body);
                },
                None => trace!("dropping orphan {ENDPART} in {:?}", path),
            },
            (_, segment) => match open.last_mut() {
                Some(part) => part.body.push_str(segment.raw()),
                None => output.push_str(segment.raw()),
            },
        }
    }

    match open.pop() {
        Some(part) => Err(Error::UnterminatedDirective(
            PART.to_owned(),
            fragment(part.directive.raw),
            part.directive.coord,
            path,
        )),
        None => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(body: &str) -> Directive<'_> {
        Directive {
            kind: DelimiterKind::Statement,
            body,
            raw: body,
            coord: Default::default(),
        }
    }

    fn statement(body: &str) -> Result<Option<Statement>> {
        Statement::of(&directive(body), "test")
    }

    #[test]
    fn test_statement_grammar() {
        assert_eq!(Some(Statement::Extends("base".to_owned())), statement("extends(\"base\")").unwrap());
        assert_eq!(Some(Statement::Include("nav".to_owned())), statement("include ( 'nav' )").unwrap());
        assert_eq!(Some(Statement::Part("title".to_owned())), statement("part(\"title\")").unwrap());
        assert_eq!(Some(Statement::EndPart), statement("endpart").unwrap());
        assert_eq!(Some(Statement::EndPart), statement("endpart()").unwrap());
        assert_eq!(Some(Statement::Show("title".to_owned())), statement("show('title')").unwrap());
        assert_eq!(Some(Statement::Parent(None)), statement("parent").unwrap());
        assert_eq!(Some(Statement::Parent(None)), statement("parent( )").unwrap());
        assert_eq!(Some(Statement::Parent(Some("body".to_owned()))), statement("parent(\"body\")").unwrap());
    }

    #[test]
    fn test_other_statements_are_not_structural() {
        assert_eq!(None, statement("upper('x')").unwrap());
        assert_eq!(None, statement("extended").unwrap());
        assert_eq!(None, statement("1 + 2").unwrap());
        assert_eq!(None, statement("").unwrap());
    }

    #[test]
    fn test_malformed_statements() {
        assert!(matches!(statement("extends(base)"), Err(Error::MalformedDirective(..))));
        assert!(matches!(statement("show"), Err(Error::MalformedDirective(..))));
        assert!(matches!(statement("part('a', 'b')"), Err(Error::MalformedDirective(..))));
        assert!(matches!(statement("part('')"), Err(Error::MalformedDirective(..))));
        assert!(matches!(statement("endpart('x')"), Err(Error::MalformedDirective(..))));
    }

    #[test]
    fn test_capture_nested_parts() {
        let mut template = Template::new("t", "");
        let content = "a<% part('outer') %>x<% part('inner') %>y<% endpart %>z<% endpart %>b<% endpart %>";
        assert_eq!("ab", capture_parts(&mut template, content).unwrap());
        assert_eq!(Some("xz"), template.part("outer"));
        assert_eq!(Some("y"), template.part("inner"));
    }

    #[test]
    fn test_capture_rejects_reopened_part() {
        let mut template = Template::new("t", "");
        let content = "<% part('a') %><% part('a') %><% endpart %><% endpart %>";
        assert!(matches!(capture_parts(&mut template, content), Err(Error::MalformedDirective(..))));
    }

    #[test]
    fn test_capture_unterminated_part() {
        let mut template = Template::new("t", "");
        assert!(matches!(
            capture_parts(&mut template, "\n  <% part('a') %>never closed"),
            Err(Error::UnterminatedDirective(what, _, coord, _))
                if what == PART && coord.line() == 1 && coord.position() == 2,
        ));
    }

    #[test]
    fn test_later_part_wins() {
        let mut template = Template::new("t", "");
        capture_parts(&mut template, "<% part('a') %>1<% endpart %><% part('a') %>2<% endpart %>").unwrap();
        assert_eq!(Some("2"), template.part("a"));
    }
}
