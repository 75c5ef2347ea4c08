//! Resolves literal and registered tags.
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
        error::Result,
        escape::Escaper,
        expression::parser::{
            is_identifier,
            string_literal,
        },
        scan::{
            scan,
            Directive,
            Segment,
        },
        template::Template,
    },
    log::trace,
};

/// Content after tag resolution.
///
/// Resolved pieces are final output and are never scanned again, so a value
/// containing delimiter text cannot turn into a directive.
#[derive(Debug, PartialEq, Eq)]
pub(crate)
enum Piece<'a> {
    Text(&'a str),
    Value(String),
    /// A directive left for expression resolution.
    Pending(Directive<'a>),
}

/// Apply the escaping policy of the kind a value came from.
pub(crate)
fn escape_for(kind: DelimiterKind, value: &str, escaper: &dyn Escaper) -> String {
    match kind {
        DelimiterKind::EscapedTag => escaper.escape(value),
        DelimiterKind::UnescapedTag | DelimiterKind::Statement => value.to_owned(),
    }
}

/// The content of a body that is exactly one quoted string, decoded the
/// same way as a string inside an expression.
fn literal(body: &str) -> Option<String> {
    match string_literal(body) {
        Ok(("", value)) => Some(value),
        _ => None,
    }
}

fn substitute(template: &Template, directive: &Directive) -> Option<String> {
    if let Some(value) = literal(directive.body) {
        return Some(value);
    }

    if is_identifier(directive.body) {
        return template.tag(directive.body).map(str::to_owned);
    }

    None
}

/// Resolve the tags of already statement-resolved content.
///
/// Literal tags become their content and tags naming a registered tag become
/// its value, each escaped per its kind. Escaped open markers lose their
/// escape character. Everything else is left pending.
pub(crate)
fn resolve<'a>(template: &Template, content: &'a str, escaper: &dyn Escaper) -> Result<Vec<Piece<'a>>> {
    let segments = scan(content, template.delimiters(), template.path())?;
    let mut pieces = Vec::with_capacity(segments.len());

    for segment in segments {
        let piece = match segment {
            Segment::Text(text) => Piece::Text(text),
            Segment::Escaped { marker, .. } => Piece::Text(marker),
            Segment::Directive(directive) if directive.kind == DelimiterKind::Statement => {
                Piece::Pending(directive)
            },
            Segment::Directive(directive) => match substitute(template, &directive) {
                Some(value) => {
                    trace!("substituting {:?} in {:?}", directive.raw, template.path());
                    Piece::Value(escape_for(directive.kind, &value, escaper))
                },
                None => Piece::Pending(directive),
            },
        };

        pieces.push(piece);
    }

    Ok(pieces)
}
