//! Splits template content into text and delimited regions.
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

use crate::{
    delimiter::{
        DelimiterKind,
        Delimiters,
        ESCAPE,
    },
    error::{
        Error,
        Result,
    },
    file::{
        Coordinate,
        Cursor,
    },
};

const FRAGMENT_LEN: usize = 48;

/// A delimited region of template content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate)
struct Directive<'a> {
    pub(crate) kind: DelimiterKind,
    /// The content between the markers, trimmed.
    pub(crate) body: &'a str,
    /// The full region including markers.
    pub(crate) raw: &'a str,
    pub(crate) coord: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate)
enum Segment<'a> {
    Text(&'a str),
    /// An open marker suppressed by a preceding escape character.
    Escaped {
        marker: &'a str,
        raw: &'a str,
    },
    Directive(Directive<'a>),
}

impl<'a> Segment<'a> {
    /// The segment exactly as it appeared in the content.
    pub(crate)
    fn raw(&self) -> &'a str {
        match self {
            Self::Text(text) => text,
            Self::Escaped { raw, .. } => raw,
            Self::Directive(directive) => directive.raw,
        }
    }
}

/// Shorten a region of content for use in an error message.
pub(crate)
fn fragment(raw: &str) -> String {
    let line = raw.lines().next().unwrap_or("");
    if line.chars().count() <= FRAGMENT_LEN && line.len() == raw.len() {
        return line.to_owned();
    }

    let mut short = line.chars().take(FRAGMENT_LEN).collect::<String>();
    short.push_str("...");
    short
}

fn opener<'d>(pos: &str, openers: &[(DelimiterKind, &'d str, &'d str)]) -> Option<(DelimiterKind, &'d str, &'d str)> {
    openers.iter()
        .find(|(_, open, _)| pos.starts_with(open))
        .copied()
}

/// Scan content into segments.
///
/// Open markers are tried longest first so that `{{!` is never read as `{{`
/// followed by `!`. A directive closes at the first close marker of its own
/// kind; a directive with no close marker is an error.
pub(crate)
fn scan<'a>(content: &'a str, delimiters: &Delimiters, path: &str) -> Result<Vec<Segment<'a>>> {
    let openers = delimiters.longest_first()
        .into_iter()
        .map(|(kind, d)| (kind, d.open(), d.close()))
        .collect::<Vec<_>>();

    let mut segments = Vec::new();
    let mut cursor = Cursor::new(content);
    let mut text_start = 0;

    while !cursor.eof() {
        let pos = cursor.pos();

        // is escaped
        if pos.starts_with(ESCAPE) {
            if let Some((_, open, _)) = opener(&pos[ESCAPE.len_utf8()..], &openers) {
                if text_start < cursor.offset() {
                    segments.push(Segment::Text(&content[text_start..cursor.offset()]));
                }

                let start = cursor.offset();
                cursor.take(1);
                cursor.take_str(open);

                let raw = cursor.since(start);
                segments.push(Segment::Escaped {
                    marker: &raw[ESCAPE.len_utf8()..],
                    raw,
                });
                text_start = cursor.offset();
                continue;
            }
        }

        // is a directive
        if let Some((kind, open, close)) = opener(pos, &openers) {
            if text_start < cursor.offset() {
                segments.push(Segment::Text(&content[text_start..cursor.offset()]));
            }

            let start = cursor.offset();
            let coord = cursor.coord();
            cursor.take_str(open);

            let body = match cursor.take_until(close) {
                Some(body) => body,
                None => return Err(Error::UnterminatedDirective(
                    kind.to_string(),
                    fragment(&content[start..]),
                    coord,
                    path.to_owned(),
                )),
            };

            cursor.take_str(close);
            segments.push(Segment::Directive(Directive {
                kind,
                body: body.trim(),
                raw: cursor.since(start),
                coord,
            }));
            text_start = cursor.offset();
            continue;
        }

        cursor.take(1);
    }

    if text_start < content.len() {
        segments.push(Segment::Text(&content[text_start..]));
    }

    Ok(segments)
}
