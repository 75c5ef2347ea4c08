//! File handling and cursor utilities for the Fortune Template Compiler.
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
    crate::error::{
        Error,
        Result,
    },
    std::{
        fmt::{ Display, Formatter, Result as FmtResult, },
        fs::read_to_string,
        path::Path,
    },
};

const NEWLINE: char = '\n';

/// Read a file, normalizing line endings and dropping the final line break.
pub(crate)
fn read_file<P: AsRef<Path>>(p: P) -> Result<String> {
    let mut output = String::new();

    let mut dlim = "";
    for line in read_to_string(&p).map_err(|e| Error::IO(e, p.as_ref().into()))?.lines() {
        output.push_str(dlim);
        output.push_str(line);
        if dlim.is_empty() {
            dlim = "\n";
        }
    }

    Ok(output)
}

/// A line and position within template content.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub
struct Coordinate {
    line: usize,
    position: usize,
}

impl Coordinate {
    /// The zero-based line.
    pub
    fn line(&self) -> usize {
        self.line
    }

    /// The zero-based character position within the line.
    pub
    fn position(&self) -> usize {
        self.position
    }
}

impl Display for Coordinate {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_fmt(format_args!(
            "line {} position {}",
            self.line + 1,
            self.position + 1,
        ))
    }
}

/// The current read-position within a piece of template content.
#[derive(Debug)]
pub(crate)
struct Cursor<'a> {
    content: &'a str,
    offset: usize,
    coord: Coordinate,
}

impl<'a> Cursor<'a> {
    pub(crate)
    fn new(content: &'a str) -> Self {
        Self {
            content,
            offset: 0,
            coord: Coordinate::default(),
        }
    }

    pub(crate)
    fn pos(&self) -> &'a str {
        &self.content[self.offset..]
    }

    pub(crate)
    fn offset(&self) -> usize {
        self.offset
    }

    pub(crate)
    fn coord(&self) -> Coordinate {
        self.coord
    }

    pub(crate)
    fn eof(&self) -> bool {
        self.offset == self.content.len()
    }

    /// Slice the content between an earlier offset and the current one.
    pub(crate)
    fn since(&self, start: usize) -> &'a str {
        &self.content[start..self.offset]
    }

    fn skip_internal(&mut self) -> Option<char> {
        let c = self.pos().chars().next()?;
        self.offset += c.len_utf8();

        if c == NEWLINE {
            self.coord.line += 1;
            self.coord.position = 0;
        }
        else {
            self.coord.position += 1;
        }

        Some(c)
    }

    /// Take the next `positions` characters, returning the consumed slice.
    pub(crate)
    fn take(&mut self, positions: usize) -> Option<&'a str> {
        if self.eof() {
            return None;
        }

        let start = self.offset;
        let mut i = 0;
        while i < positions && self.skip_internal().is_some() {
            i += 1;
        }

        Some(self.since(start))
    }

    /// Take `pattern` if the content continues with it.
    pub(crate)
    fn take_str(&mut self, pattern: &str) -> bool {
        if !self.pos().starts_with(pattern) {
            return false;
        }

        self.take(pattern.chars().count());
        true
    }

    /// Advance until `pattern` starts, returning the skipped slice, or `None`
    /// (leaving the cursor untouched) if the pattern never occurs.
    pub(crate)
    fn take_until(&mut self, pattern: &str) -> Option<&'a str> {
        let len = self.pos().find(pattern)?;
        let start = self.offset;
        let end = start + len;

        while self.offset < end {
            self.skip_internal();
        }

        Some(self.since(start))
    }
}
