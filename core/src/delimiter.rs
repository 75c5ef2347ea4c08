//! Delimiter configuration for the Fortune Template Compiler.
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
    serde::Deserialize,
    std::fmt::{
        Display,
        Formatter,
        Result as FmtResult,
    },
};

/// Placed directly before an open marker to emit the marker literally.
pub const ESCAPE: char = '\\';

pub(crate)
const ESCAPED_TAG_OPEN: &str = "{{";

pub(crate)
const ESCAPED_TAG_CLOSE: &str = "}}";

pub(crate)
const UNESCAPED_TAG_OPEN: &str = "{{!";

pub(crate)
const UNESCAPED_TAG_CLOSE: &str = "!}}";

pub(crate)
const STATEMENT_OPEN: &str = "<%";

pub(crate)
const STATEMENT_CLOSE: &str = "%>";

/// The kinds of delimited regions a template may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelimiterKind {
    /// A tag whose output passes through the escaper.
    EscapedTag,
    /// A tag whose output is written verbatim.
    UnescapedTag,
    /// A structural directive or an expression statement.
    Statement,
}

impl DelimiterKind {
    pub(crate)
    const ALL: [DelimiterKind; 3] = [
        DelimiterKind::EscapedTag,
        DelimiterKind::UnescapedTag,
        DelimiterKind::Statement,
    ];
}

impl Display for DelimiterKind {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.write_str(match self {
            Self::EscapedTag => "escaped tag",
            Self::UnescapedTag => "unescaped tag",
            Self::Statement => "statement",
        })
    }
}

/// An open/close marker pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub
struct Delimiter {
    open: String,
    close: String,
}

impl Delimiter {
    pub
    fn new<O, C>(open: O, close: C) -> Self
    where
        O: Into<String>,
        C: Into<String>
    {
        Self { open: open.into(), close: close.into(), }
    }

    pub
    fn open(&self) -> &str {
        &self.open
    }

    pub
    fn close(&self) -> &str {
        &self.close
    }
}

/// The delimiters of every kind for one template.
///
/// Construction validates the configuration: markers must be non-empty, may
/// not begin with [`ESCAPE`], and no two kinds may share an open marker. One
/// open marker being a prefix of another is allowed; the longer marker is
/// always matched first.
///
/// # Examples
///
/// ```rust
/// use fortune_core::{ Delimiters, DelimiterKind, };
///
/// let delimiters = Delimiters::default()
///     .with(DelimiterKind::Statement, "{%", "%}")
///     .unwrap();
/// assert_eq!("{%", delimiters.get(DelimiterKind::Statement).open());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub
struct Delimiters {
    escaped_tag: Delimiter,
    unescaped_tag: Delimiter,
    statement: Delimiter,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            escaped_tag: Delimiter::new(ESCAPED_TAG_OPEN, ESCAPED_TAG_CLOSE),
            unescaped_tag: Delimiter::new(UNESCAPED_TAG_OPEN, UNESCAPED_TAG_CLOSE),
            statement: Delimiter::new(STATEMENT_OPEN, STATEMENT_CLOSE),
        }
    }
}

impl Delimiters {
    /// Create a validated delimiter configuration.
    pub
    fn new(escaped_tag: Delimiter, unescaped_tag: Delimiter, statement: Delimiter) -> Result<Self> {
        let delimiters = Self { escaped_tag, unescaped_tag, statement, };
        delimiters.validate()?;
        Ok(delimiters)
    }

    /// Replace the markers of one kind, validating the result.
    pub
    fn with<O, C>(mut self, kind: DelimiterKind, open: O, close: C) -> Result<Self>
    where
        O: Into<String>,
        C: Into<String>
    {
        *self.get_mut(kind) = Delimiter::new(open, close);
        self.validate()?;
        Ok(self)
    }

    pub
    fn get(&self, kind: DelimiterKind) -> &Delimiter {
        match kind {
            DelimiterKind::EscapedTag => &self.escaped_tag,
            DelimiterKind::UnescapedTag => &self.unescaped_tag,
            DelimiterKind::Statement => &self.statement,
        }
    }

    fn get_mut(&mut self, kind: DelimiterKind) -> &mut Delimiter {
        match kind {
            DelimiterKind::EscapedTag => &mut self.escaped_tag,
            DelimiterKind::UnescapedTag => &mut self.unescaped_tag,
            DelimiterKind::Statement => &mut self.statement,
        }
    }

    /// Every kind with its markers, longest open marker first.
    pub(crate)
    fn longest_first(&self) -> Vec<(DelimiterKind, &Delimiter)> {
        let mut all = DelimiterKind::ALL.iter()
            .map(|kind| (*kind, self.get(*kind)))
            .collect::<Vec<_>>();
        all.sort_by(|a, b| b.1.open.len().cmp(&a.1.open.len()));
        all
    }

    fn validate(&self) -> Result<()> {
        for kind in DelimiterKind::ALL {
            let delimiter = self.get(kind);

            if delimiter.open.is_empty() || delimiter.close.is_empty() {
                return Err(Error::InvalidDelimiters(format!(
                    "{kind} markers may not be empty"
                )));
            }

            if delimiter.open.starts_with(ESCAPE) || delimiter.close.starts_with(ESCAPE) {
                return Err(Error::InvalidDelimiters(format!(
                    "{kind} markers may not begin with {ESCAPE:?}"
                )));
            }
        }

        for (idx, a) in DelimiterKind::ALL.iter().enumerate() {
            for b in DelimiterKind::ALL.iter().skip(idx + 1) {
                if self.get(*a).open == self.get(*b).open {
                    return Err(Error::InvalidDelimiters(format!(
                        "{a} and {b} share the open marker {:?}",
                        self.get(*a).open,
                    )));
                }
            }
        }

        Ok(())
    }
}
