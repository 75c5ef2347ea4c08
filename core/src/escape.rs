//! Output escaping filters for the Fortune Template Compiler.
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

/// Escapes the output of escaped tags.
///
/// Escaping is applied exactly once per value. Implementations are shared
/// between compilations and must be safe to call from several threads.
pub trait Escaper: Send + Sync {
    fn escape(&self, value: &str) -> String;
}

impl<F> Escaper for F
where
    F: Fn(&str) -> String + Send + Sync
{
    fn escape(&self, value: &str) -> String {
        self(value)
    }
}

/// Escapes the characters significant to HTML.
#[derive(Debug, Default, Clone, Copy)]
pub
struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape(&self, value: &str) -> String {
        escape_html(value)
    }
}

/// Leaves values untouched.
#[derive(Debug, Default, Clone, Copy)]
pub
struct IdentityEscaper;

impl Escaper for IdentityEscaper {
    fn escape(&self, value: &str) -> String {
        value.to_owned()
    }
}

pub(crate)
fn escape_html(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#039;"),
            c => output.push(c),
        }
    }

    output
}
