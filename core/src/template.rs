//! The template model of the Fortune Template Compiler.
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
    crate::delimiter::Delimiters,
    serde_json::Value as JsonValue,
    std::{
        collections::HashMap,
        sync::Arc,
    },
};

/// A template and the values bound to it.
///
/// Tags, parts and variables are looked up through the inheritance chain:
/// the template itself first, then its parent, and so on. The chain is
/// attached once while statements are resolved and is immutable afterwards.
///
/// # Examples
///
/// ```rust
/// use fortune_core::Template;
///
/// let mut template = Template::new("greeting", "Hello {{ name }}!");
/// template.set_tag("name", "World");
/// assert_eq!(Some("World"), template.tag("name"));
/// ```
#[derive(Debug, Clone)]
pub
struct Template {
    path: String,
    raw: String,
    delimiters: Delimiters,
    variables: HashMap<String, JsonValue>,
    tags: HashMap<String, String>,
    parts: HashMap<String, String>,
    parent: Option<Arc<Template>>,
}

/// Iterates a template followed by each of its ancestors, nearest first.
pub
struct Chain<'a> {
    next: Option<&'a Template>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Template;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

impl Template {
    /// Create a template with the default delimiters.
    pub
    fn new<P, S>(path: P, raw: S) -> Self
    where
        P: Into<String>,
        S: Into<String>
    {
        Self::with_delimiters(path, raw, Delimiters::default())
    }

    /// Create a template with an already validated delimiter configuration.
    pub
    fn with_delimiters<P, S>(path: P, raw: S, delimiters: Delimiters) -> Self
    where
        P: Into<String>,
        S: Into<String>
    {
        Self {
            path: path.into(),
            raw: raw.into(),
            delimiters,
            variables: HashMap::new(),
            tags: HashMap::new(),
            parts: HashMap::new(),
            parent: None,
        }
    }

    /// The name the template was loaded under.
    pub
    fn path(&self) -> &str {
        &self.path
    }

    /// The uncompiled source.
    pub
    fn raw(&self) -> &str {
        &self.raw
    }

    pub
    fn set_raw<S: Into<String>>(&mut self, raw: S) {
        self.raw = raw.into();
    }

    pub
    fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub
    fn set_delimiters(&mut self, delimiters: Delimiters) {
        self.delimiters = delimiters;
    }

    pub
    fn parent(&self) -> Option<&Template> {
        self.parent.as_deref()
    }

    pub(crate)
    fn take_parent(&mut self) -> Option<Arc<Template>> {
        self.parent.take()
    }

    pub(crate)
    fn set_parent(&mut self, parent: Option<Arc<Template>>) {
        self.parent = parent;
    }

    /// The template followed by its ancestors.
    pub
    fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self), }
    }

    /// The ancestors of the template, nearest first.
    pub
    fn ancestors(&self) -> Chain<'_> {
        Chain { next: self.parent(), }
    }

    fn merged<T, F>(&self, f: F) -> HashMap<String, T>
    where
        T: Clone,
        F: Fn(&Template) -> &HashMap<String, T>
    {
        let mut merged = HashMap::new();
        for template in self.chain() {
            for (k, v) in f(template) {
                if !merged.contains_key(k) {
                    merged.insert(k.to_owned(), v.clone());
                }
            }
        }

        merged
    }

    pub
    fn set_tag<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<String>
    {
        self.tags.insert(name.into(), value.into());
    }

    pub
    fn set_tags<I, K, V>(&mut self, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        for (k, v) in tags {
            self.set_tag(k, v);
        }
    }

    /// Look up a tag, nearest definer first.
    pub
    fn tag(&self, name: &str) -> Option<&str> {
        self.chain()
            .find_map(|t| t.tags.get(name))
            .map(|v| v.as_str())
    }

    pub
    fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }

    /// Every tag visible from this template.
    pub
    fn tags(&self) -> HashMap<String, String> {
        self.merged(|t| &t.tags)
    }

    pub
    fn set_variable<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<JsonValue>
    {
        self.variables.insert(name.into(), value.into());
    }

    pub
    fn set_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>
    {
        for (k, v) in variables {
            self.set_variable(k, v);
        }
    }

    /// Look up a variable, nearest definer first.
    pub
    fn variable(&self, name: &str) -> Option<&JsonValue> {
        self.chain().find_map(|t| t.variables.get(name))
    }

    pub
    fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Every variable visible from this template.
    pub
    fn variables(&self) -> HashMap<String, JsonValue> {
        self.merged(|t| &t.variables)
    }

    pub
    fn set_part<K, V>(&mut self, name: K, content: V)
    where
        K: Into<String>,
        V: Into<String>
    {
        self.parts.insert(name.into(), content.into());
    }

    pub
    fn set_parts<I, K, V>(&mut self, parts: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        for (k, v) in parts {
            self.set_part(k, v);
        }
    }

    /// Look up a part, nearest definer first.
    pub
    fn part(&self, name: &str) -> Option<&str> {
        self.part_from(0, name).map(|(_, content)| content)
    }

    /// Look up a part starting `level` steps up the chain, returning the
    /// level of the template that defines it.
    pub(crate)
    fn part_from(&self, level: usize, name: &str) -> Option<(usize, &str)> {
        self.chain()
            .enumerate()
            .skip(level)
            .find_map(|(idx, t)| t.parts.get(name).map(|p| (idx, p.as_str())))
    }

    /// Every part visible from this template.
    pub
    fn parts(&self) -> HashMap<String, String> {
        self.merged(|t| &t.parts)
    }
}
