//! Json configuration for compilers built from files on disk.
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
        compiler::{
            Compiler,
            DEFAULT_MAX_DEPTH,
            DEFAULT_MAX_EXPANSIONS,
        },
        delimiter::{
            Delimiter,
            DelimiterKind,
            Delimiters,
        },
        error::{
            Error,
            Result,
        },
        escape::IdentityEscaper,
        file::read_file,
        functions::FunctionRegistry,
        loader::{
            Factory,
            FileSource,
            DEFAULT_EXTENSIONS,
        },
        path::clean_path,
    },
    log::debug,
    serde::Deserialize,
    serde_json::{
        from_str as from_json_str,
        Map as JsonMap,
        Value as JsonValue,
    },
    std::{
        collections::HashMap,
        path::{
            Path,
            PathBuf,
        },
    },
};

/// How escaped tags are escaped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub
enum EscapeMode {
    #[default]
    Html,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub
struct DelimiterPair {
    pub open: String,
    pub close: String,
}

/// Compiler configuration.
///
/// ```json
/// {
///     "roots": [ "views" ],
///     "extensions": [ "fortune", "html" ],
///     "aliases": { "home": "pages.home" },
///     "delimiters": { "statement": { "open": "{%", "close": "%}" } },
///     "escape": "html",
///     "max-depth": 64,
///     "max-expansions": 10000,
///     "tags": { "site": "Fortune" },
///     "variables": { "year": 2024 }
/// }
/// ```
///
/// Relative roots are relative to the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub
struct Config {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
    aliases: HashMap<String, String>,
    delimiters: HashMap<DelimiterKind, DelimiterPair>,
    escape: EscapeMode,
    max_depth: usize,
    max_expansions: usize,
    tags: HashMap<String, String>,
    variables: JsonMap<String, JsonValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roots: vec![ PathBuf::from("."), ],
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            aliases: HashMap::new(),
            delimiters: HashMap::new(),
            escape: EscapeMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            tags: HashMap::new(),
            variables: JsonMap::new(),
        }
    }
}

impl Config {
    /// Read a configuration file.
    pub
    fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let mut config = from_json_str::<Self>(&content)
            .map_err(|e| Error::JsonParse(e, path.to_path_buf()))?;

        let dir = path.parent().unwrap_or(Path::new(""));
        config.roots = config.roots.into_iter()
            .map(|root| if root.is_relative() { clean_path(dir.join(root)) } else { root })
            .collect();

        debug!("read configuration {}", path.display());
        Ok(config)
    }

    pub
    fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Add a root ahead of the configured ones.
    pub
    fn add_root<P: Into<PathBuf>>(&mut self, root: P) {
        self.roots.insert(0, root.into());
    }

    pub
    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub
    fn escape(&self) -> EscapeMode {
        self.escape
    }

    pub
    fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub
    fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    pub
    fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    pub
    fn set_tag<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.tags.insert(name.into(), value.into());
    }

    pub
    fn variables(&self) -> &JsonMap<String, JsonValue> {
        &self.variables
    }

    pub
    fn set_variable<K: Into<String>>(&mut self, name: K, value: JsonValue) {
        self.variables.insert(name.into(), value);
    }

    /// The configured delimiters over the defaults.
    pub
    fn delimiters(&self) -> Result<Delimiters> {
        let defaults = Delimiters::default();
        let [ escaped_tag, unescaped_tag, statement, ] = DelimiterKind::ALL.map(|kind| {
            match self.delimiters.get(&kind) {
                Some(pair) => Delimiter::new(pair.open.as_str(), pair.close.as_str()),
                None => defaults.get(kind).clone(),
            }
        });

        Delimiters::new(escaped_tag, unescaped_tag, statement)
    }

    /// A factory over the configured roots. Every loaded template receives
    /// the configured tags and variables.
    pub
    fn factory(&self) -> Result<Factory> {
        let mut roots = self.roots.iter();
        let mut source = match roots.next() {
            Some(root) => FileSource::new(root),
            None => FileSource::new("."),
        };
        for root in roots {
            source = source.with_root(root);
        }
        let source = source.with_extensions(self.extensions.iter().cloned());

        let mut factory = Factory::new(source).with_delimiters(self.delimiters()?);
        for (alias, name) in self.aliases.iter() {
            factory.alias(alias, name);
        }

        let tags = self.tags.clone();
        let variables = self.variables.clone();
        factory.register_global_builder(move |template| {
            template.set_tags(tags.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            template.set_variables(variables.iter().map(|(k, v)| (k.as_str(), v.clone())));
            Ok(())
        });

        Ok(factory)
    }

    /// A compiler with the HTML view helpers registered.
    pub
    fn compiler(&self) -> Result<Compiler> {
        let compiler = Compiler::new(self.factory()?)
            .with_functions(FunctionRegistry::with_html_helpers())
            .with_max_depth(self.max_depth)
            .with_max_expansions(self.max_expansions);

        Ok(match self.escape {
            EscapeMode::Html => compiler,
            EscapeMode::None => compiler.with_escaper(IdentityEscaper),
        })
    }
}
