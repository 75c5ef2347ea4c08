//! Loading templates by name.
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
        delimiter::Delimiters,
        error::{
            Error,
            Result,
        },
        file::read_file,
        path::contained_path,
        template::Template,
    },
    log::debug,
    std::{
        collections::HashMap,
        fmt::{
            Debug,
            Formatter,
            Result as FmtResult,
        },
        path::{
            Path,
            PathBuf,
        },
    },
};

/// The extensions a [`FileSource`] tries when none are configured.
pub const DEFAULT_EXTENSIONS: [&str; 2] = [ "fortune", "html", ];

/// Where template text comes from.
pub trait TemplateSource: Send + Sync {
    /// Read the text of a template, failing with
    /// [`Error::TemplateNotFound`] when there is no such template.
    fn read(&self, name: &str) -> Result<String>;

    fn exists(&self, name: &str) -> bool {
        self.read(name).is_ok()
    }
}

/// Templates held in memory.
#[derive(Debug, Default, Clone)]
pub
struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    pub
    fn new() -> Self {
        Self::default()
    }

    pub
    fn insert<N, S>(&mut self, name: N, raw: S)
    where
        N: Into<String>,
        S: Into<String>
    {
        self.templates.insert(name.into(), raw.into());
    }

    pub
    fn with<N, S>(mut self, name: N, raw: S) -> Self
    where
        N: Into<String>,
        S: Into<String>
    {
        self.insert(name, raw);
        self
    }
}

impl TemplateSource for MemorySource {
    fn read(&self, name: &str) -> Result<String> {
        self.templates.get(name)
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))
    }

    fn exists(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}

/// Templates on disk under one or more root directories.
///
/// Roots and extensions are tried in the order they were given. A name is
/// tried as a relative path first; after that each `.` in the name is read
/// as a directory separator and each extension is appended, so
/// `layouts.main` finds `layouts/main.fortune`. Names never resolve outside
/// their root.
#[derive(Debug, Clone)]
pub
struct FileSource {
    roots: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl FileSource {
    pub
    fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            roots: vec![ root.as_ref().to_path_buf(), ],
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Add a root with a lower priority than those already present.
    pub
    fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.roots.push(root.as_ref().to_path_buf());
        self
    }

    /// Replace the extensions, highest priority first.
    pub
    fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.extensions = extensions.into_iter()
            .map(|e| e.into().trim_start_matches('.').to_owned())
            .collect();
        self
    }

    pub
    fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub
    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = vec![ PathBuf::from(name), ];
        let dotted = name.replace('.', "/");

        for ext in self.extensions.iter() {
            candidates.push(PathBuf::from(format!("{dotted}.{ext}")));
            if dotted != name {
                candidates.push(PathBuf::from(format!("{name}.{ext}")));
            }
        }

        candidates
    }

    /// The file a name resolves to.
    pub
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let candidates = self.candidates(name);

        self.roots.iter()
            .flat_map(|root| candidates.iter().filter_map(move |c| contained_path(root, c)))
            .find(|path| path.is_file())
    }
}

impl TemplateSource for FileSource {
    fn read(&self, name: &str) -> Result<String> {
        let path = self.locate(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))?;

        debug!("reading template {name:?} from {}", path.display());
        read_file(path)
    }

    fn exists(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

/// A function run against every matching template after it is loaded.
pub type Builder = Box<dyn Fn(&mut Template) -> Result<()> + Send + Sync>;

/// Loads templates by name or alias and prepares them with builders.
///
/// # Examples
///
/// ```rust
/// use fortune_core::{ Factory, MemorySource, };
///
/// let mut factory = Factory::new(MemorySource::new().with("pages.home", "Home"));
/// factory.alias("home", "pages.home");
/// factory.register_builder("home", |t| {
///     t.set_tag("title", "Welcome");
///     Ok(())
/// });
///
/// let template = factory.load("home").unwrap();
/// assert_eq!("pages.home", template.path());
/// assert_eq!(Some("Welcome"), template.tag("title"));
/// ```
pub
struct Factory {
    source: Box<dyn TemplateSource>,
    aliases: HashMap<String, String>,
    delimiters: Delimiters,
    builders: Vec<(Option<String>, Builder)>,
}

impl Debug for Factory {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.debug_struct("Factory")
            .field("aliases", &self.aliases)
            .field("delimiters", &self.delimiters)
            .field("builders", &self.builders.len())
            .finish_non_exhaustive()
    }
}

impl Factory {
    pub
    fn new<S: TemplateSource + 'static>(source: S) -> Self {
        Self {
            source: Box::new(source),
            aliases: HashMap::new(),
            delimiters: Delimiters::default(),
            builders: Vec::new(),
        }
    }

    /// Set the delimiters given to every loaded template.
    pub
    fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub
    fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub
    fn alias<A, N>(&mut self, alias: A, name: N) -> &mut Self
    where
        A: Into<String>,
        N: Into<String>
    {
        self.aliases.insert(alias.into(), name.into());
        self
    }

    /// The template name an alias stands for, or the name itself.
    pub
    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name)
            .map(|n| n.as_str())
            .unwrap_or(name)
    }

    /// Run a builder after loading the template with this name or alias.
    pub
    fn register_builder<N, F>(&mut self, name: N, builder: F) -> &mut Self
    where
        N: Into<String>,
        F: Fn(&mut Template) -> Result<()> + Send + Sync + 'static
    {
        self.builders.push((Some(name.into()), Box::new(builder)));
        self
    }

    /// Run a builder after loading any template.
    pub
    fn register_global_builder<F>(&mut self, builder: F) -> &mut Self
    where
        F: Fn(&mut Template) -> Result<()> + Send + Sync + 'static
    {
        self.builders.push((None, Box::new(builder)));
        self
    }

    /// Load a template, applying matching builders in registration order.
    pub
    fn load(&self, name: &str) -> Result<Template> {
        let resolved = self.resolve(name);
        let raw = self.source.read(resolved)?;
        let mut template = Template::with_delimiters(resolved, raw, self.delimiters.clone());

        for (target, builder) in self.builders.iter() {
            let applies = match target {
                Some(target) => target == name || target == resolved,
                None => true,
            };

            if applies {
                builder(&mut template)?;
            }
        }

        debug!("loaded template {resolved:?}");
        Ok(template)
    }

    pub
    fn exists(&self, name: &str) -> bool {
        self.source.exists(self.resolve(name))
    }
}
