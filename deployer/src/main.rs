//! The deployer for Fortune templates.
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
    clap::Parser,
    env_logger::Env,
    fortune_core::{
        Compiler,
        Config,
        Error,
        Result,
    },
    log::info,
    serde::Deserialize,
    serde_json::from_str as from_json_str,
    std::{
        fs::{
            copy,
            create_dir_all,
            read_to_string,
            write,
        },
        path::{
            Path,
            PathBuf,
        },
    },
};

const SCHEMA: &str = include_str!("../schema/deployment.json");

const NOTICE: &str = "\
fortd  Copyright (C) 2024  Frankie Baffa
This program comes with ABSOLUTELY NO WARRANTY.
This is free software, and you are welcome to redistribute it
under the terms of the GNU General Public License version 3 or later.";

#[derive(Deserialize)]
struct CompileFile {
    /// A template name or alias.
    template: String,
    destination: PathBuf,
}

#[derive(Deserialize)]
struct CompileDirectorySource {
    /// A directory beneath a template root.
    directory: PathBuf,
    extensions: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct CompileDirectoryDestination {
    directory: PathBuf,
    extension: Option<String>,
}

#[derive(Deserialize)]
struct CompileDirectory {
    source: CompileDirectorySource,
    destination: CompileDirectoryDestination,
}

#[derive(Deserialize)]
struct CopyFile {
    source: PathBuf,
    destination: PathBuf,
}

#[derive(Deserialize)]
struct CopyDirectory {
    source: PathBuf,
    destination: PathBuf,
    extensions: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Action {
    CompileFile(CompileFile),
    CompileDirectory(CompileDirectory),
    CopyFile(CopyFile),
    CopyDirectory(CopyDirectory),
}

#[derive(Deserialize)]
struct Deployment {
    /// A configuration file, relative to the deployment.
    config: Option<PathBuf>,
    actions: Vec<Action>,
}

/// Render templates and copy files as a deployment describes.
#[derive(Parser, Debug)]
#[command(name = "fortd", version)]
struct Options {
    /// The json deployment to run.
    #[arg(required_unless_present_any = [ "schema", "license_notice", ])]
    deployment: Option<PathBuf>,

    /// Print the json schema of a deployment.
    #[arg(short, long)]
    schema: bool,

    /// Print the license notice.
    #[arg(short, long)]
    license_notice: bool,

    /// Log each step of the deployment.
    #[arg(short, long)]
    verbose: bool,
}

fn io<P: AsRef<Path>>(path: P) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.as_ref().to_path_buf();
    move |e| Error::IO(e, path)
}

fn file_parts(path: &Path) -> (String, String) {
    let stem = path.file_stem()
        .and_then(|v| v.to_str())
        .unwrap_or("")
        .to_owned();
    let ext = path.extension()
        .and_then(|v| v.to_str())
        .unwrap_or("")
        .to_owned();

    (stem, ext)
}

fn wanted(ext: &str, extensions: Option<&[String]>) -> bool {
    match extensions {
        Some(exts) => exts.is_empty() || exts.iter().any(|e| e.trim_start_matches('.') == ext),
        None => true,
    }
}

fn write_output(destination: &Path, output: &str) -> Result<()> {
    if let Some(dir) = destination.parent() {
        create_dir_all(dir).map_err(io(dir))?;
    }

    write(destination, output).map_err(io(destination))
}

fn compile_directory(compiler: &Compiler, config: &Config, cdir: &CompileDirectory) -> Result<()> {
    let directory = config.roots().iter()
        .map(|root| root.join(&cdir.source.directory))
        .find(|dir| dir.is_dir())
        .ok_or_else(|| Error::TemplateNotFound(cdir.source.directory.display().to_string()))?;

    info!("Compiling directory {directory:?}");

    for e_res in directory.read_dir().map_err(io(&directory))? {
        let entry = e_res.map_err(io(&directory))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let (filename, ext) = file_parts(&path);
        if !wanted(&ext, cdir.source.extensions.as_deref()) {
            continue;
        }

        let name = cdir.source.directory.join(format!("{filename}.{ext}"));
        let name = name.to_string_lossy().replace('\\', "/");
        info!("  Compiling template {name:?}");

        let output = compiler.render(&name)?;

        let mut dest = cdir.destination.directory.clone();
        match &cdir.destination.extension {
            Some(dext) => dest.push(format!("{filename}.{}", dext.trim_start_matches('.'))),
            None => dest.push(format!("{filename}.{ext}")),
        }

        info!("  Writing to {dest:?}");
        write_output(&dest, &output)?;
    }

    Ok(())
}

fn copy_directory(cdir: &CopyDirectory) -> Result<()> {
    info!("Copying directory {:?}", cdir.source);
    create_dir_all(&cdir.destination).map_err(io(&cdir.destination))?;

    for e_res in cdir.source.read_dir().map_err(io(&cdir.source))? {
        let entry = e_res.map_err(io(&cdir.source))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let (_, ext) = file_parts(&path);
        if !wanted(&ext, cdir.extensions.as_deref()) {
            continue;
        }

        let dest = cdir.destination.join(entry.file_name());
        info!("  Copying file {path:?} to {dest:?}");
        copy(&path, &dest).map_err(io(&path))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let opts = Options::parse();

    env_logger::Builder::from_env(
        Env::default().default_filter_or(if opts.verbose { "info" } else { "warn" })
    ).init();

    if opts.license_notice {
        println!("{NOTICE}");
        return Ok(());
    }

    if opts.schema {
        println!("{SCHEMA}");
        return Ok(());
    }

    let dpath = match opts.deployment {
        Some(dpath) => dpath,
        None => return Ok(()),
    };

    let deployment = from_json_str::<Deployment>(
        &read_to_string(&dpath).map_err(io(&dpath))?
    ).map_err(|e| Error::JsonParse(e, dpath.clone()))?;

    let config = match &deployment.config {
        Some(cpath) => Config::read(dpath.parent().unwrap_or(Path::new("")).join(cpath))?,
        None => Config::default(),
    };
    let compiler = config.compiler()?;

    for action in deployment.actions.iter() {
        match action {
            Action::CompileFile(cfile) => {
                info!("Compiling template {:?}", cfile.template);
                let output = compiler.render(&cfile.template)?;

                info!("  Writing to {:?}", cfile.destination);
                write_output(&cfile.destination, &output)?;
            },
            Action::CompileDirectory(cdir) => compile_directory(&compiler, &config, cdir)?,
            Action::CopyFile(cfile) => {
                info!("Copying file {:?} to {:?}", cfile.source, cfile.destination);

                if let Some(dir) = cfile.destination.parent() {
                    create_dir_all(dir).map_err(io(dir))?;
                }

                copy(&cfile.source, &cfile.destination).map_err(io(&cfile.source))?;
            },
            Action::CopyDirectory(cdir) => copy_directory(cdir)?,
        }
    }

    Ok(())
}
