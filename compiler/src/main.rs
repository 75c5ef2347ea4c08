//! The command line compiler for Fortune templates.
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
        Config,
        Result,
    },
    log::debug,
    serde_json::{
        from_str as from_json_str,
        Value as JsonValue,
    },
    std::path::PathBuf,
};

const NOTICE: &str = "\
fortc  Copyright (C) 2024  Frankie Baffa
This program comes with ABSOLUTELY NO WARRANTY.
This is free software, and you are welcome to redistribute it
under the terms of the GNU General Public License version 3 or later.";

/// Compile a Fortune template and print the result.
#[derive(Parser, Debug)]
#[command(name = "fortc", version)]
struct Options {
    /// The name or alias of the template to compile.
    #[arg(required_unless_present = "license_notice")]
    template: Option<String>,

    /// A json configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// A template root, searched before configured roots. May be repeated.
    #[arg(short, long = "root", value_name = "DIRECTORY")]
    roots: Vec<PathBuf>,

    /// A tag given to every template, as name=value.
    #[arg(short, long = "tag", value_name = "NAME=VALUE", value_parser = parse_tag)]
    tags: Vec<(String, String)>,

    /// A variable given to every template, as name=json. Values that are
    /// not json are read as strings.
    #[arg(long = "var", value_name = "NAME=JSON", value_parser = parse_variable)]
    variables: Vec<(String, JsonValue)>,

    /// Print the license notice.
    #[arg(short, long)]
    license_notice: bool,

    /// Log what the compiler is doing.
    #[arg(short, long)]
    verbose: bool,
}

fn split_pair(input: &str) -> std::result::Result<(&str, &str), String> {
    input.split_once('=')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, found {input:?}"))
}

fn parse_tag(input: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = split_pair(input)?;
    Ok((name.to_owned(), value.to_owned()))
}

fn parse_variable(input: &str) -> std::result::Result<(String, JsonValue), String> {
    let (name, value) = split_pair(input)?;
    let value = from_json_str::<JsonValue>(value)
        .unwrap_or_else(|_| JsonValue::String(value.to_owned()));
    Ok((name.to_owned(), value))
}

fn main() -> Result<()> {
    let opts = Options::parse();

    env_logger::Builder::from_env(
        Env::default().default_filter_or(if opts.verbose { "debug" } else { "warn" })
    ).init();

    if opts.license_notice {
        println!("{NOTICE}");
        return Ok(());
    }

    let mut config = match &opts.config {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    };

    for root in opts.roots.into_iter().rev() {
        config.add_root(root);
    }

    for (name, value) in opts.tags.into_iter() {
        config.set_tag(name, value);
    }

    for (name, value) in opts.variables.into_iter() {
        config.set_variable(name, value);
    }

    debug!("searching {:?}", config.roots());

    let compiler = config.compiler()?;
    if let Some(template) = opts.template {
        let output = compiler.render(&template)?;
        println!("{output}");
    }

    Ok(())
}
