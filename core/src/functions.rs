//! The function registry and built-in functions available to templates.
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
    crate::escape::escape_html,
    serde_json::{
        Number as JsonNumber,
        Value as JsonValue,
    },
    std::{
        collections::HashMap,
        fmt::{
            Debug,
            Formatter,
            Result as FmtResult,
        },
        sync::Arc,
    },
};

/// The signature of a function callable from templates.
///
/// An `Err` aborts the compilation with the returned message.
pub type TemplateFunction = Arc<dyn Fn(&[JsonValue]) -> Result<JsonValue, String> + Send + Sync>;

/// Functions registered for use in templates.
///
/// A registered function takes precedence over a built-in of the same name.
///
/// # Examples
///
/// ```rust
/// use fortune_core::FunctionRegistry;
/// use serde_json::Value;
///
/// let mut functions = FunctionRegistry::new();
/// functions.register("shout", |args: &[Value]| {
///     Ok(Value::String(format!("{}!", args[0].as_str().unwrap_or(""))))
/// });
/// assert!(functions.contains("SHOUT"));
/// ```
#[derive(Clone, Default)]
pub
struct FunctionRegistry {
    functions: HashMap<String, TemplateFunction>,
}

impl Debug for FunctionRegistry {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.debug_set().entries(self.functions.keys()).finish()
    }
}

impl FunctionRegistry {
    /// Creates a new, empty function registry.
    pub
    fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the HTML view helpers.
    pub
    fn with_html_helpers() -> Self {
        let mut registry = Self::new();
        registry.register("charset", charset);
        registry.register("css", css);
        registry.register("favicon", favicon);
        registry.register("http_equiv", http_equiv);
        registry.register("meta_description", meta_description);
        registry.register("meta_keywords", meta_keywords);
        registry.register("page_title", page_title);
        registry.register("script", script);
        registry
    }

    /// Registers a function, replacing any function of the same name.
    pub
    fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[JsonValue]) -> Result<JsonValue, String> + Send + Sync + 'static
    {
        self.functions.insert(name.to_lowercase(), Arc::new(func));
    }

    /// Finds a function by name (case-insensitive).
    pub
    fn get(&self, name: &str) -> Option<&TemplateFunction> {
        self.functions.get(&name.to_lowercase())
    }

    pub
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Host functions every template may call without registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub
enum Builtin {
    Upper,
    Lower,
    Capitalize,
    Trim,
    Length,
    Round,
    Abs,
    Min,
    Max,
    Join,
    Json,
    Default,
}

impl Builtin {
    pub
    fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_lowercase().as_str() {
            "upper" => Self::Upper,
            "lower" => Self::Lower,
            "capitalize" => Self::Capitalize,
            "trim" => Self::Trim,
            "length" => Self::Length,
            "round" => Self::Round,
            "abs" => Self::Abs,
            "min" => Self::Min,
            "max" => Self::Max,
            "join" => Self::Join,
            "json" => Self::Json,
            "default" => Self::Default,
            _ => return None,
        })
    }

    pub(crate)
    fn call(&self, args: &[JsonValue]) -> Result<JsonValue, String> {
        match self {
            Self::Upper => Ok(to_string(arg(args, 0)?).to_uppercase().into()),
            Self::Lower => Ok(to_string(arg(args, 0)?).to_lowercase().into()),
            Self::Capitalize => {
                let s = to_string(arg(args, 0)?);
                let mut chars = s.chars();
                Ok(match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }.into())
            },
            Self::Trim => Ok(to_string(arg(args, 0)?).trim().into()),
            Self::Length => match arg(args, 0)? {
                JsonValue::Array(a) => Ok(a.len().into()),
                JsonValue::Object(o) => Ok(o.len().into()),
                JsonValue::Null => Ok(0.into()),
                v => Ok(to_string(v).chars().count().into()),
            },
            Self::Round => {
                let n = to_number(arg(args, 0)?)?;
                let precision = match args.get(1) {
                    Some(p) => to_number(p)? as i32,
                    None => 0,
                };
                let factor = 10f64.powi(precision);
                number((n * factor).round() / factor)
            },
            Self::Abs => number(to_number(arg(args, 0)?)?.abs()),
            Self::Min | Self::Max => {
                let values = match args {
                    [JsonValue::Array(a)] => a.as_slice(),
                    args => args,
                };

                let mut numbers = values.iter().map(to_number);
                let mut best = numbers.next()
                    .ok_or_else(|| "expected at least one value".to_owned())??;
                for n in numbers {
                    let n = n?;
                    best = if matches!(self, Self::Min) { best.min(n) } else { best.max(n) };
                }

                number(best)
            },
            Self::Join => {
                let separator = args.get(1).map(to_string).unwrap_or_default();
                match arg(args, 0)? {
                    JsonValue::Array(a) => Ok(a.iter()
                        .map(to_string)
                        .collect::<Vec<_>>()
                        .join(separator.as_str())
                        .into()),
                    v => Ok(to_string(v).into()),
                }
            },
            Self::Json => serde_json::to_string(arg(args, 0)?)
                .map(JsonValue::String)
                .map_err(|e| e.to_string()),
            Self::Default => {
                let v = arg(args, 0)?;
                if matches!(v, JsonValue::Null) || v.as_str().is_some_and(str::is_empty) {
                    Ok(arg(args, 1)?.clone())
                }
                else {
                    Ok(v.clone())
                }
            },
        }
    }
}

fn arg(args: &[JsonValue], idx: usize) -> Result<&JsonValue, String> {
    args.get(idx).ok_or_else(|| format!("missing argument {}", idx + 1))
}

/// Convert a value to the text it renders as.
pub(crate)
fn to_string(v: &JsonValue) -> String {
    match v {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        v => v.to_string(),
    }
}

/// Convert a value to a number, accepting numeric strings.
pub(crate)
fn to_number(v: &JsonValue) -> Result<f64, String> {
    match v {
        JsonValue::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a number")),
        JsonValue::String(s) => s.trim()
            .parse::<f64>()
            .map_err(|_| format!("{s:?} is not a number")),
        JsonValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsonValue::Null => Ok(0.0),
        v => Err(format!("{v} is not a number")),
    }
}

/// Build a number value, preferring an integer when nothing is lost.
pub(crate)
fn number(n: f64) -> Result<JsonValue, String> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Ok(JsonValue::Number((n as i64).into()));
    }

    JsonNumber::from_f64(n)
        .map(JsonValue::Number)
        .ok_or_else(|| format!("{n} is not a finite number"))
}

fn strings(v: &JsonValue) -> Vec<String> {
    match v {
        JsonValue::Array(a) => a.iter().map(to_string).collect(),
        v => vec![to_string(v)],
    }
}

fn attr(v: &JsonValue) -> String {
    escape_html(&to_string(v))
}

fn charset(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(format!("<meta charset=\"{}\">", attr(arg(args, 0)?)).into())
}

fn css(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(strings(arg(args, 0)?).iter()
        .map(|href| format!("<link href=\"{}\" rel=\"stylesheet\">", escape_html(href)))
        .collect::<Vec<_>>()
        .join("\n")
        .into())
}

fn favicon(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(format!("<link rel=\"shortcut icon\" href=\"{}\">", attr(arg(args, 0)?)).into())
}

fn http_equiv(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(format!(
        "<meta http-equiv=\"{}\" content=\"{}\">",
        attr(arg(args, 0)?),
        attr(arg(args, 1)?),
    ).into())
}

fn meta_description(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(format!("<meta name=\"description\" content=\"{}\">", attr(arg(args, 0)?)).into())
}

fn meta_keywords(args: &[JsonValue]) -> Result<JsonValue, String> {
    let keywords = strings(arg(args, 0)?).join(",");
    Ok(format!("<meta name=\"keywords\" content=\"{}\">", escape_html(&keywords)).into())
}

fn page_title(args: &[JsonValue]) -> Result<JsonValue, String> {
    Ok(format!("<title>{}</title>", attr(arg(args, 0)?)).into())
}

fn script(args: &[JsonValue]) -> Result<JsonValue, String> {
    let kind = args.get(1)
        .map(to_string)
        .unwrap_or_else(|| "text/javascript".to_owned());

    Ok(strings(arg(args, 0)?).iter()
        .map(|src| format!(
            "<script type=\"{}\" src=\"{}\"></script>",
            escape_html(&kind),
            escape_html(src),
        ))
        .collect::<Vec<_>>()
        .join("\n")
        .into())
}
