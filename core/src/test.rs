//! Tests for the Fortune Template Compiler.
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
            DEFAULT_MAX_EXPANSIONS,
        },
        config::Config,
        delimiter::{
            DelimiterKind,
            Delimiters,
        },
        error::Error,
        escape::{
            Escaper,
            HtmlEscaper,
            IdentityEscaper,
        },
        file::Cursor,
        functions::FunctionRegistry,
        loader::{
            Factory,
            FileSource,
            MemorySource,
        },
        template::Template,
    },
    serde_json::{
        json,
        Value as JsonValue,
    },
    std::path::PathBuf,
};

fn memory(templates: &[(&str, &str)]) -> Factory {
    let mut source = MemorySource::new();
    for (name, raw) in templates.iter() {
        source.insert(*name, *raw);
    }

    Factory::new(source)
}

fn identity(factory: Factory) -> Compiler {
    Compiler::new(factory).with_escaper(IdentityEscaper)
}

#[test]
fn cursor_1() {
    let mut cursor = Cursor::new("ab\ncd");
    assert_eq!(Some("ab\n"), cursor.take(3));
    assert_eq!(1, cursor.coord().line());
    assert_eq!(0, cursor.coord().position());

    assert_eq!(Some("c"), cursor.take_until("d"));
    assert_eq!(1, cursor.coord().position());

    assert!(cursor.take_until("x").is_none());
    assert!(cursor.take_str("d"));
    assert!(cursor.eof());
    assert!(cursor.take(1).is_none());
}

#[test]
fn scenario_1() {
    let mut template = Template::new("greeting", "Hello {{ name }}!");
    template.set_tag("name", "World");

    let output = identity(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("Hello World!", output);
}

#[test]
fn scenario_2() {
    let factory = memory(&[
        ("parent", "<% part(\"title\") %>Default<% endpart %><h1><% show(\"title\") %></h1>"),
        ("child", "<% extends(\"parent\") %><% part(\"title\") %>Custom<% endpart %>"),
    ]);

    assert_eq!("<h1>Custom</h1>", identity(factory).render("child").unwrap());
}

#[test]
fn scenario_3() {
    let mut template = Template::new("script", "{{ \"<script>\" }}");
    let output = Compiler::new(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("&lt;script&gt;", output);
}

#[test]
fn escaping_1() {
    let compiler = Compiler::new(memory(&[]));

    for value in [ "plain", "<a href=\"x\">", "Tom & Jerry's", "", ] {
        let mut template = Template::new("t", "{{ v }}|{{! v !}}");
        template.set_tag("v", value);

        let output = compiler.compile(&mut template).unwrap();
        assert_eq!(format!("{}|{}", HtmlEscaper.escape(value), value), output);
    }
}

#[test]
fn escaping_2() {
    let mut template = Template::new("t", "\\{{ name }} and \\<% show(\"x\") %> and \\{{! raw !}}");
    template.set_tag("name", "World");

    let output = identity(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("{{ name }} and <% show(\"x\") %> and {{! raw !}}", output);
}

#[test]
fn substituted_values_are_literal() {
    let mut template = Template::new("t", "{{! v !}}|{{ $w }}");
    template.set_tag("v", "<% show(\"x\") %>{{ y }}\\");
    template.set_variable("w", "{{ y }}");
    template.set_tag("y", "leaked");

    let output = identity(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("<% show(\"x\") %>{{ y }}\\|{{ y }}", output);
}

#[test]
fn statements_are_verbatim() {
    let mut template = Template::new("t", "<% '<b>' . upper('x') %>");
    let output = Compiler::new(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("<b>X", output);
}

#[test]
fn literal_precedence_1() {
    let mut template = Template::new("t", "{{ \"name\" }}|{{ 'name' }}|{{ name }}");
    template.set_tag("name", "registered");

    let output = identity(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("name|name|registered", output);
}

#[test]
fn literal_precedence_2() {
    let mut template = Template::new(
        "t",
        "{{ \"a\\\\b\" }}|{{ \"a\\\\b\" . \"\" }}|{{ 'it\\'s' }}|{{ 'a\\qb' }}",
    );

    let output = identity(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("a\\b|a\\b|it's|a\\qb", output);
}

fn inheritance(defined: &[&'static str]) -> String {
    let mut factory = memory(&[
        ("grand", "{{ x }}"),
        ("parent", "<% extends(\"grand\") %>"),
        ("child", "<% extends(\"parent\") %>"),
    ]);

    for name in defined.iter() {
        let name = *name;
        factory.register_builder(name, move |t| {
            t.set_tag("x", name);
            Ok(())
        });
    }

    identity(factory).render("child").unwrap()
}

#[test]
fn inheritance_1() {
    assert_eq!("child", inheritance(&[ "child", "parent", "grand", ]));
    assert_eq!("parent", inheritance(&[ "parent", "grand", ]));
    assert_eq!("grand", inheritance(&[ "grand", ]));
    assert_eq!("", inheritance(&[]));
}

#[test]
fn inheritance_2() {
    let mut factory = memory(&[
        ("grand", "{{ x }}{{ y }}{{ z }}"),
        ("parent", "<% extends(\"grand\") %>"),
        ("child", "<% extends(\"parent\") %>"),
    ]);
    factory.register_builder("grand", |t| {
        t.set_tags([ ("x", "gx"), ("y", "gy"), ("z", "gz"), ]);
        Ok(())
    });
    factory.register_builder("parent", |t| {
        t.set_tags([ ("x", "px"), ("y", "py"), ]);
        Ok(())
    });
    factory.register_builder("child", |t| {
        t.set_tag("x", "cx");
        Ok(())
    });

    let compiler = identity(factory);
    let mut child = compiler.factory().load("child").unwrap();
    assert_eq!("cxpygz", compiler.compile(&mut child).unwrap());

    let ancestors = child.ancestors().map(|t| t.path()).collect::<Vec<_>>();
    assert_eq!(vec![ "parent", "grand", ], ancestors);

    let tags = child.tags();
    assert_eq!(3, tags.len());
    assert_eq!("cx", tags["x"]);
    assert_eq!("py", tags["y"]);
    assert_eq!("gz", tags["z"]);
}

#[test]
fn part_override_1() {
    let factory = memory(&[
        ("grand", "<% part(\"body\") %>grand<% endpart %>[<% show(\"body\") %>]"),
        ("parent", "<% extends(\"grand\") %>"),
        ("child", "<% extends(\"parent\") %><% part(\"body\") %>child+<% parent(\"body\") %><% endpart %>"),
    ]);

    assert_eq!("[child+grand]", identity(factory).render("child").unwrap());
}

#[test]
fn part_override_2() {
    let factory = memory(&[
        ("grand", "<% part(\"body\") %>grand<% endpart %>[<% show(\"body\") %>]"),
        ("parent", "<% extends(\"grand\") %><% part(\"body\") %>parent+<% parent() %><% endpart %>"),
        ("child", "<% extends(\"parent\") %><% part(\"body\") %>child+<% parent %><% endpart %>"),
    ]);

    let compiler = identity(factory);
    assert_eq!("[child+parent+grand]", compiler.render("child").unwrap());
    assert_eq!("[parent+grand]", compiler.render("parent").unwrap());
}

#[test]
fn part_nested_1() {
    let factory = memory(&[
        ("layout", "<% part(\"page\") %><header><% part(\"title\") %>Untitled<% endpart %><% show(\"title\") %></header><% endpart %><% show(\"page\") %>"),
        ("page", "<% extends(\"layout\") %><% part(\"title\") %>Nested<% endpart %>"),
    ]);

    assert_eq!("<header>Nested</header>", identity(factory).render("page").unwrap());
}

#[test]
fn include_1() {
    let factory = memory(&[
        ("nav", "<nav><% include(\"link\") %></nav>"),
        ("link", "<a>{{ label }}</a>"),
        ("page", "<% include(\"nav\") %><% include(\"nav\") %>"),
    ]);

    let mut template = factory.load("page").unwrap();
    template.set_tag("label", "Home");

    let output = identity(factory).compile(&mut template).unwrap();
    assert_eq!("<nav><a>Home</a></nav><nav><a>Home</a></nav>", output);
    assert!(template.parent().is_none());
}

#[test]
fn cleanup_1() {
    let compiler = identity(memory(&[]));

    let mut template = Template::new("t", "a<% show(\"missing\") %>b{{ missing }}c<% endpart %><% parent() %>{{! !}}");
    let output = compiler.compile(&mut template).unwrap();
    assert_eq!("abc", output);

    let mut again = Template::new("t", output.as_str());
    assert_eq!("abc", compiler.compile(&mut again).unwrap());
}

#[test]
fn delimiters_1() {
    let delimiters = Delimiters::default()
        .with(DelimiterKind::UnescapedTag, "{{{", "}}}")
        .unwrap();
    let mut template = Template::with_delimiters("t", "{{{x}}} {{x}}", delimiters);
    template.set_tag("x", "<b>");

    let output = Compiler::new(memory(&[])).compile(&mut template).unwrap();
    assert_eq!("<b> &lt;b&gt;", output);
}

#[test]
fn delimiters_2() {
    let delimiters = Delimiters::default()
        .with(DelimiterKind::Statement, "{%", "%}")
        .and_then(|d| d.with(DelimiterKind::EscapedTag, "[[", "]]"))
        .unwrap();

    let mut factory = memory(&[
        ("base", "[[ title ]]{% part(\"body\") %}base{% endpart %}:{% show(\"body\") %}"),
        ("page", "{% extends(\"base\") %}{% part(\"body\") %}page <% kept %> {{ kept }}{% endpart %}"),
    ])
    .with_delimiters(delimiters);
    factory.register_builder("page", |t| {
        t.set_tag("title", "Fortune");
        Ok(())
    });

    let output = identity(factory).render("page").unwrap();
    assert_eq!("Fortune:page <% kept %> {{ kept }}", output);
}

#[test]
fn delimiters_3() {
    let invalid = [
        Delimiters::default().with(DelimiterKind::Statement, "", "%>"),
        Delimiters::default().with(DelimiterKind::Statement, "<%", ""),
        Delimiters::default().with(DelimiterKind::Statement, "\\<%", "%>"),
        Delimiters::default().with(DelimiterKind::Statement, "{{", "}}"),
    ];

    for delimiters in invalid {
        assert!(matches!(delimiters, Err(Error::InvalidDelimiters(_))));
    }
}

#[test]
fn unterminated_1() {
    let mut template = Template::new("page", "line one\n  {{ name");

    match identity(memory(&[])).compile(&mut template) {
        Ok(_) => panic!("Compilation should have failed!"),
        Err(e) => match e {
            Error::UnterminatedDirective(kind, fragment, c, path) => {
                assert_eq!("escaped tag", kind);
                assert_eq!("{{ name", fragment);
                assert_eq!(1, c.line());
                assert_eq!(2, c.position());
                assert_eq!("page", path);
            },
            _ => panic!("Error should have been UnterminatedDirective"),
        },
    }
}

#[test]
fn unterminated_2() {
    let mut template = Template::new("page", "<% part(\"a\") %>never closed");
    assert!(matches!(
        identity(memory(&[])).compile(&mut template),
        Err(Error::UnterminatedDirective(kind, ..)) if kind == "part",
    ));
}

#[test]
fn malformed_1() {
    let mut template = Template::new("page", "<% extends(base) %>");
    assert!(matches!(
        identity(memory(&[])).compile(&mut template),
        Err(Error::MalformedDirective(..)),
    ));
}

#[test]
fn not_found_1() {
    let compiler = identity(memory(&[ ("page", "<% extends(\"nope\") %>"), ]));
    assert!(matches!(compiler.render("page"), Err(Error::TemplateNotFound(name)) if name == "nope"));
    assert!(matches!(compiler.render("other"), Err(Error::TemplateNotFound(name)) if name == "other"));
}

#[test]
fn cycle_1() {
    let compiler = identity(memory(&[
        ("a", "<% extends(\"b\") %>"),
        ("b", "<% extends(\"a\") %>"),
        ("self", "<% extends(\"self\") %>"),
    ]));

    assert!(matches!(compiler.render("a"), Err(Error::InheritanceCycle(name, _)) if name == "a"));
    assert!(matches!(compiler.render("self"), Err(Error::InheritanceCycle(name, _)) if name == "self"));
}

#[test]
fn cycle_2() {
    let compiler = identity(memory(&[
        ("self", "x<% include(\"self\") %>"),
        ("a", "<% include(\"b\") %>"),
        ("b", "<% include(\"a\") %>"),
    ]));

    assert!(matches!(compiler.render("self"), Err(Error::IncludeCycle(..))));
    assert!(matches!(compiler.render("a"), Err(Error::IncludeCycle(..))));
}

#[test]
fn cycle_3() {
    let mut template = Template::new("t", "<% part(\"a\") %>[<% show(\"a\") %>]<% endpart %><% show(\"a\") %>");
    assert!(matches!(
        identity(memory(&[])).compile(&mut template),
        Err(Error::RecursivePart(name, _)) if name == "a",
    ));
}

#[test]
fn depth_1() {
    let compiler = identity(memory(&[
        ("a", "<% include(\"b\") %>"),
        ("b", "<% include(\"c\") %>"),
        ("c", "<% include(\"d\") %>"),
        ("d", "d"),
        ("e", "<% extends(\"a\") %>"),
        ("f", "<% extends(\"e\") %>"),
    ]))
    .with_max_depth(2);

    assert!(matches!(compiler.render("a"), Err(Error::RecursionLimit(what, 2, _)) if what == "include"));
    assert!(matches!(compiler.render("b"), Ok(out) if out == "d"));

    let compiler = compiler.with_max_depth(1);
    assert!(matches!(compiler.render("f"), Err(Error::RecursionLimit(what, 1, _)) if what == "extends"));
}

#[test]
fn depth_2() {
    let mut template = Template::new("t", "<% show(\"a\") %>");
    template.set_parts([
        ("a", "<% show(\"b\") %>"),
        ("b", "<% show(\"c\") %>"),
        ("c", "c"),
    ]);

    let compiler = identity(memory(&[]));
    assert_eq!("c", compiler.compile(&mut template.clone()).unwrap());

    let compiler = compiler.with_max_depth(2);
    assert!(matches!(
        compiler.compile(&mut template),
        Err(Error::RecursionLimit(what, 2, _)) if what == "show",
    ));
}

#[test]
fn depth_3() {
    let mut template = Template::new("t", "<% show(\"p0\") %>");
    for i in 0..40 {
        let next = format!("<% show(\"p{}\") %>", i + 1);
        template.set_part(format!("p{i}"), format!("{next}{next}"));
    }
    template.set_part("p40", "x");

    let compiler = identity(memory(&[]));
    assert!(matches!(
        compiler.compile(&mut template.clone()),
        Err(Error::ExpansionLimit(DEFAULT_MAX_EXPANSIONS, path)) if path == "t",
    ));

    let mut template = Template::new("t", "<% show(\"p37\") %>");
    template.set_parts((37..40).map(|i| {
        let next = format!("<% show(\"p{}\") %>", i + 1);
        (format!("p{i}"), format!("{next}{next}"))
    }));
    template.set_part("p40", "x");

    assert_eq!("xxxxxxxx", compiler.compile(&mut template.clone()).unwrap());

    let compiler = compiler.with_max_expansions(14);
    assert!(matches!(compiler.compile(&mut template), Err(Error::ExpansionLimit(14, _))));
}

#[test]
fn depth_4() {
    let sources = (0..20)
        .map(|i| (format!("i{i}"), format!("<% include(\"i{0}\") %><% include(\"i{0}\") %>", i + 1)))
        .chain([ ("i20".to_owned(), "y".to_owned()), ])
        .collect::<Vec<_>>();
    let sources = sources.iter()
        .map(|(name, raw)| (name.as_str(), raw.as_str()))
        .collect::<Vec<_>>();

    let compiler = identity(memory(&sources)).with_max_expansions(100);
    assert!(matches!(compiler.render("i0"), Err(Error::ExpansionLimit(100, _))));
    assert_eq!("yy", compiler.render("i19").unwrap());
}

#[test]
fn depth_5() {
    let compiler = identity(memory(&[]));

    for body in [
        format!("{}1{}", "(".repeat(5000), ")".repeat(5000)),
        format!("{}1", "-".repeat(50_000)),
    ] {
        let mut template = Template::new("t", format!("{{{{ {body} }}}}"));
        assert!(matches!(
            compiler.compile(&mut template),
            Err(Error::Expression(_, message, path)) if message.contains("nested") && path == "t",
        ));
    }

    let mut template = Template::new("t", "{{ ((((1 + 1)))) * -(-2) }}");
    assert_eq!("4", compiler.compile(&mut template).unwrap());
}

#[test]
fn functions_1() {
    let mut template = Template::new("t", "{{ system('rm') }}");
    assert!(matches!(
        identity(memory(&[])).compile(&mut template),
        Err(Error::UnregisteredFunction(name, _, path)) if name == "system" && path == "t",
    ));
}

#[test]
fn functions_2() {
    let mut functions = FunctionRegistry::new();
    functions.register("UPPER", |_: &[JsonValue]| Ok(JsonValue::from("shadowed")));
    functions.register("fail", |_: &[JsonValue]| Err("nope".to_owned()));

    let compiler = identity(memory(&[])).with_functions(functions);

    let mut template = Template::new("t", "{{ upper('x') }}|{{ lower('X') }}");
    assert_eq!("shadowed|x", compiler.compile(&mut template).unwrap());

    let mut template = Template::new("t", "{{ fail() }}");
    assert!(matches!(
        compiler.compile(&mut template),
        Err(Error::Evaluation(_, message, _)) if message.contains("nope"),
    ));
}

#[test]
fn functions_3() {
    let mut template = Template::new(
        "head",
        "{{! page_title('A & B') !}}\n{{! css($styles) !}}\n{{! script('app.js') !}}\n{{! charset('utf-8') !}}",
    );
    template.set_variable("styles", json!([ "a.css", "b.css", ]));

    let compiler = Compiler::new(memory(&[])).with_functions(FunctionRegistry::with_html_helpers());
    assert_eq!(
        concat!(
            "<title>A &amp; B</title>\n",
            "<link href=\"a.css\" rel=\"stylesheet\">\n",
            "<link href=\"b.css\" rel=\"stylesheet\">\n",
            "<script type=\"text/javascript\" src=\"app.js\"></script>\n",
            "<meta charset=\"utf-8\">",
        ),
        compiler.compile(&mut template).unwrap(),
    );
}

#[test]
fn builders_1() {
    let mut factory = memory(&[ ("pages.home", "{{ heading }}"), ]);
    factory.alias("home", "pages.home");
    factory.register_global_builder(|t| {
        t.set_tag("heading", "global");
        Ok(())
    });
    factory.register_builder("home", |t| {
        t.set_tag("heading", "alias");
        Ok(())
    });
    factory.register_builder("pages.home", |t| {
        t.set_tag("heading", "name");
        Ok(())
    });
    factory.register_builder("other", |t| {
        t.set_tag("heading", "other");
        Ok(())
    });

    assert!(factory.exists("home"));
    assert!(!factory.exists("missing"));

    let compiler = identity(factory);
    assert_eq!("name", compiler.render("home").unwrap());
    assert_eq!("pages.home", compiler.factory().load("home").unwrap().path());
}

#[test]
fn builders_2() {
    let mut factory = memory(&[ ("page", "text"), ]);
    factory.register_builder("page", |_| Err(Error::TemplateNotFound("dependency".to_owned())));

    assert!(matches!(factory.load("page"), Err(Error::TemplateNotFound(name)) if name == "dependency"));
}

#[test]
fn file_source_1() {
    let source = FileSource::new("test/views");
    assert_eq!(Some(PathBuf::from("test/views/layouts/master.fortune")), source.locate("layouts.master"));
    assert_eq!(Some(PathBuf::from("test/views/partials/nav.html")), source.locate("partials.nav"));
    assert_eq!(Some(PathBuf::from("test/views/pages/about.html")), source.locate("pages/about.html"));
    assert_eq!(None, source.locate("layouts.missing"));
    assert_eq!(None, source.locate("../Cargo.toml"));

    let source = FileSource::new("test/views").with_root("test/views/fallback");
    assert_eq!(Some(PathBuf::from("test/views/partials/nav.html")), source.locate("partials.nav"));
    assert_eq!(Some(PathBuf::from("test/views/fallback/contact.fortune")), source.locate("contact"));

    let source = FileSource::new("test/views").with_extensions([ ".html", ]);
    assert_eq!(None, source.locate("pages.home"));
    assert_eq!(&[ "html".to_owned(), ], source.extensions());
}

#[test]
fn file_source_2() {
    let mut factory = Factory::new(FileSource::new("test/views"));
    factory.register_global_builder(|t| {
        t.set_tag("site", "Fortune & Co");
        Ok(())
    });
    factory.register_builder("pages.home", |t| {
        t.set_tag("heading", "<Welcome>");
        t.set_variable("visits", 41);
        Ok(())
    });

    let compiler = Compiler::new(factory);
    let mut template = compiler.factory().load("pages.home").unwrap();
    let output = compiler.compile(&mut template).unwrap();

    assert_eq!(
        concat!(
            "<title>Home | Fortune</title>\n",
            "<nav>Fortune &amp; Co</nav>\n",
            "<main><h1>&lt;Welcome&gt;</h1><p>42 visits</p></main>",
        ),
        output,
    );
    assert_eq!(Some("layouts.master"), template.parent().map(|p| p.path()));
    assert_eq!(Some("Fortune"), template.part_from(1, "title").map(|(_, part)| part));
}

#[test]
fn config_1() {
    let config = Config::read("test/config/fortune.json").unwrap();
    assert_eq!(
        vec![ PathBuf::from("test/views"), PathBuf::from("test/views/fallback"), ],
        config.roots(),
    );

    let compiler = config.compiler().unwrap();
    assert_eq!(
        concat!(
            "<title>Home | Fortune</title>\n",
            "<nav>Fortune & Co</nav>\n",
            "<main><h1><Welcome></h1><p>42 visits</p></main>",
        ),
        compiler.render("home").unwrap(),
    );
    assert_eq!(
        concat!(
            "<title>Fortune</title>\n",
            "<nav>Fortune & Co</nav>\n",
            "<main><p>{{ about }}</p></main>",
        ),
        compiler.render("pages.about").unwrap(),
    );
    assert_eq!("Contact", compiler.render("contact").unwrap());
}

#[test]
fn config_2() {
    let config = Config::read("test/config/delimiters.json").unwrap();
    let delimiters = config.delimiters().unwrap();
    assert_eq!("{%", delimiters.get(DelimiterKind::Statement).open());
    assert_eq!("{{{", delimiters.get(DelimiterKind::UnescapedTag).open());
    assert_eq!("}}", delimiters.get(DelimiterKind::EscapedTag).close());
    assert_eq!(8, config.max_depth());

    let invalid = Config::read("test/config/invalid.json").unwrap();
    assert!(matches!(invalid.delimiters(), Err(Error::InvalidDelimiters(_))));
    assert!(matches!(Config::read("test/config/missing.json"), Err(Error::IO(..))));
}
