//! Bootstrap files loading the eager-load index.

use rhizome_weave_codegen_js::{OutputMode, js_string};

const HTML_TEMPLATE: &str = "<!doctype html>
<html>
<head>
  <meta charset=\"utf-8\">
  <title>Weave application</title>
</head>
<body>
  {scripts}
</body>
</html>
";

fn module_path(mode: OutputMode, module: &str) -> String {
    format!("./{}.{}", module, mode.extension())
}

/// `index.js` (`require`) or `index.mjs` (`import`) for `index`.
pub fn render_bootstrap(mode: OutputMode, index: &[String]) -> String {
    let mut out = String::new();
    for module in index {
        let path = js_string(&module_path(mode, module));
        if mode.is_esm() {
            out.push_str(&format!("import {};", path));
        } else {
            out.push_str(&format!("require({});", path));
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

/// `index.html` with one module script per entry of `index`.
pub fn render_html(index: &[String]) -> String {
    let scripts = index
        .iter()
        .map(|module| {
            format!(
                "<script type=\"module\" src=\"{}\"></script>",
                escape_attribute(&module_path(OutputMode::EsModule, module))
            )
        })
        .collect::<Vec<_>>()
        .join("\n  ");
    HTML_TEMPLATE.replace("{scripts}", &scripts)
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
