//! Compilation units.

use rhizome_weave_ir::Node;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::forms::{FormError, registry};
use crate::{CompileContext, DependencyRecord};

/// Load eligibility of a compiled module.
///
/// A module that is not `requirable` cannot be pulled in later by another
/// module, so the bootstrap loads it unconditionally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFlags {
    #[serde(default)]
    pub load: bool,
    #[serde(default)]
    pub requirable: bool,
}

impl UnitFlags {
    /// Whether the bootstrap module must load this unit eagerly.
    pub fn eager(self) -> bool {
        self.load || !self.requirable
    }
}

/// Opaque source map attached to a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceMap(Value);

impl SourceMap {
    pub fn new(map: Value) -> Self {
        Self(map)
    }

    /// `//# sourceMappingURL=` comment embedding the map as a data URI.
    pub fn data_uri_comment(&self) -> String {
        format!(
            "//# sourceMappingURL=data:application/json;charset=utf-8,{}",
            percent_encode(&self.0.to_string())
        )
    }
}

fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

/// A call site of a special form, as handed over by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroInvocation {
    pub namespace: String,
    pub selector: String,
    #[serde(default)]
    pub args: Vec<Node>,
}

impl MacroInvocation {
    pub fn new(namespace: impl Into<String>, selector: impl Into<String>, args: Vec<Node>) -> Self {
        Self {
            namespace: namespace.into(),
            selector: selector.into(),
            args,
        }
    }
}

/// A piece of a unit's generated output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    /// Text already generated by the general code generator.
    Code { text: String },
    /// A special form call site to expand here.
    Macro(MacroInvocation),
}

/// One source file as handed over by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSource {
    pub filename: String,
    #[serde(default)]
    pub flags: UnitFlags,
    #[serde(default)]
    pub source_map: Option<SourceMap>,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
}

/// Compilation failed for one unit.
#[derive(Debug, Error)]
#[error("failed to compile {filename}: {source}")]
pub struct UnitError {
    pub filename: String,
    pub source: FormError,
}

/// The compiled form of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    filename: String,
    module_name: String,
    code: String,
    source_map: Option<SourceMap>,
    flags: UnitFlags,
    local_dependencies: Vec<DependencyRecord>,
}

impl CompilationUnit {
    /// Create a unit for `filename`, deriving its module name.
    pub fn new(filename: &str, code: impl Into<String>, flags: UnitFlags) -> Self {
        Self {
            filename: filename.to_string(),
            module_name: module_name(filename),
            code: code.into(),
            source_map: None,
            flags,
            local_dependencies: Vec::new(),
        }
    }

    pub fn with_source_map(mut self, source_map: SourceMap) -> Self {
        self.source_map = Some(source_map);
        self
    }

    pub fn with_local_dependencies(mut self, dependencies: Vec<DependencyRecord>) -> Self {
        self.local_dependencies = dependencies;
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// May be empty, or shared with another unit, when filenames collapse
    /// under cleaning (`"."`, `"../x.rb"` next to `"x.rb"`).
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn source_map(&self) -> Option<&SourceMap> {
        self.source_map.as_ref()
    }

    pub fn flags(&self) -> UnitFlags {
        self.flags
    }

    /// Dependencies declared while this unit compiled. Empty if none.
    pub fn local_dependencies(&self) -> &[DependencyRecord] {
        &self.local_dependencies
    }
}

/// Derive the module name for a source file.
///
/// The path is cleaned lexically (`.` dropped, `dir/..` folded) and the
/// final component is cut at its first `.`. Module names are always
/// relative: leading `/` and unfoldable `..` components are dropped so the
/// module stays inside the output directory.
pub fn module_name(filename: &str) -> String {
    let normalized = filename.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            part => parts.push(part),
        }
    }
    if let Some(last) = parts.last_mut() {
        let file: &str = *last;
        if let Some((stem, _)) = file.split_once('.') {
            if !stem.is_empty() {
                *last = stem;
            }
        }
    }
    parts.join("/")
}

/// Compile one unit against the build's shared context.
///
/// Code fragments are copied through, macro fragments are expanded by the
/// special form registry. Dependencies the unit declares are both left in
/// the context's ledger and captured on the returned unit.
pub fn compile_unit(
    ctx: &mut CompileContext,
    source: UnitSource,
) -> Result<CompilationUnit, UnitError> {
    let mark = ctx.dependency_mark();
    let mut code = String::new();

    for fragment in &source.fragments {
        match fragment {
            Fragment::Code { text } => code.push_str(text),
            Fragment::Macro(invocation) => {
                let expanded = registry()
                    .expand(ctx, invocation)
                    .unwrap_or_else(|| {
                        Err(FormError::UnknownForm {
                            namespace: invocation.namespace.clone(),
                            selector: invocation.selector.clone(),
                        })
                    })
                    .map_err(|source_err| UnitError {
                        filename: source.filename.clone(),
                        source: source_err,
                    })?;
                code.push_str(&expanded);
            }
        }
    }

    let local_dependencies = ctx.dependencies_since(mark).to_vec();
    let mut unit = CompilationUnit::new(&source.filename, code, source.flags)
        .with_local_dependencies(local_dependencies);
    if let Some(source_map) = source.source_map {
        unit = unit.with_source_map(source_map);
    }
    debug!(
        "compiled {} as module {} ({} dependencies)",
        source.filename,
        unit.module_name(),
        unit.local_dependencies().len()
    );
    Ok(unit)
}
