//! Per-build compile state.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rhizome_weave_ir::LiteralValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Module convention for every emitted file in a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    #[default]
    #[serde(rename = "commonjs", alias = "cjs")]
    CommonJs,
    #[serde(rename = "esm", alias = "module")]
    EsModule,
}

impl OutputMode {
    pub fn is_esm(self) -> bool {
        self == OutputMode::EsModule
    }

    /// File extension of emitted modules.
    pub fn extension(self) -> &'static str {
        match self {
            OutputMode::CommonJs => "js",
            OutputMode::EsModule => "mjs",
        }
    }

    /// File name of the bootstrap module.
    pub fn index_file(self) -> String {
        format!("index.{}", self.extension())
    }

    /// Value of the manifest `type` field.
    pub fn package_type(self) -> &'static str {
        match self {
            OutputMode::CommonJs => "commonjs",
            OutputMode::EsModule => "module",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::CommonJs => "commonjs",
            OutputMode::EsModule => "esm",
        })
    }
}

#[derive(Debug, Error)]
#[error("unknown output mode `{0}` (expected `commonjs` or `esm`)")]
pub struct ParseModeError(String);

impl FromStr for OutputMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commonjs" | "cjs" => Ok(OutputMode::CommonJs),
            "esm" | "module" => Ok(OutputMode::EsModule),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// What an import binds from the target module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `:default`, the module's default export.
    Default,
    /// `:*`, the whole module namespace.
    All,
    /// `:none`, load for side effects only.
    None,
    /// Any other symbol: a named export.
    Named(String),
}

impl Binding {
    pub fn from_name(name: &str) -> Self {
        match name {
            "default" => Binding::Default,
            "*" => Binding::All,
            "none" => Binding::None,
            other => Binding::Named(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Binding::Default => "default",
            Binding::All => "*",
            Binding::None => "none",
            Binding::Named(name) => name,
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static import requested by compiled source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub source: String,
    pub binding: Binding,
    /// Whether `source` starts with `./`. Recorded for later consumers;
    /// nothing in the build reads it yet.
    pub is_relative: bool,
}

impl ImportRecord {
    pub fn new(source: impl Into<String>, binding: Binding) -> Self {
        let source = source.into();
        let is_relative = source.starts_with("./");
        Self {
            source,
            binding,
            is_relative,
        }
    }
}

/// A third-party package declared by compiled source.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    pub metadata: BTreeMap<String, LiteralValue>,
}

impl DependencyRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Mutable state for exactly one build.
///
/// Created when a build starts and passed by `&mut` into every unit
/// compilation. The import and dependency ledgers are append-only.
#[derive(Debug, Default)]
pub struct CompileContext {
    output_mode: OutputMode,
    imports: Vec<ImportRecord>,
    dependencies: Vec<DependencyRecord>,
}

impl CompileContext {
    pub fn new(output_mode: OutputMode) -> Self {
        Self {
            output_mode,
            imports: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    pub fn dependencies(&self) -> &[DependencyRecord] {
        &self.dependencies
    }

    pub fn record_import(&mut self, record: ImportRecord) {
        self.imports.push(record);
    }

    pub fn record_dependency(&mut self, record: DependencyRecord) {
        self.dependencies.push(record);
    }

    /// Current length of the dependency ledger.
    ///
    /// Pair with [`CompileContext::dependencies_since`] to collect what a
    /// single unit declared.
    pub fn dependency_mark(&self) -> usize {
        self.dependencies.len()
    }

    /// Dependencies appended after `mark`, in declaration order.
    pub fn dependencies_since(&self, mark: usize) -> &[DependencyRecord] {
        self.dependencies.get(mark..).unwrap_or(&[])
    }
}
