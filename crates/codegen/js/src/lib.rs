//! JavaScript back end for Weave.
//!
//! Expands host-interop special forms (`JS.import`, `JS.dynimport`,
//! `JS.npm_dependency`, `JS.export`) into JavaScript text and packages each
//! source file into a [`CompilationUnit`] for the build aggregator.

mod context;
pub mod forms;
mod unit;

pub use context::{
    Binding, CompileContext, DependencyRecord, ImportRecord, OutputMode, ParseModeError,
};
pub use forms::{FormError, JS_NAMESPACE, SpecialForm, SpecialFormRegistry, invoke_form, registry};
pub use unit::{
    CompilationUnit, Fragment, MacroInvocation, SourceMap, UnitError, UnitFlags, UnitSource,
    compile_unit, module_name,
};

/// Quote a string as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}
