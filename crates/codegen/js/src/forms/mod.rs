//! Special form registry.
//!
//! A special form is a namespace-qualified call (`JS.import(...)`) whose
//! arguments are decoded at compile time and which expands directly to
//! JavaScript text, bypassing ordinary code generation.

mod export;
mod import;
mod npm;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use rhizome_weave_ir::{Arguments, DecodeError, LiteralValue, Node, decode_arguments};
use thiserror::Error;
use tracing::debug;

use crate::{CompileContext, MacroInvocation};

/// Namespace marker for host-interop forms.
pub const JS_NAMESPACE: &str = "JS";

/// Errors that can occur while expanding a special form.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unknown special form: {namespace}.{selector}")]
    UnknownForm { namespace: String, selector: String },

    #[error("invalid argument count for {form}: expected {expected}, got {got}")]
    InvalidArgCount {
        form: String,
        expected: String,
        got: usize,
    },

    #[error("invalid argument for {form}: {message}")]
    InvalidArgument { form: String, message: String },

    #[error("unexpected keyword argument for {form}: {keyword}")]
    UnexpectedKeyword { form: String, keyword: String },
}

/// Handler producing the generated code for one call site.
pub type FormHandler = fn(&mut CompileContext, Arguments) -> Result<String, FormError>;

/// A registered special form.
#[derive(Debug, Clone)]
pub struct SpecialForm {
    pub namespace: &'static str,
    pub selector: &'static str,
    pub description: &'static str,
    /// Lazy forms do not decode their arguments and receive none.
    pub lazy: bool,
    handler: FormHandler,
}

impl SpecialForm {
    /// Compile one call site of this form.
    pub fn compile(&self, ctx: &mut CompileContext, args: &[Node]) -> Result<String, FormError> {
        if self.lazy {
            (self.handler)(ctx, Arguments::default())
        } else {
            invoke_form(ctx, args, self.handler)
        }
    }
}

/// Decode the call-site arguments and hand them to `handler`.
///
/// The handler's result is the whole compiled result for the call site.
pub fn invoke_form(
    ctx: &mut CompileContext,
    args: &[Node],
    handler: FormHandler,
) -> Result<String, FormError> {
    let arguments = decode_arguments(args)?;
    handler(ctx, arguments)
}

/// Lookup table from `(namespace, selector)` to a special form.
#[derive(Debug, Default)]
pub struct SpecialFormRegistry {
    forms: BTreeMap<(&'static str, &'static str), SpecialForm>,
}

static REGISTRY: LazyLock<SpecialFormRegistry> = LazyLock::new(SpecialFormRegistry::builtin);

/// The process-wide registry holding the builtin forms.
pub fn registry() -> &'static SpecialFormRegistry {
    &REGISTRY
}

impl SpecialFormRegistry {
    fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(SpecialForm {
            namespace: JS_NAMESPACE,
            selector: "import",
            description: "Static import through the runtime import table",
            lazy: false,
            handler: import::compile_import,
        });
        registry.register(SpecialForm {
            namespace: JS_NAMESPACE,
            selector: "dynimport",
            description: "Dynamic import (promise in esm mode, require in commonjs mode)",
            lazy: false,
            handler: import::compile_dynimport,
        });
        registry.register(SpecialForm {
            namespace: JS_NAMESPACE,
            selector: "npm_dependency",
            description: "Declare a package dependency for the build manifest",
            lazy: false,
            handler: npm::compile_npm_dependency,
        });
        registry.register(SpecialForm {
            namespace: JS_NAMESPACE,
            selector: "export",
            description: "Reserved; compiles to nothing",
            lazy: true,
            handler: export::compile_export,
        });
        registry
    }

    fn register(&mut self, form: SpecialForm) {
        self.forms.insert((form.namespace, form.selector), form);
    }

    /// Exact lookup. Unregistered pairs return `None`.
    pub fn lookup(&self, namespace: &str, selector: &str) -> Option<&SpecialForm> {
        self.forms
            .values()
            .find(|form| form.namespace == namespace && form.selector == selector)
    }

    /// All forms, ordered by namespace then selector.
    pub fn forms(&self) -> impl Iterator<Item = &SpecialForm> {
        self.forms.values()
    }

    /// Expand an invocation, or `None` if no form is registered for it.
    pub fn expand(
        &self,
        ctx: &mut CompileContext,
        invocation: &MacroInvocation,
    ) -> Option<Result<String, FormError>> {
        let form = self.lookup(&invocation.namespace, &invocation.selector)?;
        debug!(
            "expanding {}.{} ({} args)",
            form.namespace,
            form.selector,
            invocation.args.len()
        );
        Some(form.compile(ctx, &invocation.args))
    }
}

// ----------------------------------------------------------------------------
// Argument helpers shared by the form handlers
// ----------------------------------------------------------------------------

fn expect_arity(form: &str, args: &Arguments, min: usize, max: usize) -> Result<(), FormError> {
    let got = args.positional.len();
    if (min..=max).contains(&got) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{}..={}", min, max)
    };
    Err(FormError::InvalidArgCount {
        form: form.to_string(),
        expected,
        got,
    })
}

fn expect_no_keywords(form: &str, args: &Arguments) -> Result<(), FormError> {
    match args.keyword.keys().next() {
        Some(keyword) => Err(FormError::UnexpectedKeyword {
            form: form.to_string(),
            keyword: keyword.clone(),
        }),
        None => Ok(()),
    }
}

fn string_arg(form: &str, value: &LiteralValue, what: &str) -> Result<String, FormError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FormError::InvalidArgument {
            form: form.to_string(),
            message: format!("{} must be a string, got {}", what, value.type_name()),
        })
}
