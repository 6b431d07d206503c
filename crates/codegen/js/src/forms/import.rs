//! `JS.import` and `JS.dynimport`.

use rhizome_weave_ir::{Arguments, LiteralValue};

use super::{FormError, expect_arity, expect_no_keywords, string_arg};
use crate::{Binding, CompileContext, ImportRecord, OutputMode, js_string};

/// Runtime table that static imports are resolved through.
pub(crate) const IMPORT_TABLE: &str = "Weave.imports";

/// `JS.import(from, binding = :default)`
///
/// Records the import and looks it up in the runtime import table under
/// `"<from>/<binding>"`. The table is filled in by the runtime, so the
/// output does not depend on the output mode.
pub(super) fn compile_import(
    ctx: &mut CompileContext,
    args: Arguments,
) -> Result<String, FormError> {
    let (from, binding) = source_and_binding("import", &args)?;
    let key = format!("{}/{}", from, binding);
    ctx.record_import(ImportRecord::new(from, binding));
    Ok(format!("{}[{}]", IMPORT_TABLE, js_string(&key)))
}

/// `JS.dynimport(from, binding = :default)`
///
/// In esm mode the result is a promise and is not awaited here; callers
/// must await it themselves. In commonjs mode the module is required
/// synchronously.
pub(super) fn compile_dynimport(
    ctx: &mut CompileContext,
    args: Arguments,
) -> Result<String, FormError> {
    let (from, binding) = source_and_binding("dynimport", &args)?;
    let module = js_string(&from);

    let code = match ctx.output_mode() {
        OutputMode::EsModule => match &binding {
            Binding::Default => format!("import({}).then(_mod => _mod.default)", module),
            Binding::All => format!("import({})", module),
            Binding::None => format!("import({}).then(() => null)", module),
            Binding::Named(name) => {
                format!("import({}).then(_mod => _mod[{}])", module, js_string(name))
            }
        },
        OutputMode::CommonJs => match &binding {
            Binding::Default | Binding::All => format!("require({})", module),
            Binding::None => format!("(require({}), null)", module),
            Binding::Named(name) => format!("require({})[{}]", module, js_string(name)),
        },
    };
    Ok(code)
}

fn source_and_binding(form: &str, args: &Arguments) -> Result<(String, Binding), FormError> {
    expect_arity(form, args, 1, 2)?;
    expect_no_keywords(form, args)?;

    let from = string_arg(form, &args.positional[0], "module source")?;
    let binding = match args.get(1) {
        None => Binding::Default,
        Some(value) => binding_arg(form, value)?,
    };
    Ok((from, binding))
}

fn binding_arg(form: &str, value: &LiteralValue) -> Result<Binding, FormError> {
    value
        .as_name()
        .map(Binding::from_name)
        .ok_or_else(|| FormError::InvalidArgument {
            form: form.to_string(),
            message: format!(
                "binding must be a symbol or string, got {}",
                value.type_name()
            ),
        })
}
