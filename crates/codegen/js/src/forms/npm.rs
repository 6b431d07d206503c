//! `JS.npm_dependency`.

use rhizome_weave_ir::Arguments;
use tracing::debug;

use super::{FormError, expect_arity, string_arg};
use crate::{CompileContext, DependencyRecord};

const DEFAULT_VERSION: &str = "latest";

/// `JS.npm_dependency(name, version = "latest", **metadata)`
///
/// Compile-time only: the dependency lands in the ledger and the call site
/// evaluates to `null`.
pub(super) fn compile_npm_dependency(
    ctx: &mut CompileContext,
    args: Arguments,
) -> Result<String, FormError> {
    const FORM: &str = "npm_dependency";
    expect_arity(FORM, &args, 1, 2)?;

    let name = string_arg(FORM, &args.positional[0], "package name")?;
    let version = match args.get(1) {
        Some(value) => string_arg(FORM, value, "version")?,
        None => DEFAULT_VERSION.to_string(),
    };
    debug!("dependency declared: {}@{}", name, version);

    ctx.record_dependency(DependencyRecord {
        name,
        version,
        metadata: args.keyword,
    });
    Ok("null".to_string())
}
