//! `JS.export`.

use rhizome_weave_ir::Arguments;

use super::FormError;
use crate::CompileContext;

/// Reserved for exporting values to the host module system. Expands to
/// nothing for now.
pub(super) fn compile_export(
    _ctx: &mut CompileContext,
    _args: Arguments,
) -> Result<String, FormError> {
    Ok(String::new())
}
