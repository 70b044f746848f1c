//! Driver: one IR in, one LLVM module out.

use braid_ir::{CompilerIr, Variant};
use inkwell::context::Context;
use inkwell::module::Module;
use tracing::debug;

use crate::context::Emitter;
use crate::error::Result;
use crate::target;

/// Name of the module produced by every codegen run.
pub const MODULE_NAME: &str = "braidprogram";

/// Compile a typed IR to an LLVM module for the host target.
///
/// Creates the module, stamps it with the host triple and data layout, and
/// emits the entry Proc; the runtime prelude and every reachable scope
/// follow from there. On error the partial module is discarded with the
/// emitter.
pub fn compile<'ctx>(
    context: &'ctx Context,
    ir: &CompilerIr,
    variant: Option<&Variant>,
) -> Result<Module<'ctx>> {
    let module = context.create_module(MODULE_NAME);
    target::configure_module(&module)?;

    let mut emitter = Emitter::new(context, module, ir, variant);
    emitter.emit_main()?;
    debug!("codegen finished");
    Ok(emitter.finish())
}
