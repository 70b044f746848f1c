//! Specialization resolution.
//!
//! A variant overlay can replace the definition materialized for a scope id.
//! Resolution is a pure lookup and never changes symbol names: a `Quote` or
//! `Fun` node still calls `prog<id>`/`proc<id>` no matter which definition
//! filled that symbol in.

use braid_ir::{ScopeId, ScopeRef};

use crate::context::Emitter;
use crate::error::{CodegenError, Result};

impl<'ctx, 'ir> Emitter<'ctx, 'ir> {
    /// Pick the definition for a scope id: variant Procs, then base Procs,
    /// then variant Progs, then base Progs.
    pub(crate) fn resolve_scope(&self, id: ScopeId) -> Result<ScopeRef<'ir>> {
        let ir = self.ir;
        if let Some(variant) = self.variant {
            if let Some(proc) = variant.procs.get(&id) {
                return Ok(ScopeRef::Proc(proc));
            }
        }
        if let Some(proc) = ir.procs.get(&id) {
            return Ok(ScopeRef::Proc(proc));
        }
        if let Some(variant) = self.variant {
            if let Some(prog) = variant.progs.get(&id) {
                return Ok(ScopeRef::Prog(prog));
            }
        }
        if let Some(prog) = ir.progs.get(&id) {
            return Ok(ScopeRef::Prog(prog));
        }
        Err(CodegenError::UnknownScope(id))
    }
}
