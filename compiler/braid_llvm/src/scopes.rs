//! Scope compilation.
//!
//! Every Proc and Prog becomes one top-level LLVM function with a
//! deterministic name: `main` for the entry Proc, `proc<id>` for other
//! Procs, `prog<id>` for Progs. A Proc with N parameters gets arity N+1; a
//! Prog gets arity 1. The trailing parameter is always the opaque
//! environment pointer, present even when unused.
//!
//! Child scopes are emitted before the parent's body, so a `Quote` or `Fun`
//! node inside the body always finds its target already in the module.

use braid_ir::{ScopeId, ScopeRef};
use inkwell::types::{BasicMetadataTypeEnum, BasicType};
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;
use tracing::debug;

use crate::context::Emitter;
use crate::error::{CodegenError, Result};
use crate::types::lower;

impl<'ctx, 'ir> Emitter<'ctx, 'ir> {
    /// Emit the module entry Proc.
    pub(crate) fn emit_main(&mut self) -> Result<FunctionValue<'ctx>> {
        let ir = self.ir;
        self.emit_scope_function(ScopeRef::Proc(&ir.main), "main")
    }

    /// Emit the scope with the given id (or return it if already emitted).
    pub(crate) fn emit_scope(&mut self, id: ScopeId) -> Result<FunctionValue<'ctx>> {
        let scope = self.resolve_scope(id)?;
        let name = match scope {
            ScopeRef::Proc(_) => format!("proc{id}"),
            ScopeRef::Prog(_) => format!("prog{id}"),
        };
        self.emit_scope_function(scope, &name)
    }

    fn emit_scope_function(
        &mut self,
        scope: ScopeRef<'ir>,
        name: &str,
    ) -> Result<FunctionValue<'ctx>> {
        if let Some(existing) = self.module.get_function(name) {
            return Ok(existing);
        }
        debug!(scope = name, "emitting scope function");

        if !scope.persist().is_empty() {
            return Err(CodegenError::NotImplemented {
                id: scope.body(),
                feature: "persist",
            });
        }

        // Children first, so this body's quote/fun references resolve.
        for &child in scope.children() {
            self.emit_scope(child)?;
        }

        let arg_ids = scope.arg_ids();
        let free_ids = scope.free_ids();

        let env_ty = self.context.ptr_type(AddressSpace::default());
        let mut param_tys: Vec<BasicMetadataTypeEnum<'ctx>> = Vec::with_capacity(arg_ids.len() + 1);
        for &arg in arg_ids {
            param_tys.push(lower(self.context, self.node_type(arg)?)?.into());
        }
        param_tys.push(env_ty.into());
        let ret_ty = lower(self.context, self.node_type(scope.body())?)?;
        let fn_ty = ret_ty.fn_type(&param_tys, false);
        let function = self.module.add_function(name, fn_ty, None);

        let entry = self.context.append_basic_block(function, "entry");
        self.with_scope_state(entry, |this| {
            // Parameters: spill each into a named stack slot.
            for (i, &arg) in arg_ids.iter().enumerate() {
                if let Some(param) = function.get_nth_param(i as u32) {
                    let var_name = this.def_name(arg);
                    param.set_name(&var_name);
                    let ty = lower(this.context, this.node_type(arg)?)?;
                    let slot = this.builder.build_alloca(ty, &var_name)?;
                    this.builder.build_store(slot, param)?;
                    this.named_values.insert(arg, slot);
                }
            }

            // Environment: copy each captured field into a local slot.
            if let Some(env_param) = function.get_nth_param(arg_ids.len() as u32) {
                env_param.set_name("env");
                let env_ptr = env_param.into_pointer_value();
                let env_struct = this.env_struct_type(&free_ids)?;
                for (i, &id) in free_ids.iter().enumerate() {
                    let var_name = this.def_name(id);
                    let ty = lower(this.context, this.node_type(id)?)?;
                    let field =
                        this.builder
                            .build_struct_gep(env_struct, env_ptr, i as u32, &var_name)?;
                    let value = this.builder.build_load(ty, field, &var_name)?;
                    let slot = this.builder.build_alloca(ty, &var_name)?;
                    this.builder.build_store(slot, value)?;
                    this.named_values.insert(id, slot);
                }
            }

            // Locals: slots only; the `Let` node stores on evaluation.
            for &id in scope.bound() {
                if this.named_values.contains_key(&id) {
                    continue;
                }
                let ty = lower(this.context, this.node_type(id)?)?;
                let var_name = this.def_name(id);
                let slot = this.builder.build_alloca(ty, &var_name)?;
                this.named_values.insert(id, slot);
            }

            let ret = this.emit_expr(scope.body())?;
            this.builder.build_return(Some(&ret))?;
            Ok(())
        })?;

        Ok(function)
    }

    /// Look up the already-emitted function for a `Quote`/`Fun` reference and
    /// pack a closure over it with the scope's environment layout.
    pub(crate) fn emit_scope_reference(
        &mut self,
        scope_id: ScopeId,
        symbol_prefix: &str,
    ) -> Result<inkwell::values::BasicValueEnum<'ctx>> {
        let scope = self.resolve_scope(scope_id)?;
        let symbol = format!("{symbol_prefix}{scope_id}");
        let function = self
            .module
            .get_function(&symbol)
            .ok_or(CodegenError::UnknownScope(scope_id))?;
        let free_ids = scope.free_ids();
        self.pack_closure(function, &free_ids)
    }
}
