//! Closure ABI.
//!
//! Every callable value is a packed pair `{ fn_ptr, env_ptr }`. The
//! environment is a per-scope packed struct of the captured variables,
//! allocated on the caller's stack at pack time; the callee copies the
//! fields out into its own allocas on entry (see the scope compiler).
//!
//! Unpacking stores the pair into a stack slot and loads the two fields
//! back through GEPs. Going through memory keeps the aggregate addressable
//! without tracking the original value across blocks; mem2reg folds the
//! traffic away.

use braid_ir::ExprId;
use inkwell::values::{BasicValueEnum, FunctionValue, PointerValue};
use inkwell::AddressSpace;

use crate::context::Emitter;
use crate::error::{CodegenError, Result};
use crate::types::{closure_struct_type, lower};

impl<'ctx, 'ir> Emitter<'ctx, 'ir> {
    /// Packed struct of the lowered types of `free_ids`, in order.
    pub(crate) fn env_struct_type(
        &self,
        free_ids: &[ExprId],
    ) -> Result<inkwell::types::StructType<'ctx>> {
        let mut fields = Vec::with_capacity(free_ids.len());
        for &id in free_ids {
            fields.push(lower(self.context, self.node_type(id)?)?);
        }
        Ok(self.context.struct_type(&fields, true))
    }

    /// Build a closure value over `function`, capturing the current values
    /// of `free_ids` into a fresh stack-allocated environment.
    pub(crate) fn pack_closure(
        &mut self,
        function: FunctionValue<'ctx>,
        free_ids: &[ExprId],
    ) -> Result<BasicValueEnum<'ctx>> {
        let env_ty = self.env_struct_type(free_ids)?;

        let mut env_value = env_ty.get_undef();
        for (i, &id) in free_ids.iter().enumerate() {
            let name = self.def_name(id);
            let slot = self
                .named_values
                .get(&id)
                .copied()
                .ok_or_else(|| CodegenError::UnknownVariable { id, name: name.clone() })?;
            let field_ty = lower(self.context, self.node_type(id)?)?;
            let field = self.builder.build_load(field_ty, slot, &name)?;
            env_value = self
                .builder
                .build_insert_value(env_value, field, i as u32, "env")?
                .into_struct_value();
        }

        let env_slot = self.builder.build_alloca(env_ty, "env")?;
        self.builder.build_store(env_slot, env_value)?;

        let closure_ty = closure_struct_type(self.context);
        let fn_ptr = function.as_global_value().as_pointer_value();
        let closure = self
            .builder
            .build_insert_value(closure_ty.get_undef(), fn_ptr, 0, "closure")?
            .into_struct_value();
        let closure = self
            .builder
            .build_insert_value(closure, env_slot, 1, "closure")?
            .into_struct_value();
        Ok(closure.into())
    }

    /// Split a closure value into its function and environment pointers.
    pub(crate) fn unpack_closure(
        &mut self,
        closure: BasicValueEnum<'ctx>,
    ) -> Result<(PointerValue<'ctx>, PointerValue<'ctx>)> {
        let closure_ty = closure_struct_type(self.context);
        let ptr_ty = self.context.ptr_type(AddressSpace::default());

        let slot = self.builder.build_alloca(closure_ty, "closure")?;
        self.builder.build_store(slot, closure)?;

        let fn_field = self.builder.build_struct_gep(closure_ty, slot, 0, "fn")?;
        let fn_ptr = self
            .builder
            .build_load(ptr_ty, fn_field, "fn")?
            .into_pointer_value();
        let env_field = self.builder.build_struct_gep(closure_ty, slot, 1, "env")?;
        let env_ptr = self
            .builder
            .build_load(ptr_ty, env_field, "env")?
            .into_pointer_value();
        Ok((fn_ptr, env_ptr))
    }
}
