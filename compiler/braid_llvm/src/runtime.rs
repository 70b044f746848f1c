//! Runtime prelude.
//!
//! The generated module calls into a fixed WebGL runtime supplied by the
//! linker. For each runtime function the prelude adds the bare declaration
//! with its real C signature, then defines a `<name>_wrapper` whose signature
//! appends a trailing environment pointer. The wrapper forwards the leading
//! arguments unchanged and ignores the environment, so closures and extern
//! calls are indistinguishable at a call site: everything callable is
//! `(args..., env)`.

use inkwell::module::Linkage;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};
use inkwell::values::BasicMetadataValueEnum;
use inkwell::AddressSpace;
use tracing::debug;

use crate::context::Emitter;
use crate::error::Result;

/// The C-level type vocabulary of the runtime ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RtType {
    I32,
    Ptr,
    Void,
}

/// One extern runtime function.
pub(crate) struct RuntimeFn {
    pub(crate) name: &'static str,
    pub(crate) ret: RtType,
    pub(crate) params: &'static [RtType],
}

/// The runtime surface the backend declares. The linker supplies the
/// definitions.
pub(crate) const RUNTIME_EXTERNS: &[RuntimeFn] = &[
    RuntimeFn { name: "mesh_indices", ret: RtType::I32, params: &[RtType::Ptr] },
    RuntimeFn { name: "mesh_positions", ret: RtType::I32, params: &[RtType::Ptr] },
    RuntimeFn { name: "mesh_normals", ret: RtType::I32, params: &[RtType::Ptr] },
    RuntimeFn { name: "get_shader", ret: RtType::I32, params: &[RtType::Ptr, RtType::Ptr] },
    RuntimeFn { name: "draw_mesh", ret: RtType::Void, params: &[RtType::I32, RtType::I32] },
    RuntimeFn { name: "print_mesh", ret: RtType::Void, params: &[RtType::Ptr] },
    RuntimeFn { name: "gl_buffer", ret: RtType::I32, params: &[RtType::I32, RtType::Ptr, RtType::Ptr] },
    RuntimeFn { name: "detect_error", ret: RtType::Void, params: &[] },
    RuntimeFn { name: "load_obj", ret: RtType::Ptr, params: &[RtType::Ptr, RtType::Ptr] },
    RuntimeFn { name: "create_window", ret: RtType::Ptr, params: &[] },
];

impl<'ctx, 'ir> Emitter<'ctx, 'ir> {
    fn rt_basic_type(&self, ty: RtType) -> Option<BasicTypeEnum<'ctx>> {
        match ty {
            RtType::I32 => Some(self.context.i32_type().into()),
            RtType::Ptr => Some(self.context.ptr_type(AddressSpace::default()).into()),
            RtType::Void => None,
        }
    }

    fn rt_fn_type(&self, ret: RtType, params: &[BasicMetadataTypeEnum<'ctx>]) -> FunctionType<'ctx> {
        match self.rt_basic_type(ret) {
            Some(basic) => basic.fn_type(params, false),
            None => self.context.void_type().fn_type(params, false),
        }
    }

    /// Declare every runtime extern and define its wrapper. Idempotent per
    /// run; the `Root` node triggers it exactly once.
    pub(crate) fn emit_runtime_prelude(&mut self) -> Result<()> {
        if self.prelude_emitted {
            return Ok(());
        }
        self.prelude_emitted = true;
        debug!(externs = RUNTIME_EXTERNS.len(), "emitting runtime prelude");

        let env = self.context.ptr_type(AddressSpace::default());
        for rt in RUNTIME_EXTERNS {
            let params: Vec<BasicMetadataTypeEnum<'ctx>> = rt
                .params
                .iter()
                .filter_map(|&p| self.rt_basic_type(p))
                .map(Into::into)
                .collect();
            let decl_ty = self.rt_fn_type(rt.ret, &params);
            let decl = self
                .module
                .add_function(rt.name, decl_ty, Some(Linkage::External));

            let mut wrapper_params = params.clone();
            wrapper_params.push(env.into());
            let wrapper_ty = self.rt_fn_type(rt.ret, &wrapper_params);
            let wrapper =
                self.module
                    .add_function(&format!("{}_wrapper", rt.name), wrapper_ty, None);
            if let Some(env_param) = wrapper.get_nth_param(rt.params.len() as u32) {
                env_param.set_name("env");
            }

            // The wrapper body uses its own builder; the insertion point of
            // whichever scope is being emitted stays untouched.
            let entry = self.context.append_basic_block(wrapper, "entry");
            let builder = self.context.create_builder();
            builder.position_at_end(entry);

            let forwarded: Vec<BasicMetadataValueEnum<'ctx>> = wrapper
                .get_param_iter()
                .take(rt.params.len())
                .map(Into::into)
                .collect();
            let call = builder.build_call(decl, &forwarded, "fwd")?;
            match call.try_as_basic_value().left() {
                Some(value) => builder.build_return(Some(&value))?,
                None => builder.build_return(None)?,
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_table_matches_the_abi() {
        assert_eq!(RUNTIME_EXTERNS.len(), 10);

        let mut names: Vec<&str> = RUNTIME_EXTERNS.iter().map(|rt| rt.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);

        let draw = RUNTIME_EXTERNS
            .iter()
            .find(|rt| rt.name == "draw_mesh")
            .unwrap();
        assert_eq!(draw.ret, RtType::Void);
        assert_eq!(draw.params, &[RtType::I32, RtType::I32]);

        let window = RUNTIME_EXTERNS
            .iter()
            .find(|rt| rt.name == "create_window")
            .unwrap();
        assert!(window.params.is_empty());
        assert_eq!(window.ret, RtType::Ptr);
    }
}
