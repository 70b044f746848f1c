//! Source type lowering.
//!
//! The backend supports four source types:
//!
//! | Source        | LLVM lowering                                     |
//! |---------------|---------------------------------------------------|
//! | `Int`         | `i32`                                             |
//! | `Float`       | `double`                                          |
//! | `Fun(ps, r)`  | packed `<{ ptr, ptr }>` (fn pointer, environment) |
//! | `Code(inner)` | packed `<{ ptr, ptr }>`                           |
//!
//! Under opaque pointers the two closure fields carry no element type; the
//! function-pointer element type lives in the [`FunctionType`] computed by
//! [`callable_fn_type`] and is supplied at each indirect call site. `Fun` and
//! `Code` lower identically so both are callable through the same unpack
//! routine.

use braid_ir::Type;
use inkwell::context::Context;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType};
use inkwell::AddressSpace;

use crate::error::{CodegenError, Result};

/// Lower a source type to its LLVM value type.
pub(crate) fn lower<'ctx>(context: &'ctx Context, ty: &Type) -> Result<BasicTypeEnum<'ctx>> {
    match ty {
        Type::Int => Ok(context.i32_type().into()),
        Type::Float => Ok(context.f64_type().into()),
        Type::Fun { .. } | Type::Code(_) => Ok(closure_struct_type(context).into()),
        other => Err(CodegenError::UnsupportedType(other.clone())),
    }
}

/// The uniform closure value: packed `{ fn_ptr, env_ptr }`.
pub(crate) fn closure_struct_type(context: &Context) -> StructType<'_> {
    let ptr = context.ptr_type(AddressSpace::default());
    context.struct_type(&[ptr.into(), ptr.into()], true)
}

/// Function type behind a `Fun` or `Code` closure.
///
/// A `Fun(params, ret)` callee has type `(lower(params...), ptr) -> lower(ret)`;
/// a `Code(inner)` callee has type `(ptr) -> lower(inner)`. The trailing
/// pointer is always the opaque environment.
pub(crate) fn callable_fn_type<'ctx>(
    context: &'ctx Context,
    ty: &Type,
) -> Result<FunctionType<'ctx>> {
    let env = context.ptr_type(AddressSpace::default());
    match ty {
        Type::Fun { params, ret } => {
            let mut args: Vec<BasicMetadataTypeEnum<'ctx>> = Vec::with_capacity(params.len() + 1);
            for param in params {
                args.push(lower(context, param)?.into());
            }
            args.push(env.into());
            Ok(lower(context, ret)?.fn_type(&args, false))
        }
        Type::Code(inner) => Ok(lower(context, inner)?.fn_type(&[env.into()], false)),
        other => Err(CodegenError::UnsupportedType(other.clone())),
    }
}
