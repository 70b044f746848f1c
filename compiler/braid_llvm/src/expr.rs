//! Expression compilation.
//!
//! A syntax-directed walk over the typed AST. Each node kind maps to a
//! fixed instruction shape; anything the backend does not implement aborts
//! the pass with the feature named. Numeric decisions (integer vs float,
//! promotion sides) are driven by the checked source types, never by
//! inspecting the LLVM values.

use braid_ir::{BinaryOp, ExprId, ExprKind, Type, UnaryOp};
use inkwell::module::Linkage;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, IntValue};

use crate::context::Emitter;
use crate::error::{CodegenError, Result};
use crate::types::{callable_fn_type, lower};

impl<'ctx, 'ir> Emitter<'ctx, 'ir> {
    pub(crate) fn emit_expr(&mut self, id: ExprId) -> Result<BasicValueEnum<'ctx>> {
        let ir = self.ir;
        match &ir.expr(id).kind {
            ExprKind::Int(n) => Ok(self
                .context
                .i32_type()
                .const_int(*n as i64 as u64, true)
                .into()),

            ExprKind::Float(x) => Ok(self.context.f64_type().const_float(*x).into()),

            ExprKind::Str(s) => self.emit_str_literal(s),

            ExprKind::Seq { first, second } => {
                if self.has_effects(*first) {
                    self.emit_expr(*first)?;
                }
                self.emit_expr(*second)
            }

            ExprKind::Let { init, name } => {
                let value = self.emit_expr(*init)?;
                let slot = self
                    .named_values
                    .get(&id)
                    .copied()
                    .ok_or_else(|| CodegenError::UnknownVariable { id, name: name.clone() })?;
                self.builder.build_store(slot, value)?;
                Ok(value)
            }

            ExprKind::Assign { value, name } => {
                let assigned = self.emit_expr(*value)?;
                let def = self
                    .ir
                    .def_site(id)
                    .ok_or_else(|| CodegenError::UnknownVariable { id, name: name.clone() })?;
                if self.ir.extern_name(def).is_some() {
                    return Err(CodegenError::NotImplemented {
                        id,
                        feature: "extern assignment",
                    });
                }
                let slot = self
                    .named_values
                    .get(&def)
                    .copied()
                    .ok_or_else(|| CodegenError::UnknownVariable { id, name: name.clone() })?;
                self.builder.build_store(slot, assigned)?;
                Ok(assigned)
            }

            ExprKind::Lookup { name } => {
                let def = self
                    .ir
                    .def_site(id)
                    .ok_or_else(|| CodegenError::UnknownVariable { id, name: name.clone() })?;
                if self.ir.extern_name(def).is_some() {
                    return Err(CodegenError::NotImplemented {
                        id,
                        feature: "extern lookup",
                    });
                }
                let slot = self
                    .named_values
                    .get(&def)
                    .copied()
                    .ok_or_else(|| CodegenError::UnknownVariable { id, name: name.clone() })?;
                let ty = lower(self.context, self.node_type(id)?)?;
                Ok(self.builder.build_load(ty, slot, name)?)
            }

            ExprKind::Unary { op, operand } => self.emit_unary(*op, *operand),

            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(*op, *lhs, *rhs),

            ExprKind::Quote { prog } => self.emit_scope_reference(*prog, "prog"),

            ExprKind::Fun { proc } => self.emit_scope_reference(*proc, "proc"),

            ExprKind::Call { callee, args } => self.emit_call(*callee, args),

            ExprKind::Run { code } => self.emit_run(*code),

            ExprKind::Root { child } => {
                self.emit_runtime_prelude()?;
                self.emit_expr(*child)
            }

            ExprKind::Escape { .. } => Err(CodegenError::NotImplemented { id, feature: "escape" }),
            ExprKind::Extern { .. } => Err(CodegenError::NotImplemented {
                id,
                feature: "extern declaration",
            }),
            ExprKind::Persist { .. } => Err(CodegenError::NotImplemented { id, feature: "persist" }),
            ExprKind::If { .. } => Err(CodegenError::NotImplemented { id, feature: "if" }),
            ExprKind::While { .. } => Err(CodegenError::NotImplemented { id, feature: "while" }),
            ExprKind::MacroCall { .. } => Err(CodegenError::NotImplemented {
                id,
                feature: "macro call",
            }),
            ExprKind::Alloc { .. } => Err(CodegenError::NotImplemented { id, feature: "alloc" }),
            ExprKind::Tuple { .. } => Err(CodegenError::NotImplemented { id, feature: "tuple" }),
            ExprKind::TupleIndex { .. } => Err(CodegenError::NotImplemented {
                id,
                feature: "tuple index",
            }),
            ExprKind::TypeAlias { .. } => Err(CodegenError::NotImplemented {
                id,
                feature: "type alias",
            }),

            ExprKind::Param { .. } => Err(CodegenError::UnsupportedNode { id, tag: "param" }),
        }
    }

    /// Usefulness predicate for sequencing: pure expressions on the left of
    /// a `Seq` are elided.
    fn has_effects(&self, id: ExprId) -> bool {
        let ir = self.ir;
        match &ir.expr(id).kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Lookup { .. }
            | ExprKind::Fun { .. }
            | ExprKind::Quote { .. }
            | ExprKind::Param { .. } => false,
            ExprKind::Unary { operand, .. } => self.has_effects(*operand),
            ExprKind::Binary { lhs, rhs, .. } => self.has_effects(*lhs) || self.has_effects(*rhs),
            ExprKind::Seq { first, second } => {
                self.has_effects(*first) || self.has_effects(*second)
            }
            _ => true,
        }
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: ExprId) -> Result<BasicValueEnum<'ctx>> {
        match op {
            UnaryOp::Neg => {
                let ty = self.node_type(operand)?;
                match ty {
                    Type::Int => {
                        let value = self.emit_expr(operand)?.into_int_value();
                        Ok(self.builder.build_int_neg(value, "neg")?.into())
                    }
                    Type::Float => {
                        let value = self.emit_expr(operand)?.into_float_value();
                        Ok(self.builder.build_float_neg(value, "fneg")?.into())
                    }
                    other => Err(CodegenError::IncompatibleOperand {
                        op,
                        operand: other.clone(),
                    }),
                }
            }
            other => Err(CodegenError::UnknownUnaryOp(other)),
        }
    }

    fn emit_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    ) -> Result<BasicValueEnum<'ctx>> {
        if !matches!(op, BinaryOp::Add | BinaryOp::Mul) {
            return Err(CodegenError::UnknownBinaryOp(op));
        }
        let lhs_ty = self.node_type(lhs)?;
        let rhs_ty = self.node_type(rhs)?;
        match (lhs_ty, rhs_ty) {
            (Type::Int, Type::Int) => {
                let l = self.emit_expr(lhs)?.into_int_value();
                let r = self.emit_expr(rhs)?.into_int_value();
                let value: IntValue<'ctx> = if op == BinaryOp::Add {
                    self.builder.build_int_add(l, r, "iadd")?
                } else {
                    self.builder.build_int_mul(l, r, "imul")?
                };
                Ok(value.into())
            }
            (lhs_ty, rhs_ty) if lhs_ty.is_numeric() && rhs_ty.is_numeric() => {
                // Mixed numeric: promote whichever side is Int to double.
                let l = self.emit_numeric_as_float(lhs)?;
                let r = self.emit_numeric_as_float(rhs)?;
                let value: FloatValue<'ctx> = if op == BinaryOp::Add {
                    self.builder.build_float_add(l, r, "fadd")?
                } else {
                    self.builder.build_float_mul(l, r, "fmul")?
                };
                Ok(value.into())
            }
            (lhs_ty, rhs_ty) => Err(CodegenError::IncompatibleOperands {
                op,
                lhs: lhs_ty.clone(),
                rhs: rhs_ty.clone(),
            }),
        }
    }

    /// Emit a numeric operand, sign-extending an `Int` to double.
    fn emit_numeric_as_float(&mut self, id: ExprId) -> Result<FloatValue<'ctx>> {
        let is_int = matches!(self.node_type(id)?, Type::Int);
        let value = self.emit_expr(id)?;
        if is_int {
            Ok(self.builder.build_signed_int_to_float(
                value.into_int_value(),
                self.context.f64_type(),
                "promote",
            )?)
        } else {
            Ok(value.into_float_value())
        }
    }

    fn emit_call(&mut self, callee: ExprId, args: &[ExprId]) -> Result<BasicValueEnum<'ctx>> {
        let fn_ty = callable_fn_type(self.context, self.node_type(callee)?)?;
        let closure = self.emit_expr(callee)?;
        let (fn_ptr, env_ptr) = self.unpack_closure(closure)?;

        let mut call_args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len() + 1);
        for &arg in args {
            call_args.push(self.emit_expr(arg)?.into());
        }
        call_args.push(env_ptr.into());

        let site = self
            .builder
            .build_indirect_call(fn_ty, fn_ptr, &call_args, "call")?;
        match site.try_as_basic_value().left() {
            Some(value) => Ok(value),
            // Callable lowering rejects Void returns, so a valueless call
            // means the callee type never went through it.
            None => Err(CodegenError::UnsupportedType(Type::Void)),
        }
    }

    fn emit_run(&mut self, code: ExprId) -> Result<BasicValueEnum<'ctx>> {
        let fn_ty = callable_fn_type(self.context, self.node_type(code)?)?;
        let closure = self.emit_expr(code)?;
        let (fn_ptr, env_ptr) = self.unpack_closure(closure)?;

        let site = self
            .builder
            .build_indirect_call(fn_ty, fn_ptr, &[env_ptr.into()], "run")?;
        match site.try_as_basic_value().left() {
            Some(value) => Ok(value),
            None => Err(CodegenError::UnsupportedType(Type::Void)),
        }
    }

    /// Define a string literal as a private constant byte array. No runtime
    /// string operations exist, so the value is only ever its address.
    fn emit_str_literal(&mut self, text: &str) -> Result<BasicValueEnum<'ctx>> {
        let name = self.next_str_name();
        let i8_ty = self.context.i8_type();

        let mut bytes: Vec<_> = text
            .as_bytes()
            .iter()
            .map(|&b| i8_ty.const_int(u64::from(b), false))
            .collect();
        bytes.push(i8_ty.const_int(0, false));

        let global = self
            .module
            .add_global(i8_ty.array_type(bytes.len() as u32), None, &name);
        global.set_initializer(&i8_ty.const_array(&bytes));
        global.set_constant(true);
        global.set_linkage(Linkage::Private);
        Ok(global.as_pointer_value().into())
    }
}
