//! Emitter state.
//!
//! The [`Emitter`] owns everything mutable about a codegen run: the module
//! under construction, the single live instruction builder, and the map from
//! definition ids to the stack slots holding their values in the scope
//! currently being emitted.
//!
//! Builder and variable-map handling follow a strict stack discipline: on
//! entry to a scope both are swapped out (fresh positioned builder, empty
//! map) and on exit the scope-local builder is dropped and the saved pair
//! reinstated, whether the scope body emitted cleanly or failed partway
//! through. [`Emitter::with_scope_state`] is the only way to perform the
//! swap, so no exit path can forget the restore.

use std::mem;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::PointerValue;
use rustc_hash::FxHashMap;

use braid_ir::{CompilerIr, ExprId, ExprKind, Type, Variant};

use crate::error::{CodegenError, Result};

/// Mutable state of one codegen run.
pub struct Emitter<'ctx, 'ir> {
    pub(crate) context: &'ctx Context,
    pub(crate) module: Module<'ctx>,
    /// The current instruction builder. Exclusively owns its insertion
    /// point; exactly one is live outside of [`Self::with_scope_state`]
    /// swaps.
    pub(crate) builder: Builder<'ctx>,
    /// Definition id -> stack slot for the scope being emitted.
    pub(crate) named_values: FxHashMap<ExprId, PointerValue<'ctx>>,
    /// Active specialization overlay, if any.
    pub(crate) variant: Option<&'ir Variant>,
    /// Read-only input IR.
    pub(crate) ir: &'ir CompilerIr,
    pub(crate) prelude_emitted: bool,
    str_counter: u32,
}

impl<'ctx, 'ir> Emitter<'ctx, 'ir> {
    pub fn new(
        context: &'ctx Context,
        module: Module<'ctx>,
        ir: &'ir CompilerIr,
        variant: Option<&'ir Variant>,
    ) -> Self {
        Self {
            context,
            module,
            builder: context.create_builder(),
            named_values: FxHashMap::default(),
            variant,
            ir,
            prelude_emitted: false,
            str_counter: 0,
        }
    }

    /// Tear down the run, releasing the top-level builder and handing the
    /// finished module to the caller.
    pub fn finish(self) -> Module<'ctx> {
        self.module
    }

    /// Checked type of a node; a miss is a front-end contract violation.
    pub(crate) fn node_type(&self, id: ExprId) -> Result<&'ir Type> {
        let ir = self.ir;
        ir.node_type(id).ok_or(CodegenError::MissingType(id))
    }

    /// Human-readable name for a definition id, used to label allocas.
    pub(crate) fn def_name(&self, id: ExprId) -> String {
        let ir = self.ir;
        match &ir.expr(id).kind {
            ExprKind::Let { name, .. }
            | ExprKind::Param { name }
            | ExprKind::Assign { name, .. }
            | ExprKind::Lookup { name } => name.clone(),
            _ => format!("v{id}"),
        }
    }

    /// Fresh name for a string-literal global.
    pub(crate) fn next_str_name(&mut self) -> String {
        let n = self.str_counter;
        self.str_counter += 1;
        format!("str.{n}")
    }

    /// Run `f` with a fresh builder positioned at `entry` and an empty
    /// variable map, restoring the caller's builder and map afterwards.
    ///
    /// The scope-local builder is dropped here on every path; the expression
    /// compiler can fail partway through a body without corrupting the
    /// enclosing scope's emission state.
    pub(crate) fn with_scope_state<R>(
        &mut self,
        entry: BasicBlock<'ctx>,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let fresh = self.context.create_builder();
        fresh.position_at_end(entry);
        let saved_builder = mem::replace(&mut self.builder, fresh);
        let saved_values = mem::take(&mut self.named_values);

        let result = f(self);

        let scope_builder = mem::replace(&mut self.builder, saved_builder);
        drop(scope_builder);
        self.named_values = saved_values;

        result
    }
}
