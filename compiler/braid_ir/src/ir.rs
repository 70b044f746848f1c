//! The typed, lifted IR consumed by the backends.

use rustc_hash::FxHashMap;

use crate::arena::ExprArena;
use crate::ast::Expr;
use crate::scope::{Proc, Prog};
use crate::types::Type;
use crate::{ExprId, ScopeId};

/// Read-only input to a codegen run.
///
/// The front end guarantees: every node id used as a key in `type_table` is
/// present; every scope id referenced by a `Quote` or `Fun` node exists in
/// `procs`/`progs` (or in the active variant overlay); `main` is a Proc with
/// `id: None`; child scope ids form a DAG with edges from parent to nested
/// scope.
#[derive(Debug, Clone)]
pub struct CompilerIr {
    pub arena: ExprArena,
    pub procs: FxHashMap<ScopeId, Proc>,
    pub progs: FxHashMap<ScopeId, Prog>,
    /// The module entry Proc.
    pub main: Proc,
    /// Node id -> checked type.
    pub type_table: FxHashMap<ExprId, Type>,
    /// Use-site id -> definition-site id.
    pub defuse: FxHashMap<ExprId, ExprId>,
    /// Definition id -> extern symbol name. Absence means a local variable.
    pub externs: FxHashMap<ExprId, String>,
}

impl CompilerIr {
    pub fn expr(&self, id: ExprId) -> &Expr {
        self.arena.get(id)
    }

    /// Checked type of a node, if the front end recorded one.
    pub fn node_type(&self, id: ExprId) -> Option<&Type> {
        self.type_table.get(&id)
    }

    /// Definition site for a use site.
    pub fn def_site(&self, use_id: ExprId) -> Option<ExprId> {
        self.defuse.get(&use_id).copied()
    }

    /// Extern symbol name for a definition id, if it is an extern.
    pub fn extern_name(&self, def_id: ExprId) -> Option<&str> {
        self.externs.get(&def_id).map(String::as_str)
    }
}
