//! Lifted scopes: Procs, Progs, and specialization overlays.
//!
//! The front end lifts every function body and every quote out of the
//! expression tree into a flat scope table. A scope records everything the
//! backends need to emit a standalone function for it: its body, its value
//! parameters (Procs only), the variables it captures from enclosing scopes,
//! the locals it introduces, and the nested scopes that must be emitted
//! before its own body.

use rustc_hash::FxHashMap;

use crate::{ExprId, ScopeId};

/// A cross-stage persisted value. Recognized by the IR but not yet lowered
/// by the native backend; `owned_persist` on Progs participates in the
/// environment layout, a non-empty `persist` list aborts codegen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persist {
    /// Definition id of the persisted value.
    pub id: ExprId,
}

/// A first-class function.
#[derive(Debug, Clone, PartialEq)]
pub struct Proc {
    /// `None` for the module entry Proc, which is named `main`.
    pub id: Option<ScopeId>,
    pub body: ExprId,
    /// Ordered value-parameter definition ids.
    pub params: Vec<ExprId>,
    /// Ordered definition ids captured from enclosing scopes.
    pub free: Vec<ExprId>,
    /// Definition ids of locals introduced inside this scope.
    pub bound: Vec<ExprId>,
    pub persist: Vec<Persist>,
    /// Child scope ids, emitted before this scope's body.
    pub children: Vec<ScopeId>,
}

/// A quoted code block, lowered as a zero-argument closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Prog {
    pub id: ScopeId,
    pub body: ExprId,
    pub free: Vec<ExprId>,
    pub bound: Vec<ExprId>,
    pub persist: Vec<Persist>,
    /// Persisted values this quote owns; they lead the environment layout.
    pub owned_persist: Vec<Persist>,
    pub children: Vec<ScopeId>,
}

/// A borrowed view of either scope kind, exposing the structure the scope
/// compiler needs without caring which kind it has.
#[derive(Debug, Clone, Copy)]
pub enum ScopeRef<'a> {
    Proc(&'a Proc),
    Prog(&'a Prog),
}

impl<'a> ScopeRef<'a> {
    pub fn body(self) -> ExprId {
        match self {
            ScopeRef::Proc(p) => p.body,
            ScopeRef::Prog(p) => p.body,
        }
    }

    /// Value-parameter ids: the Proc's params, empty for a Prog.
    pub fn arg_ids(self) -> &'a [ExprId] {
        match self {
            ScopeRef::Proc(p) => &p.params,
            ScopeRef::Prog(_) => &[],
        }
    }

    /// Environment layout: `free` for a Proc, `owned_persist ++ free` for a
    /// Prog.
    pub fn free_ids(self) -> Vec<ExprId> {
        match self {
            ScopeRef::Proc(p) => p.free.clone(),
            ScopeRef::Prog(p) => p
                .owned_persist
                .iter()
                .map(|persist| persist.id)
                .chain(p.free.iter().copied())
                .collect(),
        }
    }

    pub fn bound(self) -> &'a [ExprId] {
        match self {
            ScopeRef::Proc(p) => &p.bound,
            ScopeRef::Prog(p) => &p.bound,
        }
    }

    pub fn persist(self) -> &'a [Persist] {
        match self {
            ScopeRef::Proc(p) => &p.persist,
            ScopeRef::Prog(p) => &p.persist,
        }
    }

    pub fn children(self) -> &'a [ScopeId] {
        match self {
            ScopeRef::Proc(p) => &p.children,
            ScopeRef::Prog(p) => &p.children,
        }
    }
}

/// A specialization overlay: replacement Proc/Prog definitions keyed by
/// scope id. At most one variant is active during a codegen run; it changes
/// which definition is materialized for a scope id but never the symbol name.
#[derive(Debug, Clone, Default)]
pub struct Variant {
    pub procs: FxHashMap<ScopeId, Proc>,
    pub progs: FxHashMap<ScopeId, Prog>,
}
