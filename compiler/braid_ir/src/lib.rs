//! Shared type and IR definitions for the Braid compiler.
//!
//! The front end (parser, type checker, scope lifting) produces a
//! [`CompilerIr`]; the backends consume it read-only. This crate holds only
//! the data model: the expression arena and node vocabulary, the source type
//! sum, lifted scopes (Procs and Progs), specialization overlays, and the
//! side tables (`type_table`, `defuse`, `externs`) that tie them together.

pub mod arena;
pub mod ast;
pub mod ir;
pub mod scope;
pub mod types;

mod expr_id;

pub use arena::ExprArena;
pub use ast::{BinaryOp, Expr, ExprKind, UnaryOp};
pub use expr_id::{ExprId, ScopeId};
pub use ir::CompilerIr;
pub use scope::{Persist, Proc, Prog, ScopeRef, Variant};
pub use types::Type;
