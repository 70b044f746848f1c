//! Codegen error taxonomy.
//!
//! Every error aborts the current codegen pass; the partially built module is
//! discarded by the caller. The IR is assumed well-typed, so these signal
//! either a front-end bug or a feature the backend does not implement yet.
//! No source formatting is carried beyond the kind and the offending node or
//! scope id.

use std::fmt;

use braid_ir::{BinaryOp, ExprId, ScopeId, Type, UnaryOp};
use inkwell::builder::BuilderError;

use crate::target::TargetError;

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Reasons a codegen pass aborts.
#[derive(Debug)]
pub enum CodegenError {
    /// A type outside `{Int, Float, Fun, Code}` reached lowering.
    UnsupportedType(Type),
    /// An AST node kind that must never reach the expression compiler.
    UnsupportedNode { id: ExprId, tag: &'static str },
    /// Feature recognized but unimplemented.
    NotImplemented { id: ExprId, feature: &'static str },
    /// A variable use with no stack slot in scope.
    UnknownVariable { id: ExprId, name: String },
    /// A scope id missing from both the variant overlay and the base IR.
    UnknownScope(ScopeId),
    /// Unary operator applied to a non-numeric operand.
    IncompatibleOperand { op: UnaryOp, operand: Type },
    /// Binary operator applied to a non-numeric operand pair.
    IncompatibleOperands { op: BinaryOp, lhs: Type, rhs: Type },
    /// Unary operator symbol outside the implemented subset.
    UnknownUnaryOp(UnaryOp),
    /// Binary operator symbol outside the implemented subset.
    UnknownBinaryOp(BinaryOp),
    /// A node id with no `type_table` entry; the front end broke its
    /// contract.
    MissingType(ExprId),
    /// An LLVM instruction builder failure.
    Builder(BuilderError),
    /// Target initialization or machine creation failed in the driver.
    Target(TargetError),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType(ty) => {
                write!(f, "type '{ty}' is not supported by the native backend")
            }
            Self::UnsupportedNode { id, tag } => {
                write!(f, "node {id} ({tag}) cannot appear in an expression position")
            }
            Self::NotImplemented { id, feature } => {
                write!(f, "{feature} is not implemented by the native backend (node {id})")
            }
            Self::UnknownVariable { id, name } => {
                write!(f, "no storage for variable '{name}' (node {id})")
            }
            Self::UnknownScope(id) => write!(f, "unknown scope id {id}"),
            Self::IncompatibleOperand { op, operand } => {
                write!(f, "unary '{op}' applied to operand of type '{operand}'")
            }
            Self::IncompatibleOperands { op, lhs, rhs } => {
                write!(f, "binary '{op}' applied to operands of types '{lhs}' and '{rhs}'")
            }
            Self::UnknownUnaryOp(op) => write!(f, "unknown unary operator '{op}'"),
            Self::UnknownBinaryOp(op) => write!(f, "unknown binary operator '{op}'"),
            Self::MissingType(id) => write!(f, "node {id} has no entry in the type table"),
            Self::Builder(err) => write!(f, "LLVM builder error: {err}"),
            Self::Target(err) => write!(f, "target setup failed: {err}"),
        }
    }
}

impl std::error::Error for CodegenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Builder(err) => Some(err),
            Self::Target(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BuilderError> for CodegenError {
    fn from(err: BuilderError) -> Self {
        Self::Builder(err)
    }
}

impl From<TargetError> for CodegenError {
    fn from(err: TargetError) -> Self {
        Self::Target(err)
    }
}
