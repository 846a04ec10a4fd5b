//! Shared IR models
//!
//! Signatures identify program entities across views; the IR types describe
//! method bodies as produced by a class frontend.

pub mod ir;
pub mod signatures;

pub use ir::{
    Body, ClassDef, Constant, Expr, IdentityRef, Immediate, InvokeExpr, InvokeKind, Local,
    MethodDef, Place, Stmt, StmtId,
};
pub use signatures::{ClassType, FieldSignature, MethodSignature, PrimitiveType, Type};
