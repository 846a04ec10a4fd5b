//! Three-address IR over JVM bytecode
//!
//! One `ClassDef` per class, one `Body` per concrete method. Statements are
//! addressed by `StmtId` (method signature + offset into the body), which is
//! stable across every view built from the same class bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::signatures::{ClassType, FieldSignature, MethodSignature, Type};

/// Method-scoped register
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Local {
    pub name: Arc<str>,
    pub ty: Type,
}

impl Local {
    pub fn new(name: impl AsRef<str>, ty: Type) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            ty,
        }
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Literal operand
///
/// Floating point literals keep their raw bits so constants stay `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    String(Arc<str>),
    /// Class literal, internal name or descriptor as written in the constant pool
    Class(Arc<str>),
    Null,
    Int(i64),
    Long(i64),
    Float(u32),
    Double(u64),
}

impl Constant {
    pub fn string(text: impl AsRef<str>) -> Self {
        Constant::String(Arc::from(text.as_ref()))
    }

    pub fn class(name: impl AsRef<str>) -> Self {
        Constant::Class(Arc::from(name.as_ref()))
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Constant::Class(_))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::String(s) => write!(f, "{:?}", s),
            Constant::Class(c) => write!(f, "class \"{}\"", c),
            Constant::Null => f.write_str("null"),
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Long(v) => write!(f, "{}L", v),
            Constant::Float(bits) => write!(f, "{}F", f32::from_bits(*bits)),
            Constant::Double(bits) => write!(f, "{}", f64::from_bits(*bits)),
        }
    }
}

/// Local or literal operand
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Immediate {
    Local(Local),
    Constant(Constant),
}

impl Immediate {
    pub fn as_local(&self) -> Option<&Local> {
        match self {
            Immediate::Local(local) => Some(local),
            Immediate::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Immediate::Constant(constant) => Some(constant),
            Immediate::Local(_) => None,
        }
    }
}

impl From<Local> for Immediate {
    fn from(local: Local) -> Self {
        Immediate::Local(local)
    }
}

impl From<Constant> for Immediate {
    fn from(constant: Constant) -> Self {
        Immediate::Constant(constant)
    }
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Local(local) => write!(f, "{}", local),
            Immediate::Constant(constant) => write!(f, "{}", constant),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    Static,
    Special,
    Virtual,
    Interface,
    Dynamic,
}

impl InvokeKind {
    fn keyword(&self) -> &'static str {
        match self {
            InvokeKind::Static => "staticinvoke",
            InvokeKind::Special => "specialinvoke",
            InvokeKind::Virtual => "virtualinvoke",
            InvokeKind::Interface => "interfaceinvoke",
            InvokeKind::Dynamic => "dynamicinvoke",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    pub method: MethodSignature,
    /// Receiver, absent for static and dynamic invokes
    #[serde(default)]
    pub base: Option<Local>,
    #[serde(default)]
    pub args: Vec<Immediate>,
}

impl InvokeExpr {
    pub fn new_static(method: MethodSignature, args: Vec<Immediate>) -> Self {
        Self {
            kind: InvokeKind::Static,
            method,
            base: None,
            args,
        }
    }

    pub fn new_instance(
        kind: InvokeKind,
        method: MethodSignature,
        base: Local,
        args: Vec<Immediate>,
    ) -> Self {
        Self {
            kind,
            method,
            base: Some(base),
            args,
        }
    }

    pub fn arg(&self, index: usize) -> Option<&Immediate> {
        self.args.get(index)
    }
}

impl fmt::Display for InvokeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        f.write_str(" ")?;
        if let Some(base) = &self.base {
            write!(f, "{}.", base)?;
        }
        write!(f, "{}(", self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Immediate(Immediate),
    StaticField(FieldSignature),
    InstanceField { base: Local, field: FieldSignature },
    New(ClassType),
    Invoke(InvokeExpr),
    /// Any expression the analysis does not interpret (arithmetic, casts, ...)
    Opaque(Arc<str>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Immediate(imm) => write!(f, "{}", imm),
            Expr::StaticField(field) => write!(f, "{}", field),
            Expr::InstanceField { base, field } => write!(f, "{}.{}", base, field),
            Expr::New(ty) => write!(f, "new {}", ty),
            Expr::Invoke(invoke) => write!(f, "{}", invoke),
            Expr::Opaque(text) => f.write_str(text),
        }
    }
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Place {
    Local(Local),
    StaticField(FieldSignature),
    InstanceField { base: Local, field: FieldSignature },
    ArrayElement { base: Local },
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Local(local) => write!(f, "{}", local),
            Place::StaticField(field) => write!(f, "{}", field),
            Place::InstanceField { base, field } => write!(f, "{}.{}", base, field),
            Place::ArrayElement { base } => write!(f, "{}[]", base),
        }
    }
}

/// Source of an identity binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityRef {
    This,
    Parameter(usize),
    CaughtException,
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityRef::This => f.write_str("@this"),
            IdentityRef::Parameter(i) => write!(f, "@parameter{}", i),
            IdentityRef::CaughtException => f.write_str("@caughtexception"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Identity { local: Local, source: IdentityRef },
    Assign { place: Place, value: Expr },
    Invoke(InvokeExpr),
    Return(Immediate),
    ReturnVoid,
    Goto { target: u32 },
    If { operands: Vec<Immediate>, target: u32 },
    Switch { key: Immediate, targets: Vec<u32>, default: u32 },
    Throw(Immediate),
    Nop,
}

impl Stmt {
    /// Invoke expression carried by this statement, if any
    pub fn invoke_expr(&self) -> Option<&InvokeExpr> {
        match self {
            Stmt::Invoke(invoke) => Some(invoke),
            Stmt::Assign {
                value: Expr::Invoke(invoke),
                ..
            } => Some(invoke),
            _ => None,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Stmt::Return(_) | Stmt::ReturnVoid)
    }

    /// Local receiving the result of an invoke assignment
    pub fn result_local(&self) -> Option<&Local> {
        match self {
            Stmt::Assign {
                place: Place::Local(local),
                value: Expr::Invoke(_),
            } => Some(local),
            _ => None,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Identity { local, source } => write!(f, "{} := {}", local, source),
            Stmt::Assign { place, value } => write!(f, "{} = {}", place, value),
            Stmt::Invoke(invoke) => write!(f, "{}", invoke),
            Stmt::Return(imm) => write!(f, "return {}", imm),
            Stmt::ReturnVoid => f.write_str("return"),
            Stmt::Goto { target } => write!(f, "goto {}", target),
            Stmt::If { operands, target } => {
                f.write_str("if")?;
                for op in operands {
                    write!(f, " {}", op)?;
                }
                write!(f, " goto {}", target)
            }
            Stmt::Switch { key, .. } => write!(f, "switch({})", key),
            Stmt::Throw(imm) => write!(f, "throw {}", imm),
            Stmt::Nop => f.write_str("nop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub locals: Vec<Local>,
    pub stmts: Vec<Stmt>,
}

impl Body {
    pub fn new(locals: Vec<Local>, stmts: Vec<Stmt>) -> Self {
        Self { locals, stmts }
    }

    pub fn stmt(&self, offset: u32) -> Option<&Stmt> {
        self.stmts.get(offset as usize)
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn this_local(&self) -> Option<&Local> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Identity {
                local,
                source: IdentityRef::This,
            } => Some(local),
            _ => None,
        })
    }

    pub fn parameter_local(&self, index: usize) -> Option<&Local> {
        self.stmts.iter().find_map(|stmt| match stmt {
            Stmt::Identity {
                local,
                source: IdentityRef::Parameter(i),
            } if *i == index => Some(local),
            _ => None,
        })
    }

    /// Intraprocedural successors; out-of-range targets are dropped
    pub fn successors(&self, offset: u32) -> Vec<u32> {
        let len = self.stmts.len() as u32;
        let Some(stmt) = self.stmt(offset) else {
            return Vec::new();
        };
        let next = offset + 1;
        let mut succs = match stmt {
            Stmt::Return(_) | Stmt::ReturnVoid | Stmt::Throw(_) => Vec::new(),
            Stmt::Goto { target } => vec![*target],
            Stmt::If { target, .. } => vec![next, *target],
            Stmt::Switch {
                targets, default, ..
            } => {
                let mut all = targets.clone();
                all.push(*default);
                all
            }
            _ => vec![next],
        };
        succs.retain(|s| *s < len);
        succs.dedup();
        succs
    }

    /// Offsets of `return` statements
    pub fn exit_offsets(&self) -> Vec<u32> {
        self.stmts
            .iter()
            .enumerate()
            .filter(|(_, stmt)| stmt.is_return())
            .map(|(i, _)| i as u32)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub signature: MethodSignature,
    #[serde(default)]
    pub is_static: bool,
    /// Absent for abstract and native methods
    #[serde(default)]
    pub body: Option<Body>,
}

impl MethodDef {
    pub fn new(signature: MethodSignature, is_static: bool, body: Option<Body>) -> Self {
        Self {
            signature,
            is_static,
            body,
        }
    }

    pub fn is_concrete(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(rename = "name")]
    pub ty: ClassType,
    #[serde(default)]
    pub super_class: Option<ClassType>,
    #[serde(default)]
    pub interfaces: Vec<ClassType>,
    /// Enclosing class for inner (nested) classes
    #[serde(default)]
    pub outer_class: Option<ClassType>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn new(ty: ClassType) -> Self {
        Self {
            ty,
            super_class: None,
            interfaces: Vec::new(),
            outer_class: None,
            methods: Vec::new(),
        }
    }

    pub fn method(&self, signature: &MethodSignature) -> Option<&MethodDef> {
        self.methods.iter().find(|m| &m.signature == signature)
    }

    /// Method declared here with the same name and descriptor
    pub fn method_by_sub_signature(&self, signature: &MethodSignature) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.signature.same_sub_signature(signature))
    }

    pub fn static_initializer(&self) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.signature.is_static_initializer())
    }

    pub fn is_inner_class(&self) -> bool {
        self.outer_class.is_some()
    }
}

/// Stable statement identity: declaring method plus offset into its body
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId {
    pub method: MethodSignature,
    pub offset: u32,
}

impl StmtId {
    pub fn new(method: MethodSignature, offset: u32) -> Self {
        Self { method, offset }
    }

    pub fn with_offset(&self, offset: u32) -> Self {
        Self {
            method: self.method.clone(),
            offset,
        }
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.method, self.offset)
    }
}
