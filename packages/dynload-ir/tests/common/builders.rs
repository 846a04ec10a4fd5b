//! Builders for IR test programs
//!
//! Methods get Jimple-style identity statements up front: `this := @this`
//! for instance methods, then `p{i} := @parameter{i}` for every parameter.

use dynload_ir::shared::constants::jvm;
use dynload_ir::shared::models::{
    Body, ClassDef, ClassType, Constant, Expr, FieldSignature, IdentityRef, Immediate, InvokeExpr,
    InvokeKind, Local, MethodDef, MethodSignature, Place, Stmt, Type,
};

// ═══════════════════════════════════════════════════════════════════════════
// Operands
// ═══════════════════════════════════════════════════════════════════════════

pub fn local(name: &str, ty: Type) -> Local {
    Local::new(name, ty)
}

pub fn class_local(name: &str) -> Local {
    Local::new(name, Type::class())
}

pub fn string_local(name: &str) -> Local {
    Local::new(name, Type::string())
}

pub fn builder_local(name: &str) -> Local {
    Local::new(name, Type::object(jvm::JAVA_LANG_STRING_BUILDER))
}

pub fn class_lit(name: &str) -> Immediate {
    Immediate::Constant(Constant::class(name))
}

pub fn str_lit(text: &str) -> Immediate {
    Immediate::Constant(Constant::string(text))
}

pub fn var(local: &Local) -> Immediate {
    Immediate::Local(local.clone())
}

pub fn static_field(class: &str, name: &str, ty: Type) -> FieldSignature {
    FieldSignature::new(class, name, ty)
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

pub fn load_signature() -> MethodSignature {
    MethodSignature::new(
        jvm::JAVA_UTIL_SERVICE_LOADER,
        jvm::LOAD,
        vec![Type::class()],
        Type::object(jvm::JAVA_UTIL_SERVICE_LOADER),
    )
}

/// `staticinvoke ServiceLoader.load(arg)`
pub fn load(arg: Immediate) -> Stmt {
    Stmt::Invoke(InvokeExpr::new_static(load_signature(), vec![arg]))
}

/// `staticinvoke ServiceLoader.load(arg, loader)`
pub fn load_with_loader(arg: Immediate, loader: &Local) -> Stmt {
    let sig = MethodSignature::new(
        jvm::JAVA_UTIL_SERVICE_LOADER,
        jvm::LOAD,
        vec![Type::class(), Type::object("java.lang.ClassLoader")],
        Type::object(jvm::JAVA_UTIL_SERVICE_LOADER),
    );
    Stmt::Invoke(InvokeExpr::new_static(sig, vec![arg, var(loader)]))
}

pub fn assign(target: &Local, value: Expr) -> Stmt {
    Stmt::Assign {
        place: Place::Local(target.clone()),
        value,
    }
}

pub fn assign_imm(target: &Local, value: Immediate) -> Stmt {
    assign(target, Expr::Immediate(value))
}

/// `target = staticinvoke Class.forName(arg)`
pub fn for_name(target: &Local, arg: Immediate) -> Stmt {
    let sig = MethodSignature::new(
        jvm::JAVA_LANG_CLASS,
        jvm::FOR_NAME,
        vec![Type::string()],
        Type::class(),
    );
    assign(target, Expr::Invoke(InvokeExpr::new_static(sig, vec![arg])))
}

/// `target = virtualinvoke base.getCanonicalName()`
pub fn canonical_name(target: &Local, base: &Local) -> Stmt {
    let sig = MethodSignature::new(jvm::JAVA_LANG_CLASS, jvm::CANONICAL_NAME, vec![], Type::string());
    assign(
        target,
        Expr::Invoke(InvokeExpr::new_instance(InvokeKind::Virtual, sig, base.clone(), vec![])),
    )
}

/// `target = virtualinvoke base.concat(arg)`
pub fn concat(target: &Local, base: &Local, arg: Immediate) -> Stmt {
    let sig = MethodSignature::new(
        jvm::JAVA_LANG_STRING,
        jvm::CONCAT,
        vec![Type::string()],
        Type::string(),
    );
    assign(
        target,
        Expr::Invoke(InvokeExpr::new_instance(InvokeKind::Virtual, sig, base.clone(), vec![arg])),
    )
}

pub fn new_object(target: &Local, class: &str) -> Stmt {
    assign(target, Expr::New(ClassType::new(class)))
}

/// `specialinvoke base.<init>(args)` on `class`
pub fn construct(base: &Local, class: &str, params: Vec<Type>, args: Vec<Immediate>) -> Stmt {
    let sig = MethodSignature::new(class, jvm::INIT, params, Type::Void);
    Stmt::Invoke(InvokeExpr::new_instance(
        InvokeKind::Special,
        sig,
        base.clone(),
        args,
    ))
}

/// `new StringBuilder` followed by its constructor
pub fn new_builder(sb: &Local, initial: Option<Immediate>) -> Vec<Stmt> {
    let (params, args) = match initial {
        Some(arg) => (vec![Type::string()], vec![arg]),
        None => (vec![], vec![]),
    };
    vec![
        new_object(sb, jvm::JAVA_LANG_STRING_BUILDER),
        construct(sb, jvm::JAVA_LANG_STRING_BUILDER, params, args),
    ]
}

/// `virtualinvoke sb.append(arg)`, result discarded
pub fn append(sb: &Local, arg: Immediate) -> Stmt {
    let sig = MethodSignature::new(
        jvm::JAVA_LANG_STRING_BUILDER,
        jvm::APPEND,
        vec![Type::string()],
        Type::object(jvm::JAVA_LANG_STRING_BUILDER),
    );
    Stmt::Invoke(InvokeExpr::new_instance(
        InvokeKind::Virtual,
        sig,
        sb.clone(),
        vec![arg],
    ))
}

/// `target = virtualinvoke sb.toString()`
pub fn builder_to_string(target: &Local, sb: &Local) -> Stmt {
    let sig = MethodSignature::new(
        jvm::JAVA_LANG_STRING_BUILDER,
        jvm::TO_STRING,
        vec![],
        Type::string(),
    );
    assign(
        target,
        Expr::Invoke(InvokeExpr::new_instance(InvokeKind::Virtual, sig, sb.clone(), vec![])),
    )
}

pub fn call_static(target: &MethodSignature, args: Vec<Immediate>) -> Stmt {
    Stmt::Invoke(InvokeExpr::new_static(target.clone(), args))
}

pub fn call_virtual(base: &Local, target: &MethodSignature, args: Vec<Immediate>) -> Stmt {
    Stmt::Invoke(InvokeExpr::new_instance(
        InvokeKind::Virtual,
        target.clone(),
        base.clone(),
        args,
    ))
}

pub fn get_static(target: &Local, field: &FieldSignature) -> Stmt {
    assign(target, Expr::StaticField(field.clone()))
}

pub fn put_static(field: &FieldSignature, value: Immediate) -> Stmt {
    Stmt::Assign {
        place: Place::StaticField(field.clone()),
        value: Expr::Immediate(value),
    }
}

pub fn get_field(target: &Local, base: &Local, field: &FieldSignature) -> Stmt {
    assign(
        target,
        Expr::InstanceField {
            base: base.clone(),
            field: field.clone(),
        },
    )
}

pub fn put_field(base: &Local, field: &FieldSignature, value: Immediate) -> Stmt {
    Stmt::Assign {
        place: Place::InstanceField {
            base: base.clone(),
            field: field.clone(),
        },
        value: Expr::Immediate(value),
    }
}

/// Two-way branch on an opaque condition
pub fn branch(target: u32) -> Stmt {
    Stmt::If {
        operands: vec![],
        target,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Methods and classes
// ═══════════════════════════════════════════════════════════════════════════

/// Builder for a concrete method
pub struct MethodBuilder {
    signature: MethodSignature,
    is_static: bool,
    stmts: Vec<Stmt>,
}

impl MethodBuilder {
    pub fn new_static(class: &str, name: &str, params: Vec<Type>) -> Self {
        let signature = MethodSignature::new(class, name, params, Type::Void);
        let stmts = param_identities(&signature);
        Self {
            signature,
            is_static: true,
            stmts,
        }
    }

    pub fn new_instance(class: &str, name: &str, params: Vec<Type>) -> Self {
        let signature = MethodSignature::new(class, name, params, Type::Void);
        let mut stmts = vec![Stmt::Identity {
            local: this_local(class),
            source: IdentityRef::This,
        }];
        stmts.extend(param_identities(&signature));
        Self {
            signature,
            is_static: false,
            stmts,
        }
    }

    /// Builder: set the return type
    pub fn returns(mut self, ret: Type) -> Self {
        self.signature.ret = ret;
        self
    }

    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.stmts.push(stmt);
        self
    }

    pub fn stmts(mut self, stmts: impl IntoIterator<Item = Stmt>) -> Self {
        self.stmts.extend(stmts);
        self
    }

    /// Offset the next statement will get
    pub fn next_offset(&self) -> u32 {
        self.stmts.len() as u32
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Appends `return` unless the body already ends in one
    pub fn build(mut self) -> MethodDef {
        if !self.stmts.last().is_some_and(Stmt::is_return) {
            self.stmts.push(Stmt::ReturnVoid);
        }
        MethodDef::new(
            self.signature,
            self.is_static,
            Some(Body::new(vec![], self.stmts)),
        )
    }
}

pub fn this_local(class: &str) -> Local {
    Local::new("this", Type::object(class))
}

/// Local bound to parameter `index` by `MethodBuilder`
pub fn param(signature: &MethodSignature, index: usize) -> Local {
    Local::new(format!("p{}", index), signature.params[index].clone())
}

fn param_identities(signature: &MethodSignature) -> Vec<Stmt> {
    (0..signature.param_count())
        .map(|i| Stmt::Identity {
            local: param(signature, i),
            source: IdentityRef::Parameter(i),
        })
        .collect()
}

/// Builder for a class definition
pub struct ClassBuilder {
    def: ClassDef,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            def: ClassDef::new(ClassType::new(name)),
        }
    }

    pub fn super_class(mut self, name: &str) -> Self {
        self.def.super_class = Some(ClassType::new(name));
        self
    }

    pub fn outer(mut self, name: &str) -> Self {
        self.def.outer_class = Some(ClassType::new(name));
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.def.methods.push(method);
        self
    }

    pub fn build(self) -> ClassDef {
        self.def
    }
}
