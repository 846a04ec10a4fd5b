//! Test program fixtures
//!
//! Each fixture is a small class (or class pair) exercising one resolution
//! strategy. Method names are stable so tests can look calls up by method.

use dynload_ir::shared::models::{ClassDef, FieldSignature, MethodSignature, Type};
use dynload_ir::ClassPool;

use super::builders::*;

/// Service implementation most fixtures load
pub const SVC: &str = "a/Impl";

pub fn run_signature(class: &str) -> MethodSignature {
    MethodSignature::new(class, "run", vec![], Type::Void)
}

pub fn install_signature(class: &str) -> MethodSignature {
    MethodSignature::new(class, "install", vec![Type::class()], Type::Void)
}

/// `run()` loads a class literal
pub fn literal_class(name: &str, svc: &str) -> ClassDef {
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "run", vec![])
                .stmt(load(class_lit(svc)))
                .build(),
        )
        .build()
}

/// `run()` loads `Class.forName(target)`
pub fn for_name_class(name: &str, target: &str) -> ClassDef {
    let s = string_local("s");
    let c = class_local("c");
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "run", vec![])
                .stmt(assign_imm(&s, str_lit(target)))
                .stmt(for_name(&c, var(&s)))
                .stmt(load(var(&c)))
                .build(),
        )
        .build()
}

/// `run()` builds the class name from `parts` with a `StringBuilder`
pub fn builder_class(name: &str, parts: &[String], init_with_first: bool) -> ClassDef {
    let sb = builder_local("sb");
    let s = string_local("s");
    let c = class_local("c");

    let (initial, rest) = match parts.split_first() {
        Some((first, rest)) if init_with_first => (Some(str_lit(first)), rest),
        _ => (None, parts),
    };
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "run", vec![])
                .stmts(new_builder(&sb, initial))
                .stmts(rest.iter().map(|part| append(&sb, str_lit(part))))
                .stmt(builder_to_string(&s, &sb))
                .stmt(for_name(&c, var(&s)))
                .stmt(load(var(&c)))
                .build(),
        )
        .build()
}

/// `install(Class)` loads its parameter; `use{i}()` passes `impls[i]`
pub fn fan_out_class(name: &str, impls: &[&str]) -> ClassDef {
    let install = install_signature(name);
    let mut class = ClassBuilder::new(name).method(
        MethodBuilder::new_static(name, "install", vec![Type::class()])
            .stmt(load(var(&param(&install, 0))))
            .build(),
    );
    for (i, svc) in impls.iter().enumerate() {
        class = class.method(
            MethodBuilder::new_static(name, &format!("use{}", i), vec![])
                .stmt(call_static(&install, vec![class_lit(svc)]))
                .build(),
        );
    }
    class.build()
}

/// `top()` → `relay(Class)` → `install(Class)`, literal passed at the top
pub fn chain_class(name: &str, svc: &str) -> ClassDef {
    let install = install_signature(name);
    let relay = MethodSignature::new(name, "relay", vec![Type::class()], Type::Void);
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "install", vec![Type::class()])
                .stmt(load(var(&param(&install, 0))))
                .build(),
        )
        .method(
            MethodBuilder::new_static(name, "relay", vec![Type::class()])
                .stmt(call_static(&install, vec![var(&param(&relay, 0))]))
                .build(),
        )
        .method(
            MethodBuilder::new_static(name, "top", vec![])
                .stmt(call_static(&relay, vec![class_lit(svc)]))
                .build(),
        )
        .build()
}

/// `f(Class)` and `g(Class)` call each other; nobody supplies a constant
pub fn cycle_class(name: &str) -> ClassDef {
    let f = MethodSignature::new(name, "f", vec![Type::class()], Type::Void);
    let g = MethodSignature::new(name, "g", vec![Type::class()], Type::Void);
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "f", vec![Type::class()])
                .stmt(call_static(&g, vec![var(&param(&f, 0))]))
                .stmt(load(var(&param(&f, 0))))
                .build(),
        )
        .method(
            // p0 := @parameter0; if goto 3; f(p0); return
            MethodBuilder::new_static(name, "g", vec![Type::class()])
                .stmt(branch(3))
                .stmt(call_static(&f, vec![var(&param(&g, 0))]))
                .build(),
        )
        .build()
}

pub fn service_field(class: &str) -> FieldSignature {
    static_field(class, "SERVICE", Type::class())
}

/// `<clinit>` stores a class literal in a static field `run()` loads
pub fn static_field_class(name: &str, svc: &str) -> ClassDef {
    let field = service_field(name);
    let c = class_local("c");
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "<clinit>", vec![])
                .stmt(put_static(&field, class_lit(svc)))
                .build(),
        )
        .method(
            MethodBuilder::new_static(name, "run", vec![])
                .stmt(get_static(&c, &field))
                .stmt(load(var(&c)))
                .build(),
        )
        .build()
}

pub fn inner_name(outer: &str) -> String {
    format!("{}$Inner", outer)
}

pub fn start_signature(class: &str) -> MethodSignature {
    MethodSignature::new(class, "start", vec![], Type::Void)
}

/// Outer class constructs `Inner(svc)`; `Inner.start()` loads the field
///
/// Returns `[outer, inner]`.
pub fn outer_inner_classes(outer: &str, svc: &str) -> Vec<ClassDef> {
    let inner = inner_name(outer);
    let field = FieldSignature::new(inner.as_str(), "svc", Type::class());
    let ctor = MethodSignature::new(inner.as_str(), "<init>", vec![Type::class()], Type::Void);
    let this = this_local(&inner);
    let c = class_local("c");
    let i = local("i", Type::object(&inner));

    let inner_class = ClassBuilder::new(&inner)
        .outer(outer)
        .method(
            MethodBuilder::new_instance(&inner, "<init>", vec![Type::class()])
                .stmt(put_field(&this, &field, var(&param(&ctor, 0))))
                .build(),
        )
        .method(
            MethodBuilder::new_instance(&inner, "start", vec![])
                .stmt(get_field(&c, &this, &field))
                .stmt(load(var(&c)))
                .build(),
        )
        .build();

    let outer_class = ClassBuilder::new(outer)
        .method(
            MethodBuilder::new_static(outer, "setup", vec![])
                .stmt(new_object(&i, &inner))
                .stmt(construct(&i, &inner, vec![Type::class()], vec![class_lit(svc)]))
                .build(),
        )
        .build();

    vec![outer_class, inner_class]
}

/// `run(Class)` loads its parameter and has no callers
pub fn unknown_param_class(name: &str) -> ClassDef {
    let run = MethodSignature::new(name, "run", vec![Type::class()], Type::Void);
    ClassBuilder::new(name)
        .method(
            MethodBuilder::new_static(name, "run", vec![Type::class()])
                .stmt(load(var(&param(&run, 0))))
                .build(),
        )
        .build()
}

/// Extends a library class and calls an inherited method before loading
pub fn broken_hierarchy_class(name: &str) -> ClassDef {
    let helper = MethodSignature::new(name, "helper", vec![], Type::Void);
    ClassBuilder::new(name)
        .super_class("lib.Base")
        .method(
            MethodBuilder::new_instance(name, "run", vec![])
                .stmt(call_virtual(&this_local(name), &helper, vec![]))
                .stmt(load(var(&class_local("c"))))
                .build(),
        )
        .build()
}

pub fn pool(classes: impl IntoIterator<Item = ClassDef>) -> ClassPool {
    ClassPool::from_classes(classes)
}

/// JSON document accepted by `ClassPool::from_json_*`
pub fn classes_json(classes: &[ClassDef]) -> String {
    serde_json::to_string_pretty(classes).expect("class definitions serialize")
}
