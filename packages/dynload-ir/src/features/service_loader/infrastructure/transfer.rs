//! Statement transfer function over `ValueMap`
//!
//! The analysis interprets a closed set of library operations itself
//! (`RecognizedOp`). The ICFG never steps into them; every other invoke
//! either has in-view callees or yields `Unknown`.

use crate::features::program_view::ProgramView;
use crate::features::service_loader::domain::{AbstractValue, ValueHolder, ValueMap};
use crate::shared::constants::jvm;
use crate::shared::models::{
    ClassType, Expr, Immediate, InvokeExpr, InvokeKind, Local, MethodSignature, Place, Stmt,
};

/// Library operations with built-in semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognizedOp {
    /// `Class.forName(String, ..)`
    ForName,
    /// `Class.getCanonicalName()`
    CanonicalName,
    /// `Class.getSimpleName()`
    SimpleName,
    /// `StringBuilder.<init>` / `StringBuffer.<init>`
    BuilderInit,
    /// `StringBuilder.append(x)`
    BuilderAppend,
    /// `StringBuilder.toString()`
    BuilderToString,
    /// `String.concat(String)`
    StringConcat,
}

impl RecognizedOp {
    pub fn classify(invoke: &InvokeExpr) -> Option<Self> {
        let method = &invoke.method;
        let class = &method.class;
        let name = &*method.name;
        let arity = method.param_count();

        if class.is(jvm::JAVA_LANG_CLASS) {
            return match name {
                jvm::FOR_NAME if invoke.kind == InvokeKind::Static && arity >= 1 => {
                    Some(RecognizedOp::ForName)
                }
                jvm::CANONICAL_NAME if arity == 0 => Some(RecognizedOp::CanonicalName),
                jvm::SIMPLE_NAME if arity == 0 => Some(RecognizedOp::SimpleName),
                _ => None,
            };
        }
        if is_string_builder(class) {
            return match name {
                jvm::INIT => Some(RecognizedOp::BuilderInit),
                jvm::APPEND if arity == 1 => Some(RecognizedOp::BuilderAppend),
                jvm::TO_STRING if arity == 0 => Some(RecognizedOp::BuilderToString),
                _ => None,
            };
        }
        if class.is(jvm::JAVA_LANG_STRING) && name == jvm::CONCAT && arity == 1 {
            return Some(RecognizedOp::StringConcat);
        }
        None
    }
}

fn is_string_builder(class: &ClassType) -> bool {
    class.is(jvm::JAVA_LANG_STRING_BUILDER) || class.is(jvm::JAVA_LANG_STRING_BUFFER)
}

/// Effect of an invoke: its result plus an optional receiver update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeEffect {
    pub result: AbstractValue,
    pub receiver: Option<(Local, AbstractValue)>,
}

/// Transfer function for the statements of one method
pub struct StatementVisitor<'a> {
    method: &'a MethodSignature,
    view: &'a ProgramView,
}

impl<'a> StatementVisitor<'a> {
    pub fn new(method: &'a MethodSignature, view: &'a ProgramView) -> Self {
        Self { method, view }
    }

    /// Map holding after `stmt`
    pub fn apply(&self, input: &ValueMap, stmt: &Stmt) -> ValueMap {
        let mut out = input.clone();
        match stmt {
            Stmt::Assign { place, value } => {
                let value = match value {
                    Expr::Invoke(invoke) => self.apply_effect(&mut out, input, invoke),
                    other => self.eval(input, other),
                };
                self.write(&mut out, place, value);
            }
            Stmt::Invoke(invoke) => {
                self.apply_effect(&mut out, input, invoke);
            }
            // identity bindings keep whatever the call flow supplied
            _ => {}
        }
        out
    }

    fn apply_effect(
        &self,
        out: &mut ValueMap,
        input: &ValueMap,
        invoke: &InvokeExpr,
    ) -> AbstractValue {
        let effect = self.invoke(input, invoke);
        if let Some((base, value)) = effect.receiver {
            out.set_local(self.method, &base, value);
        }
        if RecognizedOp::classify(invoke).is_none() {
            // the callee is not followed here, so it may have changed them
            for (_, arg) in self.mutable_arguments(input, invoke) {
                out.set_local(self.method, arg, AbstractValue::Unknown);
            }
        }
        effect.result
    }

    /// Argument locals a callee can change in place, with their positions
    ///
    /// String builders and tracked objects; strings and class constants are
    /// immutable.
    pub fn mutable_arguments<'i>(
        &self,
        map: &ValueMap,
        invoke: &'i InvokeExpr,
    ) -> Vec<(usize, &'i Local)> {
        invoke
            .args
            .iter()
            .enumerate()
            .filter_map(|(index, arg)| match arg {
                Immediate::Local(local)
                    if local.ty.class_type().is_some_and(is_string_builder)
                        || matches!(
                            map.get_local(self.method, local),
                            AbstractValue::ObjectRef { .. }
                        ) =>
                {
                    Some((index, local))
                }
                _ => None,
            })
            .collect()
    }

    pub fn value_of(&self, map: &ValueMap, imm: &Immediate) -> AbstractValue {
        match imm {
            Immediate::Local(local) => map.get_local(self.method, local),
            Immediate::Constant(constant) => AbstractValue::from_constant(constant),
        }
    }

    /// Value of a non-invoke right-hand side
    pub fn eval(&self, map: &ValueMap, expr: &Expr) -> AbstractValue {
        match expr {
            Expr::Immediate(imm) => self.value_of(map, imm),
            Expr::StaticField(field) => map.get_static(field),
            Expr::InstanceField { base, field } => map.get_local(self.method, base).field(field),
            Expr::New(ty) if is_string_builder(ty) => AbstractValue::Unknown,
            Expr::New(ty) if self.view.contains(ty) => AbstractValue::object(ty.clone()),
            Expr::Invoke(invoke) => self.invoke(map, invoke).result,
            Expr::New(_) | Expr::Opaque(_) => AbstractValue::Unknown,
        }
    }

    /// Effect of an invoke under `map`
    ///
    /// Anything but a recognized operation yields `Unknown` and leaves the
    /// receiver alone.
    pub fn invoke(&self, map: &ValueMap, invoke: &InvokeExpr) -> InvokeEffect {
        let Some(op) = RecognizedOp::classify(invoke) else {
            return InvokeEffect::default();
        };
        let base = || {
            invoke
                .base
                .as_ref()
                .map(|b| map.get_local(self.method, b))
                .unwrap_or_default()
        };
        let arg = |i: usize| {
            invoke
                .arg(i)
                .map(|a| self.value_of(map, a))
                .unwrap_or_default()
        };

        match op {
            RecognizedOp::ForName => InvokeEffect {
                result: arg(0)
                    .as_string()
                    .map(AbstractValue::class)
                    .unwrap_or_default(),
                receiver: None,
            },
            RecognizedOp::CanonicalName => InvokeEffect {
                result: base().canonical_name(),
                receiver: None,
            },
            RecognizedOp::SimpleName => InvokeEffect {
                result: base().simple_name(),
                receiver: None,
            },
            RecognizedOp::BuilderInit => {
                let initial = match invoke.method.params.first() {
                    None => AbstractValue::string(""),
                    Some(ty) if ty.class_type().is_none() => AbstractValue::string(""),
                    Some(_) => match arg(0) {
                        value @ AbstractValue::StringConst(_) => value,
                        _ => AbstractValue::Unknown,
                    },
                };
                InvokeEffect {
                    result: AbstractValue::Unknown,
                    receiver: invoke.base.clone().map(|b| (b, initial)),
                }
            }
            RecognizedOp::BuilderAppend => {
                let joined = base().concat(&arg(0));
                InvokeEffect {
                    result: joined.clone(),
                    receiver: invoke.base.clone().map(|b| (b, joined)),
                }
            }
            RecognizedOp::BuilderToString => InvokeEffect {
                result: match base() {
                    value @ AbstractValue::StringConst(_) => value,
                    _ => AbstractValue::Unknown,
                },
                receiver: None,
            },
            RecognizedOp::StringConcat => InvokeEffect {
                result: base().concat(&arg(0)),
                receiver: None,
            },
        }
    }

    /// Store `value` into `place`
    ///
    /// Field writes only land on tracked objects; array stores are dropped.
    pub fn write(&self, map: &mut ValueMap, place: &Place, value: AbstractValue) {
        match place {
            Place::Local(local) => map.set_local(self.method, local, value),
            Place::StaticField(field) => map.set(ValueHolder::static_field(field), value),
            Place::InstanceField { base, field } => {
                let object = map.get_local(self.method, base);
                if matches!(object, AbstractValue::ObjectRef { .. }) {
                    map.set_local(self.method, base, object.with_field(field.clone(), value));
                }
            }
            Place::ArrayElement { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ClassDef, Constant, FieldSignature, Type};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn m() -> MethodSignature {
        MethodSignature::new("a.A", "run", vec![], Type::Void)
    }

    fn view() -> ProgramView {
        ProgramView::new(vec![
            Arc::new(ClassDef::new(ClassType::new("a.A"))),
            Arc::new(ClassDef::new(ClassType::new("a.Holder"))),
        ])
    }

    fn sb() -> Local {
        Local::new("sb", Type::object(jvm::JAVA_LANG_STRING_BUILDER))
    }

    fn builder_call(name: &str, params: Vec<Type>, ret: Type, args: Vec<Immediate>) -> InvokeExpr {
        InvokeExpr::new_instance(
            if name == jvm::INIT {
                InvokeKind::Special
            } else {
                InvokeKind::Virtual
            },
            MethodSignature::new(jvm::JAVA_LANG_STRING_BUILDER, name, params, ret),
            sb(),
            args,
        )
    }

    fn append(text: &str) -> Stmt {
        Stmt::Assign {
            place: Place::Local(sb()),
            value: Expr::Invoke(builder_call(
                jvm::APPEND,
                vec![Type::string()],
                Type::object(jvm::JAVA_LANG_STRING_BUILDER),
                vec![Immediate::Constant(Constant::string(text))],
            )),
        }
    }

    #[test]
    fn test_string_builder_folds_appends() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        let s = Local::new("s", Type::string());
        let stmts = vec![
            Stmt::Assign {
                place: Place::Local(sb()),
                value: Expr::New(ClassType::new(jvm::JAVA_LANG_STRING_BUILDER)),
            },
            Stmt::Invoke(builder_call(jvm::INIT, vec![], Type::Void, vec![])),
            append("a.b."),
            append("Impl"),
            Stmt::Assign {
                place: Place::Local(s.clone()),
                value: Expr::Invoke(builder_call(jvm::TO_STRING, vec![], Type::string(), vec![])),
            },
        ];
        let out = stmts
            .iter()
            .fold(ValueMap::new(), |map, stmt| visitor.apply(&map, stmt));
        assert_eq!(out.get_local(&m(), &s), AbstractValue::string("a.b.Impl"));
    }

    #[test]
    fn test_append_of_unknown_absorbs() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        let unknown = Local::new("u", Type::string());
        let mut map = ValueMap::new();
        map.set_local(&m(), &sb(), AbstractValue::string("x"));
        let stmt = Stmt::Invoke(builder_call(
            jvm::APPEND,
            vec![Type::string()],
            Type::object(jvm::JAVA_LANG_STRING_BUILDER),
            vec![Immediate::Local(unknown)],
        ));
        let out = visitor.apply(&map, &stmt);
        assert_eq!(out.get_local(&m(), &sb()), AbstractValue::Unknown);
    }

    #[test]
    fn test_for_name_and_canonical_name() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        let c = Local::new("c", Type::class());
        let name = Local::new("n", Type::string());
        let for_name = Stmt::Assign {
            place: Place::Local(c.clone()),
            value: Expr::Invoke(InvokeExpr::new_static(
                MethodSignature::new(
                    jvm::JAVA_LANG_CLASS,
                    jvm::FOR_NAME,
                    vec![Type::string()],
                    Type::class(),
                ),
                vec![Immediate::Constant(Constant::string("a.Impl"))],
            )),
        };
        let canonical = Stmt::Assign {
            place: Place::Local(name.clone()),
            value: Expr::Invoke(InvokeExpr::new_instance(
                InvokeKind::Virtual,
                MethodSignature::new(
                    jvm::JAVA_LANG_CLASS,
                    jvm::CANONICAL_NAME,
                    vec![],
                    Type::string(),
                ),
                c.clone(),
                vec![],
            )),
        };
        let out = visitor.apply(&visitor.apply(&ValueMap::new(), &for_name), &canonical);
        assert_eq!(out.get_local(&m(), &c), AbstractValue::class("a.Impl"));
        assert_eq!(out.get_local(&m(), &name), AbstractValue::string("a.Impl"));
    }

    #[test]
    fn test_unrecognized_invoke_result_is_unknown() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        let c = Local::new("c", Type::class());
        let mut map = ValueMap::new();
        map.set_local(&m(), &c, AbstractValue::class("a/Old"));
        let stmt = Stmt::Assign {
            place: Place::Local(c.clone()),
            value: Expr::Invoke(InvokeExpr::new_static(
                MethodSignature::new("x.Lib", "pick", vec![], Type::class()),
                vec![],
            )),
        };
        assert!(visitor.apply(&map, &stmt).is_empty());
    }

    #[test]
    fn test_unfollowed_call_forgets_builder_arguments() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        let name = Local::new("n", Type::string());
        let mut map = ValueMap::new();
        map.set_local(&m(), &sb(), AbstractValue::string("a.b."));
        map.set_local(&m(), &name, AbstractValue::string("a.C"));
        let stmt = Stmt::Invoke(InvokeExpr::new_static(
            MethodSignature::new(
                "x.Lib",
                "fill",
                vec![Type::object(jvm::JAVA_LANG_STRING_BUILDER), Type::string()],
                Type::Void,
            ),
            vec![Immediate::Local(sb()), Immediate::Local(name.clone())],
        ));

        let out = visitor.apply(&map, &stmt);
        assert_eq!(out.get_local(&m(), &sb()), AbstractValue::Unknown);
        assert_eq!(out.get_local(&m(), &name), AbstractValue::string("a.C"));
    }

    #[test]
    fn test_field_write_on_tracked_object() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        let holder = Local::new("h", Type::object("a.Holder"));
        let field = FieldSignature::new("a.Holder", "svc", Type::class());
        let stmts = vec![
            Stmt::Assign {
                place: Place::Local(holder.clone()),
                value: Expr::New(ClassType::new("a.Holder")),
            },
            Stmt::Assign {
                place: Place::InstanceField {
                    base: holder.clone(),
                    field: field.clone(),
                },
                value: Expr::Immediate(Immediate::Constant(Constant::class("a/Impl"))),
            },
        ];
        let out = stmts
            .iter()
            .fold(ValueMap::new(), |map, stmt| visitor.apply(&map, stmt));
        assert_eq!(
            out.get_local(&m(), &holder).field(&field),
            AbstractValue::class("a/Impl")
        );
    }

    #[test]
    fn test_new_of_library_type_is_unknown() {
        let view = view();
        let method = m();
        let visitor = StatementVisitor::new(&method, &view);
        assert_eq!(
            visitor.eval(&ValueMap::new(), &Expr::New(ClassType::new("java.util.ArrayList"))),
            AbstractValue::Unknown
        );
        assert_eq!(
            visitor.eval(&ValueMap::new(), &Expr::New(ClassType::new("a.Holder"))),
            AbstractValue::object(ClassType::new("a.Holder"))
        );
    }
}
