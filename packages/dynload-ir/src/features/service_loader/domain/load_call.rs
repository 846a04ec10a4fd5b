//! Dynamic-load call sites and their resolutions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::value::AbstractValue;
use super::value_map::ValueMap;
use crate::config::DynamicLoadTarget;
use crate::shared::constants::jvm;
use crate::shared::models::{Immediate, InvokeExpr, InvokeKind, MethodSignature, Stmt, StmtId, Type};

/// One actual argument with its believed value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallArgument {
    pub arg: Immediate,
    /// Formal parameter type at this position
    pub param_type: Type,
    pub value: AbstractValue,
}

impl CallArgument {
    /// Class and string arguments must resolve for the call to count as resolved
    pub fn is_required(&self) -> bool {
        self.param_type.is_object(jvm::JAVA_LANG_CLASS)
            || self.param_type.is_object(jvm::JAVA_LANG_STRING)
    }
}

/// A dynamic-load call site with argument values
///
/// Two calls are equal when they sit at the same statement and carry the
/// same values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DynamicLoadCall {
    pub site: StmtId,
    pub invoke: InvokeExpr,
    pub args: Vec<CallArgument>,
}

impl DynamicLoadCall {
    /// Literal arguments start with their value, locals with `Unknown`
    pub fn new(site: StmtId, invoke: InvokeExpr) -> Self {
        let args = invoke
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| CallArgument {
                arg: arg.clone(),
                param_type: invoke.method.params.get(i).cloned().unwrap_or(Type::Void),
                value: arg
                    .as_constant()
                    .map(AbstractValue::from_constant)
                    .unwrap_or_default(),
            })
            .collect();
        Self { site, invoke, args }
    }

    /// First argument is a class literal at the call site
    pub fn has_constant_arguments(&self) -> bool {
        matches!(
            self.args.first().and_then(|a| a.arg.as_constant()),
            Some(c) if c.is_class()
        )
    }

    /// Every required argument has a known value
    pub fn is_resolved(&self) -> bool {
        self.args
            .iter()
            .filter(|a| a.is_required())
            .all(|a| a.value.is_known())
    }

    /// Copy with local arguments read from a fact at the call site
    pub fn with_values_from(&self, fact: &ValueMap) -> Self {
        let mut call = self.clone();
        for arg in &mut call.args {
            if let Immediate::Local(local) = &arg.arg {
                arg.value = fact.get_local(&self.site.method, local);
            }
        }
        call
    }

    pub fn values(&self) -> impl Iterator<Item = &AbstractValue> {
        self.args.iter().map(|a| &a.value)
    }

    /// Enclosing method of the call site
    pub fn method(&self) -> &MethodSignature {
        &self.site.method
    }
}

impl fmt::Display for DynamicLoadCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.invoke)?;
        for (i, value) in self.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")")
    }
}

/// Matcher for the dynamic-load call shape
#[derive(Debug, Clone)]
pub struct LoadCallMatcher {
    target: DynamicLoadTarget,
}

impl LoadCallMatcher {
    pub fn new(target: DynamicLoadTarget) -> Self {
        Self { target }
    }

    pub fn matches(&self, invoke: &InvokeExpr) -> bool {
        invoke.kind == InvokeKind::Static
            && invoke.method.class.is(&self.target.class)
            && &*invoke.method.name == self.target.method
            && invoke
                .method
                .params
                .first()
                .is_some_and(|p| p.is_object(&self.target.first_param))
    }

    /// Every matching call in a method body, in statement order
    pub fn scan(&self, method: &MethodSignature, stmts: &[Stmt]) -> Vec<DynamicLoadCall> {
        stmts
            .iter()
            .enumerate()
            .filter_map(|(offset, stmt)| {
                let invoke = stmt.invoke_expr()?;
                self.matches(invoke).then(|| {
                    DynamicLoadCall::new(StmtId::new(method.clone(), offset as u32), invoke.clone())
                })
            })
            .collect()
    }
}

impl Default for LoadCallMatcher {
    fn default() -> Self {
        Self::new(DynamicLoadTarget::default())
    }
}

/// A resolved call together with the entry method whose run resolved it
///
/// Equality and hashing look at the call only, so finding the same
/// resolution from another entry method does not add a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMethodWithCall {
    pub entry: MethodSignature,
    pub call: DynamicLoadCall,
}

impl EntryMethodWithCall {
    pub fn new(entry: MethodSignature, call: DynamicLoadCall) -> Self {
        Self { entry, call }
    }
}

impl PartialEq for EntryMethodWithCall {
    fn eq(&self, other: &Self) -> bool {
        self.call == other.call
    }
}

impl Eq for EntryMethodWithCall {}

impl Hash for EntryMethodWithCall {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.call.hash(state);
    }
}
