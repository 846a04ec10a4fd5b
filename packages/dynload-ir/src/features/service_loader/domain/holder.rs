//! Storage locations
//!
//! Locals are scoped by their method, static fields are program-wide.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::models::{FieldSignature, Local, MethodSignature};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueHolder {
    Local {
        method: MethodSignature,
        local: Local,
    },
    StaticField(FieldSignature),
}

impl ValueHolder {
    pub fn local(method: &MethodSignature, local: &Local) -> Self {
        ValueHolder::Local {
            method: method.clone(),
            local: local.clone(),
        }
    }

    pub fn static_field(field: &FieldSignature) -> Self {
        ValueHolder::StaticField(field.clone())
    }

    pub fn is_static_field(&self) -> bool {
        matches!(self, ValueHolder::StaticField(_))
    }

    /// Method owning a local holder
    pub fn method(&self) -> Option<&MethodSignature> {
        match self {
            ValueHolder::Local { method, .. } => Some(method),
            ValueHolder::StaticField(_) => None,
        }
    }
}

impl fmt::Display for ValueHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueHolder::Local { method, local } => write!(f, "{}#{}", method.name, local),
            ValueHolder::StaticField(field) => write!(f, "{}", field),
        }
    }
}
