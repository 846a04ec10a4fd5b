//! Class, field and method signatures
//!
//! Signatures are the only program identities that survive a view rebuild,
//! so they are cheap to clone (`Arc` backed) and totally ordered.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::shared::constants::jvm;

/// Fully qualified class name in dotted form (`java.lang.String`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassType(Arc<str>);

impl ClassType {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Last dotted component (`Map$Entry` for `java.util.Map$Entry`)
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    pub fn is(&self, name: &str) -> bool {
        &*self.0 == name
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        };
        f.write_str(name)
    }
}

/// JVM type as seen by the IR
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Object(ClassType),
    Array(Box<Type>),
}

impl Type {
    pub fn object(name: impl AsRef<str>) -> Self {
        Type::Object(ClassType::new(name))
    }

    pub fn string() -> Self {
        Type::object(jvm::JAVA_LANG_STRING)
    }

    pub fn class() -> Self {
        Type::object(jvm::JAVA_LANG_CLASS)
    }

    pub fn array_of(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// Class type when this is a (non-array) reference type
    pub fn class_type(&self) -> Option<&ClassType> {
        match self {
            Type::Object(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_object(&self, name: &str) -> bool {
        matches!(self, Type::Object(class) if class.is(name))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Primitive(p) => write!(f, "{}", p),
            Type::Object(class) => write!(f, "{}", class),
            Type::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// `<declaring.Class: type name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldSignature {
    pub class: ClassType,
    pub name: Arc<str>,
    pub ty: Type,
}

impl FieldSignature {
    pub fn new(class: impl Into<ClassType>, name: impl AsRef<str>, ty: Type) -> Self {
        Self {
            class: class.into(),
            name: Arc::from(name.as_ref()),
            ty,
        }
    }
}

impl fmt::Display for FieldSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {} {}>", self.class, self.ty, self.name)
    }
}

/// `<declaring.Class: ret name(params)>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSignature {
    pub class: ClassType,
    pub name: Arc<str>,
    pub params: Arc<[Type]>,
    pub ret: Type,
}

impl MethodSignature {
    pub fn new(
        class: impl Into<ClassType>,
        name: impl AsRef<str>,
        params: Vec<Type>,
        ret: Type,
    ) -> Self {
        Self {
            class: class.into(),
            name: Arc::from(name.as_ref()),
            params: Arc::from(params),
            ret,
        }
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_constructor(&self) -> bool {
        &*self.name == jvm::INIT
    }

    pub fn is_static_initializer(&self) -> bool {
        &*self.name == jvm::CLINIT
    }

    /// Same name and parameter list, ignoring the declaring class
    pub fn same_sub_signature(&self, other: &MethodSignature) -> bool {
        self.name == other.name && self.params == other.params && self.ret == other.ret
    }

    /// Copy of this signature re-declared on another class
    pub fn with_class(&self, class: ClassType) -> Self {
        Self {
            class,
            name: self.name.clone(),
            params: self.params.clone(),
            ret: self.ret.clone(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {} {}(", self.class, self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")>")
    }
}
