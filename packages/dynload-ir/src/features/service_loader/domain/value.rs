//! Abstract values
//!
//! `Unknown` absorbs every operation; nothing refines it except an explicit
//! overwrite by the transfer function.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::shared::models::{ClassType, Constant, FieldSignature};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AbstractValue {
    #[default]
    Unknown,
    StringConst(Arc<str>),
    /// Class name as it was obtained (internal name, descriptor or dotted)
    ClassConst(Arc<str>),
    NullConst,
    /// Freshly constructed object; `fields: None` until the first field write
    ObjectRef {
        ty: ClassType,
        #[serde(with = "field_entries")]
        fields: Option<BTreeMap<FieldSignature, AbstractValue>>,
    },
}

/// Field maps serialize as entry lists; JSON object keys must be strings
mod field_entries {
    use super::AbstractValue;
    use crate::shared::models::FieldSignature;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    type Fields = Option<BTreeMap<FieldSignature, AbstractValue>>;

    pub fn serialize<S: Serializer>(fields: &Fields, serializer: S) -> Result<S::Ok, S::Error> {
        fields
            .as_ref()
            .map(|map| map.iter().collect::<Vec<_>>())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fields, D::Error> {
        let entries: Option<Vec<(FieldSignature, AbstractValue)>> =
            Option::deserialize(deserializer)?;
        Ok(entries.map(|entries| entries.into_iter().collect()))
    }
}

impl AbstractValue {
    pub fn string(text: impl AsRef<str>) -> Self {
        AbstractValue::StringConst(Arc::from(text.as_ref()))
    }

    pub fn class(name: impl AsRef<str>) -> Self {
        AbstractValue::ClassConst(Arc::from(name.as_ref()))
    }

    pub fn object(ty: ClassType) -> Self {
        AbstractValue::ObjectRef { ty, fields: None }
    }

    /// Value of a literal operand; numeric literals are not tracked
    pub fn from_constant(constant: &Constant) -> Self {
        match constant {
            Constant::String(s) => AbstractValue::StringConst(s.clone()),
            Constant::Class(c) => AbstractValue::ClassConst(c.clone()),
            Constant::Null => AbstractValue::NullConst,
            _ => AbstractValue::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AbstractValue::Unknown)
    }

    /// String, class or null constant
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            AbstractValue::StringConst(_) | AbstractValue::ClassConst(_) | AbstractValue::NullConst
        )
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            AbstractValue::StringConst(s) => Some(s),
            _ => None,
        }
    }

    /// Field of a tracked object; `Unknown` for anything else
    pub fn field(&self, field: &FieldSignature) -> AbstractValue {
        match self {
            AbstractValue::ObjectRef {
                fields: Some(fields),
                ..
            } => fields.get(field).cloned().unwrap_or_default(),
            _ => AbstractValue::Unknown,
        }
    }

    /// Copy of a tracked object with one field written
    ///
    /// Writing `Unknown` drops the entry. Non-objects stay as they are.
    pub fn with_field(&self, field: FieldSignature, value: AbstractValue) -> AbstractValue {
        match self {
            AbstractValue::ObjectRef { ty, fields } => {
                let mut fields = fields.clone().unwrap_or_default();
                if value.is_known() {
                    fields.insert(field, value);
                } else {
                    fields.remove(&field);
                }
                AbstractValue::ObjectRef {
                    ty: ty.clone(),
                    fields: Some(fields),
                }
            }
            other => other.clone(),
        }
    }

    /// String concatenation; any non-string operand gives `Unknown`
    pub fn concat(&self, other: &AbstractValue) -> AbstractValue {
        match (self, other) {
            (AbstractValue::StringConst(a), AbstractValue::StringConst(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                AbstractValue::string(joined)
            }
            _ => AbstractValue::Unknown,
        }
    }

    /// `Class.getCanonicalName()` of a class constant
    pub fn canonical_name(&self) -> AbstractValue {
        match self {
            AbstractValue::ClassConst(name) => AbstractValue::string(class_name::canonical(name)),
            _ => AbstractValue::Unknown,
        }
    }

    /// `Class.getSimpleName()` of a class constant
    pub fn simple_name(&self) -> AbstractValue {
        match self {
            AbstractValue::ClassConst(name) => AbstractValue::string(class_name::simple(name)),
            _ => AbstractValue::Unknown,
        }
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractValue::Unknown => f.write_str("Unknown"),
            AbstractValue::StringConst(s) => write!(f, "String: {}", s),
            AbstractValue::ClassConst(c) => write!(f, "Class: {}", c),
            AbstractValue::NullConst => f.write_str("Null"),
            AbstractValue::ObjectRef { ty, fields } => {
                write!(f, "Object: {}", ty)?;
                if let Some(fields) = fields {
                    f.write_str(" {")?;
                    for (i, (field, value)) in fields.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{} = {}", field.name, value)?;
                    }
                    f.write_str("}")?;
                }
                Ok(())
            }
        }
    }
}

/// Class-name rendering for `getCanonicalName` / `getSimpleName`
///
/// Accepts internal names (`a/b/C`), dotted names and descriptors
/// (`La/b/C;`, `[La/b/C;`, `[I`).
pub mod class_name {
    /// Element name in dotted form plus array dimensions
    fn split(raw: &str) -> (String, usize) {
        let dims = raw.chars().take_while(|c| *c == '[').count();
        let element = &raw[dims..];
        let element = match element.strip_prefix('L').and_then(|e| e.strip_suffix(';')) {
            Some(inner) => inner,
            None if dims > 0 => primitive(element).unwrap_or(element),
            None => element,
        };
        (element.replace('/', "."), dims)
    }

    fn primitive(descriptor: &str) -> Option<&'static str> {
        Some(match descriptor {
            "Z" => "boolean",
            "B" => "byte",
            "C" => "char",
            "S" => "short",
            "I" => "int",
            "J" => "long",
            "F" => "float",
            "D" => "double",
            _ => return None,
        })
    }

    fn with_dims(mut name: String, dims: usize) -> String {
        for _ in 0..dims {
            name.push_str("[]");
        }
        name
    }

    pub fn canonical(raw: &str) -> String {
        let (element, dims) = split(raw);
        with_dims(element.replace('$', "."), dims)
    }

    pub fn simple(raw: &str) -> String {
        let (element, dims) = split(raw);
        let last = element
            .rsplit(|c| c == '.' || c == '$')
            .next()
            .unwrap_or(&element)
            .to_string();
        with_dims(last, dims)
    }
}
