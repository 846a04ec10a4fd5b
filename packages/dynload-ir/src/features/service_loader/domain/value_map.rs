//! Dataflow fact: storage location → abstract value
//!
//! Absent entries read as `Unknown`, and writing `Unknown` removes the
//! entry, so two maps are equal exactly when they agree on every location.
//! The empty map is the zero fact.

use std::collections::BTreeMap;
use std::fmt;

use super::holder::ValueHolder;
use super::value::AbstractValue;
use crate::features::dataflow::DataflowFact;
use crate::shared::models::{FieldSignature, Local, MethodSignature};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ValueMap(BTreeMap<ValueHolder, AbstractValue>);

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, holder: &ValueHolder) -> AbstractValue {
        self.0.get(holder).cloned().unwrap_or_default()
    }

    pub fn get_local(&self, method: &MethodSignature, local: &Local) -> AbstractValue {
        self.get(&ValueHolder::local(method, local))
    }

    pub fn get_static(&self, field: &FieldSignature) -> AbstractValue {
        self.get(&ValueHolder::static_field(field))
    }

    pub fn set(&mut self, holder: ValueHolder, value: AbstractValue) {
        if value.is_known() {
            self.0.insert(holder, value);
        } else {
            self.0.remove(&holder);
        }
    }

    pub fn set_local(&mut self, method: &MethodSignature, local: &Local, value: AbstractValue) {
        self.set(ValueHolder::local(method, local), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ValueHolder, &AbstractValue)> {
        self.0.iter()
    }

    pub fn static_fields(&self) -> impl Iterator<Item = (&FieldSignature, &AbstractValue)> {
        self.0.iter().filter_map(|(holder, value)| match holder {
            ValueHolder::StaticField(field) => Some((field, value)),
            ValueHolder::Local { .. } => None,
        })
    }

    /// Copy keeping only static-field entries
    pub fn statics_only(&self) -> ValueMap {
        ValueMap(
            self.0
                .iter()
                .filter(|(holder, _)| holder.is_static_field())
                .map(|(h, v)| (h.clone(), v.clone()))
                .collect(),
        )
    }

    /// Overlay `other`; its entries win
    pub fn overlay(&mut self, other: &ValueMap) {
        for (holder, value) in other.iter() {
            self.0.insert(holder.clone(), value.clone());
        }
    }

    /// Insert entries of `other` whose location is not set yet
    pub fn fill_missing(&mut self, other: &ValueMap) {
        for (holder, value) in other.iter() {
            self.0
                .entry(holder.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl DataflowFact for ValueMap {
    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn zero() -> Self {
        ValueMap::new()
    }
}

impl FromIterator<(ValueHolder, AbstractValue)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (ValueHolder, AbstractValue)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (holder, value) in iter {
            map.set(holder, value);
        }
        map
    }
}

impl fmt::Display for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (holder, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} -> {}", holder, value)?;
        }
        f.write_str("}")
    }
}
