//! Class pool: class identity → class bytes
//!
//! The pool owns the raw input and parses lazily through a `ClassFrontend`.
//! Already-built `ClassDef`s can be registered directly (tests, callers that
//! run their own frontend).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{DynloadError, Result};
use crate::features::program_view::errors::{ViewError, ViewResult};
use crate::features::program_view::ports::{ClassFrontend, ProgramProvider};
use crate::shared::models::{ClassDef, ClassType};

/// Frontend for classes serialized as JSON `ClassDef` documents
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFrontend;

impl ClassFrontend for JsonFrontend {
    fn parse(&self, name: &ClassType, bytes: &[u8]) -> ViewResult<ClassDef> {
        let class: ClassDef = serde_json::from_slice(bytes)
            .map_err(|e| ViewError::malformed(name.clone(), e.to_string()))?;
        if &class.ty != name {
            return Err(ViewError::malformed(
                name.clone(),
                format!("document declares class {}", class.ty),
            ));
        }
        Ok(class)
    }
}

#[derive(Debug, Clone)]
enum ClassSource {
    Bytes(Arc<[u8]>),
    Parsed(Arc<ClassDef>),
}

pub struct ClassPool {
    classes: BTreeMap<ClassType, ClassSource>,
    /// Insertion order, so batch results follow the input order
    order: Vec<ClassType>,
    frontend: Arc<dyn ClassFrontend>,
}

impl ClassPool {
    pub fn new(frontend: Arc<dyn ClassFrontend>) -> Self {
        Self {
            classes: BTreeMap::new(),
            order: Vec::new(),
            frontend,
        }
    }

    /// Pool with the JSON frontend
    pub fn json() -> Self {
        Self::new(Arc::new(JsonFrontend))
    }

    /// Pool over already-parsed classes
    pub fn from_classes(classes: impl IntoIterator<Item = ClassDef>) -> Self {
        let mut pool = Self::json();
        for class in classes {
            pool.insert_class(class);
        }
        pool
    }

    /// Load a JSON array of class documents
    ///
    /// Each element is kept as raw bytes and parsed on first use, so a
    /// malformed class only fails its own lookups.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read(path)?;
        Self::from_json_slice(&content)
    }

    pub fn from_json_slice(content: &[u8]) -> Result<Self> {
        let documents: Vec<serde_json::Value> = serde_json::from_slice(content)?;
        let mut pool = Self::json();
        for (i, document) in documents.into_iter().enumerate() {
            let name = document
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| {
                    DynloadError::parse_error(format!("#{}", i), "class document has no name")
                })?
                .to_string();
            let bytes = serde_json::to_vec(&document)?;
            pool.insert_bytes(ClassType::new(name), bytes);
        }
        Ok(pool)
    }

    pub fn insert_bytes(&mut self, name: ClassType, bytes: impl Into<Arc<[u8]>>) {
        self.insert(name, ClassSource::Bytes(bytes.into()));
    }

    pub fn insert_class(&mut self, class: ClassDef) {
        let name = class.ty.clone();
        self.insert(name, ClassSource::Parsed(Arc::new(class)));
    }

    fn insert(&mut self, name: ClassType, source: ClassSource) {
        if self.classes.insert(name.clone(), source).is_none() {
            self.order.push(name);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ProgramProvider for ClassPool {
    fn class_names(&self) -> Vec<ClassType> {
        self.order.clone()
    }

    fn load_class(&self, name: &ClassType) -> ViewResult<Arc<ClassDef>> {
        match self.classes.get(name) {
            Some(ClassSource::Parsed(class)) => Ok(class.clone()),
            Some(ClassSource::Bytes(bytes)) => self.frontend.parse(name, bytes).map(Arc::new),
            None => Err(ViewError::ClassNotFound(name.clone())),
        }
    }

    fn contains(&self, name: &ClassType) -> bool {
        self.classes.contains_key(name)
    }
}
