//! Scoped program view
//!
//! A view is an immutable snapshot over a subset of the program's classes.
//! Method lookups and virtual dispatch only see classes inside the view;
//! anything declared outside is opaque to the analysis.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::features::program_view::errors::{ViewError, ViewResult};
use crate::shared::constants::jvm;
use crate::shared::models::{
    Body, ClassDef, ClassType, InvokeExpr, InvokeKind, MethodDef, MethodSignature, Stmt, StmtId,
};

#[derive(Debug, Clone, Default)]
pub struct ProgramView {
    classes: Vec<Arc<ClassDef>>,
    index: FxHashMap<ClassType, usize>,
}

impl ProgramView {
    /// Build a view; a class listed twice keeps its first definition
    pub fn new(classes: Vec<Arc<ClassDef>>) -> Self {
        let mut view = Self::default();
        for class in classes {
            if view.index.contains_key(&class.ty) {
                continue;
            }
            view.index.insert(class.ty.clone(), view.classes.len());
            view.classes.push(class);
        }
        view
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, ty: &ClassType) -> bool {
        self.index.contains_key(ty)
    }

    pub fn class(&self, ty: &ClassType) -> Option<&ClassDef> {
        self.index.get(ty).map(|&i| self.classes[i].as_ref())
    }

    /// Every method of every class, in declaration order
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.classes().flat_map(|c| c.methods.iter())
    }

    pub fn method(&self, signature: &MethodSignature) -> Option<&MethodDef> {
        self.class(&signature.class)?.method(signature)
    }

    pub fn body(&self, signature: &MethodSignature) -> Option<&Body> {
        self.method(signature)?.body.as_ref()
    }

    pub fn stmt(&self, id: &StmtId) -> Option<&Stmt> {
        self.body(&id.method)?.stmt(id.offset)
    }

    /// `sub` equals `sup` or reaches it through in-view supertypes
    pub fn is_subtype(&self, sub: &ClassType, sup: &ClassType) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![sub.clone()];
        while let Some(ty) = stack.pop() {
            if &ty == sup {
                return true;
            }
            if !seen.insert(ty.clone()) {
                continue;
            }
            if let Some(def) = self.class(&ty) {
                stack.extend(def.super_class.iter().cloned());
                stack.extend(def.interfaces.iter().cloned());
            }
        }
        false
    }

    /// Concrete implementation of `signature` visible from `class`
    ///
    /// Walks the superclass chain inside the view. A class outside the view
    /// makes the lookup opaque (`None`), except when the walk started inside
    /// the view and leaves it through a superclass other than `Object`.
    pub fn dispatch(
        &self,
        class: &ClassType,
        signature: &MethodSignature,
    ) -> ViewResult<Option<MethodSignature>> {
        let mut current = class.clone();
        let mut seen = FxHashSet::default();
        loop {
            if !seen.insert(current.clone()) {
                return Ok(None);
            }
            let Some(def) = self.class(&current) else {
                return Ok(None);
            };
            if let Some(method) = def.method_by_sub_signature(signature) {
                return Ok(method.is_concrete().then(|| method.signature.clone()));
            }
            match &def.super_class {
                Some(sup) if self.contains(sup) => current = sup.clone(),
                Some(sup) if sup.is(jvm::JAVA_LANG_OBJECT) => return Ok(None),
                Some(sup) => {
                    return Err(ViewError::UnresolvedSuperclass {
                        method: signature.clone(),
                        class: def.ty.clone(),
                        superclass: sup.clone(),
                    })
                }
                None => return Ok(None),
            }
        }
    }

    /// In-view targets of an invoke (class hierarchy analysis)
    ///
    /// Static and special invokes have at most one target. Virtual and
    /// interface invokes add the implementations of every in-view subtype.
    /// Invokes declared on classes outside the view have no targets.
    pub fn resolve_invoke(&self, invoke: &InvokeExpr) -> ViewResult<Vec<MethodSignature>> {
        let declaring = &invoke.method.class;
        if invoke.kind == InvokeKind::Dynamic || !self.contains(declaring) {
            return Ok(Vec::new());
        }

        let mut targets = Vec::new();
        if let Some(target) = self.dispatch(declaring, &invoke.method)? {
            targets.push(target);
        }

        if matches!(invoke.kind, InvokeKind::Virtual | InvokeKind::Interface) {
            for def in self.classes() {
                if &def.ty == declaring || !self.is_subtype(&def.ty, declaring) {
                    continue;
                }
                if let Some(target) = self.dispatch(&def.ty, &invoke.method)? {
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
            }
        }

        Ok(targets)
    }
}
