//! Program view ports
//!
//! The analysis consumes classes through these two traits only. A frontend
//! turns raw class bytes into IR; a provider owns the class set and builds
//! scoped views from it.

use std::sync::Arc;

use super::errors::ViewResult;
use super::infrastructure::view::ProgramView;
use crate::shared::models::{ClassDef, ClassType};

/// Bytes to IR
pub trait ClassFrontend: Send + Sync {
    fn parse(&self, name: &ClassType, bytes: &[u8]) -> ViewResult<ClassDef>;
}

/// Class set the analysis runs over
pub trait ProgramProvider: Send + Sync {
    /// Every class in the program, in a stable order
    fn class_names(&self) -> Vec<ClassType>;

    /// Full-program lookup of a single class
    fn load_class(&self, name: &ClassType) -> ViewResult<Arc<ClassDef>>;

    /// View restricted to `classes`
    ///
    /// Fails when one of the requested classes is missing or malformed.
    fn build_view(&self, classes: &[ClassType]) -> ViewResult<ProgramView> {
        let mut defs = Vec::with_capacity(classes.len());
        for name in classes {
            defs.push(self.load_class(name)?);
        }
        Ok(ProgramView::new(defs))
    }

    fn contains(&self, name: &ClassType) -> bool {
        self.class_names().iter().any(|c| c == name)
    }
}
