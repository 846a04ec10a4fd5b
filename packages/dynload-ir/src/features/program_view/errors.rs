//! Program view errors
//!
//! Every variant is a scope-resolution failure from the driver's point of
//! view: the affected solver run is unavailable, the analysis goes on.

use thiserror::Error;

use crate::shared::models::{ClassType, MethodSignature};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// Class is not in the program
    #[error("class {0} is not part of the program")]
    ClassNotFound(ClassType),

    /// Class bytes could not be turned into IR
    #[error("malformed class {class}: {message}")]
    Malformed { class: ClassType, message: String },

    /// Method lookup walked to a superclass outside the view
    #[error("cannot resolve {method}: superclass {superclass} of {class} is outside the view")]
    UnresolvedSuperclass {
        method: MethodSignature,
        class: ClassType,
        superclass: ClassType,
    },

    /// Entry method has no body in the view
    #[error("method {0} has no body in the view")]
    MissingBody(MethodSignature),
}

impl ViewError {
    pub fn malformed(class: ClassType, message: impl Into<String>) -> Self {
        ViewError::Malformed {
            class,
            message: message.into(),
        }
    }
}

pub type ViewResult<T> = Result<T, ViewError>;
