//! Errors from booth state and interaction operations.

use crate::overlay::ElementKey;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BoothError {
    #[error("no faces detected")]
    NoFacesDetected,
    #[error("face {requested} not found: only {detected} face(s) detected")]
    FaceNotFound { requested: usize, detected: usize },
    #[error("text content cannot be empty")]
    EmptyTextContent,
    #[error("no text element is being edited")]
    NoActiveEdit,
    #[error("element no longer exists: {0:?}")]
    ElementNotFound(ElementKey),
    #[error("no haiku available to add")]
    NoHaiku,
    #[error("unknown filter: {0}")]
    UnknownFilter(String),
    #[error("unknown trash mode: {0}")]
    UnknownTrashMode(String),
}
