//! Error taxonomy for the control model.
//!
//! Everything here is fatal for the utterance being processed: either a resource could not be
//! opened, or the static database is inconsistent. Numeric degeneracies (division by zero inside
//! a formula, zero length slope intervals) are *not* errors; they surface as non-finite values in
//! the parameter track.

use alloc::string::String;
#[cfg(feature = "std")]
use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[cfg(feature = "std")]
    #[error("Could not open the file {}.", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Formula expression parser error: {description} at position {position} of string [{input}].")]
    FormulaParse {
        description: String,
        position: usize,
        input: String,
    },

    #[error("Boolean expression parser error: {description} at position {position} of string [{input}].")]
    BooleanParse {
        description: String,
        position: usize,
        input: String,
    },

    #[error("Duplicate category: {0}.")]
    DuplicateCategory(String),

    #[error("Category not found: {0}.")]
    UnknownCategory(String),

    #[error("Posture not found: {0}.")]
    UnknownPosture(String),

    #[error("Parameter name not found: {0}.")]
    UnknownParameter(String),

    #[error("Equation not found: {0}.")]
    UnknownEquation(String),

    #[error("Transition not found: {0}.")]
    UnknownTransition(String),

    #[error("Special transition not found: {0}.")]
    UnknownSpecialTransition(String),

    #[error("Formula tree not found for equation {0}.")]
    MissingFormula(String),

    #[error("No rule matches the posture sequence [{0}].")]
    NoMatchingRule(String),

    #[error("The model needs {expected} parameters, got {found}.")]
    ParameterCount { expected: usize, found: usize },

    #[error("Invalid posture {name}: {reason}.")]
    InvalidPosture { name: String, reason: String },

    #[error("Invalid rule {number}: {reason}.")]
    InvalidRule { number: usize, reason: String },

    #[error("Invalid transition {name}: {reason}.")]
    InvalidTransition { name: String, reason: String },

    #[error("At least 2 postures are required, got {0}.")]
    TooFewPostures(usize),

    #[error("Could not format the parameter track.")]
    Format(#[from] core::fmt::Error),
}
