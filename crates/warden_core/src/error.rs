//! Error types for the unit core.

use thiserror::Error;

use crate::content::ContentCategory;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all unit core errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// `init` was called on a unit that already has a type.
    ///
    /// This is a programming error and is never recovered from.
    #[error("Unit {0} is already initialized")]
    AlreadyInitialized(u64),

    /// A unit was used before it was given a type.
    #[error("Unit {0} has no type")]
    Uninitialized(u64),

    /// A content id is not registered under the given category.
    #[error("Unknown {category} type id: {id}")]
    UnknownType {
        /// Content category that was searched.
        category: ContentCategory,
        /// The id that failed to resolve.
        id: u8,
    },

    /// A content name is not registered under the given category.
    #[error("Unknown {category} type name: {name}")]
    UnknownTypeName {
        /// Content category that was searched.
        category: ContentCategory,
        /// The name that failed to resolve.
        name: String,
    },

    /// A snapshot tried to change the immutable type of a live unit.
    #[error("Unit {unit} is of type {current} but snapshot carries type {incoming}")]
    TypeMismatch {
        /// Unit being decoded.
        unit: u64,
        /// Type id the unit already has.
        current: u8,
        /// Type id carried by the record.
        incoming: u8,
    },

    /// A record carried a version tag this build does not understand.
    #[error("Unsupported {format} version: expected {expected}, got {found}")]
    VersionMismatch {
        /// Record format ("save" or "snapshot").
        format: &'static str,
        /// Version this build writes.
        expected: u32,
        /// Version found in the data.
        found: u32,
    },

    /// Record bytes could not be decoded.
    #[error("Failed to decode {format} record: {message}")]
    Decode {
        /// Record format ("save" or "snapshot").
        format: &'static str,
        /// Underlying decoder message.
        message: String,
    },

    /// Record could not be encoded.
    #[error("Failed to encode {format} record: {message}")]
    Encode {
        /// Record format ("save" or "snapshot").
        format: &'static str,
        /// Underlying encoder message.
        message: String,
    },

    /// Invalid entity reference.
    #[error("Unit not found: {0}")]
    UnitNotFound(u64),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid simulation state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
