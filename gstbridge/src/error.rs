// SPDX-FileCopyrightText: 2025 2025 Contributors to the Media eXchange Layer project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for boundary operations.
//!
//! Every operation in this crate fails locally with one of these variants.
//! None of them aborts the process.

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when crossing the native boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dynamic type tag of a handle does not satisfy the requested kind.
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Native name of the requested kind.
        expected: &'static str,
        /// Native name of the type found in the handle.
        actual: String,
    },

    /// A mutation was attempted on a shared object without promoting it first.
    #[error("{kind} is shared; make it writable before mutating")]
    NotWritable {
        /// Native name of the object kind.
        kind: &'static str,
    },

    /// Introspection found no classification for a property.
    ///
    /// This is a soft failure: render the property generically.
    #[error("Unknown property kind for \"{name}\" (value type {value_type})")]
    UnknownPropertyKind { name: String, value_type: String },

    /// A null, released or otherwise unusable handle was supplied.
    #[error("Invalid handle")]
    InvalidHandle,

    /// The native type backing a kind is not registered (yet).
    #[error("Type {0} is not registered")]
    UnregisteredType(&'static str),

    /// A generic error for failures not covered by the variants above.
    #[error("Other error: {0}")]
    Other(String),

    /// Failed to convert a Rust string to a C-compatible null-terminated string.
    #[error("Null string: {0}")]
    NulString(#[from] std::ffi::NulError),

    /// Failed to load or resolve the native library.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),
}

impl Error {
    /// Returns `true` for failures callers should degrade on rather than report.
    pub fn is_soft(&self) -> bool {
        matches!(self, Error::UnknownPropertyKind { .. })
    }
}
