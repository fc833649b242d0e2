//! Error types for label lookup, mutation, and reconciliation.
//!
//! [`LookupError`] is split into "the label is absent" and
//! "the lookup itself failed" so the engine can decide which of the two may
//! fall through to the next alias. [`DirectoryError`] covers create and update
//! failures, which always end the run. [`ReconcileError`] is what the engine
//! hands back to its caller.

use thiserror::Error;

use crate::LabelName;

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Failure to look up a label by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The directory has no label under this name.
    #[error("label '{name}' not found")]
    NotFound {
        /// The name that was looked up.
        name: LabelName,
    },

    /// The lookup could not be completed (transport failure, authentication,
    /// rate limiting, server error). Says nothing about whether the label exists.
    #[error("lookup of label '{name}' failed: {message}")]
    Unavailable {
        /// The name that was looked up.
        name: LabelName,
        /// Description of the underlying failure.
        message: String,
    },
}

/// Failure of a directory call other than a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("request failed: {message}")]
    Request {
        /// Description of the transport failure.
        message: String,
    },

    /// The remote answered with a non-success status.
    #[error("remote returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message reported by the remote, or the raw body.
        message: String,
    },

    /// The remote answered successfully but the payload was not understood.
    #[error("unexpected response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Errors that abort a reconciliation run.
///
/// Every variant is fatal: labels reconciled before the failure stay applied,
/// labels after it are never attempted.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The engine was given an empty label set.
    #[error("no labels to reconcile")]
    NoLabels,

    /// A lookup failed for a reason other than absence while the strict
    /// lookup policy was in force.
    #[error("could not resolve label '{label}': {source}")]
    Lookup {
        /// Canonical name of the label being resolved.
        label: LabelName,
        /// The lookup failure.
        #[source]
        source: LookupError,
    },

    /// Creating the label failed.
    #[error("failed to create label '{label}': {source}")]
    Create {
        /// Canonical name of the label.
        label: LabelName,
        /// The directory failure.
        #[source]
        source: DirectoryError,
    },

    /// Updating (and possibly renaming) an existing label failed.
    #[error("failed to update label '{current_name}' to '{label}': {source}")]
    Update {
        /// Canonical name of the label.
        label: LabelName,
        /// The name the remote label was addressed by.
        current_name: LabelName,
        /// The directory failure.
        #[source]
        source: DirectoryError,
    },
}
