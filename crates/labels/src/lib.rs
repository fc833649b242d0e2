//! Label reconciliation domain for ghlabels.
//!
//! This crate decides, for each desired label, whether a remote label already
//! represents it (by current name or by a former alias) and which single
//! mutation brings it into line. Infrastructure crates implement the
//! [`LabelDirectory`] and [`RepositoryProbe`] traits defined here; they never
//! add matching rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`LabelName`, `RepositoryId`, `ReconcileRunId`) |
//! | [`types`] | Desired/remote label state, planned changes, run reports |
//! | [`errors`] | Lookup, directory, and reconciliation errors |
//! | [`directory`] | Collaborator traits implemented by infrastructure |
//! | [`reconcile`] | The reconciliation engine |

pub mod directory;
pub mod errors;
pub mod identifiers;
pub mod reconcile;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use directory::{LabelDirectory, RepositoryProbe};
pub use errors::{DirectoryError, LookupError, ReconcileError};
pub use identifiers::{LabelName, ParseRepositoryIdError, ReconcileRunId, RepositoryId};
pub use reconcile::{plan, LookupPolicy, Reconciler};
pub use types::{
    LabelAction, LabelChange, LabelMatch, LabelOutcome, LabelSpec, LabelUpdate, NewLabel,
    ReconcileReport, RemoteLabel,
};
