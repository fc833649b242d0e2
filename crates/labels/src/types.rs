//! Shared value types for label reconciliation.
//!
//! [`LabelSpec`] is the desired state read from configuration; [`RemoteLabel`]
//! is the state the remote directory currently holds. The remaining types
//! describe the decision the engine makes for one spec and what it did.

use serde::{Deserialize, Serialize};

use crate::{LabelName, ReconcileRunId};

// ---------------------------------------------------------------------------
// Desired and remote state
// ---------------------------------------------------------------------------

/// Desired state for one label.
///
/// Read once per run from the label file and never mutated. Canonical names
/// are expected to be unique within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    /// The canonical name the remote label should end up with.
    pub name: LabelName,

    /// Six-hex-digit colour code, without a leading `#`.
    pub color: String,

    /// Free-form description; may be empty.
    #[serde(default)]
    pub description: String,

    /// Names this label was previously known by, in priority order.
    ///
    /// Only used to find an existing label to rename. Never sent to the remote.
    #[serde(default)]
    pub aliases: Vec<LabelName>,
}

impl LabelSpec {
    /// Creates a spec with no description and no aliases.
    pub fn new(name: LabelName, color: impl Into<String>) -> Self {
        Self {
            name,
            color: color.into(),
            description: String::new(),
            aliases: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends an alias.
    #[must_use]
    pub fn with_alias(mut self, alias: LabelName) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Returns `true` if `remote` already carries this spec's name, colour,
    /// and description. Hex colours compare case-insensitively; GitHub reports
    /// them lower-cased.
    pub fn is_satisfied_by(&self, remote: &RemoteLabel) -> bool {
        remote.name == self.name
            && remote.color.eq_ignore_ascii_case(&self.color)
            && remote.description == self.description
    }
}

/// Current state of one label as held by the remote directory.
///
/// Identified by its current name; renaming a label changes that key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLabel {
    /// Current remote name. May equal one of a spec's aliases.
    pub name: LabelName,

    /// Colour code as reported by the remote.
    pub color: String,

    /// Description as reported by the remote. `null` is read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Resolution and planning
// ---------------------------------------------------------------------------

/// A remote label found to represent a [`LabelSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch {
    /// The name the match was found under: the canonical name or an alias.
    pub matched_name: LabelName,

    /// Snapshot of the remote label at lookup time.
    pub remote: RemoteLabel,

    /// `true` when `matched_name` is one of the label spec's aliases.
    pub by_alias: bool,
}

/// Fields sent when creating a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewLabel {
    /// Name of the new label.
    pub name: LabelName,
    /// Colour code.
    pub color: String,
    /// Description.
    pub description: String,
}

/// Fields sent when updating a label, addressed separately by its current name.
///
/// `new_name` may equal the current name when no rename is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelUpdate {
    /// Name the label should carry afterwards.
    pub new_name: LabelName,
    /// Colour code.
    pub color: String,
    /// Description.
    pub description: String,
}

/// The single mutation chosen for one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    /// No remote label matched; create one.
    Create(NewLabel),

    /// A remote label matched; rename (if needed) and overwrite it.
    Update {
        /// The name the remote label is currently identified by.
        current_name: LabelName,
        /// The replacement state.
        update: LabelUpdate,
    },
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What the engine did for one spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LabelAction {
    /// The label did not exist under its name or any alias and was created.
    Created,

    /// An existing label was updated in place.
    Updated {
        /// The name the label was found under.
        previous_name: LabelName,
        /// `true` when the label was found by alias and renamed.
        renamed: bool,
        /// `true` when any of name, colour, or description differed.
        changed: bool,
    },
}

/// Outcome of reconciling one spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelOutcome {
    /// Canonical name of the reconciled spec.
    pub label: LabelName,
    /// The mutation that was applied.
    #[serde(flatten)]
    pub action: LabelAction,
}

/// Summary of a completed run.
///
/// Only produced when every spec was reconciled; an aborted run yields an
/// error instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Correlation identifier for the run.
    pub run_id: ReconcileRunId,
    /// One entry per spec, in processing order.
    pub outcomes: Vec<LabelOutcome>,
}

impl ReconcileReport {
    /// Number of labels created.
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, LabelAction::Created))
    }

    /// Number of labels updated (including renames).
    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, LabelAction::Updated { .. }))
    }

    /// Number of labels renamed from an alias.
    pub fn renamed(&self) -> usize {
        self.count(|a| matches!(a, LabelAction::Updated { renamed: true, .. }))
    }

    /// Number of updates that left the remote label unchanged.
    pub fn unchanged(&self) -> usize {
        self.count(|a| matches!(a, LabelAction::Updated { changed: false, .. }))
    }

    fn count(&self, pred: impl Fn(&LabelAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}
