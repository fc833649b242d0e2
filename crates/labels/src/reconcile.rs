//! The reconciliation engine.
//!
//! For each [`LabelSpec`], in the order given:
//!
//! 1. look the label up by its canonical name;
//! 2. if absent, try each alias in order and stop at the first hit;
//! 3. on a match, issue one update addressed by the matched name that renames
//!    the label to its canonical name and overwrites colour and description;
//! 4. otherwise issue one create.
//!
//! Specs are processed strictly one after another. The first failure ends the
//! run: earlier mutations stay applied and later specs are never attempted.

use tracing::{debug, instrument, Instrument};

use crate::{
    LabelAction, LabelChange, LabelDirectory, LabelMatch, LabelName, LabelOutcome, LabelSpec,
    LabelUpdate, LookupError, NewLabel, ReconcileError, ReconcileReport, ReconcileRunId,
    RemoteLabel,
};

/// How lookup failures other than "not found" are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupPolicy {
    /// Every lookup failure is treated as "not found". A transient failure can
    /// therefore skip an alias or cause a duplicate label to be created.
    #[default]
    Lenient,

    /// Only a positive "not found" advances to the next alias or to creation.
    /// Any other lookup failure aborts the run.
    Strict,
}

/// Brings remote labels into agreement with a set of [`LabelSpec`]s.
#[derive(Debug)]
pub struct Reconciler<D> {
    directory: D,
    policy: LookupPolicy,
}

impl<D: LabelDirectory> Reconciler<D> {
    /// Creates a reconciler using [`LookupPolicy::Lenient`].
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            policy: LookupPolicy::default(),
        }
    }

    /// Replaces the lookup policy.
    #[must_use]
    pub fn with_policy(mut self, policy: LookupPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reconciles every spec in order, stopping at the first error.
    pub async fn reconcile_all(
        &self,
        specs: &[LabelSpec],
    ) -> Result<ReconcileReport, ReconcileError> {
        if specs.is_empty() {
            return Err(ReconcileError::NoLabels);
        }

        let run_id = ReconcileRunId::new_random();
        let span = tracing::info_span!(
            "reconcile_run",
            run_id = %run_id,
            labels = specs.len(),
            policy = ?self.policy,
        );

        async {
            let mut outcomes = Vec::with_capacity(specs.len());
            for spec in specs {
                outcomes.push(self.reconcile_label(spec).await?);
            }
            Ok::<_, ReconcileError>(ReconcileReport { run_id, outcomes })
        }
        .instrument(span)
        .await
    }

    /// Reconciles a single spec with at most one create or update call.
    #[instrument(skip_all, fields(label = %spec.name))]
    pub async fn reconcile_label(&self, spec: &LabelSpec) -> Result<LabelOutcome, ReconcileError> {
        let found = self.resolve(spec).await?;
        let action = match plan(spec, found.as_ref()) {
            LabelChange::Create(new_label) => {
                debug!("no existing label matched; creating");
                self.directory
                    .create_label(&new_label)
                    .await
                    .map_err(|source| ReconcileError::Create {
                        label: spec.name.clone(),
                        source,
                    })?;
                LabelAction::Created
            }
            LabelChange::Update {
                current_name,
                update,
            } => {
                let changed = found
                    .as_ref()
                    .is_some_and(|m| !spec.is_satisfied_by(&m.remote));
                debug!(%current_name, changed, "updating existing label");
                self.directory
                    .update_label(&current_name, &update)
                    .await
                    .map_err(|source| ReconcileError::Update {
                        label: spec.name.clone(),
                        current_name: current_name.clone(),
                        source,
                    })?;
                LabelAction::Updated {
                    renamed: current_name != spec.name,
                    previous_name: current_name,
                    changed,
                }
            }
        };

        Ok(LabelOutcome {
            label: spec.name.clone(),
            action,
        })
    }

    /// Finds the remote label representing `spec`, trying the canonical name
    /// first and then each alias in order. The first hit wins.
    pub async fn resolve(&self, spec: &LabelSpec) -> Result<Option<LabelMatch>, ReconcileError> {
        let candidates = std::iter::once((&spec.name, false))
            .chain(spec.aliases.iter().map(|alias| (alias, true)));

        for (name, by_alias) in candidates {
            if let Some(remote) = self.lookup(spec, name).await? {
                debug!(matched = %name, by_alias, "found existing label");
                return Ok(Some(LabelMatch {
                    matched_name: name.clone(),
                    remote,
                    by_alias,
                }));
            }
        }

        Ok(None)
    }

    async fn lookup(
        &self,
        spec: &LabelSpec,
        name: &LabelName,
    ) -> Result<Option<RemoteLabel>, ReconcileError> {
        match self.directory.get_label(name).await {
            Ok(remote) => Ok(Some(remote)),
            Err(LookupError::NotFound { .. }) => Ok(None),
            Err(err) => match self.policy {
                LookupPolicy::Lenient => {
                    debug!(%name, error = %err, "lookup failed; treating as not found");
                    Ok(None)
                }
                LookupPolicy::Strict => Err(ReconcileError::Lookup {
                    label: spec.name.clone(),
                    source: err,
                }),
            },
        }
    }
}

/// Chooses the mutation for `spec` given the result of resolving it.
///
/// Aliases never reach the remote: they only drive matching.
pub fn plan(spec: &LabelSpec, found: Option<&LabelMatch>) -> LabelChange {
    match found {
        None => LabelChange::Create(NewLabel {
            name: spec.name.clone(),
            color: spec.color.clone(),
            description: spec.description.clone(),
        }),
        Some(m) => LabelChange::Update {
            current_name: m.matched_name.clone(),
            update: LabelUpdate {
                new_name: spec.name.clone(),
                color: spec.color.clone(),
                description: spec.description.clone(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::DirectoryError;

    fn name(s: &str) -> LabelName {
        LabelName::new(s).unwrap()
    }

    fn remote(n: &str, color: &str, description: &str) -> RemoteLabel {
        RemoteLabel {
            name: name(n),
            color: color.into(),
            description: description.into(),
        }
    }

    fn bug_spec() -> LabelSpec {
        LabelSpec::new(name("bug"), "ff0000")
            .with_description("A bug")
            .with_alias(name("defect"))
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Get(String),
        Create(NewLabel),
        Update(String, LabelUpdate),
    }

    /// In-memory directory that records every call.
    #[derive(Default)]
    struct RecordingDirectory {
        labels: Mutex<BTreeMap<String, RemoteLabel>>,
        calls: Mutex<Vec<Call>>,
        unavailable: HashSet<String>,
        fail_mutations_for: HashSet<String>,
    }

    impl RecordingDirectory {
        fn with_labels(labels: impl IntoIterator<Item = RemoteLabel>) -> Self {
            let dir = Self::default();
            {
                let mut map = dir.labels.lock().unwrap();
                for label in labels {
                    map.insert(label.name.to_string(), label);
                }
            }
            dir
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn mutations(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| !matches!(c, Call::Get(_)))
                .collect()
        }

        fn snapshot(&self) -> BTreeMap<String, RemoteLabel> {
            self.labels.lock().unwrap().clone()
        }

        fn reject(&self, label: &str) -> Result<(), DirectoryError> {
            if self.fail_mutations_for.contains(label) {
                Err(DirectoryError::Api {
                    status: 422,
                    message: "Validation Failed".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl LabelDirectory for RecordingDirectory {
        async fn get_label(&self, name: &LabelName) -> Result<RemoteLabel, LookupError> {
            self.calls.lock().unwrap().push(Call::Get(name.to_string()));
            if self.unavailable.contains(name.as_str()) {
                return Err(LookupError::Unavailable {
                    name: name.clone(),
                    message: "502 Bad Gateway".into(),
                });
            }
            self.labels
                .lock()
                .unwrap()
                .get(name.as_str())
                .cloned()
                .ok_or_else(|| LookupError::NotFound { name: name.clone() })
        }

        async fn create_label(&self, label: &NewLabel) -> Result<RemoteLabel, DirectoryError> {
            self.calls.lock().unwrap().push(Call::Create(label.clone()));
            self.reject(label.name.as_str())?;
            let created = RemoteLabel {
                name: label.name.clone(),
                color: label.color.clone(),
                description: label.description.clone(),
            };
            self.labels
                .lock()
                .unwrap()
                .insert(label.name.to_string(), created.clone());
            Ok(created)
        }

        async fn update_label(
            &self,
            current_name: &LabelName,
            update: &LabelUpdate,
        ) -> Result<RemoteLabel, DirectoryError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(current_name.to_string(), update.clone()));
            self.reject(update.new_name.as_str())?;
            let mut labels = self.labels.lock().unwrap();
            labels
                .remove(current_name.as_str())
                .ok_or(DirectoryError::Api {
                    status: 404,
                    message: "Not Found".into(),
                })?;
            let updated = RemoteLabel {
                name: update.new_name.clone(),
                color: update.color.clone(),
                description: update.description.clone(),
            };
            labels.insert(update.new_name.to_string(), updated.clone());
            Ok(updated)
        }
    }

    fn update_call(current: &str, new_name: &str, color: &str, description: &str) -> Call {
        Call::Update(
            current.into(),
            LabelUpdate {
                new_name: name(new_name),
                color: color.into(),
                description: description.into(),
            },
        )
    }

    #[tokio::test]
    async fn creates_when_name_and_aliases_are_absent() {
        let dir = RecordingDirectory::default();
        let outcome = Reconciler::new(&dir)
            .reconcile_label(&bug_spec())
            .await
            .unwrap();

        assert_eq!(outcome.action, LabelAction::Created);
        assert_eq!(
            dir.calls(),
            vec![
                Call::Get("bug".into()),
                Call::Get("defect".into()),
                Call::Create(NewLabel {
                    name: name("bug"),
                    color: "ff0000".into(),
                    description: "A bug".into(),
                }),
            ]
        );
    }

    #[tokio::test]
    async fn updates_in_place_when_canonical_name_exists() {
        let dir = RecordingDirectory::with_labels([
            remote("bug", "00ff00", ""),
            remote("defect", "ffffff", ""),
        ]);
        let outcome = Reconciler::new(&dir)
            .reconcile_label(&bug_spec())
            .await
            .unwrap();

        assert_eq!(
            outcome.action,
            LabelAction::Updated {
                previous_name: name("bug"),
                renamed: false,
                changed: true,
            }
        );
        // Aliases are not consulted once the canonical name resolves.
        assert_eq!(
            dir.calls(),
            vec![
                Call::Get("bug".into()),
                update_call("bug", "bug", "ff0000", "A bug"),
            ]
        );
        assert!(dir.snapshot().contains_key("defect"));
    }

    #[tokio::test]
    async fn renames_label_found_by_alias() {
        let dir = RecordingDirectory::with_labels([remote("defect", "ffffff", "")]);
        let outcome = Reconciler::new(&dir)
            .reconcile_label(&bug_spec())
            .await
            .unwrap();

        assert_eq!(
            outcome.action,
            LabelAction::Updated {
                previous_name: name("defect"),
                renamed: true,
                changed: true,
            }
        );
        assert_eq!(
            dir.mutations(),
            vec![update_call("defect", "bug", "ff0000", "A bug")]
        );
        assert_eq!(
            dir.snapshot().into_values().collect::<Vec<_>>(),
            vec![remote("bug", "ff0000", "A bug")]
        );
    }

    #[tokio::test]
    async fn first_resolving_alias_wins() {
        let spec = LabelSpec::new(name("bug"), "ff0000")
            .with_alias(name("missing"))
            .with_alias(name("defect"))
            .with_alias(name("kind/bug"));
        let dir = RecordingDirectory::with_labels([
            remote("defect", "ffffff", ""),
            remote("kind/bug", "000000", ""),
        ]);

        Reconciler::new(&dir).reconcile_label(&spec).await.unwrap();

        assert_eq!(
            dir.calls(),
            vec![
                Call::Get("bug".into()),
                Call::Get("missing".into()),
                Call::Get("defect".into()),
                update_call("defect", "bug", "ff0000", ""),
            ]
        );
        assert_eq!(dir.snapshot()["kind/bug"], remote("kind/bug", "000000", ""));
    }

    #[tokio::test]
    async fn second_run_reports_no_drift() {
        let dir = RecordingDirectory::with_labels([remote("defect", "ffffff", "")]);
        let reconciler = Reconciler::new(&dir);
        let specs = [bug_spec()];

        reconciler.reconcile_all(&specs).await.unwrap();
        let after_first = dir.snapshot();
        let second = reconciler.reconcile_all(&specs).await.unwrap();

        assert_eq!(dir.snapshot(), after_first);
        assert_eq!(
            second.outcomes[0].action,
            LabelAction::Updated {
                previous_name: name("bug"),
                renamed: false,
                changed: false,
            }
        );
        assert_eq!(
            dir.mutations().last(),
            Some(&update_call("bug", "bug", "ff0000", "A bug"))
        );
    }

    #[tokio::test]
    async fn upper_case_colour_matching_remote_is_not_drift() {
        let dir = RecordingDirectory::with_labels([remote("bug", "d73a4a", "")]);
        let spec = LabelSpec::new(name("bug"), "D73A4A");

        let outcome = Reconciler::new(&dir).reconcile_label(&spec).await.unwrap();

        assert_eq!(
            outcome.action,
            LabelAction::Updated {
                previous_name: name("bug"),
                renamed: false,
                changed: false,
            }
        );
    }

    #[tokio::test]
    async fn mutation_failure_stops_the_run_without_rollback() {
        let mut dir = RecordingDirectory::default();
        dir.fail_mutations_for.insert("second".into());
        let specs = [
            LabelSpec::new(name("first"), "111111"),
            LabelSpec::new(name("second"), "222222"),
            LabelSpec::new(name("third"), "333333"),
        ];

        let err = Reconciler::new(&dir)
            .reconcile_all(&specs)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Create { ref label, .. } if label == "second"
        ));
        let labels = dir.snapshot();
        assert!(labels.contains_key("first"));
        assert!(!labels.contains_key("third"));
        assert!(!dir.calls().contains(&Call::Get("third".into())));
    }

    #[tokio::test]
    async fn update_failure_reports_matched_name() {
        let mut dir = RecordingDirectory::with_labels([remote("defect", "ffffff", "")]);
        dir.fail_mutations_for.insert("bug".into());

        let err = Reconciler::new(&dir)
            .reconcile_label(&bug_spec())
            .await
            .unwrap_err();

        match err {
            ReconcileError::Update {
                label,
                current_name,
                ..
            } => {
                assert_eq!(label, "bug");
                assert_eq!(current_name, "defect");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_spec_set_is_rejected() {
        let dir = RecordingDirectory::default();
        let err = Reconciler::new(&dir).reconcile_all(&[]).await.unwrap_err();
        assert!(matches!(err, ReconcileError::NoLabels));
        assert!(dir.calls().is_empty());
    }

    #[tokio::test]
    async fn strict_policy_aborts_on_unavailable_lookup() {
        let mut dir = RecordingDirectory::with_labels([remote("defect", "ffffff", "")]);
        dir.unavailable.insert("bug".into());

        let err = Reconciler::new(&dir)
            .with_policy(LookupPolicy::Strict)
            .reconcile_label(&bug_spec())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Lookup { source: LookupError::Unavailable { .. }, .. }
        ));
        assert_eq!(dir.calls(), vec![Call::Get("bug".into())]);
    }

    #[tokio::test]
    async fn default_policy_creates_when_lookup_is_unavailable() {
        let mut dir = RecordingDirectory::default();
        dir.unavailable.insert("bug".into());
        let spec = LabelSpec::new(name("bug"), "ff0000");

        let outcome = Reconciler::new(&dir).reconcile_label(&spec).await.unwrap();

        assert_eq!(outcome.action, LabelAction::Created);
        assert_eq!(
            dir.mutations(),
            vec![Call::Create(NewLabel {
                name: name("bug"),
                color: "ff0000".into(),
                description: String::new(),
            })]
        );
    }

    #[tokio::test]
    async fn lenient_policy_treats_unavailable_lookup_as_absent() {
        let mut dir = RecordingDirectory::with_labels([remote("defect", "ffffff", "")]);
        dir.unavailable.insert("bug".into());

        let outcome = Reconciler::new(&dir)
            .with_policy(LookupPolicy::Lenient)
            .reconcile_label(&bug_spec())
            .await
            .unwrap();

        assert!(matches!(
            outcome.action,
            LabelAction::Updated { renamed: true, .. }
        ));
        assert_eq!(
            dir.mutations(),
            vec![update_call("defect", "bug", "ff0000", "A bug")]
        );
    }

    #[tokio::test]
    async fn lenient_policy_creates_when_every_lookup_fails() {
        let mut dir = RecordingDirectory::default();
        dir.unavailable.insert("bug".into());
        dir.unavailable.insert("defect".into());

        let outcome = Reconciler::new(&dir)
            .with_policy(LookupPolicy::Lenient)
            .reconcile_label(&bug_spec())
            .await
            .unwrap();

        assert_eq!(outcome.action, LabelAction::Created);
    }

    #[test]
    fn plan_never_sends_aliases() {
        let spec = bug_spec();
        let found = LabelMatch {
            matched_name: name("defect"),
            remote: remote("defect", "ffffff", ""),
            by_alias: true,
        };
        assert_eq!(
            plan(&spec, Some(&found)),
            LabelChange::Update {
                current_name: name("defect"),
                update: LabelUpdate {
                    new_name: name("bug"),
                    color: "ff0000".into(),
                    description: "A bug".into(),
                },
            }
        );
        assert_eq!(
            plan(&spec, None),
            LabelChange::Create(NewLabel {
                name: name("bug"),
                color: "ff0000".into(),
                description: "A bug".into(),
            })
        );
    }

    #[tokio::test]
    async fn scenario_c_overwrites_colour_of_canonical_label() {
        let dir = RecordingDirectory::with_labels([remote("bug", "00ff00", "")]);
        let spec = LabelSpec::new(name("bug"), "ff0000");

        Reconciler::new(&dir).reconcile_label(&spec).await.unwrap();

        assert_eq!(dir.mutations(), vec![update_call("bug", "bug", "ff0000", "")]);
    }
}
