//! ghlabels CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse arguments**: target repository, label file name, token, API URL.
//! 2. **Wire observability**: configure `tracing-subscriber` (text or JSON on
//!    stderr) and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry
//!    OTLP exporter.
//! 3. **Load the label file**: search `.` then `.github/` for the configured
//!    name and validate its contents.
//! 4. **Construct infrastructure**: build a [`GithubLabelDirectory`] and check
//!    that the repository is reachable before touching any label.
//! 5. **Reconcile**: hand the label set to [`Reconciler`] and report the result.
//!
//! Any error ends the run with a non-zero exit status.

mod config;
mod observability;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use github::{GithubLabelDirectory, GithubSettings, DEFAULT_API_URL};
use labels::{LabelAction, LookupPolicy, Reconciler, RepositoryId, RepositoryProbe};
use tracing::{error, info};

use crate::observability::LogFormat;

/// Create and update GitHub labels from a JSON definition file.
///
/// Labels are matched by name, then by each of their aliases in order; a label
/// found under an alias is renamed. Labels not in the file are left untouched.
#[derive(Debug, Parser)]
#[command(name = "ghlabels", version)]
struct Args {
    /// Target repository in owner/repo format.
    #[arg(value_name = "REPOSITORY")]
    repository: RepositoryId,

    /// Label file name, searched for in the working directory then `.github/`.
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_CONFIG_NAME)]
    config: PathBuf,

    /// GitHub token with write access to the repository's labels.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout.
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    timeout: u64,

    /// Abort when a lookup fails for any reason other than "label not found".
    ///
    /// By default every failed lookup counts as "not found", so a transient API
    /// failure may create a duplicate label or skip an alias.
    #[arg(long)]
    strict_lookups: bool,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = observability::init(args.log_format)?;

    run(args).await.inspect_err(|err| error!(error = %format!("{err:#}"), "run failed"))
}

async fn run(args: Args) -> Result<()> {
    if args.token.trim().is_empty() {
        bail!("GITHUB_TOKEN is empty");
    }

    let base = std::env::current_dir().context("failed to read working directory")?;
    let candidates = config::candidate_paths(&base, &args.config);
    let path = config::find_first_existing(&candidates)?;
    let specs = config::load_label_specs(&path)?;
    info!(path = %path.display(), labels = specs.len(), "loaded label definitions");

    let settings = GithubSettings::new(args.repository.clone(), args.token)
        .with_api_url(args.api_url)
        .with_timeout(Duration::from_secs(args.timeout));
    let directory = GithubLabelDirectory::new(settings).context("failed to configure GitHub client")?;

    directory
        .ensure_repository()
        .await
        .with_context(|| format!("repository {} is not reachable", args.repository))?;

    let policy = if args.strict_lookups {
        LookupPolicy::Strict
    } else {
        LookupPolicy::Lenient
    };
    let report = Reconciler::new(&directory)
        .with_policy(policy)
        .reconcile_all(&specs)
        .await
        .with_context(|| format!("failed to reconcile labels for {}", args.repository))?;

    for outcome in &report.outcomes {
        match &outcome.action {
            LabelAction::Created => info!(label = %outcome.label, "created label"),
            LabelAction::Updated {
                previous_name,
                renamed: true,
                ..
            } => info!(label = %outcome.label, from = %previous_name, "renamed label"),
            LabelAction::Updated { changed, .. } => {
                info!(label = %outcome.label, changed, "updated label")
            }
        }
    }
    info!(
        run_id = %report.run_id,
        repository = %args.repository,
        created = report.created(),
        updated = report.updated(),
        renamed = report.renamed(),
        unchanged = report.unchanged(),
        "labels reconciled"
    );
    Ok(())
}
