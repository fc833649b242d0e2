//! ghlabels GitHub infrastructure adapter.
//!
//! Implements the [`labels::LabelDirectory`] and [`labels::RepositoryProbe`]
//! traits defined in the [`labels`] crate on top of the GitHub REST API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain matching rules.
//! All GitHub API details (authentication, URL encoding of label names,
//! status-code interpretation) are handled here; the [`labels`] crate never
//! sees them.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Precondition | `GET /repos/{owner}/{repo}` |
//! | Lookup | `GET /repos/{owner}/{repo}/labels/{name}` |
//! | Create | `POST /repos/{owner}/{repo}/labels` |
//! | Update / rename | `PATCH /repos/{owner}/{repo}/labels/{current_name}` |
//!
//! A `404` on lookup is the only response mapped to
//! [`labels::LookupError::NotFound`]; everything else that is not a success
//! becomes [`labels::LookupError::Unavailable`].

mod client;
mod settings;

pub use client::GithubLabelDirectory;
pub use settings::{GithubSettings, GithubSetupError, API_VERSION, DEFAULT_API_URL};
