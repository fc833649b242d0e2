//! Label file discovery and loading.
//!
//! The label file is a JSON array of label objects:
//!
//! ```json
//! [
//!   { "name": "bug", "color": "d73a4a", "description": "Something isn't working", "aliases": ["defect"] }
//! ]
//! ```
//!
//! A relative `--config` name is searched for in the working directory first,
//! then in `.github/`. The first existing file wins.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use fs_err as fs;
use labels::{LabelName, LabelSpec};
use thiserror::Error;
use tracing::debug;

/// Default label file name.
pub const DEFAULT_CONFIG_NAME: &str = "labels.json";

/// Directories searched, in order, for a relative label file name.
const SEARCH_DIRS: &[&str] = &[".", ".github"];

/// Errors raised while locating, reading, or validating the label file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of the candidate paths exists.
    #[error("label file not found; searched: {}", display_paths(.searched))]
    NotFound {
        /// Every path that was checked, in search order.
        searched: Vec<PathBuf>,
    },

    /// The file exists but could not be read.
    #[error(transparent)]
    Read(#[from] std::io::Error),

    /// The file is not a JSON array of label objects.
    #[error("invalid label file '{}': {source}", .path.display())]
    Parse {
        /// The offending file.
        path: PathBuf,
        /// The JSON error, including line and column.
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed but declares no labels.
    #[error("label file '{}' declares no labels", .path.display())]
    Empty {
        /// The offending file.
        path: PathBuf,
    },

    /// Two labels share a canonical name.
    #[error("label '{name}' is declared more than once")]
    DuplicateName {
        /// The repeated name.
        name: LabelName,
    },

    /// A colour is not six hexadecimal digits.
    #[error("label '{name}' has invalid color '{color}': expected six hex digits without '#'")]
    InvalidColor {
        /// The label carrying the colour.
        name: LabelName,
        /// The rejected colour value.
        color: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Candidate locations for `config`, relative to `base`.
///
/// An absolute `config` is its own single candidate.
pub fn candidate_paths(base: &Path, config: &Path) -> Vec<PathBuf> {
    if config.is_absolute() {
        return vec![config.to_path_buf()];
    }
    SEARCH_DIRS
        .iter()
        .map(|dir| base.join(dir).join(config))
        .collect()
}

/// Returns the first candidate that exists as a regular file.
pub fn find_first_existing(candidates: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    candidates
        .iter()
        .inspect(|p| debug!(path = %p.display(), "checking for label file"))
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| ConfigError::NotFound {
            searched: candidates.to_vec(),
        })
}

/// Reads and validates the label file at `path`.
pub fn load_label_specs(path: &Path) -> Result<Vec<LabelSpec>, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let specs: Vec<LabelSpec> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if specs.is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }
    validate(&specs)?;
    Ok(specs)
}

fn validate(specs: &[LabelSpec]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(&spec.name) {
            return Err(ConfigError::DuplicateName {
                name: spec.name.clone(),
            });
        }
        if !is_hex_color(&spec.color) {
            return Err(ConfigError::InvalidColor {
                name: spec.name.clone(),
                color: spec.color.clone(),
            });
        }
    }
    Ok(())
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 6 && color.bytes().all(|b| b.is_ascii_hexdigit())
}
