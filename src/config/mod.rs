//! Run configuration.
//!
//! # Sources
//!
//! | Source                  | Precedence |
//! |-------------------------|------------|
//! | Action inputs / flags   | highest    |
//! | `[publish]` config file | middle     |
//! | Built-in defaults       | lowest     |
//!
//! Inputs are trimmed, and empty ones count as unset: the runner exports every
//! declared input, even the ones the workflow leaves blank.

mod error;
mod file;

pub use error::ConfigError;
pub use file::{FileConfig, PublishSection};

use crate::cli::InputArgs;
use crate::package::parse_build_args;
use std::path::{Path, PathBuf};

/// Branch used when `deploy-branch` is not set.
pub const DEFAULT_DEPLOY_BRANCH: &str = "master";

/// Working directory used when `working-dir` is not set.
pub const DEFAULT_WORKING_DIR: &str = ".";

/// Directory, relative to the working directory, holding the build output.
pub const OUTPUT_DIR: &str = "public";

/// Fully resolved configuration, immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Empty when neither the input nor a token file provided one.
    pub access_token: String,
    pub deploy_branch: String,
    /// `None` publishes to the current repository.
    pub deploy_repo: Option<String>,
    pub working_dir: PathBuf,
    /// Already split and prefixed with `--` when non-empty.
    pub build_args: Vec<String>,
    pub skip_publish: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            deploy_branch: DEFAULT_DEPLOY_BRANCH.to_string(),
            deploy_repo: None,
            working_dir: PathBuf::from(DEFAULT_WORKING_DIR),
            build_args: Vec::new(),
            skip_publish: false,
        }
    }
}

impl PublishConfig {
    /// Merge inputs over the optional config file over defaults.
    pub fn resolve(inputs: &InputArgs, file: Option<&FileConfig>) -> Result<Self, ConfigError> {
        let section = file.map(|f| &f.publish);

        let access_token = match non_empty(inputs.access_token.as_ref()) {
            Some(token) => token,
            None => section
                .map(PublishSection::read_token)
                .transpose()?
                .flatten()
                .unwrap_or_default(),
        };

        let deploy_branch = non_empty(inputs.deploy_branch.as_ref())
            .or_else(|| non_empty(section.and_then(|s| s.deploy_branch.as_ref())))
            .unwrap_or_else(|| DEFAULT_DEPLOY_BRANCH.to_string());

        let deploy_repo = non_empty(inputs.deploy_repo.as_ref())
            .or_else(|| non_empty(section.and_then(|s| s.deploy_repo.as_ref())));

        let working_dir = non_empty_path(inputs.working_dir.as_ref())
            .or_else(|| section.and_then(|s| s.working_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIR));

        let raw_args = non_empty(inputs.gatsby_args.as_ref())
            .or_else(|| non_empty(section.and_then(|s| s.build_args.as_ref())))
            .unwrap_or_default();

        let skip_publish = match non_empty(inputs.skip_publish.as_ref()) {
            Some(flag) => parse_flag(&flag),
            None => section.and_then(|s| s.skip_publish).unwrap_or(false),
        };

        Ok(Self {
            access_token,
            deploy_branch,
            deploy_repo,
            working_dir,
            build_args: parse_build_args(&raw_args),
            skip_publish,
        })
    }

    /// The access token, or [`ConfigError::MissingAccessToken`].
    pub fn require_access_token(&self) -> Result<&str, ConfigError> {
        if self.access_token.is_empty() {
            Err(ConfigError::MissingAccessToken)
        } else {
            Ok(&self.access_token)
        }
    }

    /// `<working-dir>/public`
    pub fn output_dir(&self) -> PathBuf {
        self.working_dir.join(OUTPUT_DIR)
    }

    /// `<working-dir>/<name>`
    pub fn root_join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.working_dir.join(name)
    }

    /// Whether publishing targets the repository the run belongs to.
    pub fn is_same_repo(&self, current_repo: &str) -> bool {
        self.deploy_repo
            .as_deref()
            .is_none_or(|repo| repo == current_repo)
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Like [`non_empty`]; paths that are not UTF-8 are kept untouched.
fn non_empty_path(value: Option<&PathBuf>) -> Option<PathBuf> {
    let path = value?;
    let path = match path.to_str() {
        Some(s) => PathBuf::from(s.trim()),
        None => path.clone(),
    };
    (!path.as_os_str().is_empty()).then_some(path)
}

/// `true` in any letter case; everything else is `false`.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
