//! Optional `[publish]` config file.
//!
//! # Example
//!
//! ```toml
//! [publish]
//! deploy_branch = "gh-pages"       # Target branch
//! deploy_repo = "octocat.github.io" # Target repository (same owner)
//! working_dir = "site"             # Relative to this file
//! build_args = "--prefix-paths"    # Passed to `gatsby build`
//! skip_publish = false             # Build only
//! token_path = "~/.github-token"   # Used when no access-token input is set
//! ```

use super::ConfigError;
use crate::log;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub publish: PublishSection,
}

/// `[publish]` table. Every field is optional; inputs take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSection {
    pub deploy_branch: Option<String>,
    pub deploy_repo: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub build_args: Option<String>,
    pub skip_publish: Option<bool>,
    /// Path to a file containing the access token.
    ///
    /// Store outside the repository; never commit tokens.
    pub token_path: Option<PathBuf>,
}

impl FileConfig {
    /// Load from `path`, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        let base = path.parent().unwrap_or(Path::new(""));
        config.publish.normalize_paths(base);
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), fields.join(", "));
    }
}

impl PublishSection {
    fn normalize_paths(&mut self, base: &Path) {
        if let Some(dir) = self.working_dir.take() {
            self.working_dir = Some(base.join(dir));
        }
        if let Some(token_path) = self.token_path.take() {
            self.token_path = Some(normalize_token_path(&token_path, base));
        }
    }

    /// Read the token file, if configured.
    pub fn read_token(&self) -> Result<Option<String>, ConfigError> {
        let Some(path) = &self.token_path else {
            return Ok(None);
        };
        let token = fs::read_to_string(path).map_err(|err| ConfigError::Io(path.clone(), err))?;
        Ok(Some(token.trim().to_owned()))
    }
}

/// Expand `~` and resolve relative paths against `base`.
fn normalize_token_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
