//! Host-supplied run context.
//!
//! Facts about the triggering workflow run: ref, repository, commit and actor.
//! Read once from the runner environment (or CLI overrides) and passed into
//! the pipeline as a read-only value.

use crate::cli::ContextArgs;
use thiserror::Error;

/// Server used when `GITHUB_SERVER_URL` is not set.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Errors while assembling the run context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("`{0}` is not set; this step must run inside a GitHub Actions workflow")]
    Missing(&'static str),

    #[error("Invalid repository `{0}`, expected `owner/name`")]
    InvalidRepository(String),

    #[error("Invalid server URL `{0}`")]
    InvalidServerUrl(String),
}

/// Read-only facts about the triggering run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Fully qualified ref, e.g. `refs/heads/main`.
    pub git_ref: String,
    pub owner: String,
    pub repo: String,
    /// Commit that triggered the run.
    pub sha: String,
    /// Login of the user that triggered the run.
    pub actor: String,
    /// Git host, e.g. `github.com`.
    pub host: String,
}

impl RunContext {
    /// Build the context from CLI/env values.
    ///
    /// `ContextArgs` already carries the `GITHUB_*` variables through clap's
    /// `env` support, so this only validates and splits them.
    pub fn from_args(args: &ContextArgs) -> Result<Self, ContextError> {
        let git_ref = required(args.git_ref.as_deref(), "GITHUB_REF")?;
        let repository = required(args.repository.as_deref(), "GITHUB_REPOSITORY")?;
        let sha = required(args.sha.as_deref(), "GITHUB_SHA")?;
        let actor = required(args.actor.as_deref(), "GITHUB_ACTOR")?;
        let server_url = args
            .server_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL);

        let (owner, repo) = split_repository(repository)?;

        Ok(Self {
            git_ref: git_ref.to_owned(),
            owner,
            repo,
            sha: sha.to_owned(),
            actor: actor.to_owned(),
            host: host_of(server_url)?,
        })
    }

    /// Whether the run was triggered by a push to `branch`.
    pub fn is_ref_for_branch(&self, branch: &str) -> bool {
        self.git_ref.strip_prefix("refs/heads/") == Some(branch)
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ContextError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ContextError::Missing(name))
}

/// Split `owner/name` into its two parts.
fn split_repository(slug: &str) -> Result<(String, String), ContextError> {
    match slug.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner.to_owned(), name.to_owned()))
        }
        _ => Err(ContextError::InvalidRepository(slug.to_owned())),
    }
}

/// Host (with port, if any) of the server URL.
fn host_of(server_url: &str) -> Result<String, ContextError> {
    let parsed = url::Url::parse(server_url)
        .map_err(|_| ContextError::InvalidServerUrl(server_url.to_owned()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ContextError::InvalidServerUrl(server_url.to_owned()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

#[cfg(test)]
pub(crate) fn test_context(git_ref: &str) -> RunContext {
    RunContext {
        git_ref: git_ref.to_owned(),
        owner: "octocat".to_owned(),
        repo: "blog".to_owned(),
        sha: "3f786850e387550fdab836ed7e6dc881de23001b".to_owned(),
        actor: "octocat".to_owned(),
        host: "github.com".to_owned(),
    }
}
