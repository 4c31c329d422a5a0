//! Site deployment.
//!
//! Turns the build output directory into a fresh single-commit repository and
//! force-pushes it to the deploy branch.

use crate::config::PublishConfig;
use crate::context::RunContext;
use crate::utils::exec::Invocation;
use std::path::Path;

/// Local branch pushed to the deploy branch.
///
/// Always `master`, whatever `git init` names the initial branch.
pub const SOURCE_BRANCH: &str = "master";

/// Where the build output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl Target {
    pub fn new(ctx: &RunContext, config: &PublishConfig) -> Self {
        Self {
            host: ctx.host.clone(),
            owner: ctx.owner.clone(),
            repo: config.deploy_repo.clone().unwrap_or_else(|| ctx.repo.clone()),
            branch: config.deploy_branch.clone(),
        }
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// HTTPS remote with the token as userinfo. Never log the result.
    pub fn remote_url(&self, token: &str) -> String {
        format!("https://{token}@{}/{}.git", self.host, self.slug())
    }

    /// `master:<branch>`
    pub fn refspec(&self) -> String {
        format!("{SOURCE_BRANCH}:{}", self.branch)
    }
}

/// Message of the deploy commit.
pub fn commit_message(sha: &str) -> String {
    format!("deployed via Gatsby Publish Action 🎩 for {sha}")
}

/// No-reply address for `actor` on `host`.
pub fn noreply_email(actor: &str, host: &str) -> String {
    format!("{actor}@users.noreply.{host}")
}

/// Git commands that publish `output_dir`, in order.
///
/// Only the push carries the token, and it is marked as the invocation's secret.
pub fn publish_commands(
    output_dir: &Path,
    target: &Target,
    ctx: &RunContext,
    token: &str,
) -> Vec<Invocation> {
    let git = |args: Vec<String>| Invocation::new("git", args, output_dir);

    vec![
        git(vec!["init".into()]),
        git(vec!["config".into(), "user.name".into(), ctx.actor.clone()]),
        git(vec![
            "config".into(),
            "user.email".into(),
            noreply_email(&ctx.actor, &target.host),
        ]),
        git(vec!["add".into(), ".".into()]),
        git(vec!["commit".into(), "-m".into(), commit_message(&ctx.sha)]),
        git(vec![
            "push".into(),
            "-f".into(),
            target.remote_url(token),
            target.refspec(),
        ])
        .with_secret(token),
    ]
}
