//! Command-line interface definitions.
//!
//! Every input doubles as the environment variable the Actions runner sets for
//! it (`INPUT_<NAME>`), so the binary works both as an action entrypoint and
//! from a shell.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Build a Gatsby site and publish it to a branch
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional config file with a `[publish]` table
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub inputs: InputArgs,

    #[command(flatten)]
    pub context: ContextArgs,
}

/// Action inputs.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Personal access token used to push the build output
    #[arg(long, env = "INPUT_ACCESS-TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Branch that receives the build output [default: master]
    #[arg(long, env = "INPUT_DEPLOY-BRANCH")]
    pub deploy_branch: Option<String>,

    /// Repository (under the same owner) that receives the build output
    #[arg(long, env = "INPUT_DEPLOY-REPO")]
    pub deploy_repo: Option<String>,

    /// Root of the site; build output is expected in `<dir>/public` [default: .]
    #[arg(long, env = "INPUT_WORKING-DIR", value_hint = clap::ValueHint::DirPath)]
    pub working_dir: Option<PathBuf>,

    /// Extra arguments passed to `gatsby build`, whitespace separated
    #[arg(long, env = "INPUT_GATSBY-ARGS", allow_hyphen_values = true)]
    pub gatsby_args: Option<String>,

    /// Build only, do not publish (`true` in any letter case)
    #[arg(long, env = "INPUT_SKIP-PUBLISH")]
    pub skip_publish: Option<String>,
}

/// Facts about the triggering run, normally set by the runner.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// Ref that triggered the run (e.g. refs/heads/main)
    #[arg(long = "ref", env = "GITHUB_REF")]
    pub git_ref: Option<String>,

    /// Current repository as `owner/name`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Commit that triggered the run
    #[arg(long, env = "GITHUB_SHA")]
    pub sha: Option<String>,

    /// Login of the user that triggered the run
    #[arg(long, env = "GITHUB_ACTOR")]
    pub actor: Option<String>,

    /// Base URL of the git server
    #[arg(long, env = "GITHUB_SERVER_URL", value_hint = clap::ValueHint::Url)]
    pub server_url: Option<String>,
}
