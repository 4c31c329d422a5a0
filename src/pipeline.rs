//! Install → build → augment → publish.
//!
//! A run is a straight line with two early exits, both modelled as
//! [`Outcome`] variants:
//!
//! ```text
//! token? ──► loop guard ──► install ──► build ──► copy extras ──► skip? ──► publish
//!              │                                                  │           │
//!              ▼                                                  ▼           ▼
//!        NothingToDeploy                                        Built     Published
//! ```
//!
//! The first failing step aborts the run. Nothing is rolled back.

use crate::config::PublishConfig;
use crate::context::RunContext;
use crate::deploy::{self, Target};
use crate::log;
use crate::package::PackageManager;
use crate::utils::exec::ProcessRunner;
use crate::utils::fs::FileProbe;
use anyhow::Result;

/// Terminal state of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Triggered by a push to the deploy branch of the same repository.
    NothingToDeploy,
    /// Built and augmented, publish skipped on request.
    Built,
    /// Build output force-pushed to `target`.
    Published(Target),
}

/// Copied from the working directory into the build output when present.
#[derive(Debug, Clone, Copy)]
struct Extra {
    name: &'static str,
    label: &'static str,
    recursive: bool,
}

const EXTRAS: &[Extra] = &[
    Extra {
        name: "CNAME",
        label: "CNAME",
        recursive: false,
    },
    Extra {
        name: ".github",
        label: "GitHub Actions",
        recursive: true,
    },
    Extra {
        name: "firebase.json",
        label: "Firebase",
        recursive: false,
    },
];

/// One run over injected collaborators.
pub struct Pipeline<'a> {
    config: &'a PublishConfig,
    ctx: &'a RunContext,
    runner: &'a dyn ProcessRunner,
    probe: &'a dyn FileProbe,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a PublishConfig,
        ctx: &'a RunContext,
        runner: &'a dyn ProcessRunner,
        probe: &'a dyn FileProbe,
    ) -> Self {
        Self {
            config,
            ctx,
            runner,
            probe,
        }
    }

    pub fn run(&self) -> Result<Outcome> {
        let token = self.config.require_access_token()?;

        if self.triggered_by_deploy_branch() {
            log!("guard"; "Triggered by branch used to deploy: {}.", self.ctx.git_ref);
            log!("guard"; "Nothing to deploy.");
            return Ok(Outcome::NothingToDeploy);
        }

        let manager = self.install()?;
        self.build(manager)?;
        self.copy_extras()?;

        if self.config.skip_publish {
            log!("done"; "Building completed successfully - skipping publish");
            return Ok(Outcome::Built);
        }

        self.publish(token).map(Outcome::Published)
    }

    /// Deploy commits land on the deploy branch; rebuilding them would loop.
    fn triggered_by_deploy_branch(&self) -> bool {
        self.config.is_same_repo(&self.ctx.repo)
            && self.ctx.is_ref_for_branch(&self.config.deploy_branch)
    }

    fn install(&self) -> Result<PackageManager> {
        let workdir = &self.config.working_dir;
        let manager = PackageManager::detect(self.probe, workdir)?;

        log!("install"; "Installing your site's dependencies using {manager}.");
        self.runner.run(&manager.install(workdir))?;
        log!("install"; "Finished installing dependencies.");
        Ok(manager)
    }

    fn build(&self, manager: PackageManager) -> Result<()> {
        let invocation = manager.build(&self.config.working_dir, &self.config.build_args);

        log!("build"; "Ready to build your Gatsby site!");
        log!("build"; "Building with: {invocation}");
        self.runner.run(&invocation)?;
        log!("build"; "Finished building your site.");
        Ok(())
    }

    fn copy_extras(&self) -> Result<()> {
        let output_dir = self.config.output_dir();

        for extra in EXTRAS {
            let from = self.config.root_join(extra.name);
            if !self.probe.exists(&from)? {
                continue;
            }

            let to = output_dir.join(extra.name);
            log!("copy"; "Copying {} over.", extra.label);
            if extra.recursive {
                self.probe.copy_dir(&from, &to)?;
            } else {
                self.probe.copy_file(&from, &to)?;
            }
            log!("copy"; "Finished copying {}.", extra.name);
        }
        Ok(())
    }

    fn publish(&self, token: &str) -> Result<Target> {
        let target = Target::new(self.ctx, self.config);

        log!("deploy"; "Ready to deploy your new shiny site!");
        log!("deploy"; "Deploying to repo: {} and branch: {}", target.slug(), target.branch);
        log!("deploy"; "You can configure the deploy branch by setting the `deploy-branch` input for this action.");

        let output_dir = self.config.output_dir();
        for invocation in deploy::publish_commands(&output_dir, &target, self.ctx, token) {
            self.runner.run(&invocation)?;
        }

        log!("deploy"; "Finished deploying your site.");
        log!("done"; "Enjoy! ✨");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::context::test_context;
    use crate::utils::exec::Invocation;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    // ------------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------------

    /// Records invocations; fails the first one whose display starts with `fail_on`.
    #[derive(Default)]
    struct FakeRunner {
        calls: RefCell<Vec<Invocation>>,
        fail_on: Option<&'static str>,
    }

    impl FakeRunner {
        fn failing_on(prefix: &'static str) -> Self {
            Self {
                fail_on: Some(prefix),
                ..Default::default()
            }
        }

        fn shown(&self) -> Vec<String> {
            self.calls.borrow().iter().map(ToString::to_string).collect()
        }
    }

    impl ProcessRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            self.calls.borrow_mut().push(invocation.clone());
            if let Some(prefix) = self.fail_on
                && invocation.to_string().starts_with(prefix)
            {
                bail!("Command `{}` failed with exit status: 1", invocation.program);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFs {
        existing: HashSet<PathBuf>,
        copies: RefCell<Vec<(PathBuf, PathBuf, bool)>>,
        broken: bool,
    }

    impl FakeFs {
        fn with(paths: &[&str]) -> Self {
            Self {
                existing: paths.iter().map(PathBuf::from).collect(),
                ..Default::default()
            }
        }
    }

    impl FileProbe for FakeFs {
        fn exists(&self, path: &Path) -> Result<bool> {
            if self.broken {
                bail!("Failed to stat {}", path.display());
            }
            Ok(self.existing.contains(path))
        }

        fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
            self.copies
                .borrow_mut()
                .push((from.to_path_buf(), to.to_path_buf(), false));
            Ok(())
        }

        fn copy_dir(&self, from: &Path, to: &Path) -> Result<()> {
            self.copies
                .borrow_mut()
                .push((from.to_path_buf(), to.to_path_buf(), true));
            Ok(())
        }
    }

    fn config(token: &str) -> PublishConfig {
        PublishConfig {
            access_token: token.to_string(),
            ..Default::default()
        }
    }

    fn run(
        config: &PublishConfig,
        git_ref: &str,
        runner: &FakeRunner,
        fs: &FakeFs,
    ) -> Result<Outcome> {
        let ctx = test_context(git_ref);
        Pipeline::new(config, &ctx, runner, fs).run()
    }

    // ------------------------------------------------------------------------
    // Early exits
    // ------------------------------------------------------------------------

    #[test]
    fn test_missing_token_spawns_nothing() {
        let runner = FakeRunner::default();
        let fs = FakeFs::default();

        let err = run(&config(""), "refs/heads/feature", &runner, &fs).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingAccessToken)
        ));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_token_checked_before_loop_guard() {
        let runner = FakeRunner::default();
        let err = run(&config(""), "refs/heads/master", &runner, &FakeFs::default()).unwrap_err();
        assert!(err.to_string().contains("access token"));
    }

    #[test]
    fn test_loop_guard_same_repo() {
        // Scenario B
        let runner = FakeRunner::default();
        let outcome =
            run(&config("tok"), "refs/heads/master", &runner, &FakeFs::default()).unwrap();

        assert_eq!(outcome, Outcome::NothingToDeploy);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_loop_guard_explicit_same_repo() {
        let runner = FakeRunner::default();
        let config = PublishConfig {
            deploy_repo: Some("blog".into()),
            deploy_branch: "gh-pages".into(),
            ..config("tok")
        };

        let outcome = run(&config, "refs/heads/gh-pages", &runner, &FakeFs::default()).unwrap();

        assert_eq!(outcome, Outcome::NothingToDeploy);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_loop_guard_ignores_other_repo() {
        let runner = FakeRunner::default();
        let config = PublishConfig {
            deploy_repo: Some("octocat.github.io".into()),
            ..config("tok")
        };

        let outcome = run(&config, "refs/heads/master", &runner, &FakeFs::default()).unwrap();

        assert!(matches!(outcome, Outcome::Published(_)));
        assert!(!runner.calls.borrow().is_empty());
    }

    // ------------------------------------------------------------------------
    // Full runs
    // ------------------------------------------------------------------------

    #[test]
    fn test_scenario_default_publish() {
        // Scenario A
        let runner = FakeRunner::default();
        let fs = FakeFs::default();

        let outcome = run(&config("tok"), "refs/heads/feature", &runner, &fs).unwrap();

        assert_eq!(
            runner.shown(),
            [
                "npm install",
                "npm run build",
                "git init",
                "git config user.name octocat",
                "git config user.email octocat@users.noreply.github.com",
                "git add .",
                "git commit -m deployed via Gatsby Publish Action 🎩 for 3f786850e387550fdab836ed7e6dc881de23001b",
                "git push -f https://***@github.com/octocat/blog.git master:master",
            ]
        );

        let calls = runner.calls.borrow();
        assert_eq!(calls[0].cwd, PathBuf::from("."));
        assert_eq!(calls[1].cwd, PathBuf::from("."));
        assert!(calls[2..].iter().all(|c| c.cwd == PathBuf::from("./public")));
        assert!(calls[7].args.iter().any(|a| a.contains("tok")));

        assert!(fs.copies.borrow().is_empty());
        match outcome {
            Outcome::Published(target) => {
                assert_eq!(target.slug(), "octocat/blog");
                assert_eq!(target.branch, "master");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_scenario_yarn_skip_publish() {
        // Scenario C
        let runner = FakeRunner::default();
        let fs = FakeFs::with(&["./yarn.lock"]);
        let config = PublishConfig {
            skip_publish: true,
            ..config("tok")
        };

        let outcome = run(&config, "refs/heads/feature", &runner, &fs).unwrap();

        assert_eq!(outcome, Outcome::Built);
        assert_eq!(runner.shown(), ["yarn install", "yarn run build"]);
    }

    #[test]
    fn test_build_args_forwarded() {
        let runner = FakeRunner::default();
        let config = PublishConfig {
            build_args: vec!["--".into(), "--prefix-paths".into()],
            skip_publish: true,
            ..config("tok")
        };

        run(&config, "refs/heads/feature", &runner, &FakeFs::default()).unwrap();

        assert_eq!(runner.shown()[1], "npm run build -- --prefix-paths");
    }

    #[test]
    fn test_custom_working_dir_and_target() {
        let runner = FakeRunner::default();
        let config = PublishConfig {
            working_dir: PathBuf::from("site"),
            deploy_repo: Some("octocat.github.io".into()),
            deploy_branch: "gh-pages".into(),
            ..config("tok")
        };

        run(&config, "refs/heads/main", &runner, &FakeFs::default()).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls[0].cwd, PathBuf::from("site"));
        let push = calls.last().unwrap();
        assert_eq!(push.cwd, PathBuf::from("site/public"));
        assert_eq!(
            push.args,
            [
                "push",
                "-f",
                "https://tok@github.com/octocat/octocat.github.io.git",
                "master:gh-pages"
            ]
        );
    }

    // ------------------------------------------------------------------------
    // Extras
    // ------------------------------------------------------------------------

    #[test]
    fn test_copies_all_extras() {
        let runner = FakeRunner::default();
        let fs = FakeFs::with(&["site/CNAME", "site/.github", "site/firebase.json"]);
        let config = PublishConfig {
            working_dir: PathBuf::from("site"),
            skip_publish: true,
            ..config("tok")
        };

        run(&config, "refs/heads/feature", &runner, &fs).unwrap();

        assert_eq!(
            *fs.copies.borrow(),
            [
                (PathBuf::from("site/CNAME"), PathBuf::from("site/public/CNAME"), false),
                (PathBuf::from("site/.github"), PathBuf::from("site/public/.github"), true),
                (
                    PathBuf::from("site/firebase.json"),
                    PathBuf::from("site/public/firebase.json"),
                    false
                ),
            ]
        );
    }

    #[test]
    fn test_copies_only_existing_extras() {
        let runner = FakeRunner::default();
        let fs = FakeFs::with(&["./firebase.json"]);

        run(&config("tok"), "refs/heads/feature", &runner, &fs).unwrap();

        assert_eq!(
            *fs.copies.borrow(),
            [(
                PathBuf::from("./firebase.json"),
                PathBuf::from("./public/firebase.json"),
                false
            )]
        );
    }

    // ------------------------------------------------------------------------
    // Failures
    // ------------------------------------------------------------------------

    #[test]
    fn test_install_failure_stops_run() {
        let runner = FakeRunner::failing_on("npm install");
        let err =
            run(&config("tok"), "refs/heads/feature", &runner, &FakeFs::default()).unwrap_err();

        assert!(err.to_string().contains("npm"));
        assert_eq!(runner.shown(), ["npm install"]);
    }

    #[test]
    fn test_build_failure_skips_copy_and_publish() {
        let runner = FakeRunner::failing_on("npm run build");
        let fs = FakeFs::with(&["./CNAME"]);

        run(&config("tok"), "refs/heads/feature", &runner, &fs).unwrap_err();

        assert_eq!(runner.shown(), ["npm install", "npm run build"]);
        assert!(fs.copies.borrow().is_empty());
    }

    #[test]
    fn test_git_failure_stops_publish() {
        let runner = FakeRunner::failing_on("git commit");

        run(&config("tok"), "refs/heads/feature", &runner, &FakeFs::default()).unwrap_err();

        let shown = runner.shown();
        assert!(shown.last().unwrap().starts_with("git commit"));
        assert!(!shown.iter().any(|c| c.starts_with("git push")));
    }

    #[test]
    fn test_probe_failure_stops_before_install() {
        let runner = FakeRunner::default();
        let fs = FakeFs {
            broken: true,
            ..Default::default()
        };

        let err = run(&config("tok"), "refs/heads/feature", &runner, &fs).unwrap_err();

        assert!(err.to_string().contains("Failed to stat"));
        assert!(runner.calls.borrow().is_empty());
    }
}
