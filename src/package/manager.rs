//! Package manager selection.

use crate::utils::exec::Invocation;
use crate::utils::fs::FileProbe;
use anyhow::Result;
use std::{fmt, path::Path};

/// Lockfile whose presence selects `yarn`.
pub const LOCKFILE: &str = "yarn.lock";

/// Node package manager used to install and build the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
}

impl PackageManager {
    /// Pick `yarn` when `<workdir>/yarn.lock` exists, `npm` otherwise.
    pub fn detect(probe: &dyn FileProbe, workdir: &Path) -> Result<Self> {
        let manager = if probe.exists(&workdir.join(LOCKFILE))? {
            Self::Yarn
        } else {
            Self::Npm
        };
        Ok(manager)
    }

    /// Executable name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
        }
    }

    /// `<manager> install` in `workdir`.
    pub fn install(&self, workdir: &Path) -> Invocation {
        Invocation::new(self.as_str(), ["install"], workdir)
    }

    /// `<manager> run build [args...]` in `workdir`.
    ///
    /// `args` are passed through verbatim; see [`super::parse_build_args`].
    pub fn build(&self, workdir: &Path, args: &[String]) -> Invocation {
        let argv = ["run", "build"]
            .into_iter()
            .map(str::to_owned)
            .chain(args.iter().cloned());
        Invocation::new(self.as_str(), argv, workdir)
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
