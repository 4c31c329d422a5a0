//! Node package manager handling.
//!
//! - `manager` - picks `yarn` or `npm` from the lockfile and builds their invocations
//! - `args` - turns the free-form `gatsby-args` input into build arguments

mod args;
mod manager;

pub use args::parse_build_args;
pub use manager::PackageManager;
