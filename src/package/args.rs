//! Build argument parsing.

/// Separator telling the package manager to forward the rest to the script.
pub const ARGS_SEPARATOR: &str = "--";

/// Split `raw` on whitespace into build script arguments.
///
/// Empty or whitespace-only input yields no arguments. Otherwise the tokens
/// are returned in order, preceded by [`ARGS_SEPARATOR`].
///
/// # Examples
///
/// - `""` -> `[]`
/// - `"--prefix-paths"` -> `["--", "--prefix-paths"]`
/// - `"  a   b "` -> `["--", "a", "b"]`
pub fn parse_build_args(raw: &str) -> Vec<String> {
    let tokens: Vec<String> = raw.split_whitespace().map(str::to_owned).collect();
    if tokens.is_empty() {
        return tokens;
    }

    let mut args = Vec::with_capacity(tokens.len() + 1);
    args.push(ARGS_SEPARATOR.to_owned());
    args.extend(tokens);
    args
}
