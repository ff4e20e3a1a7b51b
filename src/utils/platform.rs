//! Platform helpers: home directory lookup and `~`/environment expansion.

use anyhow::Result;
use std::path::PathBuf;

/// Returns true on Windows targets.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Get the home directory path for the current user.
///
/// Falls back to an error with a platform-specific hint when neither `HOME`
/// nor `USERPROFILE` can be resolved.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Directory holding steward's own files (config, state) by default.
///
/// - Unix/macOS: `~/.bedrock-steward`
/// - Windows: `%LOCALAPPDATA%\bedrock-steward`
pub fn default_data_dir() -> Result<PathBuf> {
    if is_windows() {
        Ok(dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
            .join("bedrock-steward"))
    } else {
        Ok(get_home_dir()?.join(".bedrock-steward"))
    }
}

/// Expand `~` and `$VAR`/`${VAR}` references in a configured path.
///
/// # Examples
///
/// ```rust,no_run
/// use bedrock_steward::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let server = resolve_path("~/bedrock/server")?;
/// assert!(server.is_absolute());
/// # Ok(())
/// # }
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{path}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_plain() {
        assert_eq!(resolve_path("/srv/bedrock").unwrap(), PathBuf::from("/srv/bedrock"));
    }

    #[test]
    fn test_resolve_path_tilde() {
        let home = get_home_dir().unwrap();
        assert_eq!(resolve_path("~/server").unwrap(), home.join("server"));
    }

    #[test]
    fn test_resolve_path_unknown_variable_fails() {
        assert!(resolve_path("$STEWARD_SURELY_UNSET_VARIABLE/x").is_err());
    }
}
