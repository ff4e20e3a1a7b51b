//! Global constants used throughout the steward codebase.
//!
//! Timeouts, well-known file names and Bedrock Dedicated Server layout
//! conventions live here so the update pipeline, the supervisor and the pack
//! installer agree on them.

use std::time::Duration;

/// Grace period between stopping and restarting the server.
///
/// Gives the OS time to release the server's listening sockets and file locks
/// before the new process binds them again.
pub const DEFAULT_RESTART_GRACE: Duration = Duration::from_secs(3);

/// Default interval between scheduled update checks (1 hour).
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 3600;

/// Default timeout for HTTP requests issued by the resolver, fetcher and notifier.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Number of attempts made for a download before giving up.
pub const DOWNLOAD_ATTEMPTS: usize = 3;

/// Starting delay for download retry backoff (250ms).
pub const DOWNLOAD_BACKOFF_START_MS: u64 = 250;

/// Maximum delay between download retries (4s).
pub const DOWNLOAD_BACKOFF_MAX_MS: u64 = 4_000;

/// Official Bedrock Dedicated Server download page.
pub const DEFAULT_DOWNLOAD_PAGE_URL: &str = "https://www.minecraft.net/en-us/download/server/bedrock";

/// The download page rejects requests without a browser-like user agent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Regex locating the Linux server archive link on the download page.
pub const LINUX_ARTIFACT_PATTERN: &str = r#"https://[^"'\s<>]+/bin-linux/bedrock-server-[^"'\s<>]+\.zip"#;

/// Regex locating the Windows server archive link on the download page.
pub const WINDOWS_ARTIFACT_PATTERN: &str = r#"https://[^"'\s<>]+/bin-win/bedrock-server-[^"'\s<>]+\.zip"#;

/// Extracts the version embedded in an artifact file name (`name-1.2.3.zip`).
pub const ARTIFACT_VERSION_PATTERN: &str = r"-(\d+(?:\.\d+)+)\.zip$";

/// Single-line file recording the last successfully installed version.
pub const VERSION_MARKER_FILE: &str = "installed_version.txt";

/// File mirroring the supervised server's pid across invocations.
pub const PID_FILE: &str = "server.pid";

/// Cross-process lock file taken for the duration of an update run.
pub const UPDATE_LOCK_FILE: &str = "update.lock";

/// Server stdout/stderr are appended here.
pub const SERVER_LOG_FILE: &str = "server.log";

/// Server configuration file inside the install root.
pub const SERVER_PROPERTIES_FILE: &str = "server.properties";

/// Property naming the world the server loads.
pub const LEVEL_NAME_KEY: &str = "level-name";

/// Directory holding world folders inside the install root.
pub const WORLDS_DIR: &str = "worlds";

/// Directory holding behavior packs inside the install root.
pub const BEHAVIOR_PACKS_DIR: &str = "behavior_packs";

/// Directory holding resource packs inside the install root.
pub const RESOURCE_PACKS_DIR: &str = "resource_packs";

/// Per-world registry of enabled behavior packs.
pub const WORLD_BEHAVIOR_PACKS_FILE: &str = "world_behavior_packs.json";

/// Per-world registry of enabled resource packs.
pub const WORLD_RESOURCE_PACKS_FILE: &str = "world_resource_packs.json";

/// Descriptor file present at the root of every pack.
pub const PACK_MANIFEST_FILE: &str = "manifest.json";

/// Staging directory for uploaded pack archives inside the temp root.
pub const UPLOADS_DIR: &str = "uploads";

/// User-data items carried over from a snapshot into a freshly swapped install.
pub const DEFAULT_PRESERVE: &[&str] = &[
    WORLDS_DIR,
    BEHAVIOR_PACKS_DIR,
    RESOURCE_PACKS_DIR,
    SERVER_PROPERTIES_FILE,
    "allowlist.json",
    "permissions.json",
];

/// Name of the server executable for the current platform.
#[must_use]
pub const fn default_server_executable() -> &'static str {
    if cfg!(windows) { "bedrock_server.exe" } else { "bedrock_server" }
}

/// Artifact pattern for the current platform.
#[must_use]
pub const fn default_artifact_pattern() -> &'static str {
    if cfg!(windows) { WINDOWS_ARTIFACT_PATTERN } else { LINUX_ARTIFACT_PATTERN }
}
