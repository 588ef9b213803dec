// =============================================================================
// APPLICATION
// =============================================================================

/// Name used for config/data directories and the User-Agent header
pub const APP_NAME: &str = "gitclock";

/// Qualifier passed to `ProjectDirs`
pub const APP_QUALIFIER: &str = "dev";

/// Organization passed to `ProjectDirs`
pub const APP_ORGANIZATION: &str = "gitclock";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

// =============================================================================
// POLLING
// =============================================================================

/// Default period between two working-tree scans (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default timeout for a single git invocation (seconds)
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// GITHUB
// =============================================================================

/// GitHub REST API base URL
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Repository that hosts the activity log
pub const DEFAULT_REPO_NAME: &str = "gitclock-activity";

/// Path of the activity log inside the repository
pub const DEFAULT_LOG_FILE: &str = "README.md";

/// How long the login flow waits for the OAuth redirect (seconds)
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

/// Timeout for a single GitHub HTTP request (seconds)
pub const HTTP_TIMEOUT_SECS: u64 = 30;
