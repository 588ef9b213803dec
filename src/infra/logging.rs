use tracing::Level;

/// Environment variable selecting the log level
const LOG_ENV: &str = "GITCLOCK_LOG";

/// Parse a level name, falling back to INFO.
fn level_from(value: Option<&str>) -> Level {
    value.and_then(|v| v.trim().parse::<Level>().ok()).unwrap_or(Level::INFO)
}

/// Install the global stderr subscriber. Call once, before anything logs.
pub fn init() {
    let level = level_from(std::env::var(LOG_ENV).ok().as_deref());
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_target(false).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(level_from(None), Level::INFO);
        assert_eq!(level_from(Some("debug")), Level::DEBUG);
        assert_eq!(level_from(Some(" WARN ")), Level::WARN);
        assert_eq!(level_from(Some("chatty")), Level::INFO);
    }
}
