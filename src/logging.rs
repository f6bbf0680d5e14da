use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Filter from `RUST_LOG`, falling back to `default_level` when unset or invalid.
pub fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

/// Installs the global fmt subscriber. Calling it twice is harmless.
pub fn init(default_level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_match_filter_directives() {
        assert_eq!(LogLevel::default().as_str(), "info");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(LogLevel::Debug);
        init(LogLevel::Info);
    }
}
