pub mod assembly;
pub mod domain;
pub mod error;
pub mod form;
pub mod metrics;
pub mod notify;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub simulate_latency: bool,
        pub seed_fixtures: bool,
        pub input_path: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                simulate_latency: env_flag("FINSIGHT_SIMULATE_LATENCY", false)?,
                seed_fixtures: env_flag("FINSIGHT_SEED_FIXTURES", true)?,
                input_path: std::env::var("FINSIGHT_INPUT")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
            })
        }
    }

    fn env_flag(key: &str, default: bool) -> anyhow::Result<bool> {
        let Ok(raw) = std::env::var(key) else {
            return Ok(default);
        };
        parse_flag(&raw).with_context(|| format!("{key} must be a boolean (got {raw:?})"))
    }

    fn parse_flag(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

}
