use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

/// Upstream feed for the three resorts, without credentials.
pub const DEFAULT_SOURCE_URL: &str =
    "https://mtnpowder.com/feed/v3.json?resortId%5B%5D=173&resortId%5B%5D=58&resortId%5B%5D=57";

/// Process-wide settings, built once at startup.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Status source URL
    #[arg(long, env = "RESORT_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Token sent as the `bearer_token` query parameter
    #[arg(long, env = "RESORT_SOURCE_TOKEN", hide_env_values = true)]
    pub source_token: Option<String>,

    /// SQLite database file
    #[arg(long = "db", env = "RESORT_DB_PATH", default_value = "data/resort_status.sqlite")]
    pub db_path: PathBuf,

    /// Address the HTTP service binds to
    #[arg(long, env = "RESORT_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Browser origin allowed by CORS (repeatable)
    #[arg(
        long = "allowed-origin",
        env = "RESORT_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values = ["https://bigbearscrapertest.web.app", "http://localhost:5000"]
    )]
    pub allowed_origins: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: AppConfig,
    }

    #[test]
    fn defaults() {
        let config = TestCli::try_parse_from(["resort_status"]).unwrap().config;
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert!(config.source_token.is_none());
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn origins_split_on_commas() {
        let config = TestCli::try_parse_from([
            "resort_status",
            "--allowed-origin",
            "http://a.test,http://b.test",
            "--db",
            "/tmp/x.sqlite",
        ])
        .unwrap()
        .config;
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.sqlite"));
    }

    #[test]
    fn bad_listen_addr_rejected() {
        assert!(TestCli::try_parse_from(["resort_status", "--listen", "nope"]).is_err());
    }
}
